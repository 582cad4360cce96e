//! Customer commands: CRUD, spreadsheet import and export.

use std::path::Path;

use anyhow::Result;
use opencrm_client::{Customer, CustomerQuery, ImportMode};

use super::client;

pub async fn list(query: &CustomerQuery, json: bool, client_config_path: &Path) -> Result<()> {
    let customers = client(client_config_path)?.list_customers(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&customers)?);
    } else {
        print_table(&customers);
    }
    Ok(())
}

pub async fn get(id: &str, client_config_path: &Path) -> Result<()> {
    let customer = client(client_config_path)?.get_customer(id).await?;
    println!("{}", serde_json::to_string_pretty(&customer)?);
    Ok(())
}

pub async fn create(body: &serde_json::Value, client_config_path: &Path) -> Result<()> {
    let customer = client(client_config_path)?.create_customer(body).await?;
    println!("Customer #{} created.", customer.serial_no);
    println!("{}", serde_json::to_string_pretty(&customer)?);
    Ok(())
}

pub async fn update(id: &str, patch: &serde_json::Value, client_config_path: &Path) -> Result<()> {
    let customer = client(client_config_path)?.update_customer(id, patch).await?;
    println!("Customer {} updated.", id);
    println!("{}", serde_json::to_string_pretty(&customer)?);
    Ok(())
}

pub async fn delete(id: &str, client_config_path: &Path) -> Result<()> {
    let message = client(client_config_path)?.delete_customer(id).await?;
    println!("{}", message);
    Ok(())
}

/// Read a spreadsheet and upload its rows in one batch.
pub async fn import(file: &Path, mode: ImportMode, client_config_path: &Path) -> Result<()> {
    let client = client(client_config_path)?;
    let mut rows = opencrm_sheet::read_rows(file)?;
    if rows.is_empty() {
        anyhow::bail!("No rows found in {}.", file.display());
    }
    opencrm_sheet::apply_import_defaults(&mut rows);

    tracing::info!(file = %file.display(), rows = rows.len(), mode = mode.as_str(), "importing customers");
    let summary = client.import(mode, &rows).await?;
    println!("{}", summary.message);
    println!("  Total:    {}", summary.total);
    println!("  Inserted: {}", summary.inserted);
    println!("  Errors:   {}", summary.errors);
    Ok(())
}

/// Download customers matching `query` into an `.xlsx` file.
pub async fn export(file: &Path, query: &CustomerQuery, client_config_path: &Path) -> Result<()> {
    let customers = client(client_config_path)?.list_customers(query).await?;
    opencrm_sheet::write_customers(file, &customers)?;
    println!("Exported {} customers to {}.", customers.len(), file.display());
    Ok(())
}

fn print_table(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers.");
        return;
    }
    println!("{:>6} {:16} {:24} {:16} {}", "SERIAL", "NAME", "COMPANY", "MOBILE", "ID");
    for c in customers {
        println!(
            "{:>6} {:16} {:24} {:16} {}",
            c.serial_no,
            c.name,
            c.text("company").unwrap_or("-"),
            c.text("mobile").unwrap_or("-"),
            c.id
        );
    }
}
