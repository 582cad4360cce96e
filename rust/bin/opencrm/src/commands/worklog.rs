//! Work log commands. Entries belong to the logged-in user.

use std::path::Path;

use anyhow::Result;

use super::client;

pub async fn list(json: bool, client_config_path: &Path) -> Result<()> {
    let entries = client(client_config_path)?.list_worklog().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No work log entries.");
        return Ok(());
    }
    for entry in &entries {
        let first_line = entry.log.lines().next().unwrap_or("");
        println!("{:12} {}", entry.date, first_line);
    }
    Ok(())
}

pub async fn get(date: &str, client_config_path: &Path) -> Result<()> {
    let day = client(client_config_path)?.get_worklog(date).await?;
    if day.log.is_empty() {
        println!("No entry for {}.", day.date);
    } else {
        println!("{}", day.log);
    }
    Ok(())
}

pub async fn save(date: &str, log: &str, client_config_path: &Path) -> Result<()> {
    let entry = client(client_config_path)?.save_worklog(date, log).await?;
    println!("Work log for {} saved.", entry.date);
    Ok(())
}

pub async fn update(date: &str, log: &str, client_config_path: &Path) -> Result<()> {
    let entry = client(client_config_path)?.update_worklog(date, log).await?;
    println!("Work log for {} updated.", entry.date);
    Ok(())
}

pub async fn delete(date: &str, client_config_path: &Path) -> Result<()> {
    let message = client(client_config_path)?.delete_worklog(date).await?;
    println!("{}", message);
    Ok(())
}

/// Log text from `--log` or `-f <file>`.
pub fn log_input(log: Option<String>, file: Option<String>) -> Result<String> {
    match (log, file) {
        (_, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (Some(log), None) => Ok(log),
        (None, None) => anyhow::bail!("Provide --log or -f <file>."),
    }
}
