use std::path::Path;

use anyhow::Result;

use super::anonymous_client;

/// Print the public holidays of `year`. Needs no login.
pub async fn list(year: u16, json: bool, client_config_path: &Path) -> Result<()> {
    let holidays = anonymous_client(client_config_path)?.holidays(year).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&holidays)?);
        return Ok(());
    }
    if holidays.is_empty() {
        println!("No holidays for {}.", year);
    }
    for h in &holidays {
        println!("{:12} {}", h.date, h.name);
    }
    Ok(())
}
