use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory and:
/// - Creates an initial `config.json` file using `sheet_url` and `worksheet` along with defaults
/// - Stores the service-account key from `service_account` in `.secrets/secrets.json`
///
/// # Arguments
/// - `expenses_home` - The directory that will be the home directory, e.g. `$HOME/expenses`
/// - `service_account` - The JSON key file downloaded for a Google service account that has been
///   given read access to the sheet.
/// - `sheet_url` - The URL or ID of the Google Sheet holding the transactions.
/// - `worksheet` - The worksheet to read by default.
///
/// # Errors
/// - Returns an error if the URL is not understood or if any file operations fail.
pub async fn init(
    expenses_home: &Path,
    service_account: &Path,
    sheet_url: Option<&str>,
    worksheet: Option<&str>,
) -> Result<Out<()>> {
    let config = Config::create(expenses_home, service_account, sheet_url, worksheet).await?;
    Ok(format!(
        "Successfully created the expenses directory and config at {}",
        config.root().display()
    )
    .into())
}
