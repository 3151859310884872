use crate::api::Mode;
use crate::commands::{sheet_client, Out};
use crate::{Config, Result};

/// Lists the worksheet titles of the spreadsheet named by `sheet`, or of the configured one.
pub async fn worksheets(config: &Config, mode: Mode, sheet: Option<&str>) -> Result<Out<Vec<String>>> {
    let spreadsheet_id = config.resolve_spreadsheet_id(sheet)?;
    if spreadsheet_id.is_empty() {
        return Ok("No Sheet ID configured. Pass --sheet or set sheet_url in config.json.".into());
    }
    let client = sheet_client(config, mode);
    let titles = client.list_worksheets(&spreadsheet_id).await?;
    Ok(Out::new(titles.join("\n"), titles.to_vec()))
}
