use crate::api::Mode;
use crate::args::ReportArgs;
use crate::commands::{sheet_client, Out};
use crate::render::format_report;
use crate::report::{build_report, Report};
use crate::{export, Config, Result};
use tracing::info;

/// Loads the worksheet once and renders the dashboard. With `--csv` the cleaned ledger is also
/// written to disk.
pub async fn report(config: &Config, mode: Mode, args: &ReportArgs) -> Result<Out<Report>> {
    let spreadsheet_id = config.resolve_spreadsheet_id(args.sheet())?;
    let worksheet = args
        .worksheet()
        .filter(|w| !w.trim().is_empty())
        .or(config.worksheet());
    let preview = args.preview().unwrap_or(config.preview_rows());

    let client = sheet_client(config, mode);
    let report = build_report(&client, &spreadsheet_id, worksheet, preview).await?;
    let mut message = format_report(&report);

    if let Some(path) = args.csv() {
        if report.is_empty() {
            info!("Nothing to export, no rows were loaded");
        } else {
            let written = export::write_csv(report.ledger(), path).await?;
            info!("Saved the cleaned data to {}", written.display());
            message.push_str(&format!(
                "\n\nWrote {} rows to {}",
                report.ledger().len(),
                written.display()
            ));
        }
    }

    Ok(Out::new(message, report))
}
