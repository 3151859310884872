use crate::api::Mode;
use crate::args::WatchArgs;
use crate::client::SheetClient;
use crate::commands::{sheet_client, Out};
use crate::error::{ErrorType, IntoResult};
use crate::render::format_report;
use crate::report::build_report;
use crate::{Config, Result};
use anyhow::Context;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "[Enter] reload  [r] refresh from the sheet  [q] quit";

/// Shows the dashboard and redraws it on every keypress until the user quits. Enter reloads through
/// the cache; `r` drops the cache first so that fresh data is fetched.
pub async fn watch(config: &Config, mode: Mode, args: &WatchArgs) -> Result<Out<()>> {
    let spreadsheet_id = config.resolve_spreadsheet_id(args.sheet())?;
    let worksheet = args
        .worksheet()
        .filter(|w| !w.trim().is_empty())
        .or(config.worksheet());
    let preview = args.preview().unwrap_or(config.preview_rows());

    let client = sheet_client(config, mode);
    let input = BufReader::new(tokio::io::stdin());
    let passes = watch_loop(
        &client,
        &spreadsheet_id,
        worksheet,
        preview,
        input,
        &mut std::io::stdout(),
    )
    .await?;
    Ok(format!("Stopped after {passes} loads").into())
}

/// Renders a pass for every line of `input` and returns how many passes were rendered.
async fn watch_loop<R, W>(
    client: &SheetClient,
    spreadsheet_id: &str,
    worksheet: Option<&str>,
    preview: usize,
    input: R,
    out: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut passes = 0;
    loop {
        let report = build_report(client, spreadsheet_id, worksheet, preview).await?;
        passes += 1;
        writeln!(out, "{}\n\n{HELP}", format_report(&report))
            .and_then(|_| out.flush())
            .context("Unable to write the dashboard")
            .pub_result(ErrorType::Internal)?;

        let line = lines
            .next_line()
            .await
            .context("Unable to read from stdin")
            .pub_result(ErrorType::Internal)?;
        match line.as_deref().map(str::trim) {
            None | Some("q") | Some("quit") => break,
            Some("r") => {
                debug!("Refresh requested");
                client.refresh();
            }
            Some(_) => {}
        }
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;
    use crate::client::DEFAULT_CACHE_TTL;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_watch_loop_reload_refresh_quit() {
        let sheet = Arc::new(TestSheet::seeded());
        let client = SheetClient::new(sheet.clone(), DEFAULT_CACHE_TTL);
        let mut out = Vec::new();
        let passes = watch_loop(&client, "any", None, 5, &b"\n\nr\nq\nnever\n"[..], &mut out)
            .await
            .unwrap();
        assert_eq!(passes, 4);
        assert_eq!(sheet.value_calls(), 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HELP).count(), 4);
        assert!(text.contains("Cleaned data (first 5 rows)"));
    }

    #[tokio::test]
    async fn test_watch_loop_stops_at_eof() {
        let sheet = Arc::new(TestSheet::seeded());
        let client = SheetClient::new(sheet.clone(), DEFAULT_CACHE_TTL);
        let mut out = Vec::new();
        let passes = watch_loop(&client, "any", Some("Card"), 5, &b""[..], &mut out)
            .await
            .unwrap();
        assert_eq!(passes, 1);
        assert_eq!(sheet.value_calls(), 1);
    }
}
