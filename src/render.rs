//! Renders a `Report` as the text dashboard.

use crate::aggregate::{DailyPoint, MonthlyMatrix, Summary};
use crate::export::Layout;
use crate::model::{LedgerRow, RawRecord};
use crate::report::{Report, RAW_PREVIEW_ROWS};
use comfy_table::{Cell, CellAlignment, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Shown instead of the dashboard when nothing was loaded.
pub const EMPTY_PROMPT: &str =
    "No data loaded yet. Provide Sheet ID and ensure worksheet has rows and headers.";

const NOT_AVAILABLE: &str = "N/A";

/// Formats the whole dashboard. An empty load renders only the notice, if any, and the prompt.
pub fn format_report(report: &Report) -> String {
    let mut sections = Vec::new();
    if let Some(notice) = report.notice() {
        sections.push(notice.to_string());
    }
    if report.is_empty() {
        sections.push(EMPTY_PROMPT.to_string());
        return sections.join("\n\n");
    }

    sections.push(format!("Summary\n{}", format_summary(report.summary())));
    let raw: Vec<&RawRecord> = report.table().rows().iter().take(RAW_PREVIEW_ROWS).collect();
    sections.push(format!(
        "Raw data (first {} rows)\n{}",
        raw.len(),
        format_records(report.table().headers(), &raw)
    ));
    if !report.daily().is_empty() {
        sections.push(format!(
            "Daily spending\n{}",
            format_daily(report.daily())
        ));
    }
    if !report.monthly().is_empty() {
        sections.push(format!(
            "Monthly totals by type\n{}",
            format_monthly(report.monthly())
        ));
    }
    sections.push(format!(
        "Cleaned data (first {} rows)\n{}",
        report.preview().len(),
        format_ledger(report.ledger().headers(), report.preview())
    ));
    sections.join("\n\n")
}

pub fn format_summary(summary: &Summary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Total debit"),
        Cell::new(money(summary.total_debit)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Total credit"),
        Cell::new(money(summary.total_credit)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Transactions"),
        Cell::new(summary.transaction_count).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Latest transaction"),
        Cell::new(
            summary
                .latest_timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
    ]);
    table.to_string()
}

pub fn format_records(headers: &[String], rows: &[&RawRecord]) -> String {
    let mut table = Table::new();
    table.set_header(headers);
    for row in rows {
        table.add_row(headers.iter().map(|h| row.cell(h).text()));
    }
    table.to_string()
}

pub fn format_daily(series: &[DailyPoint]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Debit"]);
    for point in series {
        table.add_row(vec![
            Cell::new(point.date.format("%Y-%m-%d")),
            Cell::new(money(point.amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

pub fn format_monthly(matrix: &MonthlyMatrix) -> String {
    let mut table = Table::new();
    let mut header = vec!["Month"];
    header.extend(matrix.types().iter().map(String::as_str));
    table.set_header(header);
    for row in matrix.rows() {
        let mut cells = vec![Cell::new(&row.month)];
        cells.extend(
            row.values
                .iter()
                .map(|v| Cell::new(money(*v)).set_alignment(CellAlignment::Right)),
        );
        table.add_row(cells);
    }
    table.to_string()
}

/// Formats ledger rows with the same columns as the CSV export.
pub fn format_ledger(headers: &[String], rows: &[LedgerRow]) -> String {
    let layout = Layout::new(headers);
    let mut table = Table::new();
    table.set_header(layout.header());
    for row in rows {
        table.add_row(layout.record(row));
    }
    table.to_string()
}

/// Formats an amount with thousands separators and two decimals, e.g. `-1,234.50`.
pub fn money(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!(
        "{sign}{}",
        format_num::format_num!(",.2", amount.abs().to_f64().unwrap_or_default())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{book_from_csv, TestSheet};
    use crate::client::{SheetClient, DEFAULT_CACHE_TTL};
    use crate::report::build_report;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Arc;

    async fn report(id: &str, csv: &str) -> Report {
        let book = book_from_csv(&[("Sheet1", csv)]).unwrap();
        let client = SheetClient::new(
            Arc::new(TestSheet::new(HashMap::from([("id".to_string(), book)]))),
            DEFAULT_CACHE_TTL,
        );
        build_report(&client, id, None, 200).await.unwrap()
    }

    #[test]
    fn test_money() {
        assert_eq!(money(Decimal::from_str("1234.5").unwrap()), "1,234.50");
        assert_eq!(money(Decimal::from_str("-87.43").unwrap()), "-87.43");
        assert_eq!(money(Decimal::ZERO), "0.00");
        assert_eq!(money(Decimal::from_str("1000000").unwrap()), "1,000,000.00");
    }

    #[test]
    fn test_summary_without_timestamp() {
        let text = format_summary(&Summary::default());
        assert!(text.contains("Total debit"));
        assert!(text.contains("0.00"));
        assert!(text.contains(NOT_AVAILABLE));
    }

    #[tokio::test]
    async fn test_format_report_sections() {
        let report = report(
            "id",
            "DateTime,Amount,Type,Message\n\
             2024-01-05 10:00:00,1250.5,debit,rent\n\
             2024-01-20 12:00:00,3000,credit,salary\n",
        )
        .await;
        let text = format_report(&report);
        assert!(text.contains("Summary"));
        assert!(text.contains("1,250.50"));
        assert!(text.contains("3,000.00"));
        assert!(text.contains("2024-01-20 12:00:00"));
        assert!(text.contains("Raw data (first 2 rows)"));
        assert!(text.contains("Daily spending"));
        assert!(text.contains("Monthly totals by type"));
        assert!(text.contains("Cleaned data (first 2 rows)"));
        assert!(text.contains("Weekday"));
        assert!(!text.contains(EMPTY_PROMPT));
    }

    #[tokio::test]
    async fn test_format_report_omits_empty_daily_table() {
        let report = report("id", "Date,Amount,Type\n2024-01-05,10,credit\n").await;
        let text = format_report(&report);
        assert!(!text.contains("Daily spending"));
        assert!(text.contains("Monthly totals by type"));
    }

    #[tokio::test]
    async fn test_format_report_empty_load() {
        let report = report("", "Date,Amount\n").await;
        assert_eq!(format_report(&report), EMPTY_PROMPT);
    }

    #[tokio::test]
    async fn test_format_report_with_notice() {
        let report = report("missing", "Date,Amount\n").await;
        let text = format_report(&report);
        assert!(text.starts_with("Unable to open sheet: "));
        assert!(text.ends_with(EMPTY_PROMPT));
        assert!(!text.contains("Summary"));
    }
}
