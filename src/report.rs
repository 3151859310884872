//! One pass of the dashboard: load the worksheet, infer its columns, normalize it and aggregate.

use crate::aggregate::{
    daily_debit_series, monthly_type_matrix, summarize, DailyPoint, MonthlyMatrix, Summary,
};
use crate::client::SheetClient;
use crate::model::{infer_columns, normalize, ColumnMap, LedgerRow, LedgerTable, SheetTable};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// How many raw rows are shown before normalization.
pub const RAW_PREVIEW_ROWS: usize = 10;

/// Everything the dashboard shows for one load.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    spreadsheet_id: String,
    worksheet: Option<String>,
    notice: Option<String>,
    columns: ColumnMap,
    summary: Summary,
    daily: Vec<DailyPoint>,
    monthly: MonthlyMatrix,
    preview: Vec<LedgerRow>,
    #[serde(skip)]
    table: Arc<SheetTable>,
    #[serde(skip)]
    ledger: LedgerTable,
}

impl Report {
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The worksheet that was asked for, if any.
    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }

    /// Why the sheet could not be read, if it could not.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn daily(&self) -> &[DailyPoint] {
        &self.daily
    }

    pub fn monthly(&self) -> &MonthlyMatrix {
        &self.monthly
    }

    /// The first rows of the normalized ledger.
    pub fn preview(&self) -> &[LedgerRow] {
        &self.preview
    }

    /// The worksheet as it was loaded.
    pub fn table(&self) -> &SheetTable {
        &self.table
    }

    /// The whole normalized ledger.
    pub fn ledger(&self) -> &LedgerTable {
        &self.ledger
    }

    /// True when no rows were loaded.
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }
}

/// Picks the worksheet to load: the first worksheet of the spreadsheet, unless `requested` names
/// one. Failing to list the worksheets is not an error here; the load reports it.
pub async fn select_worksheet(
    client: &SheetClient,
    spreadsheet_id: &str,
    requested: Option<&str>,
) -> Option<String> {
    let first = match client.list_worksheets(spreadsheet_id).await {
        Ok(titles) => titles.first().cloned(),
        Err(e) => {
            warn!("Unable to list worksheets: {e}");
            None
        }
    };
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Some(name.to_string()),
        None => first,
    }
}

/// Runs the whole pipeline once.
///
/// # Errors
/// Only configuration errors are returned. A sheet that cannot be read produces an empty report
/// carrying a notice.
pub async fn build_report(
    client: &SheetClient,
    spreadsheet_id: &str,
    worksheet: Option<&str>,
    preview_rows: usize,
) -> Result<Report> {
    let worksheet = select_worksheet(client, spreadsheet_id, worksheet).await;
    let table = client
        .load_worksheet(spreadsheet_id, worksheet.as_deref())
        .await?;
    let columns = infer_columns(table.headers());
    debug!("Inferred columns {columns:?}");
    let ledger = normalize(&table, &columns);

    Ok(Report {
        spreadsheet_id: spreadsheet_id.to_string(),
        worksheet,
        notice: table.notice().map(str::to_string),
        summary: summarize(ledger.rows()),
        daily: daily_debit_series(ledger.rows()),
        monthly: monthly_type_matrix(ledger.rows()),
        preview: ledger.rows().iter().take(preview_rows).cloned().collect(),
        columns,
        table,
        ledger,
    })
}
