use crate::model::{CellValue, ColumnMap, RawRecord, SheetTable};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// The `Month` of a row whose timestamp could not be parsed. Grouping treats it as its own bucket.
pub const UNPARSEABLE_MONTH: &str = "NaT";

pub const DEBIT: &str = "debit";
pub const CREDIT: &str = "credit";
pub const UNKNOWN: &str = "unknown";

/// One normalized transaction, derived from exactly one `RawRecord`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedgerRow {
    amount: Option<Decimal>,
    date_time: Option<NaiveDateTime>,
    date: Option<NaiveDate>,
    month: String,
    weekday: Option<String>,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(skip)]
    source: RawRecord,
}

impl LedgerRow {
    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.date_time
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// `YYYY-MM`, or `"NaT"` when there is no timestamp.
    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn weekday(&self) -> Option<&str> {
        self.weekday.as_deref()
    }

    /// The transaction type, e.g. `"debit"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The record this row was derived from.
    pub fn source(&self) -> &RawRecord {
        &self.source
    }

    pub fn is_debit(&self) -> bool {
        self.kind == DEBIT
    }

    pub fn is_credit(&self) -> bool {
        self.kind == CREDIT
    }
}

/// The normalized working table: one `LedgerRow` per sheet row, in sheet order.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct LedgerTable {
    headers: Vec<String>,
    columns: ColumnMap,
    rows: Vec<LedgerRow>,
}

impl LedgerTable {
    /// The headers of the worksheet the table was derived from.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derives a `LedgerTable` from the raw records of a worksheet.
///
/// This never fails: a cell that cannot be coerced leaves its field undefined. The output has
/// exactly one row per input row, in the same order, and the function has no side effects.
///
/// - `Amount` comes from the amount column. Without one, the first column (in header order) whose
///   every cell is already a number is used instead; failing that, every amount is undefined.
/// - `DateTime` comes from the date column, and `Date`, `Month` and `Weekday` derive from it.
/// - `Type` is the type column's text, lower-cased and trimmed. Without a type column it is
///   `"debit"` for negative amounts, `"credit"` for positive ones and `"unknown"` otherwise.
pub fn normalize(table: &SheetTable, columns: &ColumnMap) -> LedgerTable {
    let amount_column = columns
        .amount()
        .or_else(|| first_numeric_column(table));

    let rows = table
        .rows()
        .iter()
        .map(|record| normalize_row(record, amount_column, columns))
        .collect();

    LedgerTable {
        headers: table.headers().to_vec(),
        columns: columns.clone(),
        rows,
    }
}

fn normalize_row(record: &RawRecord, amount_column: Option<&str>, columns: &ColumnMap) -> LedgerRow {
    let amount = amount_column.and_then(|header| record.cell(header).to_amount());
    let date_time = columns
        .date()
        .and_then(|header| record.cell(header).to_timestamp());

    let kind = match columns.kind() {
        Some(header) => record.cell(header).text().to_lowercase().trim().to_string(),
        None => infer_kind(amount).to_string(),
    };

    LedgerRow {
        amount,
        date_time,
        date: date_time.map(|dt| dt.date()),
        month: date_time
            .map(|dt| dt.format("%Y-%m").to_string())
            .unwrap_or_else(|| UNPARSEABLE_MONTH.to_string()),
        weekday: date_time.map(|dt| dt.format("%A").to_string()),
        kind,
        source: record.clone(),
    }
}

fn infer_kind(amount: Option<Decimal>) -> &'static str {
    match amount {
        Some(a) if a.is_sign_negative() && !a.is_zero() => DEBIT,
        Some(a) if !a.is_zero() => CREDIT,
        _ => UNKNOWN,
    }
}

/// The first header whose cells are all numbers. An empty table has no numeric columns.
fn first_numeric_column(table: &SheetTable) -> Option<&str> {
    if table.is_empty() {
        return None;
    }
    table
        .headers()
        .iter()
        .find(|header| {
            table
                .rows()
                .iter()
                .all(|record| record.get(header).is_some_and(CellValue::is_number))
        })
        .map(String::as_str)
}
