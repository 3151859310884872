//! CSV export of the normalized ledger.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{LedgerRow, LedgerTable};
use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// The file name offered for the cleaned export.
pub const CLEANED_CSV: &str = "transactions_cleaned.csv";

const DERIVED: [Derived; 6] = [
    Derived::Amount,
    Derived::DateTime,
    Derived::Date,
    Derived::Month,
    Derived::Weekday,
    Derived::Type,
];

/// The columns added to every exported row.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Derived {
    Amount,
    DateTime,
    Date,
    Month,
    Weekday,
    Type,
}

impl Derived {
    fn header(self) -> &'static str {
        match self {
            Derived::Amount => "Amount",
            Derived::DateTime => "DateTime",
            Derived::Date => "Date",
            Derived::Month => "Month",
            Derived::Weekday => "Weekday",
            Derived::Type => "Type",
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        DERIVED.into_iter().find(|d| d.header() == header)
    }

    fn value(self, row: &LedgerRow) -> String {
        match self {
            Derived::Amount => row.amount().map(|a| a.to_string()).unwrap_or_default(),
            Derived::DateTime => row
                .date_time()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            Derived::Date => row
                .date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            Derived::Month => row.month().to_string(),
            Derived::Weekday => row.weekday().unwrap_or_default().to_string(),
            Derived::Type => row.kind().to_string(),
        }
    }
}

/// One output column: either a sheet column copied through, or a derived field.
#[derive(Debug, Clone, Copy)]
enum Column<'a> {
    Sheet(&'a str),
    Derived(Derived),
}

/// The export columns: the sheet headers in order, where a header that has the exact name of a
/// derived field is replaced in place by that field, then any derived fields not yet placed.
#[derive(Debug, Clone)]
pub(crate) struct Layout<'a> {
    columns: Vec<Column<'a>>,
}

impl<'a> Layout<'a> {
    pub(crate) fn new(headers: &'a [String]) -> Self {
        let mut columns: Vec<Column<'a>> = headers
            .iter()
            .map(|h| match Derived::from_header(h) {
                Some(derived) => Column::Derived(derived),
                None => Column::Sheet(h.as_str()),
            })
            .collect();
        for derived in DERIVED {
            if !headers.iter().any(|h| h == derived.header()) {
                columns.push(Column::Derived(derived));
            }
        }
        Self { columns }
    }

    pub(crate) fn header(&self) -> Vec<&'a str> {
        self.columns
            .iter()
            .map(|c| match c {
                Column::Sheet(h) => *h,
                Column::Derived(d) => d.header(),
            })
            .collect()
    }

    pub(crate) fn record(&self, row: &LedgerRow) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| match c {
                Column::Sheet(h) => row.source().cell(h).text(),
                Column::Derived(d) => d.value(row),
            })
            .collect()
    }
}

/// Serializes the whole ledger as UTF-8 CSV with a header row and no index column.
pub fn to_csv(ledger: &LedgerTable) -> Result<Vec<u8>> {
    csv_bytes(ledger).pub_result(ErrorType::Internal)
}

fn csv_bytes(ledger: &LedgerTable) -> Res<Vec<u8>> {
    let layout = Layout::new(ledger.headers());
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(layout.header())
        .context("Unable to write the CSV header")?;

    for (ix, row) in ledger.rows().iter().enumerate() {
        writer
            .write_record(layout.record(row))
            .with_context(|| format!("Unable to write CSV row {}", ix + 1))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush the CSV writer: {}", e.error()))
}

/// Writes the CSV export to `path`. If `path` is a directory the file is named
/// `transactions_cleaned.csv` inside it. Returns the path written.
pub async fn write_csv(ledger: &LedgerTable, path: &Path) -> Result<PathBuf> {
    let path = if path.is_dir() {
        path.join(CLEANED_CSV)
    } else {
        path.to_path_buf()
    };
    let data = to_csv(ledger)?;
    crate::utils::write(&path, data)
        .await
        .pub_result(ErrorType::Filesystem)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{infer_columns, normalize, SheetTable};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ledger(values: Vec<Vec<&str>>) -> LedgerTable {
        let table = SheetTable::from_values(values);
        let columns = infer_columns(table.headers());
        normalize(&table, &columns)
    }

    fn to_string(ledger: &LedgerTable) -> String {
        String::from_utf8(to_csv(ledger).unwrap()).unwrap()
    }

    #[test]
    fn test_layout_replaces_matching_headers_in_place() {
        let ledger = ledger(vec![
            vec!["Date", "Amount", "Type", "Message"],
            vec!["2024-01-05", "-50", "Debit ", "coffee"],
        ]);
        let csv = to_string(&ledger);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Amount,Type,Message,DateTime,Month,Weekday")
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-05,-50,debit,coffee,2024-01-05 00:00:00,2024-01,Friday")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_layout_appends_derived_columns() {
        let ledger = ledger(vec![
            vec!["when", "amt", "msg"],
            vec!["x", "abc", "hello, world"],
        ]);
        let csv = to_string(&ledger);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("when,amt,msg,Amount,DateTime,Date,Month,Weekday,Type")
        );
        assert_eq!(
            lines.next(),
            Some("x,abc,\"hello, world\",,,,NaT,,unknown")
        );
    }

    #[test]
    fn test_csv_round_trip_amount_and_type() {
        let ledger = ledger(vec![
            vec!["DateTime", "Amount", "msg"],
            vec!["2024-01-05 10:00:00", "-12.50", "lunch"],
            vec!["2024-01-06 11:00:00", "2000", "pay"],
            vec!["nope", "", "blank"],
        ]);
        let bytes = to_csv(&ledger).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        let amount_ix = headers.iter().position(|h| h == "Amount").unwrap();
        let type_ix = headers.iter().position(|h| h == "Type").unwrap();

        let parsed: Vec<(Option<Decimal>, String)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                let amount = Some(&r[amount_ix])
                    .filter(|s| !s.is_empty())
                    .map(|s| Decimal::from_str(s).unwrap());
                (amount, r[type_ix].to_string())
            })
            .collect();

        let expected: Vec<(Option<Decimal>, String)> = ledger
            .rows()
            .iter()
            .map(|r| (r.amount(), r.kind().to_string()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_empty_ledger_writes_header_only() {
        let ledger = ledger(vec![vec!["Date", "Amount"]]);
        let csv = to_string(&ledger);
        assert_eq!(csv, "Date,Amount,DateTime,Month,Weekday,Type\n");
    }

    #[tokio::test]
    async fn test_write_csv_into_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let ledger = ledger(vec![vec!["Amount"], vec!["1"]]);
        let path = write_csv(&ledger, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join(CLEANED_CSV));
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with("Amount,DateTime,Date,Month,Weekday,Type\n"));
    }
}
