use crate::model::CellValue;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// One row from a worksheet, keyed by the original header text.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, CellValue>);

impl RawRecord {
    /// Returns the cell under `header`, or `None` if the record has no such header.
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.0.get(header)
    }

    /// Returns the cell under `header`, treating a missing header as an empty cell.
    pub fn cell(&self, header: &str) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.0.get(header).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(header.into(), value.into());
    }
}

impl<H, V> FromIterator<(H, V)> for RawRecord
where
    H: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<T: IntoIterator<Item = (H, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(h, v)| (h.into(), v.into()))
                .collect(),
        )
    }
}

/// The records of one worksheet along with its headers in sheet order.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<RawRecord>,
    /// Set when the sheet could not be opened or read. The table is empty in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

impl SheetTable {
    /// Builds a table from raw sheet values where the first row holds the headers. Every later row
    /// becomes one `RawRecord`. Short rows are padded with empty cells and cells beyond the last
    /// header are dropped. A repeated header keeps its first position and its last value.
    pub fn from_values<S, R>(values: impl IntoIterator<Item = R>) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mut rows = values.into_iter();
        let header_row: Vec<String> = match rows.next() {
            Some(header_row) => header_row.into_iter().map(Into::into).collect(),
            None => return Self::default(),
        };

        let mut seen = HashSet::new();
        let headers: Vec<String> = header_row
            .iter()
            .filter(|h| seen.insert(h.as_str()))
            .cloned()
            .collect();

        let mut records: Vec<RawRecord> = Vec::new();
        for (row_ix, row) in rows.enumerate() {
            let mut values: Vec<String> = row.into_iter().map(Into::into).collect();
            if values.len() > header_row.len() {
                warn!(
                    "Row {} has {} cells but there are only {} headers, the extra cells are ignored",
                    row_ix + 2,
                    values.len(),
                    header_row.len()
                );
                values.truncate(header_row.len());
            }
            values.resize(header_row.len(), String::new());
            records.push(header_row.iter().cloned().zip(values).collect());
        }

        Self {
            headers,
            rows: records,
            notice: None,
        }
    }

    /// Builds a table directly from headers and records.
    pub fn new(headers: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self {
            headers,
            rows,
            notice: None,
        }
    }

    /// An empty table that carries a message explaining why nothing could be loaded.
    pub fn unavailable(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..Self::default()
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_from_values_header_row() {
        let table = SheetTable::from_values(vec![
            vec!["Date", "Amount", "Message"],
            vec!["2024-01-05", "-50", "coffee"],
            vec!["2024-01-06", "", "refund"],
        ]);
        assert_eq!(table.headers(), ["Date", "Amount", "Message"]);
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.cell("Amount"), &CellValue::Number(Decimal::new(-50, 0)));
        assert_eq!(first.cell("Message"), &CellValue::Text("coffee".into()));
        // Empty cells stay empty rather than becoming zero.
        assert_eq!(table.rows()[1].cell("Amount"), &CellValue::Empty);
    }

    #[test]
    fn test_from_values_pads_and_truncates() {
        let table = SheetTable::from_values(vec![
            vec!["A", "B"],
            vec!["1"],
            vec!["1", "2", "3"],
            vec![],
        ]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].get("B"), Some(&CellValue::Empty));
        assert_eq!(table.rows()[1].get("B"), Some(&CellValue::Number(Decimal::new(2, 0))));
        assert_eq!(table.rows()[2].get("A"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_from_values_duplicate_header() {
        let table = SheetTable::from_values(vec![vec!["A", "B", "A"], vec!["first", "x", "last"]]);
        assert_eq!(table.headers(), ["A", "B"]);
        assert_eq!(table.rows()[0].cell("A"), &CellValue::Text("last".into()));
    }

    #[test]
    fn test_from_values_empty() {
        let table = SheetTable::from_values(Vec::<Vec<String>>::new());
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
        assert!(table.notice().is_none());
    }

    #[test]
    fn test_unavailable() {
        let table = SheetTable::unavailable("Unable to open sheet: boom");
        assert!(table.is_empty());
        assert_eq!(table.notice(), Some("Unable to open sheet: boom"));
    }
}
