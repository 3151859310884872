//! Scalar cell values and the lenient coercions applied to them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single cell from a worksheet.
///
/// The Sheets API hands us every cell as text. When a worksheet is loaded the text is
/// "numericised": an empty cell becomes `Empty`, text that reads as a plain number becomes
/// `Number`, and everything else is kept verbatim as `Text`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub enum CellValue {
    #[default]
    Empty,
    Number(Decimal),
    Text(String),
}

impl CellValue {
    /// Creates a `CellValue` from the text of a sheet cell.
    ///
    /// ```
    /// # use expense_tracker::model::CellValue;
    /// # use rust_decimal::Decimal;
    /// assert_eq!(CellValue::from_sheet(""), CellValue::Empty);
    /// assert_eq!(CellValue::from_sheet("-50"), CellValue::Number(Decimal::new(-50, 0)));
    /// assert_eq!(CellValue::from_sheet("$5.00"), CellValue::Text("$5.00".into()));
    /// ```
    pub fn from_sheet(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            return CellValue::Empty;
        }
        // Underscores are legal in some numeric literals but never in a number typed into a sheet.
        if s.contains('_') {
            return CellValue::Text(s);
        }
        match parse_decimal(s.trim()) {
            Some(d) => CellValue::Number(d),
            None => CellValue::Text(s),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// The text of the cell as it would be shown, `""` for `Empty`.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Coerces the cell to a number. Unparseable and empty cells give `None`, never zero.
    ///
    /// Text must read as a plain or scientific decimal once surrounding whitespace is trimmed.
    /// Currency symbols and thousands separators make the amount undefined, e.g. `$1,250.00`.
    pub fn to_amount(&self) -> Option<Decimal> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(d) => Some(*d),
            CellValue::Text(s) => parse_decimal(s.trim()),
        }
    }

    /// Coerces the cell to a timestamp. Unparseable and empty cells give `None`.
    pub fn to_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(d) => parse_timestamp(&d.to_string()),
            CellValue::Text(s) => parse_timestamp(s),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(d) => Display::fmt(d, f),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(d) => Serialize::serialize(d, serializer),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::from_sheet(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from_sheet(value)
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Date-time layouts tried in order after RFC 3339 and RFC 2822.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
];

/// Date-only layouts; these produce midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parses a timestamp in any of the layouts we recognize. A timestamp with a UTC offset keeps its
/// local wall-clock time.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_from_sheet_numericises() {
        assert_eq!(CellValue::from_sheet("12.5"), CellValue::Number(Decimal::new(125, 1)));
        assert_eq!(CellValue::from_sheet(" 7 "), CellValue::Number(Decimal::new(7, 0)));
        assert_eq!(CellValue::from_sheet("1e3"), CellValue::Number(Decimal::new(1000, 0)));
    }

    #[test]
    fn test_from_sheet_keeps_text() {
        assert_eq!(CellValue::from_sheet("coffee"), CellValue::Text("coffee".into()));
        assert_eq!(CellValue::from_sheet("1,000"), CellValue::Text("1,000".into()));
        assert_eq!(CellValue::from_sheet("1_000"), CellValue::Text("1_000".into()));
        assert_eq!(CellValue::from_sheet(" "), CellValue::Text(" ".into()));
    }

    #[test]
    fn test_to_amount_plain() {
        assert_eq!(CellValue::from("-50").to_amount(), Some(Decimal::new(-50, 0)));
        assert_eq!(CellValue::Text("  12.25 ".into()).to_amount(), Some(Decimal::new(1225, 2)));
    }

    #[test]
    fn test_to_amount_currency_is_none() {
        for text in ["$1,000.00", "1,000", "-$5", "-$60,000.00", "5 USD"] {
            assert_eq!(CellValue::from(text).to_amount(), None, "{text}");
        }
    }

    #[test]
    fn test_to_amount_scientific_text() {
        assert_eq!(CellValue::Text(" 2.5e2 ".into()).to_amount(), Some(Decimal::new(250, 0)));
    }

    #[test]
    fn test_to_amount_unparseable_is_none() {
        assert_eq!(CellValue::Empty.to_amount(), None);
        assert_eq!(CellValue::from("n/a").to_amount(), None);
        assert_eq!(CellValue::from("--5").to_amount(), None);
        assert_eq!(CellValue::from("$").to_amount(), None);
    }

    #[test]
    fn test_to_timestamp_iso() {
        assert_eq!(
            CellValue::from("2024-01-05").to_timestamp(),
            Some(ts("2024-01-05 00:00:00"))
        );
        assert_eq!(
            CellValue::from("2024-01-05 13:45:10").to_timestamp(),
            Some(ts("2024-01-05 13:45:10"))
        );
        assert_eq!(
            CellValue::from("2024-01-05T13:45:10.250").to_timestamp(),
            Some(ts("2024-01-05 13:45:10") + chrono::Duration::milliseconds(250))
        );
    }

    #[test]
    fn test_to_timestamp_keeps_local_time_of_offset() {
        assert_eq!(
            CellValue::from("2024-01-05T23:30:00+05:00").to_timestamp(),
            Some(ts("2024-01-05 23:30:00"))
        );
    }

    #[test]
    fn test_to_timestamp_sheet_formats() {
        assert_eq!(
            CellValue::from("10/21/2025 9:15:30 AM").to_timestamp(),
            Some(ts("2025-10-21 09:15:30"))
        );
        assert_eq!(
            CellValue::from("10/1/2025").to_timestamp(),
            Some(ts("2025-10-01 00:00:00"))
        );
        assert_eq!(
            CellValue::from("Mar 3, 2024").to_timestamp(),
            Some(ts("2024-03-03 00:00:00"))
        );
        assert_eq!(
            CellValue::from_sheet("20240105").to_timestamp(),
            Some(ts("2024-01-05 00:00:00"))
        );
    }

    #[test]
    fn test_to_timestamp_unparseable() {
        assert_eq!(CellValue::from("not-a-date").to_timestamp(), None);
        assert_eq!(CellValue::Empty.to_timestamp(), None);
        assert_eq!(CellValue::from("2024-13-45").to_timestamp(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::from("-50").to_string(), "-50");
        assert_eq!(CellValue::from("coffee").text(), "coffee");
    }
}
