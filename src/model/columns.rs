use serde::Serialize;
use std::collections::HashMap;

const DATE_CANDIDATES: &[&str] = &["datetime", "date"];
const AMOUNT_CANDIDATES: &[&str] = &["amount", "amt"];
const TYPE_CANDIDATES: &[&str] = &["type"];
const MESSAGE_CANDIDATES: &[&str] = &["message", "msg"];

/// Maps the four logical roles of a ledger to the actual headers found in a worksheet. A role that
/// could not be matched is `None`; that is not an error, the normalizer has fallbacks for it.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct ColumnMap {
    date: Option<String>,
    amount: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

impl ColumnMap {
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    /// The header of the transaction type column.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Works out which headers hold the date, amount, type and message of each transaction.
///
/// Matching is case-insensitive and only looks at header text. For each role the first candidate
/// found wins: `datetime` then `date`, `amount` then `amt`, `type`, and `message` then `msg`. If two
/// headers differ only by case, the later one is used.
///
/// ```
/// # use expense_tracker::model::infer_columns;
/// let columns = infer_columns(["Date", "DateTime", "AMT", "Notes"]);
/// assert_eq!(columns.date(), Some("DateTime"));
/// assert_eq!(columns.amount(), Some("AMT"));
/// assert_eq!(columns.kind(), None);
/// assert_eq!(columns.message(), None);
/// ```
pub fn infer_columns<S>(headers: impl IntoIterator<Item = S>) -> ColumnMap
where
    S: AsRef<str>,
{
    let lookup: HashMap<String, String> = headers
        .into_iter()
        .map(|h| (h.as_ref().to_lowercase(), h.as_ref().to_string()))
        .collect();

    let resolve = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|candidate| lookup.get(*candidate).cloned())
    };

    ColumnMap {
        date: resolve(DATE_CANDIDATES),
        amount: resolve(AMOUNT_CANDIDATES),
        kind: resolve(TYPE_CANDIDATES),
        message: resolve(MESSAGE_CANDIDATES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_all_roles() {
        let columns = infer_columns(["Date", "Amount", "Type", "Message"]);
        assert_eq!(columns.date(), Some("Date"));
        assert_eq!(columns.amount(), Some("Amount"));
        assert_eq!(columns.kind(), Some("Type"));
        assert_eq!(columns.message(), Some("Message"));
    }

    #[test]
    fn test_infer_date_any_casing() {
        for header in ["date", "DATE", "Date", "dAtE", "datetime", "DateTime", "DATETIME"] {
            let columns = infer_columns(["Other", header]);
            assert_eq!(columns.date(), Some(header), "{header}");
        }
    }

    #[test]
    fn test_infer_datetime_takes_precedence() {
        let columns = infer_columns(["date", "DATETIME"]);
        assert_eq!(columns.date(), Some("DATETIME"));
        let columns = infer_columns(["DateTime", "Date"]);
        assert_eq!(columns.date(), Some("DateTime"));
    }

    #[test]
    fn test_infer_short_names() {
        let columns = infer_columns(["When", "amt", "msg"]);
        assert_eq!(columns.date(), None);
        assert_eq!(columns.amount(), Some("amt"));
        assert_eq!(columns.message(), Some("msg"));
    }

    #[test]
    fn test_infer_last_seen_wins_on_collision() {
        let columns = infer_columns(["amount", "Amount"]);
        assert_eq!(columns.amount(), Some("Amount"));
    }

    #[test]
    fn test_infer_nothing() {
        let columns = infer_columns(["timestamp", "value"]);
        assert_eq!(columns, ColumnMap::default());
    }

    #[test]
    fn test_infer_does_not_trim() {
        let columns = infer_columns([" Amount"]);
        assert_eq!(columns.amount(), None);
    }
}
