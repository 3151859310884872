//! Types that represent the data model, from raw worksheet cells to normalized ledger rows.
mod cell;
mod columns;
mod ledger;
mod table;

pub use cell::CellValue;
pub use columns::{infer_columns, ColumnMap};
pub use ledger::{normalize, LedgerRow, LedgerTable, CREDIT, DEBIT, UNKNOWN, UNPARSEABLE_MONTH};
pub use table::{RawRecord, SheetTable};
