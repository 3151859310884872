//! Access to spreadsheet data.
//!
//! The `Sheet` trait is the seam between the dashboard and the spreadsheet service. `GoogleSheet`
//! talks to the Google Sheets API as a service account; `TestSheet` serves in-memory data so that
//! the whole program can run top-to-bottom without touching Google.

mod google;
mod test_sheet;
mod token;

use crate::secrets::SecretsFile;
use crate::{Config, Result};
use std::sync::Arc;

pub use test_sheet::{book_from_csv, Book, TestSheet};

/// OAuth scopes requested for the service account. We only ever read.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// When this environment variable is set and non-empty, `Mode::from_env` selects `Mode::Test`.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// Selects the spreadsheet backend.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Use the Google Sheets API.
    #[default]
    Google,
    /// Use seeded in-memory data.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// A spreadsheet service: it can list the worksheets of a spreadsheet and return the cell values
/// of one worksheet.
///
/// Errors from credentials carry `ErrorType::Configuration`; everything that goes wrong while
/// talking to the service carries `ErrorType::Access`.
#[async_trait::async_trait]
pub trait Sheet: Send + Sync {
    /// Opens the spreadsheet and returns its worksheet titles in tab order.
    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    /// Returns every row of the worksheet titled `title`, the header row included.
    async fn worksheet_values(&self, spreadsheet_id: &str, title: &str)
        -> Result<Vec<Vec<String>>>;
}

/// Creates the `Sheet` for `mode`. Credentials are not read until the first request.
pub fn sheet(config: &Config, mode: Mode) -> Arc<dyn Sheet> {
    match mode {
        Mode::Google => Arc::new(google::GoogleSheet::new(SecretsFile::new(
            config.secrets_path(),
        ))),
        Mode::Test => Arc::new(TestSheet::seeded()),
    }
}
