//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::Sheet;
use crate::error::{ErrorType, IntoResult, Res};
use crate::Result;
use anyhow::anyhow;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The worksheets of one spreadsheet, in tab order.
pub type Book = Vec<(String, Vec<Vec<String>>)>;

/// An implementation of the `Sheet` trait that does not use Google sheets. It holds spreadsheets in
/// memory and counts the calls made to it.
#[derive(Debug, Default)]
pub struct TestSheet {
    books: HashMap<String, Book>,
    /// Served for any spreadsheet id that is not in `books`.
    fallback: Option<Book>,
    title_calls: AtomicUsize,
    value_calls: AtomicUsize,
}

impl TestSheet {
    /// Create a `TestSheet` holding `books`, keyed by spreadsheet id. Any other id fails to open.
    pub fn new(books: HashMap<String, Book>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    /// Create a `TestSheet` that serves the seed data for every spreadsheet id.
    pub fn seeded() -> Self {
        Self {
            fallback: Some(seed_book()),
            ..Self::default()
        }
    }

    /// How many times `worksheet_titles` has been called.
    pub fn title_calls(&self) -> usize {
        self.title_calls.load(Ordering::SeqCst)
    }

    /// How many times `worksheet_values` has been called.
    pub fn value_calls(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
    }

    fn book(&self, spreadsheet_id: &str) -> Result<&Book> {
        self.books
            .get(spreadsheet_id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| anyhow!("Spreadsheet '{spreadsheet_id}' not found"))
            .pub_result(ErrorType::Access)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .book(spreadsheet_id)?
            .iter()
            .map(|(title, _)| title.clone())
            .collect())
    }

    async fn worksheet_values(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Vec<Vec<String>>> {
        self.value_calls.fetch_add(1, Ordering::SeqCst);
        self.book(spreadsheet_id)?
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| anyhow!("Worksheet '{title}' not found"))
            .pub_result(ErrorType::Access)
    }
}

/// Builds a book from (title, CSV data) pairs.
pub fn book_from_csv(worksheets: &[(&str, &str)]) -> Res<Book> {
    worksheets
        .iter()
        .map(|(title, data)| Ok((title.to_string(), load_csv(data)?)))
        .collect()
}

/// The seed spreadsheet: a typed ledger first, then a sheet without a type column.
fn seed_book() -> Book {
    // The seed data is constant and covered by tests, so it always parses.
    book_from_csv(&[(TRANSACTIONS, TRANSACTION_DATA), (CARD, CARD_DATA)]).unwrap_or_default()
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

const TRANSACTIONS: &str = "Transactions";
const CARD: &str = "Card";

/// Seed transactions with a type column.
const TRANSACTION_DATA: &str = r##"DateTime,Amount,Type,Message
2025-10-01 06:00:00,45.88,debit,City Water District
2025-10-01 09:30:00,3250.00,credit,Payroll
2025-10-02 18:40:11,9.75,debit,In-N-Out Burger
2025-10-03 16:55:22,61.45,debit,Shell Station #4521
2025-10-04 08:12:05,5.95,debit,Starbucks #1923
2025-10-05 14:30:18,118.56,debit,Costco Wholesale
2025-10-06 06:00:00,75.00,debit,AT&T Wireless
2025-10-07 19:25:33,42.30,debit,Olive Garden
2025-10-10 12:00:00,500.00,transfer,To savings
2025-10-15 09:30:00,3250.00,credit,Payroll
2025-11-01 06:00:00,47.12,debit,City Water District
2025-11-02 10:05:44,8.50,debit,Blue Bottle Coffee
2025-11-03 15:42:15,95.82,debit,Safeway #1534
2025-11-04 17:20:00,24.00,refund,Returned cable
not a date,12.00,debit,Unknown merchant
"##;

/// Seed card statement without a type column; the sign of the amount tells debit from credit.
const CARD_DATA: &str = r##"Date,Amt,msg
10/20/2025,-87.43,Whole Foods Market
10/19/2025,-6.75,Starbucks #2847
10/18/2025,-52.30,Shell Gas Station
10/17/2025,14.85,Chipotle refund
10/16/2025,-142.67,PG&E Electric
"##;
