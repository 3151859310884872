//! Pulls transaction rows from a Google Sheet, normalizes them into a ledger and reports on them.
//!
//! The pipeline is: `SheetClient` loads a worksheet as a `SheetTable`, `infer_columns` works out
//! which headers hold the date, amount, type and message, `normalize` turns every row into a
//! `LedgerRow`, and the `aggregate` functions summarize the ledger for the dashboard.

pub mod aggregate;
mod api;
pub mod args;
mod client;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod model;
pub mod render;
pub mod report;
pub mod secrets;
mod utils;


pub use api::{sheet, Mode, Sheet, TestSheet};
pub use client::{SheetClient, DEFAULT_CACHE_TTL};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
