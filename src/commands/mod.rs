//! Command handlers for the expenses CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod init;
mod report;
mod watch;
mod worksheets;

use crate::api::Mode;
use crate::client::SheetClient;
use crate::Config;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

pub use init::init;
pub use report::report;
pub use watch::watch;
pub use worksheets::worksheets;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to stdout and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        if !self.message.is_empty() {
            println!("{}", self.message);
        }
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }

    /// Print the structured data as JSON to stdout, falling back to the message when there is none.
    pub fn print_json(&self) {
        match self
            .structure()
            .and_then(|s| serde_json::to_string_pretty(s).ok())
        {
            Some(json) => println!("{json}"),
            None => self.print(),
        }
    }
}

/// Creates the cached sheet client for `config`.
fn sheet_client(config: &Config, mode: Mode) -> SheetClient {
    debug!("Using the {mode:?} sheet backend");
    SheetClient::new(crate::api::sheet(config, mode), config.cache_ttl())
}
