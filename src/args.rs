//! These structs provide the CLI interface for the expenses CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: A terminal dashboard for the transactions in a Google Sheet.
///
/// The program reads a worksheet of transactions with a Google service account, works out which
/// columns hold the date, amount, type and message, normalizes every row and then prints totals,
/// daily spending, monthly totals by type and a preview of the cleaned data. The cleaned data can
/// be saved as CSV.
///
/// Share the sheet with the service account's email address and run `expenses init` first.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration files.
    ///
    /// You need a JSON key for a Google service account, downloaded from the Google Cloud
    /// console, and the sheet must be shared with the service account's email address. The key is
    /// stored in $EXPENSES_HOME/.secrets/secrets.json.
    Init(InitArgs),
    /// List the worksheets of the spreadsheet.
    Worksheets(WorksheetsArgs),
    /// Load the worksheet once and print the dashboard.
    Report(ReportArgs),
    /// Print the dashboard and redraw it on every keypress.
    Watch(WatchArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and secrets are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to the downloaded service account JSON key.
    #[arg(long)]
    service_account: PathBuf,

    /// The URL of your Google sheet, or just its ID. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: Option<String>,

    /// The worksheet to read. Defaults to the first worksheet.
    #[arg(long)]
    worksheet: Option<String>,
}

impl InitArgs {
    pub fn new(
        service_account: impl Into<PathBuf>,
        sheet_url: Option<String>,
        worksheet: Option<String>,
    ) -> Self {
        Self {
            service_account: service_account.into(),
            sheet_url,
            worksheet,
        }
    }

    pub fn service_account(&self) -> &Path {
        &self.service_account
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }
}

/// Args for the `expenses worksheets` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct WorksheetsArgs {
    /// The sheet URL or ID. Defaults to the sheet_url in config.json.
    #[arg(long)]
    sheet: Option<String>,
}

impl WorksheetsArgs {
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }
}

/// Args for the `expenses report` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ReportArgs {
    #[clap(flatten)]
    view: ViewArgs,

    /// Also save the cleaned data as CSV to this path. If it is a directory the file is named
    /// transactions_cleaned.csv.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    pub fn sheet(&self) -> Option<&str> {
        self.view.sheet()
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.view.worksheet()
    }

    pub fn preview(&self) -> Option<usize> {
        self.view.preview()
    }

    pub fn csv(&self) -> Option<&Path> {
        self.csv.as_deref()
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.view.sheet = Some(sheet.into());
        self
    }

    pub fn with_worksheet(mut self, worksheet: impl Into<String>) -> Self {
        self.view.worksheet = Some(worksheet.into());
        self
    }

    pub fn with_preview(mut self, rows: usize) -> Self {
        self.view.preview = Some(rows);
        self
    }

    pub fn with_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv = Some(path.into());
        self
    }
}

/// Args for the `expenses watch` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct WatchArgs {
    #[clap(flatten)]
    view: ViewArgs,
}

impl WatchArgs {
    pub fn sheet(&self) -> Option<&str> {
        self.view.sheet()
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.view.worksheet()
    }

    pub fn preview(&self) -> Option<usize> {
        self.view.preview()
    }
}

/// Selects what the dashboard shows.
#[derive(Debug, Default, Parser, Clone)]
pub struct ViewArgs {
    /// The sheet URL or ID. Defaults to the sheet_url in config.json.
    #[arg(long)]
    sheet: Option<String>,

    /// The worksheet to read. Defaults to the configured worksheet, then the first worksheet.
    #[arg(long)]
    worksheet: Option<String>,

    /// How many rows of cleaned data to preview. Defaults to preview_rows in config.json.
    #[arg(long)]
    preview: Option<usize>,
}

impl ViewArgs {
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }

    pub fn preview(&self) -> Option<usize> {
        self.preview
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or EXPENSES_HOME instead of relying on the default \
                expenses home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let args = Args::try_parse_from([
            "expenses",
            "--home",
            "/tmp/x",
            "report",
            "--worksheet",
            "Card",
            "--preview",
            "5",
            "--csv",
            "out.csv",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/x"));
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        match args.command() {
            Command::Report(report) => {
                assert_eq!(report.worksheet(), Some("Card"));
                assert_eq!(report.sheet(), None);
                assert_eq!(report.preview(), Some(5));
                assert_eq!(report.csv(), Some(Path::new("out.csv")));
                assert!(report.json());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let args = Args::try_parse_from([
            "expenses",
            "--log-level",
            "debug",
            "--home",
            "h",
            "init",
            "--service-account",
            "key.json",
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/abc",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Init(init) => {
                assert_eq!(init.service_account(), Path::new("key.json"));
                assert_eq!(
                    init.sheet_url(),
                    Some("https://docs.google.com/spreadsheets/d/abc")
                );
                assert_eq!(init.worksheet(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_requires_service_account() {
        assert!(Args::try_parse_from(["expenses", "--home", "h", "init"]).is_err());
    }
}
