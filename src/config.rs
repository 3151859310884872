//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and says which Google Sheet to
//! read, how long to keep fetched data, and where the service-account credentials are kept.

use crate::error::{ErrorType, IntoResult, Res};
use crate::secrets::{SecretsFile, SERVICE_ACCOUNT_KEY};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SECRETS_JSON: &str = "secrets.json";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_PREVIEW_ROWS: usize = 200;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the home directory and:
    /// - Creates an initial `config.json` using `sheet_url` and `worksheet` along with defaults.
    /// - Stores the contents of `service_account_file` in the secret store under
    ///   `gcp_service_account`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/expenses`
    /// - `service_account_file` - The JSON key downloaded for a Google service account. If it is
    ///   valid JSON it is stored as a JSON value, otherwise as a string.
    /// - `sheet_url` - The URL or ID of the Google Sheet holding the transactions.
    /// - `worksheet` - The worksheet to read. The first worksheet is used when absent.
    ///
    /// # Errors
    /// - A configuration error if `sheet_url` is not a Google Sheets URL or ID.
    /// - A filesystem error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        service_account_file: &Path,
        sheet_url: Option<&str>,
        worksheet: Option<&str>,
    ) -> Result<Self> {
        let sheet_url = sheet_url.map(str::trim).filter(|s| !s.is_empty());
        let spreadsheet_id = extract_spreadsheet_id(sheet_url.unwrap_or_default())
            .context("Failed to extract spreadsheet ID from sheet URL")
            .pub_result(ErrorType::Configuration)?
            .to_string();

        let maybe_relative = dir.into();
        let root = create_home(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")
            .pub_result(ErrorType::Filesystem)?;
        let secrets = root.join(SECRETS);

        let service_account = utils::read(service_account_file)
            .await
            .pub_result(ErrorType::Filesystem)?;
        let mut secret_map = Map::new();
        secret_map.insert(
            SERVICE_ACCOUNT_KEY.to_string(),
            serde_json::from_str(&service_account).unwrap_or(Value::String(service_account)),
        );
        SecretsFile::new(secrets.join(SECRETS_JSON))
            .save(&secret_map)
            .await
            .context("Unable to write the secret store")
            .pub_result(ErrorType::Filesystem)?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.map(str::to_string),
            worksheet: worksheet
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ..ConfigFile::default()
        };
        config_file
            .save(&config_path)
            .await
            .pub_result(ErrorType::Filesystem)?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that `expenses_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    ///
    /// # Errors
    /// Every failure is a configuration error.
    pub async fn load(expenses_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(expenses_home.into())
            .await
            .pub_result(ErrorType::Configuration)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing, run `expenses init` first")?;
        let _ = utils::read_dir(&root)
            .await
            .context("Expenses home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id =
            extract_spreadsheet_id(config_file.sheet_url.as_deref().unwrap_or_default())
                .context("Failed to extract spreadsheet ID from sheet URL")?
                .to_string();

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        self.config_file.sheet_url.as_deref().unwrap_or_default()
    }

    /// The configured spreadsheet ID, empty when none is configured.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The spreadsheet ID to use: taken from `sheet` when given, otherwise the configured one.
    ///
    /// # Errors
    /// A configuration error if `sheet` is neither a Google Sheets URL nor an ID.
    pub fn resolve_spreadsheet_id(&self, sheet: Option<&str>) -> Result<String> {
        match sheet {
            Some(sheet) => Ok(extract_spreadsheet_id(sheet.trim())
                .pub_result(ErrorType::Configuration)?
                .to_string()),
            None => Ok(self.spreadsheet_id.clone()),
        }
    }

    /// The configured worksheet, if any.
    pub fn worksheet(&self) -> Option<&str> {
        self.config_file.worksheet.as_deref()
    }

    /// How long fetched sheet data is reused.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config_file.cache_ttl_secs)
    }

    /// How many rows of the cleaned data to preview.
    pub fn preview_rows(&self) -> usize {
        self.config_file.preview_rows
    }

    /// Returns the stored `secrets_path` if it is absolute, otherwise resolves the relative path.
    pub fn secrets_path(&self) -> PathBuf {
        let p = self.config_file.secrets_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

async fn create_home(maybe_relative: &Path) -> Res<PathBuf> {
    utils::make_dir(maybe_relative).await?;
    let root = utils::canonicalize(maybe_relative).await?;
    utils::make_dir(&root.join(SECRETS)).await?;
    Ok(root)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "worksheet": "Transactions",
///   "cache_ttl_secs": 60,
///   "preview_rows": 200,
///   "secrets_path": ".secrets/secrets.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL or ID of the Google Sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sheet_url: Option<String>,

    /// The worksheet to read; the first worksheet when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worksheet: Option<String>,

    /// Seconds that fetched sheet data is reused
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,

    /// Rows of cleaned data shown in the preview
    #[serde(default = "default_preview_rows")]
    preview_rows: usize,

    /// Path to the secret store (optional, relative to the home directory or absolute)
    /// Defaults to $EXPENSES_HOME/.secrets/secrets.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secrets_path: Option<PathBuf>,
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: None,
            worksheet: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            secrets_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another app.
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the secret store path. If None, defaults to .secrets/secrets.json
    fn secrets_path(&self) -> PathBuf {
        self.secrets_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SECRETS_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL. Anything without a `/` is taken to be an ID
/// already.
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
///
/// # Returns
/// The spreadsheet ID or an error if the URL format is invalid. Returns an empty string if the URL
/// is empty.
pub(crate) fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    if url.is_empty() || !url.contains('/') {
        return Ok(url);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            if !id.is_empty() {
                return Ok(id);
            }
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}
