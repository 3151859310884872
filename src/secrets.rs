//! Resolves the Google service-account credentials from the secret store.
//!
//! The secret store is a JSON object on disk, `$EXPENSES_HOME/.secrets/secrets.json`. The service
//! account lives under the `gcp_service_account` key, either as a JSON object or as a string that
//! holds the JSON. People paste that string in many ways, so we accept it wrapped in triple quotes
//! and with literal `\n` sequences where newlines should be.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// The key under which the service-account credentials are stored.
pub const SERVICE_ACCOUNT_KEY: &str = "gcp_service_account";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Anything that can look up a secret by key.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Res<Option<Value>>;
}

/// A secret store backed by a JSON object in a file. The file is read on every lookup so that
/// edits are picked up without a restart.
#[derive(Debug, Clone)]
pub struct SecretsFile {
    path: PathBuf,
}

impl SecretsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `secrets` to the file, readable only by the owner on Unix.
    pub(crate) async fn save(&self, secrets: &Map<String, Value>) -> Res<()> {
        let json = serde_json::to_string_pretty(secrets).context("Unable to serialize secrets")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }
}

#[async_trait]
impl SecretStore for SecretsFile {
    async fn get(&self, key: &str) -> Res<Option<Value>> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to check for secrets file at {}", self.path.display()))?;
        if !exists {
            return Ok(None);
        }
        let mut secrets: Map<String, Value> = utils::deserialize(&self.path).await?;
        Ok(secrets.remove(key))
    }
}

#[async_trait]
impl SecretStore for Map<String, Value> {
    async fn get(&self, key: &str) -> Res<Option<Value>> {
        Ok(Map::get(self, key).cloned())
    }
}

/// The service-account credentials exactly as they were stored.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CredentialDescription(Map<String, Value>);

impl CredentialDescription {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The fields needed to sign in as the service account.
    pub fn service_account_key(&self) -> Result<ServiceAccountKey> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .context("The service account credentials are missing required fields")
            .pub_result(ErrorType::Configuration)
    }
}

/// The parts of a Google service-account key file that we use.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Reads the service-account credentials from `store`.
///
/// # Errors
/// Returns a configuration error if the key is missing, the store cannot be read, or the stored
/// value cannot be understood as a JSON object.
pub async fn resolve_credentials(store: &dyn SecretStore) -> Result<CredentialDescription> {
    let raw = store
        .get(SERVICE_ACCOUNT_KEY)
        .await
        .context("Unable to read the secret store")
        .pub_result(ErrorType::Configuration)?
        .ok_or_else(|| anyhow!("{SERVICE_ACCOUNT_KEY} not found in secrets"))
        .pub_result(ErrorType::Configuration)?;

    let parsed = match raw {
        Value::Object(map) => return Ok(CredentialDescription(map)),
        Value::String(s) => parse_service_account(&s),
        other => parse_service_account(&other.to_string()),
    }
    .context("Unable to parse the service account credentials")
    .pub_result(ErrorType::Configuration)?;

    match parsed {
        Value::Object(map) => Ok(CredentialDescription(map)),
        _ => Err(anyhow!("The service account credentials must be a JSON object"))
            .pub_result(ErrorType::Configuration),
    }
}

/// Parses a service-account string, peeling off triple quotes and repairing escaped newlines.
fn parse_service_account(raw: &str) -> Res<Value> {
    let mut s = raw.trim();
    if let Some(inner) = strip_wrapper(s, "\"\"\"") {
        s = inner.trim();
    }
    if let Some(inner) = strip_wrapper(s, "'''") {
        s = inner.trim();
    }
    match serde_json::from_str(s) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::from_str(&s.replace("\\n", "\n"))?),
    }
}

fn strip_wrapper<'a>(s: &'a str, wrapper: &str) -> Option<&'a str> {
    s.strip_prefix(wrapper)?.strip_suffix(wrapper)
}
