//! Access tokens for a Google service account.
//!
//! A service account signs a short-lived JWT with its private key and exchanges it at the key's
//! `token_uri` for an OAuth access token (the JWT bearer grant). Tokens last about an hour; we keep
//! the current one and only fetch a new one shortly before it expires.

use crate::api::OAUTH_SCOPES;
use crate::error::{ErrorType, IntoResult, Res};
use crate::secrets::{resolve_credentials, SecretStore, ServiceAccountKey};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// A token this close to expiring is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Hands out access tokens for the service account found in a secret store.
pub(super) struct TokenProvider {
    store: Box<dyn SecretStore>,
    http: reqwest::Client,
    current: Mutex<Option<AccessToken>>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

impl TokenProvider {
    pub(super) fn new(store: Box<dyn SecretStore>, http: reqwest::Client) -> Self {
        Self {
            store,
            http,
            current: Mutex::new(None),
        }
    }

    /// Returns a valid access token, fetching a new one if needed.
    ///
    /// # Errors
    /// - A configuration error if the credentials are missing or unusable.
    /// - An access error if the token endpoint cannot be reached or refuses the request.
    pub(super) async fn token(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let key = resolve_credentials(self.store.as_ref()).await?.service_account_key()?;
        let assertion = sign_assertion(&key, Utc::now())?;
        let token = self
            .exchange(&key, &assertion)
            .await
            .pub_result(ErrorType::Access)?;
        debug!(
            "Obtained an access token for {} valid until {}",
            key.client_email, token.expires_at
        );
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    async fn exchange(&self, key: &ServiceAccountKey, assertion: &str) -> Res<AccessToken> {
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
            .send()
            .await
            .with_context(|| format!("Failed to send the token request to {}", key.token_uri))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The token request failed with status {status}: {body}");
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .context("Failed to parse the token response")?;
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        })
    }
}

/// Builds and signs the JWT that is exchanged for an access token.
fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let iat = now.timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: OAUTH_SCOPES.join(" "),
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("The service account private_key is not a valid RSA key in PEM format")
        .pub_result(ErrorType::Configuration)?;
    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .context("Unable to sign the service account assertion")
        .pub_result(ErrorType::Configuration)
}
