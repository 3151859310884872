//! Implements the `Sheet` trait against the Google Sheets API, signed in as a service account.

use crate::api::token::TokenProvider;
use crate::api::Sheet;
use crate::error::{ErrorType, IntoResult, Res};
use crate::secrets::SecretsFile;
use crate::Result;
use anyhow::{bail, Context};
use serde::Deserialize;
use sheets::types::{DateTimeRenderOption, Dimension, ValueRenderOption};
use sheets::ClientError;
use tracing::trace;
use url::Url;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Reads worksheets with the `sheets::Client`. Worksheet titles come from the spreadsheet metadata
/// endpoint, which we call directly so that only the titles are transferred.
pub(super) struct GoogleSheet {
    http: reqwest::Client,
    token_provider: TokenProvider,
}

impl GoogleSheet {
    pub(super) fn new(secrets: SecretsFile) -> Self {
        let http = reqwest::Client::new();
        Self {
            token_provider: TokenProvider::new(Box::new(secrets), http.clone()),
            http,
        }
    }

    /// Creates a `sheets::Client` carrying a current access token.
    async fn client(&self) -> Result<sheets::Client> {
        let access_token = self.token_provider.token().await?;
        // The client id, secret, redirect uri and refresh token are only used by the crate's own
        // OAuth flow, which we do not use.
        Ok(sheets::Client::new(
            String::new(),
            String::new(),
            String::new(),
            access_token,
            String::new(),
        ))
    }

    async fn fetch_titles(&self, access_token: &str, spreadsheet_id: &str) -> Res<Vec<String>> {
        let url = metadata_url(spreadsheet_id)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to send the spreadsheet request to the Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google Sheets API request failed with status {status}: {body}");
        }

        let metadata: SpreadsheetMetadata = response
            .json()
            .await
            .context("Failed to parse the Google Sheets API response")?;
        let mut sheets = metadata.sheets;
        sheets.sort_by_key(|s| s.properties.index);
        Ok(sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        trace!("worksheet_titles for {spreadsheet_id}");
        let access_token = self.token_provider.token().await?;
        self.fetch_titles(&access_token, spreadsheet_id)
            .await
            .with_context(|| format!("Unable to open spreadsheet {spreadsheet_id}"))
            .pub_result(ErrorType::Access)
    }

    async fn worksheet_values(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Vec<Vec<String>>> {
        trace!("worksheet_values for {spreadsheet_id} {title}");
        let client = self.client().await?;
        let response = client
            .spreadsheets()
            .values_get(
                spreadsheet_id,
                &worksheet_range(title),
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch worksheet '{title}'"))
            .pub_result(ErrorType::Access)?;
        Ok(response.body.values)
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<WorksheetEntry>,
}

#[derive(Debug, Deserialize)]
struct WorksheetEntry {
    properties: WorksheetProperties,
}

#[derive(Debug, Deserialize)]
struct WorksheetProperties {
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: i64,
}

fn metadata_url(spreadsheet_id: &str) -> Res<Url> {
    let mut url = Url::parse(SHEETS_API).context("Invalid Google Sheets API url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Google Sheets API url cannot have path segments"))?
        .push(spreadsheet_id);
    url.query_pairs_mut()
        .append_pair("fields", "sheets.properties(title,index)");
    Ok(url)
}

/// An A1 range naming a whole worksheet. Single quotes inside the title are doubled.
fn worksheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worksheet_range_quotes_title() {
        assert_eq!(worksheet_range("Transactions"), "'Transactions'");
        assert_eq!(worksheet_range("Bob's Sheet"), "'Bob''s Sheet'");
    }

    #[test]
    fn test_metadata_url() {
        let url = metadata_url("abc-123_XYZ").unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/abc-123_XYZ");
        assert_eq!(
            url.query_pairs()
                .find(|(k, _)| k == "fields")
                .map(|(_, v)| v.to_string()),
            Some("sheets.properties(title,index)".to_string())
        );
    }

    #[test]
    fn test_metadata_sorted_by_index() {
        let metadata: SpreadsheetMetadata = serde_json::from_str(
            r#"{"sheets":[
                {"properties":{"title":"Second","index":1}},
                {"properties":{"title":"First","index":0}}
            ]}"#,
        )
        .unwrap();
        let mut sheets = metadata.sheets;
        sheets.sort_by_key(|s| s.properties.index);
        let titles: Vec<_> = sheets.into_iter().map(|s| s.properties.title).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_missing_secrets_is_configuration_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let sheet = GoogleSheet::new(SecretsFile::new(dir.path().join("secrets.json")));
        let err = sheet.worksheet_titles("abc").await.unwrap_err();
        assert!(err.is_configuration());
        let err = sheet.worksheet_values("abc", "Sheet1").await.unwrap_err();
        assert!(err.is_configuration());
    }
}
