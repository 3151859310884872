//! The `SheetClient` reads worksheets through a `Sheet` backend and remembers the results for a
//! short time.
//!
//! Both operations are memoized in `moka` caches with a time-to-live. Callers asking for the same
//! key at the same time share one fetch. Failures are not cached. A load that could not open the
//! spreadsheet is cached like any other result, notice included, until it expires or `refresh` is
//! called.

use crate::api::Sheet;
use crate::model::SheetTable;
use crate::Result;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// The default time-to-live of cached sheet data.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

const MAX_ENTRIES: u64 = 64;

type LoadKey = (String, Option<String>);

pub struct SheetClient {
    sheet: Arc<dyn Sheet>,
    titles: Cache<String, Arc<Vec<String>>>,
    tables: Cache<LoadKey, Arc<SheetTable>>,
}

impl SheetClient {
    pub fn new(sheet: Arc<dyn Sheet>, ttl: Duration) -> Self {
        Self {
            sheet,
            titles: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(MAX_ENTRIES)
                .build(),
            tables: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(MAX_ENTRIES)
                .build(),
        }
    }

    /// Returns the worksheet titles of the spreadsheet in tab order. An empty `sheet_id` yields an
    /// empty list without contacting the backend.
    ///
    /// # Errors
    /// Any error from the backend is returned, credential problems included.
    pub async fn list_worksheets(&self, sheet_id: &str) -> Result<Arc<Vec<String>>> {
        if sheet_id.is_empty() {
            return Ok(Arc::default());
        }
        cached_titles(&self.titles, self.sheet.clone(), sheet_id).await
    }

    /// Loads one worksheet as a `SheetTable`. An empty `sheet_id` yields an empty table without
    /// contacting the backend.
    ///
    /// The named worksheet is used when it exists, otherwise the first one. If the spreadsheet
    /// cannot be opened or the worksheet cannot be read, the error is logged and an empty table
    /// carrying a notice is returned.
    ///
    /// # Errors
    /// Only configuration errors (unusable credentials) are returned.
    pub async fn load_worksheet(
        &self,
        sheet_id: &str,
        worksheet: Option<&str>,
    ) -> Result<Arc<SheetTable>> {
        if sheet_id.is_empty() {
            return Ok(Arc::default());
        }
        let sheet = self.sheet.clone();
        let titles = self.titles.clone();
        let key = (sheet_id.to_string(), worksheet.map(str::to_string));
        let (id, name) = key.clone();
        self.tables
            .try_get_with(key, async move {
                fetch_table(sheet, &titles, &id, name.as_deref())
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Forgets everything cached so that the next call fetches fresh data.
    pub fn refresh(&self) {
        debug!("Invalidating cached sheet data");
        self.titles.invalidate_all();
        self.tables.invalidate_all();
    }
}

async fn cached_titles(
    titles: &Cache<String, Arc<Vec<String>>>,
    sheet: Arc<dyn Sheet>,
    id: &str,
) -> Result<Arc<Vec<String>>> {
    let owned_id = id.to_string();
    titles
        .try_get_with(id.to_string(), async move {
            debug!("Listing worksheets of {owned_id}");
            sheet.worksheet_titles(&owned_id).await.map(Arc::new)
        })
        .await
        .map_err(|e| (*e).clone())
}

/// Opening the spreadsheet goes through the titles cache, so a load right after a listing does not
/// list the worksheets again.
async fn fetch_table(
    sheet: Arc<dyn Sheet>,
    titles: &Cache<String, Arc<Vec<String>>>,
    id: &str,
    worksheet: Option<&str>,
) -> Result<SheetTable> {
    let titles = match cached_titles(titles, sheet.clone(), id).await {
        Ok(titles) => titles,
        Err(e) if e.is_configuration() => return Err(e),
        Err(e) => {
            error!("Unable to open sheet {id}: {e}");
            return Ok(SheetTable::unavailable(format!("Unable to open sheet: {e}")));
        }
    };

    let title = match worksheet.filter(|name| titles.iter().any(|t| t == name)) {
        Some(name) => name,
        None => match titles.first() {
            Some(first) => first.as_str(),
            None => return Ok(SheetTable::default()),
        },
    };

    debug!("Reading worksheet '{title}' of {id}");
    match sheet.worksheet_values(id, title).await {
        Ok(values) => Ok(SheetTable::from_values(values)),
        Err(e) if e.is_configuration() => Err(e),
        Err(e) => {
            error!("Unable to read worksheet '{title}' of {id}: {e}");
            Ok(SheetTable::unavailable(format!("Unable to open sheet: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{book_from_csv, TestSheet};
    use crate::error::{Error, ErrorType};
    use std::collections::HashMap;
    use std::time::Duration;

    const ID: &str = "sheet-1";

    fn test_sheet() -> Arc<TestSheet> {
        let book = book_from_csv(&[
            ("First", "Date,Amount\n2024-01-01,5\n"),
            ("Second", "DateTime,Amt,Type\n2024-02-01 10:00:00,7,credit\n"),
        ])
        .unwrap();
        Arc::new(TestSheet::new(HashMap::from([(ID.to_string(), book)])))
    }

    fn client(sheet: &Arc<TestSheet>) -> SheetClient {
        SheetClient::new(sheet.clone(), DEFAULT_CACHE_TTL)
    }

    #[tokio::test]
    async fn test_empty_id_makes_no_backend_calls() {
        let sheet = test_sheet();
        let client = client(&sheet);
        assert!(client.list_worksheets("").await.unwrap().is_empty());
        let table = client.load_worksheet("", Some("First")).await.unwrap();
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
        assert_eq!(table.notice(), None);
        assert_eq!(sheet.title_calls(), 0);
        assert_eq!(sheet.value_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_worksheets_is_cached() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let titles = client.list_worksheets(ID).await.unwrap();
        assert_eq!(*titles, vec!["First", "Second"]);
        client.list_worksheets(ID).await.unwrap();
        assert_eq!(sheet.title_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_worksheets_propagates_errors() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let err = client.list_worksheets("missing").await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Access);
    }

    #[tokio::test]
    async fn test_load_named_worksheet() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let table = client.load_worksheet(ID, Some("Second")).await.unwrap();
        assert_eq!(table.headers(), ["DateTime", "Amt", "Type"]);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_worksheet_falls_back_to_first() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let table = client.load_worksheet(ID, Some("Nope")).await.unwrap();
        assert_eq!(table.headers(), ["Date", "Amount"]);
        let table = client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(table.headers(), ["Date", "Amount"]);
    }

    #[tokio::test]
    async fn test_load_is_cached_until_refresh() {
        let sheet = test_sheet();
        let client = client(&sheet);
        client.load_worksheet(ID, None).await.unwrap();
        client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(sheet.value_calls(), 1);

        client.refresh();
        client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(sheet.value_calls(), 2);
    }

    #[tokio::test]
    async fn test_load_expires_after_ttl() {
        let sheet = test_sheet();
        let client = SheetClient::new(sheet.clone(), Duration::from_millis(200));
        client.load_worksheet(ID, None).await.unwrap();
        client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(sheet.value_calls(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(sheet.value_calls(), 2);
        assert_eq!(sheet.title_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let (a, b) = tokio::join!(
            client.load_worksheet(ID, Some("Second")),
            client.load_worksheet(ID, Some("Second"))
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(sheet.value_calls(), 1);
        assert_eq!(sheet.title_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_after_listing_reuses_titles() {
        let sheet = test_sheet();
        let client = client(&sheet);
        client.list_worksheets(ID).await.unwrap();
        client.load_worksheet(ID, Some("Second")).await.unwrap();
        client.load_worksheet(ID, None).await.unwrap();
        assert_eq!(sheet.title_calls(), 1);
        assert_eq!(sheet.value_calls(), 2);
    }

    #[tokio::test]
    async fn test_open_failure_becomes_notice() {
        let sheet = test_sheet();
        let client = client(&sheet);
        let table = client.load_worksheet("missing", None).await.unwrap();
        assert!(table.is_empty());
        let notice = table.notice().unwrap();
        assert!(notice.starts_with("Unable to open sheet: "), "{notice}");
        assert!(notice.contains("missing"), "{notice}");
    }

    #[tokio::test]
    async fn test_empty_spreadsheet_gives_empty_table() {
        let sheet = Arc::new(TestSheet::new(HashMap::from([(ID.to_string(), Vec::new())])));
        let client = client(&sheet);
        let table = client.load_worksheet(ID, None).await.unwrap();
        assert!(table.is_empty());
        assert_eq!(table.notice(), None);
        assert_eq!(sheet.value_calls(), 0);
    }

    struct Unconfigured;

    #[async_trait::async_trait]
    impl Sheet for Unconfigured {
        async fn worksheet_titles(&self, _: &str) -> Result<Vec<String>> {
            Err(Error::new(
                ErrorType::Configuration,
                anyhow::anyhow!("gcp_service_account not found in secrets"),
            ))
        }

        async fn worksheet_values(&self, _: &str, _: &str) -> Result<Vec<Vec<String>>> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_configuration_error_propagates() {
        let client = SheetClient::new(Arc::new(Unconfigured), DEFAULT_CACHE_TTL);
        let err = client.load_worksheet(ID, None).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
