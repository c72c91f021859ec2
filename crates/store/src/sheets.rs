//! REST client for the Google Sheets v4 values API.
//!
//! Implements [`TabularStore`] against one worksheet using three calls:
//!
//! ```text
//! GET  /v4/spreadsheets/{key}/values/{ws}!A2:E                   read_rows
//! PUT  /v4/spreadsheets/{key}/values/{ws}!B{n}:E{n}              update_row
//! POST /v4/spreadsheets/{key}/values/{ws}!A:E:append             append_row
//! ```
//!
//! Writes use `valueInputOption=RAW` so identifiers and timestamps are
//! stored verbatim instead of being reinterpreted as numbers or dates.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::SheetsConfig;
use crate::credentials::TokenProvider;
use crate::error::StoreError;
use crate::table::{Row, RowValues, TabularStore};

/// Sheet row holding the first data row (row 1 is the header).
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Omitted by the API when the range is empty.
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [Vec<String>; 1],
}

/// Quote a worksheet name for A1 notation (`'It''s'!A1`).
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// [`TabularStore`] backed by a Google Sheets worksheet.
pub struct SheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
    tokens: TokenProvider,
}

impl SheetsClient {
    /// Create a client. No network traffic happens until the first call;
    /// missing credentials surface then, as an unreachable store.
    pub fn new(config: SheetsConfig) -> Self {
        let client = reqwest::Client::new();
        Self::with_client(client, config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: SheetsConfig) -> Self {
        let tokens = TokenProvider::new(client.clone(), config.clone());
        Self {
            client,
            config,
            tokens,
        }
    }

    fn range(&self, cells: &str) -> String {
        format!("{}!{cells}", quote_sheet_name(&self.config.worksheet))
    }

    /// `{api_url}/v4/spreadsheets/{key}/values/{range}{suffix}` with the
    /// range percent-encoded as a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| StoreError::Unreachable(format!("invalid SHEETS_API_URL: {e}")))?;
        let last = format!("{range}{suffix}");
        url.path_segments_mut()
            .map_err(|()| StoreError::Unreachable("SHEETS_API_URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_key.as_str(),
                "values",
                last.as_str(),
            ]);
        Ok(url)
    }

    async fn write_values(
        &self,
        method: reqwest::Method,
        url: Url,
        range: &str,
        cells: Vec<String>,
        query: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: [cells],
        };
        let response = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .query(query)
            .json(&body)
            .send()
            .await?;
        self.ensure_success(response).await?;
        Ok(())
    }

    /// Map non-2xx responses to errors. 401/403 also drop the cached token
    /// so the next call re-authenticates.
    async fn ensure_success(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.tokens.invalidate().await;
            return Err(StoreError::Auth(format!(
                "Sheets API returned {status}: {body}"
            )));
        }
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn read_rows(&self) -> Result<Vec<Row>, StoreError> {
        let token = self.tokens.access_token().await?;
        let url = self.values_url(&self.range("A2:E"), "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await?;
        let range: ValueRange = self.ensure_success(response).await?.json().await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_row(&self, index: usize, values: &RowValues) -> Result<(), StoreError> {
        let sheet_row = index + FIRST_DATA_ROW;
        let range = self.range(&format!("B{sheet_row}:E{sheet_row}"));
        let url = self.values_url(&range, "")?;
        self.write_values(
            reqwest::Method::PUT,
            url,
            &range,
            values.to_cells(),
            &[("valueInputOption", "RAW")],
        )
        .await
    }

    async fn append_row(&self, id: &str, values: &RowValues) -> Result<(), StoreError> {
        let range = self.range("A:E");
        let url = self.values_url(&range, ":append")?;
        self.write_values(
            reqwest::Method::POST,
            url,
            &range,
            values.to_row(id),
            &[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")],
        )
        .await
    }
}
