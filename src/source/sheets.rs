//! Google Sheets values API backend.

use super::grid::{Grid, GridBackend, column_letter};
use crate::chat::{Attempt, RetryPolicy, Sleeper, TokioSleeper};
use crate::config::SourceConfig;
use crate::error::{SyncError, SyncResultOf};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Reads one sheet tab in full and writes single cells with `RAW` input.
#[derive(Clone)]
pub struct SheetsBackend {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for SheetsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsBackend")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .finish_non_exhaustive()
    }
}

impl SheetsBackend {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            access_token: access_token.into(),
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Build from source config; fails when the spreadsheet id or token is missing.
    pub fn from_config(config: &SourceConfig) -> SyncResultOf<Self> {
        let spreadsheet_id = config
            .spreadsheet_id
            .clone()
            .ok_or_else(|| SyncError::config("SPREADSHEET_ID"))?;
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| SyncError::config("GOOGLE_ACCESS_TOKEN"))?;
        Ok(Self::new(
            config.sheets_api_base_url.clone(),
            spreadsheet_id,
            config.sheet_name.clone(),
            access_token,
        ))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the wait between rate-limit retries.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// A1 reference for one cell; `grid_row` is 0-based with the header at 0.
    fn cell_range(&self, grid_row: usize, column: usize) -> String {
        format!(
            "'{}'!{}{}",
            self.sheet_name.replace('\'', "''"),
            column_letter(column),
            grid_row + 1
        )
    }

    /// Send with rate-limit retries and return the response body.
    async fn send<F>(&self, action: &str, build: F) -> SyncResultOf<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let label = format!("sheets {}", action);
        self.retry
            .run(self.sleeper.as_ref(), &label, || {
                send_once(build().bearer_auth(&self.access_token), action)
            })
            .await
    }
}

async fn send_once(request: RequestBuilder, action: &str) -> Attempt<String> {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return Attempt::Fatal(e.into()),
    };

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Attempt::Retryable;
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return Attempt::Fatal(e.into()),
    };
    if !status.is_success() {
        return Attempt::Fatal(SyncError::data_source(format!(
            "sheets {} failed: {} {}",
            action,
            status.as_u16(),
            body
        )));
    }
    Attempt::Success(body)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl GridBackend for SheetsBackend {
    async fn load_grid(&self) -> SyncResultOf<Grid> {
        let url = self.values_url(&self.sheet_name);
        let body = self
            .send("read", || {
                self.client
                    .get(&url)
                    .query(&[("majorDimension", "ROWS")])
            })
            .await?;
        let range: ValueRange = serde_json::from_str(&body)?;

        let table = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(Grid::from_table(table))
    }

    async fn write_cell(&self, grid_row: usize, column: usize, value: &str) -> SyncResultOf<()> {
        let range = self.cell_range(grid_row, column);
        let url = self.values_url(&range);
        debug!(range = %range, "Writing sheet cell");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        self.send("write", || {
            self.client
                .put(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body)
        })
        .await?;
        Ok(())
    }
}
