/// Hosted table store client (PostgREST / Supabase REST dialect)
///
/// Reads and writes the gauge table through the store's auto-generated REST
/// endpoint. Authentication is the project's anon key, sent both as the
/// `apikey` header and as a bearer token.
///
/// Endpoint shape: `{base}/rest/v1/{table}`
///   - select: `GET  ?select=*&order=created_at.asc`
///   - insert: `POST` with `Prefer: return=representation`

use super::GaugeStore;
use crate::logging::{self, Component};
use crate::model::{GaugeRecord, NewGauge, StoreError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

const REST_PREFIX: &str = "rest/v1";

pub struct RestGaugeStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestGaugeStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url, api_key, table))
    }

    /// Uses a caller-built HTTP client (custom proxy or TLS settings).
    pub fn with_client(client: Client, base_url: &str, api_key: &str, table: &str) -> Self {
        RestGaugeStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        }
    }

    pub fn table_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, REST_PREFIX, self.table)
    }

    pub fn select_url(&self) -> String {
        format!("{}?select=*&order=created_at.asc", self.table_url())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    /// Turns a non-2xx response into `HttpError`, keeping the store's message.
    fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::HttpError(status.as_u16(), error_message(&body)))
    }

    fn read_body(response: Response) -> Result<String, StoreError> {
        response
            .text()
            .map_err(|e| StoreError::Transport(e.to_string()))
    }
}

/// Decodes a select response row by row.
///
/// The body must be a JSON array. A row that does not decode is logged and
/// left out; the remaining rows are still returned.
pub fn decode_rows(body: &str) -> Result<Vec<GaugeRecord>, StoreError> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| StoreError::ParseError(e.to_string()))?;

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<GaugeRecord>(row) {
            Ok(record) => records.push(record),
            Err(e) => logging::log_store_failure(
                "decode row",
                &StoreError::ParseError(format!("row {} skipped: {}", index, e)),
            ),
        }
    }
    Ok(records)
}

/// Extracts `message` from a PostgREST error body, or returns the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

impl GaugeStore for RestGaugeStore {
    fn select_all(&self) -> Result<Vec<GaugeRecord>, StoreError> {
        let url = self.select_url();
        logging::debug(Component::Store, Some(&self.table), &format!("GET {}", url));

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        decode_rows(&Self::read_body(Self::check(response)?)?)
    }

    fn insert(&self, gauge: &NewGauge) -> Result<GaugeRecord, StoreError> {
        let url = self.table_url();
        logging::debug(Component::Store, Some(&self.table), &format!("POST {}", url));

        let response = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&[gauge])
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let body = Self::read_body(Self::check(response)?)?;
        serde_json::from_str::<Vec<GaugeRecord>>(&body)
            .map_err(|e| StoreError::ParseError(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("store returned no inserted row".to_string()))
    }

    fn describe(&self) -> String {
        format!("rest {}", self.table_url())
    }
}
