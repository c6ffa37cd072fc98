//! HTTP client for the Airtable content table.
//!
//! The batch endpoint treats one Airtable table as its payload source; this
//! client fetches every record in the table, following `offset` pagination to
//! exhaustion. Interpreting the record fields is left to the pipeline.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// Errors returned while interacting with Airtable.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Airtable responded with an unexpected status code.
    #[error("Unexpected Airtable response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by Airtable.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// One row of the content table.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    /// Airtable record identifier, used as a fallback `content_id`.
    pub id: String,
    /// Raw field mapping exactly as stored in the table.
    pub fields: Map<String, Value>,
}

/// Lightweight HTTP client for one Airtable table.
pub struct AirtableClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) base_id: String,
    pub(crate) table_name: String,
}

#[derive(Deserialize)]
struct ListRecordsResponse {
    records: Vec<RecordEnvelope>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Deserialize)]
struct RecordEnvelope {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl AirtableClient {
    /// Construct a client for the given base and table.
    pub fn new(api_key: String, base_id: String, table_name: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: AIRTABLE_API_URL.to_string(),
            base_id,
            table_name,
        }
    }

    /// Fetch every record in the table, following pagination to exhaustion.
    pub async fn fetch_all_records(&self) -> Result<Vec<ContentRecord>, AirtableError> {
        let url = format!("{}/{}/{}", self.base_url, self.base_id, self.table_name);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.api_key);
            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = AirtableError::UnexpectedStatus { status, body };
                tracing::error!(table = %self.table_name, error = %error, "Failed to list content records");
                return Err(error);
            }

            let page: ListRecordsResponse = response.json().await?;
            records.extend(page.records.into_iter().map(|envelope| ContentRecord {
                id: envelope.id,
                fields: envelope.fields,
            }));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(table = %self.table_name, records = records.len(), "Content table fetched");
        Ok(records)
    }
}
