//! HTTP surface for Court Index.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `GET /health` – Fixed liveness payload, independent of configuration.
//! - `POST /store-vector` – Decode an externally-embedded content record, validate and
//!   normalize it, and upsert it into the Pinecone index. Returns
//!   `{status, vector_id, embedding_length, metadata_fields}`.
//! - `GET|POST /process-airtable` – Pull the Airtable content table, embed each record via
//!   the configured provider, and drive the same normalize/upsert path per record. Returns
//!   aggregate counts (`processed_records`, `total_records`).
//! - `GET /metrics` – Observe ingestion counters.
//!
//! Validation failures map to HTTP 400 with a JSON `{error}` body; configuration and
//! store-side failures map to HTTP 500. The handlers never panic on caller input.

use crate::pipeline::{IngestApi, IngestError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/store-vector", post(store_vector::<S>))
        .route(
            "/process-airtable",
            get(process_airtable::<S>).post(process_airtable::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Liveness probe; succeeds regardless of configuration state.
async fn health() -> &'static str {
    "Healthy!"
}

/// Success response for the `POST /store-vector` endpoint.
#[derive(Serialize)]
struct StoreVectorResponse {
    /// Fixed `"success"` marker kept for webhook-tool compatibility.
    status: &'static str,
    /// Identifier the vector was stored under.
    vector_id: String,
    /// Length of the stored embedding.
    embedding_length: usize,
    /// Number of metadata fields persisted alongside the vector.
    metadata_fields: usize,
}

/// Store one externally-embedded content record.
///
/// The body is taken raw; callers send strict JSON, form-encoded fields, or
/// near-JSON text, and the extraction chain sorts out which one this is.
async fn store_vector<S>(
    State(service): State<Arc<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoreVectorResponse>, AppError>
where
    S: IngestApi,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    tracing::info!(
        content_type = content_type.unwrap_or("<none>"),
        bytes = body.len(),
        "Store-vector request received"
    );

    let receipt = service.store_vector(&body, content_type).await?;
    Ok(Json(StoreVectorResponse {
        status: "success",
        vector_id: receipt.vector_id,
        embedding_length: receipt.embedding_length,
        metadata_fields: receipt.metadata_fields,
    }))
}

/// Response body for the batch endpoint.
#[derive(Serialize)]
struct BatchResponse {
    processed_records: usize,
    total_records: usize,
}

/// Embed and store every record of the content table.
async fn process_airtable<S>(State(service): State<Arc<S>>) -> Result<Json<BatchResponse>, AppError>
where
    S: IngestApi,
{
    let outcome = service.process_content_table().await?;
    tracing::info!(
        processed = outcome.processed_records,
        total = outcome.total_records,
        "Batch request completed"
    );
    Ok(Json(BatchResponse {
        processed_records: outcome.processed_records,
        total_records: outcome.total_records,
    }))
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    vectors_stored: u64,
    batch_records_processed: u64,
}

/// Return a concise metrics snapshot with ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: IngestApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        vectors_stored: snapshot.vectors_stored,
        batch_records_processed: snapshot.batch_records_processed,
    })
}

struct AppError(IngestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_caller_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self(inner)
    }
}
