//! Core data types and error definitions for the ingestion pipeline.

use crate::{
    airtable::AirtableError, embedding::EmbeddingClientError, pinecone::StoreError,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while decoding a raw request body into a field mapping.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Every decode strategy failed; carries the strict-decode error text.
    #[error("Invalid JSON: {0}")]
    MalformedPayload(String),
}

/// Errors produced while turning a field mapping into a canonical record.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Embedding field had a shape the pipeline does not understand.
    #[error("Embedding must be an array or delimited string, got {0}")]
    UnsupportedEmbeddingType(&'static str),
    /// Embedding entries could not all be coerced to floats.
    #[error("Invalid embedding values: {0}")]
    InvalidEmbeddingValues(String),
    /// Coerced embedding length does not match the index dimensionality.
    #[error("Invalid embedding length: {observed} (expected {expected})")]
    EmbeddingDimensionMismatch {
        /// Dimensionality the index was created with.
        expected: usize,
        /// Length of the vector the caller supplied.
        observed: usize,
    },
    /// Request carried no usable `content_id`.
    #[error("Missing content_id field")]
    MissingIdentifier,
}

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Request body could not be decoded by any strategy.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// Field mapping failed validation.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    /// Pinecone API key was absent from the environment.
    #[error("Pinecone API key not configured")]
    StoreNotConfigured,
    /// A dependency the batch endpoint needs was absent from the environment.
    #[error("{0} not configured")]
    BatchNotConfigured(&'static str),
    /// Vector store interaction failed during the upsert.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Embedding provider failed to produce a vector for a batch record.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Airtable interaction failed while fetching the content table.
    #[error("Airtable request failed: {0}")]
    ContentTable(#[from] AirtableError),
}

impl IngestError {
    /// Whether the failure was caused by the caller's input (HTTP 400) rather
    /// than by configuration or a dependency (HTTP 500).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Extract(_) | Self::Normalize(_))
    }
}

/// Validated, whitelisted record ready for a single idempotent upsert.
///
/// Only ever constructed once the embedding length matches the index
/// dimensionality and the identifier is non-empty.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    /// Stable vector identifier derived from `content_id`.
    pub id: String,
    /// Fixed-length embedding vector.
    pub embedding: Vec<f64>,
    /// Whitelisted, length-capped metadata fields.
    pub metadata: BTreeMap<String, String>,
}

/// Observable result of a successful upsert.
#[derive(Debug, Clone)]
pub struct UpsertReceipt {
    /// Identifier the vector was stored under.
    pub vector_id: String,
    /// Length of the stored embedding.
    pub embedding_length: usize,
    /// Number of metadata fields persisted alongside the vector.
    pub metadata_fields: usize,
}

/// Aggregate result of a batch run over the content table.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    /// Records embedded and written successfully.
    pub processed_records: usize,
    /// Records fetched from the content table.
    pub total_records: usize,
}
