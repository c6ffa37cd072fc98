//! Shared types used by the Pinecone client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned while interacting with Pinecone.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configured host failed to parse or normalize.
    #[error("Invalid Pinecone host: {0}")]
    InvalidHost(String),
    /// Pinecone refused the API key.
    #[error("Pinecone authentication failed ({status}): {body}")]
    AuthFailed {
        /// HTTP status returned by Pinecone.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Pinecone rejected the request itself (oversized payload, bad vector).
    #[error("Pinecone rejected the request ({status}): {body}")]
    Rejected {
        /// HTTP status returned by Pinecone.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Transport failure or a server-side error before a usable response.
    #[error("Pinecone unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// One vector in an upsert request body.
#[derive(Debug, Serialize)]
pub(crate) struct VectorUpsert<'a> {
    pub(crate) id: &'a str,
    pub(crate) values: &'a [f64],
    pub(crate) metadata: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpsertRequest<'a> {
    pub(crate) vectors: [VectorUpsert<'a>; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescribeIndexResponse {
    pub(crate) host: String,
}
