//! Ingestion pipeline: payload extraction, record normalization, and upsert
//! orchestration.

pub mod extract;
pub mod normalize;
mod service;
pub mod types;

pub use service::{IngestApi, IngestService};
pub use types::{
    BatchOutcome, CanonicalRecord, ExtractError, IngestError, NormalizeError, UpsertReceipt,
};
