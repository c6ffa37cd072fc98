#![deny(missing_docs)]

//! Core library for the Court Index ingestion server.

/// Airtable content table client used by the batch endpoint.
pub mod airtable;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and the OpenAI adapter.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Pinecone vector index integration.
pub mod pinecone;
/// Payload extraction, record normalization, and upsert orchestration.
pub mod pipeline;
