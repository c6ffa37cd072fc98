//! Pinecone vector index integration.

pub mod client;
pub mod types;

pub use client::{INDEX_NAME, PineconeService};
pub use types::StoreError;
