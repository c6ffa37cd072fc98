//! Ingest service coordinating extraction, normalization, and index writes.

use crate::{
    airtable::{AirtableClient, ContentRecord},
    config::get_config,
    embedding::{EmbeddingClient, OpenAiEmbeddingClient},
    metrics::{IngestMetrics, MetricsSnapshot},
    pinecone::PineconeService,
    pipeline::{
        extract::{FieldMap, extract_fields},
        normalize::normalize,
        types::{BatchOutcome, IngestError, UpsertReceipt},
    },
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Fields concatenated into the embedding input for batch records.
const EMBED_INPUT_FIELDS: &[&str] = &[
    "video_title",
    "short_summary",
    "key_takeaways",
    "detailed_analysis",
    "tennis_topics",
    "full_transcript",
    "content_text",
];

/// Coordinates the full ingestion pipeline: payload extraction, record
/// normalization, and Pinecone writes.
///
/// The service owns long-lived handles to the store client, the embedding
/// client, the content table client, and the metrics registry. Construct it
/// once near process start and share it through an `Arc`; clients that are not
/// configured stay `None` and the corresponding operations report the missing
/// piece at request time.
pub struct IngestService {
    store: Option<PineconeService>,
    embedder: Option<Box<dyn EmbeddingClient>>,
    content_table: Option<AirtableClient>,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the ingestion pipeline used by the HTTP surface.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Extract, normalize, and upsert one externally-embedded content record.
    async fn store_vector(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<UpsertReceipt, IngestError>;

    /// Embed and upsert every record of the content table.
    async fn process_content_table(&self) -> Result<BatchOutcome, IngestError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl IngestService {
    /// Build a new ingest service from the loaded configuration.
    pub fn new() -> Self {
        let config = get_config();

        let store = config.pinecone_api_key.clone().map(|key| {
            PineconeService::new(key, config.pinecone_index_host.clone())
                .expect("Failed to initialize Pinecone client")
        });
        if store.is_none() {
            tracing::warn!("PINECONE_API_KEY not set; store-vector requests will be refused");
        }

        let embedder: Option<Box<dyn EmbeddingClient>> = config
            .openai_api_key
            .clone()
            .map(|key| Box::new(OpenAiEmbeddingClient::new(key)) as Box<dyn EmbeddingClient>);

        let content_table = match (&config.airtable_api_key, &config.airtable_base_id) {
            (Some(key), Some(base)) => Some(AirtableClient::new(
                key.clone(),
                base.clone(),
                config.airtable_table_name.clone(),
            )),
            _ => None,
        };

        Self {
            store,
            embedder,
            content_table,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Run the extract → normalize → write pipeline for one request body.
    pub async fn store_vector(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<UpsertReceipt, IngestError> {
        // Configuration is checked before any parsing work happens.
        let Some(store) = &self.store else {
            tracing::error!("Pinecone API key not found");
            return Err(IngestError::StoreNotConfigured);
        };

        let fields = extract_fields(body, content_type)?;
        let record = normalize(&fields, get_config().embedding_dimension)?;

        let receipt = UpsertReceipt {
            vector_id: record.id.clone(),
            embedding_length: record.embedding.len(),
            metadata_fields: record.metadata.len(),
        };

        store.upsert(&record).await?;
        self.metrics.record_vector();
        tracing::info!(
            vector_id = %receipt.vector_id,
            embedding_length = receipt.embedding_length,
            metadata_fields = receipt.metadata_fields,
            "Vector stored"
        );

        Ok(receipt)
    }

    /// Pull the content table, embed each record, and drive the shared
    /// normalize → write path per record.
    ///
    /// Per-record failures are logged and skipped so one bad row cannot abort
    /// the batch.
    pub async fn process_content_table(&self) -> Result<BatchOutcome, IngestError> {
        let Some(store) = &self.store else {
            return Err(IngestError::StoreNotConfigured);
        };
        let Some(embedder) = &self.embedder else {
            return Err(IngestError::BatchNotConfigured("OpenAI API key"));
        };
        let Some(content_table) = &self.content_table else {
            return Err(IngestError::BatchNotConfigured("Airtable credentials"));
        };

        let records = content_table.fetch_all_records().await?;
        let total_records = records.len();
        let mut processed_records = 0usize;

        for record in records {
            let record_id = record.id.clone();
            match self
                .process_record(store, embedder.as_ref(), record)
                .await
            {
                Ok(vector_id) => {
                    processed_records += 1;
                    tracing::debug!(record_id = %record_id, vector_id = %vector_id, "Content record stored");
                }
                Err(error) => {
                    tracing::warn!(record_id = %record_id, error = %error, "Skipping content record");
                }
            }
        }

        self.metrics.record_batch(processed_records as u64);
        tracing::info!(processed_records, total_records, "Content table processed");

        Ok(BatchOutcome {
            processed_records,
            total_records,
        })
    }

    async fn process_record(
        &self,
        store: &PineconeService,
        embedder: &dyn EmbeddingClient,
        record: ContentRecord,
    ) -> Result<String, IngestError> {
        let ContentRecord { id, mut fields } = record;

        if !has_content_id(&fields) {
            fields.insert("content_id".to_string(), Value::String(id));
        }

        let input = embedding_input(&fields);
        let vector = embedder.embed(&input).await?;
        fields.insert(
            "embedding".to_string(),
            Value::Array(vector.into_iter().map(Value::from).collect()),
        );

        let record = normalize(&fields, get_config().embedding_dimension)?;
        store.upsert(&record).await?;
        self.metrics.record_vector();
        Ok(record.id)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn has_content_id(fields: &FieldMap) -> bool {
    match fields.get("content_id") {
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

/// Concatenate the record's descriptive text fields into one embedding input.
fn embedding_input(fields: &FieldMap) -> String {
    EMBED_INPUT_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter_map(|value| value.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl IngestApi for IngestService {
    async fn store_vector(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<UpsertReceipt, IngestError> {
        IngestService::store_vector(self, body, content_type).await
    }

    async fn process_content_table(&self) -> Result<BatchOutcome, IngestError> {
        IngestService::process_content_table(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestService::metrics_snapshot(self)
    }
}
