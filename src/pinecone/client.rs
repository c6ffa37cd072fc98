//! HTTP client wrapper for the Pinecone data plane.

use crate::pinecone::types::{DescribeIndexResponse, StoreError, UpsertRequest, VectorUpsert};
use crate::pipeline::CanonicalRecord;
use reqwest::{Client, StatusCode};
use tokio::sync::OnceCell;

/// Name of the index every vector is written to.
pub const INDEX_NAME: &str = "tennis-knowledge-base";

/// Control-plane endpoint used to resolve the index's data-plane host.
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// Lightweight HTTP client for Pinecone upserts.
///
/// The data-plane host is resolved from the control plane at most once per
/// process and cached; deployments that pin `PINECONE_INDEX_HOST` skip the
/// discovery call entirely.
pub struct PineconeService {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) control_url: String,
    pub(crate) index_host: OnceCell<String>,
}

impl PineconeService {
    /// Construct a new client for the given API key and optional host override.
    pub fn new(api_key: String, index_host: Option<String>) -> Result<Self, StoreError> {
        let client = Client::builder().user_agent("court-index/0.3").build()?;

        let cached_host = match index_host {
            Some(host) => {
                let normalized = normalize_host(&host)?;
                OnceCell::from(normalized)
            }
            None => OnceCell::new(),
        };

        tracing::debug!(
            index = INDEX_NAME,
            host_pinned = cached_host.initialized(),
            "Initialized Pinecone HTTP client"
        );

        Ok(Self {
            client,
            api_key,
            control_url: CONTROL_PLANE_URL.to_string(),
            index_host: cached_host,
        })
    }

    /// Upsert one canonical record, fully replacing any prior vector and
    /// metadata stored under the same identifier.
    pub async fn upsert(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        let host = self.index_host().await?;
        let body = UpsertRequest {
            vectors: [VectorUpsert {
                id: &record.id,
                values: &record.embedding,
                metadata: &record.metadata,
            }],
        };

        let response = self
            .client
            .post(format!("{host}/vectors/upsert"))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(vector_id = %record.id, "Vector upserted");
            return Ok(());
        }

        let error = classify_status(response).await;
        tracing::error!(vector_id = %record.id, error = %error, "Pinecone upsert failed");
        Err(error)
    }

    /// Resolve and cache the data-plane host for the index.
    async fn index_host(&self) -> Result<&str, StoreError> {
        self.index_host
            .get_or_try_init(|| self.describe_index_host())
            .await
            .map(String::as_str)
    }

    async fn describe_index_host(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .get(format!("{}/indexes/{INDEX_NAME}", self.control_url))
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = classify_status(response).await;
            tracing::error!(index = INDEX_NAME, error = %error, "Index host discovery failed");
            return Err(error);
        }

        let described: DescribeIndexResponse = response.json().await?;
        let host = normalize_host(&described.host)?;
        tracing::debug!(index = INDEX_NAME, host = %host, "Resolved index host");
        Ok(host)
    }
}

/// Accept hosts with or without a scheme; strip any trailing slash.
fn normalize_host(host: &str) -> Result<String, StoreError> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidHost(host.to_string()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

async fn classify_status(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AuthFailed { status, body },
        status if status.is_client_error() => StoreError::Rejected { status, body },
        _ => StoreError::Unavailable(format!("{status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn service_for(server: &MockServer) -> PineconeService {
        PineconeService {
            client: Client::builder()
                .user_agent("court-index-test")
                .build()
                .expect("client"),
            api_key: "test-key".into(),
            control_url: server.base_url(),
            index_host: OnceCell::from(server.base_url()),
        }
    }

    fn sample_record() -> CanonicalRecord {
        let mut metadata = BTreeMap::new();
        metadata.insert("content_id".to_string(), "vid-1".to_string());
        metadata.insert("skill_level".to_string(), "beginner".to_string());
        CanonicalRecord {
            id: "tennis-vid-1".into(),
            embedding: vec![0.1, 0.2, 0.3],
            metadata,
        }
    }

    #[tokio::test]
    async fn upsert_emits_expected_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .header("Api-Key", "test-key")
                    .json_body(json!({
                        "vectors": [
                            {
                                "id": "tennis-vid-1",
                                "values": [0.1, 0.2, 0.3],
                                "metadata": {
                                    "content_id": "vid-1",
                                    "skill_level": "beginner"
                                }
                            }
                        ]
                    }));
                then.status(200).json_body(json!({ "upsertedCount": 1 }));
            })
            .await;

        let service = service_for(&server);
        service.upsert(&sample_record()).await.expect("upsert");
        mock.assert();
    }

    #[tokio::test]
    async fn auth_failures_are_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(401).body("unauthorized");
            })
            .await;

        let service = service_for(&server);
        let err = service.upsert(&sample_record()).await.expect_err("auth");
        assert!(matches!(err, StoreError::AuthFailed { .. }));
    }

    #[tokio::test]
    async fn client_errors_are_rejections() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(400).body("metadata too large");
            })
            .await;

        let service = service_for(&server);
        let err = service.upsert(&sample_record()).await.expect_err("rejected");
        assert!(matches!(err, StoreError::Rejected { .. }));
    }

    #[tokio::test]
    async fn server_errors_read_as_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(503).body("maintenance");
            })
            .await;

        let service = service_for(&server);
        let err = service.upsert(&sample_record()).await.expect_err("unavailable");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn host_is_discovered_once_when_not_pinned() {
        let server = MockServer::start_async().await;
        let describe = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET)
                    .path(format!("/indexes/{INDEX_NAME}"))
                    .header("Api-Key", "test-key");
                then.status(200).json_body(json!({
                    "name": INDEX_NAME,
                    "host": server.base_url()
                }));
            })
            .await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200).json_body(json!({ "upsertedCount": 1 }));
            })
            .await;

        let service = PineconeService {
            client: Client::builder()
                .user_agent("court-index-test")
                .build()
                .expect("client"),
            api_key: "test-key".into(),
            control_url: server.base_url(),
            index_host: OnceCell::new(),
        };

        service.upsert(&sample_record()).await.expect("first upsert");
        service.upsert(&sample_record()).await.expect("second upsert");

        describe.assert_hits(1);
        upsert.assert_hits(2);
    }

    #[test]
    fn hosts_are_normalized() {
        assert_eq!(
            normalize_host("demo.svc.pinecone.io").expect("bare host"),
            "https://demo.svc.pinecone.io"
        );
        assert_eq!(
            normalize_host("http://127.0.0.1:6333/").expect("scheme host"),
            "http://127.0.0.1:6333"
        );
        assert!(normalize_host("  ").is_err());
    }
}
