use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use courtindex::{api, config, pipeline::IngestService};
use httpmock::{Method::POST, MockServer};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tower::ServiceExt;

static INIT: OnceCell<()> = OnceCell::const_new();
static MOCK_SERVER: OnceCell<&'static MockServer> = OnceCell::const_new();

const TEST_DIMENSION: usize = 8;

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests run in a single process and establish deterministic configuration upfront.
    unsafe { std::env::set_var(key, value) }
}

async fn ensure_harness() {
    INIT.get_or_init(|| async {
        let mock_server_owned = MockServer::start_async().await;
        let mock_server = Box::leak(Box::new(mock_server_owned));

        set_env("PINECONE_API_KEY", "integration-test-key");
        set_env("PINECONE_INDEX_HOST", &mock_server.base_url());
        set_env("EMBEDDING_DIMENSION", &TEST_DIMENSION.to_string());

        mock_server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200).json_body(json!({ "upsertedCount": 1 }));
            })
            .await;

        MOCK_SERVER.set(mock_server).ok();
        config::init_config();
    })
    .await;
}

async fn app() -> axum::Router {
    ensure_harness().await;
    api::create_router(Arc::new(IngestService::new()))
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}

fn embedding_values() -> Vec<f64> {
    (0..TEST_DIMENSION).map(|i| i as f64 / 10.0).collect()
}

async fn post_store_vector(app: axum::Router, content_type: &str, body: String) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri("/store-vector")
            .header("content-type", content_type)
            .body(Body::from(body))
            .expect("request"),
    )
    .await
    .expect("router response")
}

#[tokio::test]
async fn health_is_healthy_regardless_of_store_state() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert_eq!(&body[..], b"Healthy!");
}

#[tokio::test]
async fn strict_json_round_trips_to_a_receipt() {
    let payload = json!({
        "content_id": "vid-42",
        "embedding": embedding_values(),
        "video_title": "Kick serve basics",
        "skill_level": "intermediate",
        "not_in_whitelist": "dropped"
    })
    .to_string();

    let response = post_store_vector(app().await, "application/json", payload).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["vector_id"], "tennis-vid-42");
    assert_eq!(body["embedding_length"], TEST_DIMENSION);
    // content_id + video_title + skill_level survive the whitelist.
    assert_eq!(body["metadata_fields"], 3);
}

#[tokio::test]
async fn form_encoded_bodies_are_accepted() {
    let embedding = embedding_values()
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let body = serde_urlencoded::to_string([
        ("content_id", "vid-form"),
        ("embedding", embedding.as_str()),
        ("coaching_style", "technical"),
    ])
    .expect("form body");

    let response =
        post_store_vector(app().await, "application/x-www-form-urlencoded", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["vector_id"], "tennis-vid-form");
    assert_eq!(json["embedding_length"], TEST_DIMENSION);
}

#[tokio::test]
async fn near_json_with_smart_quotes_is_repaired() {
    let values = embedding_values()
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let body = format!(
        "{{\u{201c}content_id\u{201d}: \u{201c}vid-smart\u{201d}, \u{201c}embedding\u{201d}: [{values}]}}"
    );

    let response = post_store_vector(app().await, "application/json", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["vector_id"], "tennis-vid-smart");
}

#[tokio::test]
async fn wrong_dimension_is_a_bad_request() {
    let payload = json!({
        "content_id": "vid-short",
        "embedding": [0.1, 0.2, 0.3]
    })
    .to_string();

    let response = post_store_vector(app().await, "application/json", payload).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    let message = body["error"].as_str().expect("error string");
    assert!(message.contains("3"));
    assert!(message.contains(&TEST_DIMENSION.to_string()));
}

#[tokio::test]
async fn missing_content_id_is_a_bad_request() {
    let payload = json!({ "embedding": embedding_values() }).to_string();

    let response = post_store_vector(app().await, "application/json", payload).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Missing content_id field");
}

#[tokio::test]
async fn undecodable_bodies_are_a_bad_request() {
    let response =
        post_store_vector(app().await, "application/json", "definitely not json".into()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error string")
            .starts_with("Invalid JSON:")
    );
}

#[tokio::test]
async fn repeated_writes_replace_under_the_same_identifier() {
    let first = json!({
        "content_id": "vid-idem",
        "embedding": embedding_values(),
        "short_summary": "first pass"
    })
    .to_string();
    let second = json!({
        "content_id": "vid-idem",
        "embedding": embedding_values(),
        "short_summary": "second pass",
        "skill_level": "advanced"
    })
    .to_string();

    let response = post_store_vector(app().await, "application/json", first).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["vector_id"], "tennis-vid-idem");

    let response = post_store_vector(app().await, "application/json", second).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["vector_id"], "tennis-vid-idem");
    assert_eq!(body["metadata_fields"], 3);
}

#[tokio::test]
async fn batch_endpoint_reports_missing_configuration() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/process-airtable")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error string")
            .contains("not configured")
    );
}
