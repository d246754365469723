//! HTTP-level tests for the embedding client: retry policy and response
//! shape handling against a mock server.

use std::sync::Arc;

use httpmock::prelude::*;

use project_recall::config::EmbeddingConfig;
use project_recall::embedding::{Embedder, EmbeddingApi, HttpEmbeddingApi};
use project_recall::error::EmbedError;

const KEY_ENV: &str = "RECALL_TEST_EMBED_KEY";

fn config(server: &MockServer, max_retries: u32) -> EmbeddingConfig {
    std::env::set_var(KEY_ENV, "test-key");
    EmbeddingConfig {
        endpoint: server.url("/v1/embeddings"),
        model: "text-embedding-3-small".to_string(),
        dims: 3,
        api_key_env: KEY_ENV.to_string(),
        max_retries,
        timeout_secs: 5,
        concurrency: 2,
    }
}

#[tokio::test]
async fn success_parses_the_embedding_payload() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/embeddings")
            .header("authorization", "Bearer test-key");
        then.status(200)
            .json_body(serde_json::json!({
                "data": [ { "embedding": [0.1, 0.2, 0.3] } ]
            }));
    });

    let api = HttpEmbeddingApi::new(&config(&server, 0)).unwrap();
    let raw = api.embed_raw("billing system").await.unwrap();
    assert_eq!(raw, serde_json::json!([0.1, 0.2, 0.3]));
    mock.assert();
}

#[tokio::test]
async fn nested_response_is_flattened_by_the_embedder() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200)
            .json_body(serde_json::json!({
                "data": [ { "embedding": [[0.1, 0.2, 0.3], [9.0, 9.0, 9.0]] } ]
            }));
    });

    let cfg = config(&server, 0);
    let api: Arc<dyn EmbeddingApi> = Arc::new(HttpEmbeddingApi::new(&cfg).unwrap());
    let embedder = Embedder::new(api, cfg.dims);
    let vector = embedder.embed_checked("billing system").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn auth_failure_is_permanent_and_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(401).body("invalid api key");
    });

    let api = HttpEmbeddingApi::new(&config(&server, 3)).unwrap();
    let err = api.embed_raw("billing system").await.unwrap_err();
    match err {
        EmbedError::Service { transient, .. } => assert!(!transient),
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_hits(1);
}

#[tokio::test]
async fn server_errors_are_retried_until_the_budget_runs_out() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(503).body("overloaded");
    });

    let api = HttpEmbeddingApi::new(&config(&server, 1)).unwrap();
    let err = api.embed_raw("billing system").await.unwrap_err();
    match err {
        EmbedError::Service { transient, .. } => assert!(transient),
        other => panic!("unexpected error: {other:?}"),
    }
    // Initial attempt plus one retry.
    mock.assert_hits(2);
}

#[tokio::test]
async fn missing_embedding_field_is_a_service_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200).json_body(serde_json::json!({ "data": [] }));
    });

    let api = HttpEmbeddingApi::new(&config(&server, 0)).unwrap();
    let err = api.embed_raw("billing system").await.unwrap_err();
    assert!(matches!(err, EmbedError::Service { transient: false, .. }));
}
