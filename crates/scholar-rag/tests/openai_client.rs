//! OpenAI client behaviour against a mock server

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scholar_rag::config::{resolve_api_key, ApiKey, OpenAiConfig};
use scholar_rag::error::{Error, ServiceErrorKind};
use scholar_rag::providers::{
    EmbeddingProvider, LlmProvider, OpenAiChat, OpenAiClient, OpenAiEmbedder, OpenAiProviderFactory,
    ProviderFactory,
};
use scholar_rag::types::{Chunk, ChunkSource, Citation};

fn key() -> ApiKey {
    resolve_api_key(Some("sk-test"), None).unwrap()
}

fn config(server: &MockServer, max_retries: u32) -> OpenAiConfig {
    OpenAiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        max_retries,
        embedding_batch_size: 2,
        ..OpenAiConfig::default()
    }
}

fn client(server: &MockServer, max_retries: u32) -> Arc<OpenAiClient> {
    Arc::new(OpenAiClient::new(&config(server, max_retries), key()).unwrap())
}

#[tokio::test]
async fn test_embeddings_sent_with_bearer_and_reordered_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "text-embedding-3-small" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ],
            "model": "text-embedding-3-small"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vectors = client(&server, 0)
        .embeddings("text-embedding-3-small", &["first".to_string(), "second".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn test_embedder_splits_into_batches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "index": 0, "embedding": [0.5, 0.5] },
                { "index": 1, "embedding": [0.5, 0.5] }
            ]
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "index": 0, "embedding": [0.5, 0.5] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::from_client(client(&server, 0), "text-embedding-3-small", 2);
    let texts: Vec<String> = (0..5).map(|i| format!("chunk {}", i)).collect();
    let vectors = embedder.embed_batch(&texts).await.unwrap();
    assert_eq!(vectors.len(), 5);
    assert_eq!(embedder.model(), "text-embedding-3-small");
}

#[tokio::test]
async fn test_auth_failure_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .embeddings("text-embedding-3-small", &["text".to_string()])
        .await
        .unwrap_err();
    match err {
        Error::Embedding { kind, message } => {
            assert_eq!(kind, ServiceErrorKind::Auth);
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_not_retried_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 0)
        .chat_completion("gpt-4o-mini", &[], 0.7)
        .await
        .unwrap_err();
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::RateLimit));
    assert!(matches!(err, Error::Llm { .. }));
}

#[tokio::test]
async fn test_transient_failure_retried_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vectors = client(&server, 1)
        .embeddings("text-embedding-3-small", &["text".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3]]);
}

#[tokio::test]
async fn test_chat_sends_grounding_prompt_and_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "According to the paper, eight heads (page 2)." },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let chat = OpenAiChat::from_client(client(&server, 0), "gpt-4o-mini", 0.7);
    let chunk = Chunk::new(
        uuid::Uuid::new_v4(),
        "Eight parallel attention heads.".to_string(),
        ChunkSource::pdf("attention.pdf".to_string(), 2, 3),
        0,
    );
    let citations = vec![Citation::from_chunk(&chunk, 0.9, 1, 200)];
    let answer = chat
        .generate_answer("How many heads?", "[1] attention.pdf, Page 2\n\nEight parallel attention heads.", &citations)
        .await
        .unwrap();
    assert_eq!(answer, "According to the paper, eight heads (page 2).");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Eight parallel attention heads."));
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "How many heads?");
}

#[tokio::test]
async fn test_empty_choices_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server, 0)
        .chat_completion("gpt-4o-mini", &[], 0.7)
        .await
        .unwrap_err();
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Decode));
}

#[tokio::test]
async fn test_factory_builds_providers_for_model() {
    let server = MockServer::start().await;
    let factory = OpenAiProviderFactory::new(config(&server, 0), 0.7);
    let embedder = factory.embedder(&key(), "text-embedding-3-large").unwrap();
    let llm = factory.llm(&key(), "gpt-4o").unwrap();
    assert_eq!(embedder.model(), "text-embedding-3-large");
    assert_eq!(embedder.name(), "openai");
    assert_eq!(llm.model(), "gpt-4o");
}
