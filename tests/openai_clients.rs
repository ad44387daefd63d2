use std::time::Duration;

use logsai::chat::{ChatMessage, ChatProvider, OpenAiChatClient, CHAT_ERROR_PREFIX};
use logsai::embedding::{EmbeddingProvider, OpenAiEmbeddingClient};
use logsai::openai::OpenAiEndpoint;
use logsai::LogsaiError;
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The clients block, so the mock server is driven from its own runtime and
/// requests are issued from the test thread outside of it.
struct Harness {
    server: MockServer,
    runtime: Runtime,
}

impl Harness {
    fn start() -> Option<Self> {
        if std::net::TcpListener::bind("127.0.0.1:0").is_err() {
            println!("Skipping test due to sandbox network bind restrictions.");
            return None;
        }
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Some(Self { server, runtime })
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn endpoint(&self) -> OpenAiEndpoint {
        OpenAiEndpoint::new(
            format!("{}/v1", self.server.uri()),
            "test-key",
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }
}

#[test]
fn embeddings_are_returned_in_input_order() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "text-embedding-ada-002",
                "input": ["first", "second"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] },
                ]
            })))
            .expect(1),
    );

    let client = OpenAiEmbeddingClient::new(harness.endpoint(), "text-embedding-ada-002", 16);
    let vectors = client
        .embed(&["first".to_string(), "second".to_string()])
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[test]
fn large_inputs_are_split_into_batches() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "input": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 0, "embedding": [1.0] },
                    { "index": 1, "embedding": [2.0] },
                ]
            })))
            .expect(1),
    );
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "input": ["c"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [3.0] }]
            })))
            .expect(1),
    );

    let client = OpenAiEmbeddingClient::new(harness.endpoint(), "m", 2);
    let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

    assert_eq!(
        client.embed(&texts).unwrap(),
        vec![vec![1.0], vec![2.0], vec![3.0]]
    );
}

#[test]
fn short_embedding_responses_are_errors() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [1.0] }]
            }))),
    );

    let client = OpenAiEmbeddingClient::new(harness.endpoint(), "m", 16);
    let err = client
        .embed(&["a".to_string(), "b".to_string()])
        .unwrap_err();

    assert!(matches!(err, LogsaiError::RemoteService { service: "embedding", .. }));
}

#[test]
fn embedding_http_errors_propagate() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key")),
    );

    let client = OpenAiEmbeddingClient::new(harness.endpoint(), "m", 16);
    let err = client.embed(&["a".to_string()]).unwrap_err();

    assert!(err.to_string().contains("401"));
    assert!(err.to_string().contains("invalid api key"));
}

#[test]
fn empty_input_makes_no_request() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0),
    );

    let client = OpenAiEmbeddingClient::new(harness.endpoint(), "m", 16);
    assert!(client.embed(&[]).unwrap().is_empty());
}

#[test]
fn chat_returns_the_first_choice() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "hello" },
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi there" } }]
            })))
            .expect(1),
    );

    let client = OpenAiChatClient::new(harness.endpoint(), "gpt-3.5-turbo");
    let answer = client.complete(&[
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("hello"),
    ]);

    assert_eq!(answer, "hi there");
}

#[test]
fn chat_server_errors_become_answers() {
    let Some(harness) = Harness::start() else { return };
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded")),
    );

    let client = OpenAiChatClient::new(harness.endpoint(), "gpt-3.5-turbo");
    let answer = client.complete(&[ChatMessage::user("hello")]);

    assert!(answer.starts_with(CHAT_ERROR_PREFIX));
    assert!(answer.contains("overloaded"));
}
