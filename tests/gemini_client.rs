use project_tracker::ai::{AiCollaborator, GeminiClient};
use project_tracker::config::AiConfig;
use serde_json::json;
use tracker_core::TrackerError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-1.5-pro:generateContent";

fn config(server: &MockServer) -> AiConfig {
    AiConfig {
        api_key: Some("test-key".into()),
        base_url: server.uri(),
        ..Default::default()
    }
}

#[tokio::test]
async fn joins_candidate_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
            "generationConfig": { "maxOutputTokens": 8192 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hi " }, { "text": "there" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server)).unwrap();
    assert_eq!(client.generate("hello").await.unwrap(), "Hi there");
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server)).unwrap();
    match client.generate("hello").await {
        Err(TrackerError::ExternalTool { tool, message }) => {
            assert_eq!(tool, "gemini");
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_body_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server)).unwrap();
    let err = client.generate("hello").await.unwrap_err();
    assert!(err.to_string().contains("HTTP 503"), "{err}");
}

#[tokio::test]
async fn empty_candidates_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server)).unwrap();
    assert!(matches!(
        client.generate("hello").await,
        Err(TrackerError::MalformedAiResponse(_))
    ));
}

#[test]
fn missing_key_is_rejected_up_front() {
    assert!(matches!(
        GeminiClient::new(AiConfig::default()),
        Err(TrackerError::ExternalTool { .. })
    ));
}
