//! Single-shot queries: payload shape, retries and error mapping.

use crate::integration::mock_server::MockServerFixture;
use mockito::Matcher;
use rag_chat_client::{Error, Message};
use serde_json::json;
use std::time::Instant;

#[tokio::test]
async fn answers_on_first_attempt_without_retries() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_answer(r#"{"answer":"Paris.","sources":[{"filename":"europe.pdf","metadata":{"page":3}}],"processing_time":0.42}"#)
        .await;

    let client = fixture.create_test_client(3);
    let (response, stats) = client
        .chat()
        .messages(vec![Message::user("What is the capital of France?")])
        .execute_with_stats()
        .await
        .unwrap();

    assert_eq!(response.answer, "Paris.");
    assert_eq!(response.sources.unwrap()[0].filename, "europe.pdf");
    assert_eq!(stats.retry_count, 0);
    assert_eq!(stats.http_status, 200);
    assert_eq!(stats.endpoint, "/query");
    mock.assert_async().await;
}

#[tokio::test]
async fn request_body_carries_question_and_filtered_history() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/query")
            .match_header("content-type", "application/json")
            .match_header("x-request-id", Matcher::Any)
            .match_body(Matcher::Json(json!({
                "question": "And Germany?",
                "system_context": "Answer briefly.",
                "user_context": {"team": "geo"},
                "chat_history": [
                    {"type": "user", "content": "What is the capital of France?"},
                    {"type": "assistant", "content": "Paris."}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"answer":"Berlin."}"#)
            .create_async()
            .await
    };

    let client = fixture.create_test_client(0);
    let response = client
        .chat()
        .messages(vec![
            Message::assistant("Hello! I'm your Civic Nexus assistant. Ask me anything about your documents.")
                .system_greeting(),
            Message::user("What is the capital of France?"),
            Message::assistant("Paris."),
            Message::assistant("Network error: connection refused").error(),
            Message::user("And Germany?"),
        ])
        .system_context("Answer briefly.")
        .user_context("team", "geo")
        .execute()
        .await
        .unwrap();

    assert_eq!(response.answer, "Berlin.");
    mock.assert_async().await;
}

#[tokio::test]
async fn bearer_token_is_attached() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/query")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body(r#"{"answer":"ok"}"#)
            .create_async()
            .await
    };

    let client = rag_chat_client::RagClientBuilder::new()
        .config(rag_chat_client::ClientConfig::default())
        .base_url_override(&fixture.base_url)
        .api_token("secret-token")
        .build()
        .unwrap();
    let answer = client.query(&[Message::user("hi")]).await.unwrap();
    assert_eq!(answer.answer, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_error_response("/query", 500, r#"{"detail":"boom"}"#, 2)
        .await;
    let ok = fixture.mock_answer(r#"{"answer":"ok"}"#).await;

    let client = fixture.create_test_client(3);
    let started = Instant::now();
    let (response, stats) = client
        .chat()
        .message(Message::user("ping"))
        .execute_with_stats()
        .await
        .unwrap();

    assert_eq!(response.answer, "ok");
    assert_eq!(stats.retry_count, 2);
    // 20ms + 40ms of backoff
    assert!(started.elapsed().as_millis() >= 60);
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response("/query", 404, r#"{"detail":"Not Found"}"#, 1)
        .await;

    let client = fixture.create_test_client(3);
    let err = client.query(&[Message::user("hello")]).await.unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn unavailable_service_exhausts_retries() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response("/query", 503, r#"{"error":"overloaded"}"#, 3)
        .await;

    let client = fixture.create_test_client(2);
    let err = client.query(&[Message::user("hello")]).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_success_body_is_a_validation_error() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_answer(r#"{"answer":42}"#).await;

    let client = fixture.create_test_client(3);
    let err = client.query(&[Message::user("hello")]).await.unwrap_err();

    match err {
        Error::Validation { context, .. } => {
            assert_eq!(context.field_path.as_deref(), Some("response.answer"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Validation failures are never retried.
    mock.assert_async().await;
}

#[tokio::test]
async fn transcript_without_user_message_fails_before_any_request() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(r#"{"answer":"unused"}"#)
            .expect(0)
            .create_async()
            .await
    };

    let client = fixture.create_test_client(3);
    let err = client
        .query(&[Message::assistant("Hi! How can I help you today?").system_greeting()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyInput));

    let err = client.query(&[Message::user("   \n\t")]).await.unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
    mock.assert_async().await;
}
