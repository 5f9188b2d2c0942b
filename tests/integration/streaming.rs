//! Streaming queries against `/query/stream`.

use crate::integration::mock_server::MockServerFixture;
use futures::StreamExt;
use rag_chat_client::{Error, Message};

#[tokio::test]
async fn callback_receives_fragments_in_order() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_stream(&[
            r#"data: {"chunk":"Par"}"#,
            r#"data: {"chunk":"is."}"#,
            "data: [DONE]",
        ])
        .await;

    let client = fixture.create_test_client(0);
    let mut seen = Vec::new();
    let answer = client
        .chat()
        .message(Message::user("What is the capital of France?"))
        .execute_stream_with(|fragment| {
            seen.push(fragment.to_string());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["Par", "is."]);
    assert_eq!(answer, "Paris.");
    mock.assert_async().await;
}

#[tokio::test]
async fn stream_skips_heartbeats_and_ignores_data_after_done() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_stream(&[
            ": keep-alive",
            "",
            r#"data: {"chunk":"one"}"#,
            "data: not-json",
            r#"data: {"chunk":" two"}"#,
            "data: [DONE]",
            r#"data: {"chunk":" three"}"#,
        ])
        .await;

    let client = fixture.create_test_client(0);
    let stream = client
        .query_stream(&[Message::user("count")])
        .await
        .unwrap();
    assert_eq!(stream.stats().http_status, 200);
    assert_eq!(stream.stats().endpoint, "/query/stream");
    assert_eq!(stream.collect_answer().await.unwrap(), "one two");
}

#[tokio::test]
async fn stream_is_released_after_completion() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_stream(&[r#"data: {"chunk":"a"}"#, "data: [DONE]"])
        .await;

    let client = fixture.create_test_client(0);
    let mut stream = client.query_stream(&[Message::user("a")]).await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "a");
    assert!(stream.next().await.is_none());
    assert!(!stream.is_open());
}

#[tokio::test]
async fn callback_error_stops_the_stream_and_is_classified() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_stream(&[
            r#"data: {"chunk":"first"}"#,
            r#"data: {"chunk":"second"}"#,
            "data: [DONE]",
        ])
        .await;

    let client = fixture.create_test_client(0);
    let mut calls = 0;
    let err = client
        .chat()
        .message(Message::user("go"))
        .execute_stream_with(|_| {
            calls += 1;
            anyhow::bail!("display closed")
        })
        .await
        .unwrap_err();

    assert_eq!(calls, 1);
    match err {
        Error::ChatService { message, .. } => assert_eq!(message, "display closed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn stream_open_retries_on_server_error() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_error_response("/query/stream", 502, r#"{"detail":"bad gateway"}"#, 1)
        .await;
    let ok = fixture
        .mock_stream(&[r#"data: {"chunk":"ok"}"#, "data: [DONE]"])
        .await;

    let client = fixture.create_test_client(2);
    let stream = client.query_stream(&[Message::user("retry")]).await.unwrap();
    assert_eq!(stream.stats().retry_count, 1);
    assert_eq!(stream.collect_answer().await.unwrap(), "ok");
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn cancelling_an_open_stream_ends_it() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_stream(&[r#"data: {"chunk":"a"}"#, r#"data: {"chunk":"b"}"#, "data: [DONE]"])
        .await;

    let client = fixture.create_test_client(0);
    let mut stream = client.query_stream(&[Message::user("a")]).await.unwrap();
    stream.cancel_handle().cancel();

    let item = stream.next().await.unwrap();
    assert!(matches!(item, Err(Error::Cancelled { .. })));
    assert!(stream.next().await.is_none());
}
