//! Caller cancellation, request timeout and unreachable services.

use crate::integration::mock_server::{client_for, spawn_hanging_server, unused_address};
use rag_chat_client::{CancelHandle, CancelReason, Error, Message};
use std::time::{Duration, Instant};

#[tokio::test]
async fn caller_cancel_mid_flight_is_not_a_network_error() {
    let base_url = spawn_hanging_server().await;
    let client = client_for(&base_url, 3, Duration::from_secs(10));

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .chat()
        .message(Message::user("slow question"))
        .cancel_handle(cancel)
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Cancelled {
            reason: CancelReason::Caller
        }
    ));
    assert!(!err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn request_timeout_is_reported_as_timeout_without_retry() {
    let base_url = spawn_hanging_server().await;
    let client = client_for(&base_url, 3, Duration::from_millis(150));

    let started = Instant::now();
    let err = client.query(&[Message::user("slow")]).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Cancelled {
            reason: CancelReason::Timeout
        }
    ));
    // Four attempts would take at least 600ms before any backoff.
    assert!(started.elapsed() < Duration::from_millis(600));
}

#[tokio::test]
async fn already_cancelled_handle_sends_nothing() {
    let base_url = spawn_hanging_server().await;
    let client = client_for(&base_url, 3, Duration::from_secs(10));
    let cancel = CancelHandle::new();
    cancel.cancel();

    let err = client
        .chat()
        .message(Message::user("never sent"))
        .cancel_handle(cancel)
        .execute_stream()
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn refused_connection_is_a_network_error_after_retries() {
    let base_url = unused_address().await;
    let client = client_for(&base_url, 2, Duration::from_secs(5));

    let err = client.query(&[Message::user("anyone there?")]).await.unwrap_err();
    match err {
        Error::Network { message, source } => {
            assert!(message.contains("after 3 attempts"), "{message}");
            assert!(message.contains(&base_url), "{message}");
            assert!(source.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn cancel_during_backoff_stops_retrying() {
    let base_url = unused_address().await;
    let client = rag_chat_client::RagClientBuilder::new()
        .config(rag_chat_client::ClientConfig::default())
        .base_url_override(&base_url)
        .max_retries(5)
        .retry_base_delay(Duration::from_secs(30))
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .chat()
        .message(Message::user("retry me"))
        .cancel_handle(cancel)
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Cancelled {
            reason: CancelReason::Caller
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
}
