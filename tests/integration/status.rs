//! `GET /status` health probe.

use crate::integration::mock_server::MockServerFixture;
use rag_chat_client::Error;

#[tokio::test]
async fn healthy_status_is_parsed() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_status(
            200,
            r#"{"status":"healthy","documents_ingested":12,"vector_store_ready":true,"ollama_available":true}"#,
        )
        .await;

    let client = fixture.create_test_client(0);
    let status = client.status().await.unwrap();
    assert!(status.is_healthy());
    assert_eq!(status.documents_ingested, 12);
    assert!(status.vector_store_ready);
    mock.assert_async().await;
}

#[tokio::test]
async fn degraded_status_is_not_healthy() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_status(200, r#"{"status":"degraded","vector_store_ready":false}"#)
        .await;

    let client = fixture.create_test_client(0);
    let status = client.status().await.unwrap();
    assert!(!status.is_healthy());
    assert_eq!(status.documents_ingested, 0);
}

#[tokio::test]
async fn status_failure_maps_to_api_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_status(401, r#"{"detail":"Not authenticated"}"#)
        .await;

    let client = fixture.create_test_client(3);
    let err = client.status().await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
