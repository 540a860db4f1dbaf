//! Client behavior against an in-process fake segmenter endpoint.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use pseg_client::{ClientError, SegmenterClient};
use pseg_core::{SegmentRequest, Segmentation};
use std::time::Duration;
use tokio_test::assert_ok;

/// Serves `router` on an ephemeral loopback port and returns the port.
async fn spawn_fake_server(router: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve fake segmenter");
    });
    port
}

/// Echo-style handler: one segmentation per input text, in order.
async fn echo_segments(Json(request): Json<SegmentRequest>) -> Json<Vec<Segmentation>> {
    let results = request
        .texts
        .iter()
        .map(|text| Segmentation {
            segments: vec![text.clone()],
            mask: "0".repeat(text.chars().count()),
        })
        .collect();
    Json(results)
}

#[tokio::test]
async fn segment_round_trips_texts_in_order() {
    let port = spawn_fake_server(Router::new().route("/segment", post(echo_segments))).await;
    let client = SegmenterClient::new("127.0.0.1", port);

    let request = SegmentRequest::new(
        "en",
        vec!["Hello. My name is John.".to_string(), "And you?".to_string()],
    );
    let results = tokio_test::assert_ok!(client.segment(&request).await);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].segments[0], "Hello. My name is John.");
    assert_eq!(results[1].segments[0], "And you?");
    assert_eq!(results[1].mask.chars().count(), "And you?".chars().count());
}

#[tokio::test]
async fn server_error_surfaces_status_and_body() {
    let failing = Router::new().route(
        "/segment",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "segmenter exploded") }),
    );
    let port = spawn_fake_server(failing).await;
    let client = SegmenterClient::new("127.0.0.1", port);

    let request = SegmentRequest::new("en", vec!["Hello".to_string()]);
    let error = client.segment(&request).await.unwrap_err();

    match error {
        ClientError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("segmenter exploded"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_a_payload_error() {
    let garbled = Router::new().route("/segment", post(|| async { "<html>not json</html>" }));
    let port = spawn_fake_server(garbled).await;
    let client = SegmenterClient::new("127.0.0.1", port);

    let request = SegmentRequest::new("en", vec!["Hello".to_string()]);
    let error = client.segment(&request).await.unwrap_err();

    assert!(matches!(error, ClientError::Payload(_)), "got {error:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind and immediately drop a listener so the port is known closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let client = SegmenterClient::new("127.0.0.1", port);
    let request = SegmentRequest::new("en", vec!["Hello".to_string()]);
    let error = client.segment(&request).await.unwrap_err();

    assert!(matches!(error, ClientError::Transport(_)), "got {error:?}");
}

#[tokio::test]
async fn slow_server_hits_the_request_timeout() {
    let slow = Router::new().route(
        "/segment",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(Vec::<Segmentation>::new())
        }),
    );
    let port = spawn_fake_server(slow).await;
    let client = SegmenterClient::with_timeout("127.0.0.1", port, Duration::from_millis(200));

    let request = SegmentRequest::new("en", vec!["Hello".to_string()]);
    let error = client.segment(&request).await.unwrap_err();

    match error {
        ClientError::Transport(inner) => assert!(inner.is_timeout(), "{inner:?}"),
        other => panic!("expected Transport timeout, got {other:?}"),
    }
}
