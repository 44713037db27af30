//! Integration tests for the live-update channel

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, ResponseTemplate};

use rollcall_core::domain::ClientId;
use rollcall_core::ports::ChangeNotice;
use rollcall_remote::{KioskClient, LiveUpdateChannel};

use crate::common;

const UPDATE_STREAM: &str = ": hello\n\ndata: {\"type\":\"update\"}\n\ndata: {\"type\":\"ping\"}\n\n";

fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.to_string())
}

#[tokio::test]
async fn test_forwards_update_notices() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .and(query_param_contains("client_id", "-"))
        .respond_with(event_stream(UPDATE_STREAM))
        .mount(&server)
        .await;

    let channel = LiveUpdateChannel::new(
        service.client().clone(),
        Duration::from_millis(20),
        Duration::from_millis(100),
    );
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(channel.run(tx, cancel.clone()));

    let notice = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no notice received")
        .expect("channel closed");
    assert!(notice.is_update());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("channel did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_reconnects_after_failure() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(event_stream(UPDATE_STREAM))
        .mount(&server)
        .await;

    let channel = LiveUpdateChannel::new(
        service.client().clone(),
        Duration::from_millis(10),
        Duration::from_millis(50),
    );
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    tokio::spawn(channel.run(tx, cancel.clone()));

    let notice = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no notice after reconnect")
        .expect("channel closed");
    assert!(notice.is_update());
    cancel.cancel();

    let attempts = server.received_requests().await.unwrap().len();
    assert!(attempts >= 3, "expected reconnect attempts, saw {attempts}");
}

#[tokio::test]
async fn test_stops_when_receiver_dropped() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .respond_with(event_stream(UPDATE_STREAM))
        .mount(&server)
        .await;

    let channel = LiveUpdateChannel::new(
        service.client().clone(),
        Duration::from_millis(10),
        Duration::from_millis(10),
    );
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    tokio::time::timeout(Duration::from_secs(5), channel.run(tx, CancellationToken::new()))
        .await
        .expect("channel kept running without a receiver");
}

/// Collects `count` notices from a channel subscribed to `base_url`
async fn collect_notices(base_url: &str, count: usize) -> Vec<ChangeNotice> {
    let client = KioskClient::new(base_url, ClientId::new(), Duration::from_secs(2)).unwrap();
    let channel = LiveUpdateChannel::new(
        Arc::new(client),
        Duration::from_millis(20),
        Duration::from_millis(100),
    );
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(channel.run(tx, cancel.clone()));

    let mut notices = Vec::new();
    while notices.len() < count {
        let notice = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no notice received")
            .expect("channel closed");
        notices.push(notice);
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("channel did not stop")
        .unwrap();
    notices
}

#[tokio::test]
async fn test_multibyte_text_split_across_chunks() {
    let event = "data: {\"type\":\"update\",\"message\":\"入室\"}\n\n".as_bytes();
    let cut = event.iter().position(|&b| b >= 0x80).unwrap() + 1;
    let base_url =
        common::serve_chunked_stream(vec![event[..cut].to_vec(), event[cut..].to_vec()]).await;

    let notices = collect_notices(&base_url, 1).await;
    assert_eq!(notices[0].message.as_deref(), Some("入室"));
}

#[tokio::test]
async fn test_split_frames_crlf_and_multiline_data() {
    let chunks = vec![
        b": keep-alive\r\n\r\nda".to_vec(),
        b"ta: {\"type\":\r\ndata: \"update\"}\r\n".to_vec(),
        b"\r\nevent: message\r\nid: 4\r\ndata: {\"type\":\"update\",\"message\":\"x\"}\r\n\r\n".to_vec(),
    ];
    let base_url = common::serve_chunked_stream(chunks).await;

    let notices = collect_notices(&base_url, 2).await;
    assert!(notices.iter().all(ChangeNotice::is_update));
    assert!(notices[0].message.is_none());
    assert_eq!(notices[1].message.as_deref(), Some("x"));
}
