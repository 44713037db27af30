//! Shared test helpers for attendance server integration tests
//!
//! Provides wiremock-based mock server setup. Each helper mounts the
//! necessary mock endpoints; [`setup_server`] returns a service pointing
//! at the mock server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollcall_core::domain::{ClientId, Seat, SubjectRef};
use rollcall_remote::{HttpAttendanceService, KioskClient};

/// Starts a mock server and returns a (MockServer, service) tuple.
pub async fn setup_server() -> (MockServer, HttpAttendanceService) {
    let server = MockServer::start().await;
    let service = service_for(&server, Duration::from_secs(2));
    (server, service)
}

/// Builds a service for `server` with the given request timeout.
pub fn service_for(server: &MockServer, timeout: Duration) -> HttpAttendanceService {
    let client = KioskClient::new(&server.uri(), ClientId::new(), timeout)
        .expect("failed to build client");
    HttpAttendanceService::new(Arc::new(client), Duration::from_millis(500))
}

/// Mounts a POST endpoint answering with `status` and a JSON body.
pub async fn mount_action(
    server: &MockServer,
    route: &str,
    status: u16,
    body: serde_json::Value,
) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub fn subject() -> SubjectRef {
    SubjectRef::new("S42").unwrap()
}

pub fn seat() -> Seat {
    Seat::new("12").unwrap()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap()
}

/// Serves `text/event-stream` responses written as separate HTTP chunks.
///
/// Each connection receives `chunks` in order with a short pause between
/// them, so the client sees them as distinct reads. The connection is then
/// held open. Returns the base URL.
pub async fn serve_chunked_stream(chunks: Vec<Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            content-type: text/event-stream\r\n\
                            transfer-encoding: chunked\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for chunk in chunks {
                    let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
                    frame.extend_from_slice(&chunk);
                    frame.extend_from_slice(b"\r\n");
                    if socket.write_all(&frame).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    format!("http://{addr}")
}
