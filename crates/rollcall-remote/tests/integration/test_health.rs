//! Integration tests for the health probe

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollcall_core::ports::{IHealthProbe, RemoteError};
use rollcall_remote::{HttpAttendanceService, KioskClient, ServerRoutes};

use crate::common;

#[tokio::test]
async fn test_probe_succeeds_on_2xx() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(service.probe().await.is_ok());
}

#[tokio::test]
async fn test_probe_fails_on_server_error() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    assert_eq!(service.probe().await.unwrap_err().status(), Some(502));
}

#[tokio::test]
async fn test_probe_is_time_bounded() {
    let (server, service) = common::setup_server().await;

    // Probe timeout in the helper is 500ms.
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    assert_eq!(service.probe().await, Err(RemoteError::Timeout));
}

#[tokio::test]
async fn test_default_probe_hits_settings_route() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(service.probe().await.is_ok());
}

#[tokio::test]
async fn test_probe_uses_configured_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = KioskClient::new(
        &server.uri(),
        rollcall_core::domain::ClientId::new(),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_routes(ServerRoutes {
        health: "/healthz".to_string(),
        events: "/api/stream".to_string(),
    });
    let service = HttpAttendanceService::new(Arc::new(client), Duration::from_millis(500));

    assert!(service.probe().await.is_ok());
}
