//! Integration tests for action submissions
//!
//! Verifies request bodies and headers, acknowledgement decoding and the
//! mapping of server statuses onto RemoteError.

use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

use rollcall_core::domain::{ActionKind, RecordId, TempId};
use rollcall_core::outcome::{classify, Outcome};
use rollcall_core::ports::{
    CheckInRequest, CheckOutRequest, IAttendanceService, RemoteError, Submission, ToggleRequest,
};
use rollcall_remote::{CLIENT_ID_HEADER, IDEMPOTENCY_KEY_HEADER, REPLAY_HEADER};

use crate::common;

fn check_in() -> CheckInRequest {
    CheckInRequest {
        subject: common::subject(),
        seat: common::seat(),
        entry_time: common::t0(),
    }
}

#[tokio::test]
async fn test_check_in_sends_payload_and_returns_log_id() {
    let (server, service) = common::setup_server().await;
    let action_id = TempId::new();

    Mock::given(method("POST"))
        .and(path("/api/check_in"))
        .and(header_exists(CLIENT_ID_HEADER))
        .and(header(IDEMPOTENCY_KEY_HEADER, action_id.to_string().as_str()))
        .and(body_partial_json(serde_json::json!({
            "system_id": "S42",
            "seat_number": "12",
            "entry_time": "2026-04-01T08:30:00+00:00",
            "action_id": action_id.to_string(),
            "replay": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "message": "checked in",
            "log_id": 789
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = service
        .submit_check_in(&check_in(), Submission::direct(action_id))
        .await
        .expect("check-in failed");

    assert_eq!(ack.record_id, Some(RecordId::new(789)));
    assert_eq!(ack.opened_record(ActionKind::CheckIn), Some(RecordId::new(789)));
    assert_eq!(ack.message.as_deref(), Some("checked in"));
}

#[tokio::test]
async fn test_replay_sets_replay_header() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("POST"))
        .and(path("/api/qr_process"))
        .and(header(REPLAY_HEADER, "1"))
        .and(body_partial_json(serde_json::json!({"replay": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "log_id": 5,
            "action": "check_out"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = service
        .submit_toggle(
            &ToggleRequest {
                subject: common::subject(),
                at: common::t0(),
            },
            Submission::replay(TempId::new()),
        )
        .await
        .unwrap();

    assert_eq!(ack.applied, Some(ActionKind::CheckOut));
    assert_eq!(ack.opened_record(ActionKind::Toggle), None);
}

#[tokio::test]
async fn test_check_out_without_server_id_omits_log_id() {
    let (server, service) = common::setup_server().await;
    common::mount_action(
        &server,
        "/api/check_out",
        200,
        serde_json::json!({"status": "success"}),
    )
    .await;

    service
        .submit_check_out(
            &CheckOutRequest {
                subject: common::subject(),
                record: None,
                exit_time: common::t0(),
            },
            Submission::replay(TempId::new()),
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("log_id").is_none());
    assert_eq!(body["system_id"], "S42");
}

#[tokio::test]
async fn test_check_out_with_server_id_sends_log_id() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("POST"))
        .and(path("/api/check_out"))
        .and(body_partial_json(serde_json::json!({"log_id": 789})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    service
        .submit_check_out(
            &CheckOutRequest {
                subject: common::subject(),
                record: Some(RecordId::new(789)),
                exit_time: common::t0(),
            },
            Submission::direct(TempId::new()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_conflict_maps_to_status_409() {
    let (server, service) = common::setup_server().await;
    common::mount_action(
        &server,
        "/api/check_in",
        409,
        serde_json::json!({"status": "error", "message": "already checked in"}),
    )
    .await;

    let result = service
        .submit_check_in(&check_in(), Submission::replay(TempId::new()))
        .await;

    assert_eq!(
        result,
        Err(RemoteError::Status {
            status: 409,
            message: "already checked in".into()
        })
    );
    assert!(matches!(classify(&result), Outcome::Conflict { .. }));
}

#[tokio::test]
async fn test_validation_error_is_rejected() {
    let (server, service) = common::setup_server().await;
    common::mount_action(
        &server,
        "/api/check_in",
        400,
        serde_json::json!({"status": "error", "message": "missing seat"}),
    )
    .await;

    let result = service
        .submit_check_in(&check_in(), Submission::replay(TempId::new()))
        .await;

    assert!(matches!(
        classify(&result),
        Outcome::Rejected { status: 400, ref message } if message == "missing seat"
    ));
}

#[tokio::test]
async fn test_server_error_with_plain_body_is_transient() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("POST"))
        .and(path("/api/check_in"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = service
        .submit_check_in(&check_in(), Submission::direct(TempId::new()))
        .await;

    assert_eq!(result.as_ref().unwrap_err().status(), Some(503));
    assert!(matches!(classify(&result), Outcome::Transient { .. }));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let (server, _) = common::setup_server().await;
    let service = common::service_for(&server, Duration::from_millis(100));

    Mock::given(method("POST"))
        .and(path("/api/check_in"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = service
        .submit_check_in(&check_in(), Submission::direct(TempId::new()))
        .await;

    assert_eq!(result, Err(RemoteError::Timeout));
}

#[tokio::test]
async fn test_undecodable_success_body_counts_as_applied() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("POST"))
        .and(path("/api/check_in"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let ack = service
        .submit_check_in(&check_in(), Submission::direct(TempId::new()))
        .await
        .unwrap();

    assert!(ack.record_id.is_none());
}

#[tokio::test]
async fn test_unreachable_server_is_connect_error() {
    let (server, service) = common::setup_server().await;
    drop(server);

    let result = service
        .submit_check_in(&check_in(), Submission::direct(TempId::new()))
        .await;

    assert!(matches!(
        result,
        Err(RemoteError::Connect(_)) | Err(RemoteError::Transport(_))
    ));
    assert!(matches!(classify(&result), Outcome::Transient { .. }));
}
