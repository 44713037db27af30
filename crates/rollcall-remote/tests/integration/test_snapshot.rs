//! Integration tests for the snapshot fetch

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use rollcall_core::domain::{RecordId, RecordRef};
use rollcall_core::ports::{IAttendanceService, RemoteError};

use crate::common;

#[tokio::test]
async fn test_fetch_snapshot_flattens_initial_data() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/initial_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "students": {
                "1": {"2": {"3": {
                    "system_id": 1020003, "name": "Hina", "grade": 1, "class": 2,
                    "student_number": 3, "is_present": true, "current_log_id": 789
                }}}
            },
            "attendees": [{
                "log_id": 789, "system_id": 1020003, "seat_number": "12",
                "entry_time": "2026-04-01T08:30:00+00:00", "exit_time": null,
                "name": "Hina", "grade": 1, "class": 2, "student_number": 3
            }],
            "version": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = service.fetch_snapshot().await.expect("fetch failed");

    assert_eq!(snapshot.version, Some(11));
    assert_eq!(snapshot.roster.len(), 1);
    assert_eq!(snapshot.roster[0].name, "Hina");
    assert_eq!(snapshot.records.len(), 1);
    let record = &snapshot.records[0];
    assert_eq!(record.record_id, RecordRef::Server(RecordId::new(789)));
    assert_eq!(record.subject.as_str(), "1020003");
    assert_eq!(record.entry_time, common::t0());
    assert!(record.exit_time.is_none());
    assert!(!record.pending);
}

#[tokio::test]
async fn test_fetch_snapshot_without_version() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/initial_data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"students": {}, "attendees": []})),
        )
        .mount(&server)
        .await;

    let snapshot = service.fetch_snapshot().await.unwrap();
    assert!(snapshot.version.is_none());
    assert!(snapshot.records.is_empty());
}

#[tokio::test]
async fn test_malformed_snapshot_is_decode_error() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/initial_data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(matches!(
        service.fetch_snapshot().await,
        Err(RemoteError::Decode(_))
    ));
}

#[tokio::test]
async fn test_snapshot_server_error() {
    let (server, service) = common::setup_server().await;

    Mock::given(method("GET"))
        .and(path("/api/initial_data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = service.fetch_snapshot().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}
