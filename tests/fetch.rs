mod common;

use std::time::{Duration, Instant};

use chrono::Utc;
use gardenlog::{fetch_snapshot, FetchError, SensorReader};

use common::*;

#[test]
fn snapshot_carries_the_served_values() {
    let server = StubServer::json(SENSOR_BODY);
    let before = Utc::now();

    let snapshot = fetch_snapshot(&server.url, Duration::from_secs(5)).unwrap();

    assert_eq!(snapshot.soil_moisture, 42.0);
    assert_eq!(snapshot.temperature, 21.5);
    assert_eq!(snapshot.humidity, 55.0);
    assert!(snapshot.timestamp >= before);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/");
}

#[test]
fn server_error_is_a_status_failure() {
    let server = StubServer::serve(vec![(503, r#"{"error":"sensor offline"}"#.to_string())]);
    match fetch_snapshot(&server.url, Duration::from_secs(5)) {
        Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[test]
fn missing_field_is_a_body_failure() {
    let server = StubServer::json(r#"{"soil":{"percent":42},"temperature":{"value":21.5}}"#);
    match fetch_snapshot(&server.url, Duration::from_secs(5)) {
        Err(FetchError::Body(err)) => assert!(err.to_string().contains("humidity")),
        other => panic!("expected body error, got {:?}", other),
    }
}

#[test]
fn unanswered_request_times_out() {
    let url = silent_server(Duration::from_secs(10));
    let reader = SensorReader::new(&url, Duration::from_millis(300)).unwrap();

    let started = Instant::now();
    let result = reader.fetch();

    assert!(started.elapsed() < Duration::from_secs(5));
    match result {
        Err(FetchError::Timeout { timeout, .. }) => {
            assert_eq!(timeout, Duration::from_millis(300))
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn refused_connection_is_a_request_failure() {
    match fetch_snapshot(&refused_url(), Duration::from_secs(5)) {
        Err(FetchError::Request { .. }) => {}
        other => panic!("expected request error, got {:?}", other),
    }
}
