//! Integration tests for the Neviweb HTTP client using wiremock.

use neviweb_client_rs::{
    DeviceApi, DeviceStatePatch, NeviwebClient, NeviwebClientError, NeviwebOptions, SetpointMode,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> NeviwebClient {
    let options = NeviwebOptions::builder()
        .base_url(format!("{}/api/", server.uri()))
        .session_id("session-123")
        .build()
        .unwrap();
    NeviwebClient::new(options).unwrap()
}

#[tokio::test]
async fn fetch_thermostat_attributes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device/42/attribute"))
        .and(header("Session-Id", "session-123"))
        .and(query_param_contains("attributes", "roomTemperature"))
        .and(query_param_contains("attributes", "setpointMode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "roomTemperature": {"value": 19.5, "error": null},
            "roomSetpoint": 21,
            "outputPercentDisplay": 100,
            "setpointMode": "manual"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client_for(&server).fetch_device("42").await.unwrap();
    assert_eq!(snapshot.room_temperature, Some(19.5));
    assert_eq!(snapshot.room_setpoint, Some(21.0));
    assert_eq!(snapshot.output_percent, Some(100.0));
    assert_eq!(
        snapshot.setpoint_mode,
        Some(SetpointMode::Other("manual".to_string()))
    );
}

#[tokio::test]
async fn fetch_switch_attributes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device/7/attribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "onOff": "off",
            "wattageInstant": 0
        })))
        .mount(&server)
        .await;

    let snapshot = client_for(&server).fetch_device("7").await.unwrap();
    assert!(!snapshot.is_thermostat());
    assert_eq!(snapshot.is_on(), Some(false));
}

#[tokio::test]
async fn update_sends_sparse_patch() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/device/42/attribute"))
        .and(header("Session-Id", "session-123"))
        .and(body_json(json!({"setpointMode": "off"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"setpointMode": "off"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .update_device("42", &DeviceStatePatch::setpoint_mode(SetpointMode::Off))
        .await
        .unwrap();
}

#[tokio::test]
async fn in_band_error_payload_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device/42/attribute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "USRSESSEXP"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_device("42").await.unwrap_err();
    match err {
        NeviwebClientError::ApiError { status, code } => {
            assert_eq!(status, 200);
            assert_eq!(code, "USRSESSEXP");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/device/42/attribute"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .update_device("42", &DeviceStatePatch::room_setpoint(20.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NeviwebClientError::ApiError { status: 503, .. }
    ));
}

#[tokio::test]
async fn unparseable_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device/42/attribute"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_device("42").await.unwrap_err();
    assert!(matches!(err, NeviwebClientError::DecodeError(_)));
}
