// Integration tests for `HomeComClient` and `OAuthSession` using wiremock.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homecom_api::auth::{OAuthEndpoints, OAuthSession, TokenPair};
use homecom_api::transport::TransportConfig;
use homecom_api::{Error, HomeComClient};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN_PATH: &str = "/auth/connect/token";
const FAR_FUTURE: i64 = 4_102_444_800; // 2100-01-01

fn forged_jwt(exp: i64, marker: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "jti": marker }).to_string());
    format!("header.{payload}.signature")
}

fn pair(access: &str) -> TokenPair {
    TokenPair {
        access: SecretString::from(access.to_owned()),
        refresh: SecretString::from("refresh-1".to_owned()),
    }
}

async fn setup(initial_access: &str) -> (MockServer, HomeComClient) {
    let server = MockServer::start().await;
    let token_url = Url::parse(&format!("{}{TOKEN_PATH}", server.uri())).unwrap();
    let session = Arc::new(OAuthSession::new(
        reqwest::Client::new(),
        OAuthEndpoints::with_token_url(token_url),
        pair(initial_access),
    ));
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        HomeComClient::with_base_url(base_url, session, &TransportConfig::default()).unwrap();
    (server, client)
}

fn token_response(access: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": "refresh-2",
        "expires_in": 3600,
        "token_type": "Bearer",
    }))
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_devices() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "deviceId": "100200300", "deviceType": "rac" },
            { "deviceId": "100200301", "deviceType": "k40" },
            { "deviceId": "100200302", "deviceType": "somethingnew" },
        ])))
        .mount(&server)
        .await;

    let devices = client.get_devices().await.unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].device_id, "100200300");
    assert_eq!(devices[0].device_type, homecom_api::DeviceType::Rac);
    assert_eq!(devices[1].device_type, homecom_api::DeviceType::K40);
    assert_eq!(devices[2].device_type, homecom_api::DeviceType::Generic);
}

#[tokio::test]
async fn test_get_resource_reference_list() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("GET"))
        .and(path(
            "/gateways/dev1/resource/airConditioning/standardFunctions",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "references": [
                { "id": "/airConditioning/temperatureSetpoint", "value": 21,
                  "minValue": 16, "maxValue": 30 },
            ]
        })))
        .mount(&server)
        .await;

    let payload = client
        .get_resource("dev1", "/airConditioning/standardFunctions")
        .await
        .unwrap();

    assert_eq!(payload.references().len(), 1);
    let setpoint: homecom_api::Reference =
        serde_json::from_value(payload.references()[0].clone()).unwrap();
    assert_eq!(setpoint.value, Some(json!(21)));
    assert_eq!(setpoint.min_value, Some(16.0));
    assert_eq!(setpoint.max_value, Some(30.0));
}

#[tokio::test]
async fn test_put_value_sends_value_envelope() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("PUT"))
        .and(path("/gateways/dev1/resource/airConditioning/acControl"))
        .and(body_json(json!({ "value": "on" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .put_value("dev1", "/airConditioning/acControl", json!("on"))
        .await
        .unwrap();
}

// ── Token lifecycle tests ───────────────────────────────────────────

#[tokio::test]
async fn test_valid_token_performs_no_exchange() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(&forged_jwt(FAR_FUTURE, "b")))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    client.get_devices().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_refreshes_exactly_once() {
    let fresh = forged_jwt(FAR_FUTURE, "fresh");
    let (server, client) = setup(&forged_jwt(1, "expired")).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(&fresh))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // First call exchanges the refresh token; the second reuses the new
    // access token without touching the token endpoint again.
    client.get_devices().await.unwrap();
    client.get_devices().await.unwrap();
}

#[tokio::test]
async fn test_401_triggers_one_refresh_and_one_retry() {
    let initial = forged_jwt(FAR_FUTURE, "initial");
    let fresh = forged_jwt(FAR_FUTURE, "fresh");
    let (server, client) = setup(&initial).await;

    // First attempt is rejected despite a valid-looking exp claim.
    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(&fresh))
        .expect(1)
        .mount(&server)
        .await;

    // The retry must carry the refreshed bearer token.
    Mock::given(method("GET"))
        .and(path("/gateways"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "deviceId": "1", "deviceType": "rac" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.get_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_second_401_is_not_retried() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(&forged_jwt(FAR_FUTURE, "b")))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.get_devices().await;
    assert!(
        matches!(result, Err(Error::TokenRejected)),
        "expected TokenRejected, got: {result:?}"
    );
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_gateway_error_surfaces_status() {
    let (server, client) = setup(&forged_jwt(FAR_FUTURE, "a")).await;

    Mock::given(method("GET"))
        .and(path("/gateways/dev1/resource/gateway/versionFirmware"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let result = client.get_resource("dev1", "/gateway/versionFirmware").await;

    match result {
        Err(Error::Api { status, ref path, .. }) => {
            assert_eq!(status, 504);
            assert_eq!(path, "/gateways/dev1/resource/gateway/versionFirmware");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_refresh_surfaces_auth_error() {
    let (server, client) = setup(&forged_jwt(1, "expired")).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let result = client.get_devices().await;

    assert!(
        matches!(result, Err(Error::Auth { .. })),
        "expected Auth error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_token_rotation_is_observable() {
    let fresh = forged_jwt(FAR_FUTURE, "fresh");
    let (server, client) = setup(&forged_jwt(1, "expired")).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(&fresh))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut rotations = client.session().subscribe();
    client.get_devices().await.unwrap();

    // The refreshed pair is published for persistence.
    assert!(rotations.has_changed().unwrap());
    let pair = rotations.borrow_and_update().clone();
    use secrecy::ExposeSecret;
    assert_eq!(pair.access.expose_secret(), fresh);
    assert_eq!(pair.refresh.expose_secret(), "refresh-2");
}
