//! API integration tests for authentichain-server.
//!
//! These drive the router end to end with JSON requests: opening and
//! fulfilling verification requests, gated commits, authentication and
//! the attestation relay backed by the mock client.

use std::sync::Arc;
use std::time::Duration;

use authentichain_core::{
    Address, AttestationClient, MockAttestation, Registry, RegistryConfig, RequestId, Verdict,
    U256,
};
use authentichain_server::{create_router, AppState, CallerAuth};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use tower::ServiceExt;

const OWNER: &str = "0x00000000000000000000000000000000000000aa";
const CALLBACK: &str = "0x00000000000000000000000000000000000000cb";
const ALICE: &str = "0x00000000000000000000000000000000000000a1";
const BOB: &str = "0x00000000000000000000000000000000000000b0";
const MALLORY: &str = "0x00000000000000000000000000000000000000ee";

const JWT_SECRET: &[u8] = b"api-integration-secret";

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn token(address: &str) -> String {
    CallerAuth::new(JWT_SECRET).issue(addr(address), 300).unwrap()
}

fn gated_app(fee: u64) -> Router {
    let config = RegistryConfig::new(addr(OWNER), addr(CALLBACK)).with_fee(U256::from(fee));
    let state = AppState::new(Registry::new(config), None)
        .with_caller_auth(CallerAuth::new(JWT_SECRET));
    create_router(state)
}

fn mock_state(mock: Arc<MockAttestation>) -> AppState {
    let config = RegistryConfig::new(addr(OWNER), addr(CALLBACK));
    let client: Arc<dyn AttestationClient> = mock;
    AppState::new(Registry::new(config), Some(client)).with_caller_auth(CallerAuth::new(JWT_SECRET))
}

fn app_with_mock(mock: Arc<MockAttestation>) -> Router {
    create_router(mock_state(mock))
}

fn metadata() -> Value {
    json!({
        "gpsLongitude": "a",
        "gpsLatitude": "b",
        "gpsLongitudeRef": "c",
        "gpsLatitudeRef": "d",
        "timestamp": 1000,
        "size": 100,
        "format": "f"
    })
}

fn accepted_word() -> String {
    format!("0x{}", hex::encode(Verdict::ACCEPTED.to_word()))
}

fn rejected_word(code: u64) -> String {
    format!("0x{}", hex::encode(Verdict::rejected(code).to_word()))
}

/// Send a request, authenticated as `caller` when given.
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let headers: Vec<(&str, String)> = caller
        .map(|caller| vec![("Authorization", format!("Bearer {}", token(caller)))])
        .unwrap_or_default();
    send_with_headers(app, method, uri, &headers, body).await
}

async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, String)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn open_request(app: &Router, caller: &str, value: u64) -> u64 {
    let (status, json) = send(
        app,
        "POST",
        "/requests",
        Some(caller),
        Some(json!({ "value": value })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "open failed: {json}");
    json["requestId"].as_u64().unwrap()
}

async fn fulfill(app: &Router, id: u64, word: String) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/requests/{id}/fulfill"),
        Some(CALLBACK),
        Some(json!({ "verdict": word })),
    )
    .await
}

async fn commit(app: &Router, caller: &str, data: &[u8], request_id: Option<u64>) -> (StatusCode, Value) {
    let mut body = json!({
        "metadata": metadata(),
        "data": BASE64.encode(data),
    });
    if let Some(id) = request_id {
        body["requestId"] = json!(id);
    }
    send(app, "POST", "/commitments", Some(caller), Some(body)).await
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_reports_degraded_without_attestation() {
    let app = gated_app(0);
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["attestation_available"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_health_reports_mock_source() {
    let app = app_with_mock(Arc::new(MockAttestation::accepting()));
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["attestation_source"].as_str().unwrap().contains("Mock"));
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let app = gated_app(0);
    let (status, _) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Gated Commit Flow
// ============================================================================

#[tokio::test]
async fn test_full_gated_flow() {
    let app = gated_app(0);

    let id = open_request(&app, ALICE, 0).await;
    assert_eq!(id, 1);

    let (status, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"]["status"], "pending");
    assert_eq!(json["requester"], ALICE);

    let (status, json) = fulfill(&app, id, accepted_word()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["accepted"], true);

    let (status, json) = commit(&app, ALICE, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::CREATED, "commit failed: {json}");
    assert_eq!(
        json["metadataDigest"],
        "0xb589cf2c80e4485a650e55cfb45b20dc3409cd2d6c81323187e4179e93a0a860"
    );
    assert_eq!(
        json["dataDigest"],
        "0x8f54f1c2d0eb5771cd5bf67a6689fcd6eed9444d91a39e5ef32a9b4ae5ca14ff"
    );

    let (_, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(json["state"]["status"], "consumed");

    let (status, json) = send(
        &app,
        "POST",
        "/authenticate",
        None,
        Some(json!({ "metadata": metadata(), "data": BASE64.encode(b"data") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["authentic"], true);

    let (_, json) = send(
        &app,
        "POST",
        "/authenticate",
        None,
        Some(json!({ "metadata": metadata(), "data": BASE64.encode(b"datA") })),
    )
    .await;
    assert_eq!(json["authentic"], false);
}

#[tokio::test]
async fn test_commit_without_request_is_rejected() {
    let app = gated_app(0);
    let (status, json) = commit(&app, ALICE, b"data", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "REQUEST_REQUIRED");
}

#[tokio::test]
async fn test_commit_on_pending_request_is_conflict() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = commit(&app, ALICE, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "NOT_FULFILLED");
}

#[tokio::test]
async fn test_rejected_verdict_consumes_request() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = fulfill(&app, id, rejected_word(2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["accepted"], false);

    let (status, json) = commit(&app, ALICE, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "LOCATION_NOT_VERIFIED");

    let (_, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(json["state"]["status"], "consumed");

    let (status, _) = send(
        &app,
        "POST",
        "/data-digest",
        None,
        Some(json!({ "metadata": metadata() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_commit_by_other_caller_is_forbidden() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;
    fulfill(&app, id, accepted_word()).await;

    let (status, json) = commit(&app, BOB, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "NOT_REQUESTER");
}

#[tokio::test]
async fn test_duplicate_commit_is_conflict() {
    let app = gated_app(0);

    let first = open_request(&app, ALICE, 0).await;
    fulfill(&app, first, accepted_word()).await;
    let (status, _) = commit(&app, ALICE, b"data", Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);

    let second = open_request(&app, ALICE, 0).await;
    fulfill(&app, second, accepted_word()).await;
    let (status, json) = commit(&app, ALICE, b"other", Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_COMMITTED");

    // The first commit's data is unchanged
    let (_, json) = send(
        &app,
        "POST",
        "/authenticate",
        None,
        Some(json!({ "metadata": metadata(), "data": BASE64.encode(b"data") })),
    )
    .await;
    assert_eq!(json["authentic"], true);
}

#[tokio::test]
async fn test_get_commitment_by_digest() {
    let app = create_router(AppState::new(
        Registry::new(RegistryConfig::ungated(addr(OWNER))),
        None,
    ));

    let (status, json) = commit(&app, ALICE, b"data", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let digest = json["metadataDigest"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "GET", &format!("/commitments/{digest}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metadata"]["format"], "f");
    assert_eq!(json["metadata"]["timestamp"], "1000");

    let unknown = format!("0x{}", "00".repeat(32));
    let (status, json) = send(&app, "GET", &format!("/commitments/{unknown}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_COMMITTED");
}

// ============================================================================
// Fulfillment & Request Lookup
// ============================================================================

#[tokio::test]
async fn test_fulfill_by_non_callback_is_forbidden() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/requests/{id}/fulfill"),
        Some(ALICE),
        Some(json!({ "verdict": accepted_word() })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "UNAUTHORIZED_CALLBACK");
}

#[tokio::test]
async fn test_fulfill_twice_is_conflict() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    fulfill(&app, id, accepted_word()).await;
    let (status, json) = fulfill(&app, id, rejected_word(1)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_FULFILLED");
}

#[tokio::test]
async fn test_malformed_verdict_leaves_request_pending() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = fulfill(&app, id, "0x01".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MALFORMED_VERDICT");

    let (_, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(json["state"]["status"], "pending");
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let app = gated_app(0);
    let (status, json) = send(&app, "GET", "/requests/42", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "UNKNOWN_REQUEST");

    let (status, _) = send(&app, "GET", "/requests/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_request_tracks_newest() {
    let app = gated_app(0);

    let (status, json) = send(&app, "GET", &format!("/requests/latest/{ALICE}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NO_REQUEST");

    open_request(&app, ALICE, 0).await;
    let second = open_request(&app, ALICE, 0).await;

    let (status, json) = send(&app, "GET", &format!("/requests/latest/{ALICE}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], second);
}

// ============================================================================
// Caller Identity
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = gated_app(0);
    let (status, json) = send(&app, "POST", "/requests", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_MISSING_TOKEN");
}

#[tokio::test]
async fn test_self_declared_address_is_not_an_identity() {
    let app = gated_app(0);
    let id = open_request(&app, MALLORY, 0).await;

    let headers = [("x-caller-address", CALLBACK.to_string())];
    let (status, json) = send_with_headers(
        &app,
        "POST",
        &format!("/requests/{id}/fulfill"),
        &headers,
        Some(json!({ "verdict": accepted_word() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_MISSING_TOKEN");

    let headers = [("x-caller-address", OWNER.to_string())];
    let (status, _) = send_with_headers(&app, "POST", "/withdraw", &headers, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(json["state"]["status"], "pending");
}

#[tokio::test]
async fn test_token_from_another_secret_is_unauthorized() {
    let app = gated_app(0);
    let id = open_request(&app, MALLORY, 0).await;

    let forged = CallerAuth::new(b"guessed-secret")
        .issue(addr(CALLBACK), 300)
        .unwrap();
    let headers = [("Authorization", format!("Bearer {forged}"))];
    let (status, json) = send_with_headers(
        &app,
        "POST",
        &format!("/requests/{id}/fulfill"),
        &headers,
        Some(json!({ "verdict": accepted_word() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_INVALID_TOKEN");

    let headers = [(
        "Authorization",
        format!(
            "Bearer {}",
            CallerAuth::new(b"guessed-secret").issue(addr(OWNER), 300).unwrap()
        ),
    )];
    let (status, json) = send_with_headers(&app, "POST", "/withdraw", &headers, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_INVALID_TOKEN");
}

#[tokio::test]
async fn test_valid_token_for_wrong_identity_is_forbidden() {
    let app = gated_app(0);
    let id = open_request(&app, MALLORY, 0).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/requests/{id}/fulfill"),
        Some(MALLORY),
        Some(json!({ "verdict": accepted_word() })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "UNAUTHORIZED_CALLBACK");

    let (status, json) = send(&app, "POST", "/withdraw", Some(MALLORY), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "NOT_OWNER");

    let (status, json) = commit(&app, MALLORY, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "NOT_FULFILLED");
}

#[tokio::test]
async fn test_unconfigured_authentication_is_unavailable() {
    let config = RegistryConfig::new(addr(OWNER), addr(CALLBACK));
    let app = create_router(AppState::new(Registry::new(config), None));

    let (status, json) = send(&app, "POST", "/requests", Some(ALICE), Some(json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");

    let (status, _) = send(&app, "GET", "/registry", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Fees & Withdrawal
// ============================================================================

#[tokio::test]
async fn test_underpaid_request_is_rejected() {
    let app = gated_app(100);
    let (status, json) = send(
        &app,
        "POST",
        "/requests",
        Some(ALICE),
        Some(json!({ "value": 99 })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "INSUFFICIENT_FEE");

    let (_, json) = send(&app, "GET", "/registry", None, None).await;
    assert_eq!(json["balance"], "0");
}

#[tokio::test]
async fn test_fees_accumulate_and_owner_withdraws() {
    let app = gated_app(100);
    open_request(&app, ALICE, 100).await;
    open_request(&app, BOB, 150).await;

    let (status, json) = send(&app, "GET", "/registry", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fee"], "100");
    assert_eq!(json["balance"], "250");
    assert_eq!(json["owner"], OWNER);

    let (status, json) = send(&app, "POST", "/withdraw", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "NOT_OWNER");

    let (status, json) = send(&app, "POST", "/withdraw", Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["amount"], "250");

    let (_, json) = send(&app, "GET", "/registry", None, None).await;
    assert_eq!(json["balance"], "0");
}

#[tokio::test]
async fn test_events_record_registry_activity() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;
    fulfill(&app, id, accepted_word()).await;
    commit(&app, ALICE, b"data", Some(id)).await;

    let (status, json) = send(&app, "GET", "/events", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let events = json.as_array().unwrap();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "verificationRequested",
            "verificationFulfilled",
            "commitmentSaved"
        ]
    );
}

// ============================================================================
// Attestation Relay
// ============================================================================

fn attest_body() -> Value {
    json!({
        "cellTowers": { "radioType": "lte", "cellTowers": [] },
        "reported": { "lat": 15.873072, "lng": -97.081776 },
        "claimed": { "lat": 15.873, "lng": -97.0817 },
    })
}

async fn wait_for_attestation(app: &Router, id: u64) -> Value {
    for _ in 0..50 {
        let (_, json) = send(app, "GET", &format!("/requests/{id}"), None, None).await;
        if json["attestation"]["status"] != "submitted" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("attestation for request {id} never completed");
}

#[tokio::test]
async fn test_attest_without_client_is_unavailable() {
    let app = gated_app(0);
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/requests/{id}/attest"),
        Some(ALICE),
        Some(attest_body()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_attest_relays_mock_verdict_then_commit() {
    let mock = Arc::new(MockAttestation::accepting());
    let state = mock_state(mock.clone());
    let app = create_router(state.clone());
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/requests/{id}/attest"),
        Some(ALICE),
        Some(attest_body()),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(json["source"].as_str().unwrap().contains("Mock"));

    let json = wait_for_attestation(&app, id).await;
    assert_eq!(json["attestation"]["status"], "delivered");
    assert_eq!(json["state"]["status"], "fulfilled");
    assert_eq!(mock.submission_count(), 1);

    let (status, _) = commit(&app, ALICE, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Progress of a consumed request is no longer tracked
    assert!(state.attestations.is_empty());
    let (_, json) = send(&app, "GET", &format!("/requests/{id}"), None, None).await;
    assert_eq!(json["state"]["status"], "consumed");
    assert!(json["attestation"].is_null());
}

#[tokio::test]
async fn test_attest_rejection_blocks_commit() {
    let state = mock_state(Arc::new(MockAttestation::rejecting(1)));
    let app = create_router(state.clone());
    let id = open_request(&app, ALICE, 0).await;

    send(
        &app,
        "POST",
        &format!("/requests/{id}/attest"),
        Some(ALICE),
        Some(attest_body()),
    )
    .await;

    let json = wait_for_attestation(&app, id).await;
    assert_eq!(json["attestation"]["verdict"], "1");

    let (status, _) = commit(&app, ALICE, b"data", Some(id)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(state.attestation_status(RequestId(id)).is_none());
}

#[tokio::test]
async fn test_attest_by_non_requester_is_forbidden() {
    let app = app_with_mock(Arc::new(MockAttestation::accepting()));
    let id = open_request(&app, ALICE, 0).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/requests/{id}/attest"),
        Some(BOB),
        Some(attest_body()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "NOT_REQUESTER");
}
