//! Verification request handlers
//!
//! Open requests, look them up, deliver verdicts as the authorized callback,
//! and start an attestation relay on the requester's behalf.

use authentichain_core::{
    primitives::{u256_serde, unix_now},
    Address, AttestationRequest, Coordinates, RegistryError, RequestId,
    RequestState, SecretsRef, Verdict, VerificationRequest, U256,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::{AppState, AttestationStatus};
use crate::validation::{decode_verdict_word, parse_address, parse_request_id};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequestBody {
    /// Payment attached to the request (decimal, hex string or number)
    #[serde(default, with = "u256_serde::option")]
    pub value: Option<U256>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequestResponse {
    pub request_id: RequestId,
    pub requester: Address,
    #[serde(with = "u256_serde")]
    pub paid: U256,
}

/// A request as seen now, with expiry applied.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: RequestId,
    pub requester: Address,
    pub state: RequestState,
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationStatus>,
}

impl RequestView {
    fn new(
        request: &VerificationRequest,
        state: RequestState,
        attestation: Option<AttestationStatus>,
    ) -> Self {
        Self {
            id: request.id,
            requester: request.requester,
            state,
            created_at: request.created_at,
            fulfilled_at: request.fulfilled_at,
            attestation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FulfillBody {
    /// Verdict as a `0x`-prefixed 32-byte big-endian word
    pub verdict: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillResponse {
    pub request_id: RequestId,
    pub verdict: Verdict,
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestBody {
    pub cell_towers: serde_json::Value,
    pub reported: Coordinates,
    pub claimed: Coordinates,
    #[serde(default)]
    pub secrets: SecretsRef,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestResponse {
    pub request_id: RequestId,
    pub status: AttestationStatus,
    pub source: String,
}

/// POST /requests - Pay the fee and open a verification request
pub async fn open_request_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<OpenRequestBody>,
) -> Result<(StatusCode, Json<OpenRequestResponse>), ApiError> {
    let paid = body.value.unwrap_or_default();
    let ctx = caller.context().with_value(paid);

    let request_id = state.registry.lock().await.request_verification(&ctx)?;

    Ok((
        StatusCode::CREATED,
        Json(OpenRequestResponse {
            request_id,
            requester: caller.0,
            paid,
        }),
    ))
}

/// GET /requests/{id} - Look up a request
pub async fn get_request_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RequestView>, ApiError> {
    let id = parse_request_id(&id)?;
    let now = unix_now();

    let registry = state.registry.lock().await;
    let request = registry.request(id)?;
    let effective = registry.request_state(id, now)?;

    Ok(Json(RequestView::new(
        request,
        effective,
        state.attestation_status(id),
    )))
}

/// GET /requests/latest/{address} - Most recent request opened by an address
pub async fn latest_request_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RequestView>, ApiError> {
    let address = parse_address(&address)?;
    let now = unix_now();

    let registry = state.registry.lock().await;
    let id = registry.latest_request(&address)?;
    let request = registry.request(id)?;
    let effective = registry.request_state(id, now)?;

    Ok(Json(RequestView::new(
        request,
        effective,
        state.attestation_status(id),
    )))
}

/// POST /requests/{id}/fulfill - Deliver a verdict (authorized callback only)
pub async fn fulfill_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<FulfillBody>,
) -> Result<Json<FulfillResponse>, ApiError> {
    let id = parse_request_id(&id)?;
    let word = decode_verdict_word(&body.verdict)?;

    state
        .registry
        .lock()
        .await
        .fulfill_encoded(&caller.context(), id, &word)?;

    // The registry accepted the word, so it is exactly 32 bytes.
    let verdict = Verdict::from_word(&word)?;
    Ok(Json(FulfillResponse {
        request_id: id,
        verdict,
        accepted: verdict.is_accepted(),
    }))
}

/// POST /requests/{id}/attest - Start the attestation relay for a pending request
///
/// Only the requester may start it. Returns 202 immediately; progress is
/// reported under `attestation` by `GET /requests/{id}`.
pub async fn attest_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<AttestBody>,
) -> Result<(StatusCode, Json<AttestResponse>), ApiError> {
    let id = parse_request_id(&id)?;
    let relay = state.relay()?;

    {
        let ctx = caller.context();
        let registry = state.registry.lock().await;
        let request = registry.request(id)?;
        if request.requester != caller.0 {
            return Err(RegistryError::NotRequester {
                id,
                caller: caller.0,
            }
            .into());
        }
        match registry.request_state(id, ctx.timestamp)? {
            RequestState::Pending => {}
            RequestState::Expired => return Err(RegistryError::Expired(id).into()),
            _ => return Err(RegistryError::AlreadyFulfilled(id).into()),
        }
        state.prune_attestations(&registry, ctx.timestamp);
    }

    let request = AttestationRequest {
        request_id: id,
        cell_towers: body.cell_towers,
        reported: body.reported,
        claimed: body.claimed,
    };
    request.args()?;

    let source = state
        .attestation
        .as_ref()
        .map(|client| client.source_id().to_string())
        .unwrap_or_default();
    state.attestations.insert(id, AttestationStatus::Submitted);

    let tracker = state.attestations.clone();
    let secrets = body.secrets;
    tokio::spawn(async move {
        let status = match relay.relay(&request, &secrets).await {
            Ok(verdict) => AttestationStatus::Delivered { verdict },
            Err(e) => {
                tracing::warn!(request_id = %id, error = %e, "Attestation relay failed");
                AttestationStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        tracker.insert(id, status);
    });

    tracing::info!(request_id = %id, source = %source, "Attestation relay started");

    Ok((
        StatusCode::ACCEPTED,
        Json(AttestResponse {
            request_id: id,
            status: AttestationStatus::Submitted,
            source,
        }),
    ))
}
