//! Commitment handlers
//!
//! Commit data under metadata, read commitments back, and check candidate
//! data against them. Data travels base64-encoded and is never stored.

use authentichain_core::{Digest, Metadata, RequestId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use crate::validation::{decode_data, parse_digest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBody {
    pub metadata: Metadata,
    /// Base64-encoded payload
    pub data: String,
    /// Required unless the registry runs ungated
    #[serde(default)]
    pub request_id: Option<RequestId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub metadata_digest: Digest,
    pub data_digest: Digest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentView {
    pub metadata_digest: Digest,
    pub metadata: Metadata,
    pub data_digest: Digest,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateBody {
    pub metadata: Metadata,
    /// Base64-encoded candidate payload
    pub data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub authentic: bool,
    pub metadata_digest: Digest,
}

#[derive(Debug, Deserialize)]
pub struct DataDigestBody {
    pub metadata: Metadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDigestResponse {
    pub data_digest: Digest,
}

/// POST /commitments - Commit data under metadata
///
/// In the gated configuration `requestId` must name a fulfilled request
/// opened by the caller. A rejected verdict consumes the request and
/// returns 422.
pub async fn commit_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<CommitBody>,
) -> Result<(StatusCode, Json<CommitResponse>), ApiError> {
    let data = decode_data(&body.data)?;
    let ctx = caller.context();

    let mut registry = state.registry.lock().await;
    let result = registry.commit(&ctx, body.metadata, &data, body.request_id);
    // A rejected verdict consumes the request too, so settle either way.
    if let Some(request_id) = body.request_id {
        state.settle_attestation(&registry, request_id, ctx.timestamp);
    }
    let metadata_digest = result?;
    let metadata = registry.get_metadata(&metadata_digest)?.clone();
    let data_digest = registry.get_data_digest(&metadata)?;

    Ok((
        StatusCode::CREATED,
        Json(CommitResponse {
            metadata_digest,
            data_digest,
        }),
    ))
}

/// GET /commitments/{digest} - Read a commitment by metadata digest
pub async fn get_commitment_handler(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> Result<Json<CommitmentView>, ApiError> {
    let metadata_digest = parse_digest(&digest)?;

    let registry = state.registry.lock().await;
    let metadata = registry.get_metadata(&metadata_digest)?.clone();
    let data_digest = registry.get_data_digest(&metadata)?;

    Ok(Json(CommitmentView {
        metadata_digest,
        metadata,
        data_digest,
    }))
}

/// POST /authenticate - Check candidate data against a commitment
///
/// Returns `authentic: false` when nothing was committed under the metadata.
pub async fn authenticate_handler(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateBody>,
) -> Result<Json<AuthenticateResponse>, ApiError> {
    let data = decode_data(&body.data)?;
    let authentic = state
        .registry
        .lock()
        .await
        .authenticate(&body.metadata, &data);

    Ok(Json(AuthenticateResponse {
        authentic,
        metadata_digest: body.metadata.digest(),
    }))
}

/// POST /data-digest - Stored data digest for metadata
pub async fn data_digest_handler(
    State(state): State<AppState>,
    Json(body): Json<DataDigestBody>,
) -> Result<Json<DataDigestResponse>, ApiError> {
    let data_digest = state
        .registry
        .lock()
        .await
        .get_data_digest(&body.metadata)?;
    Ok(Json(DataDigestResponse { data_digest }))
}
