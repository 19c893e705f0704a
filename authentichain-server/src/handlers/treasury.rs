//! Registry-wide handlers
//!
//! Registry parameters, fee withdrawal and the audit event log.

use authentichain_core::{
    primitives::u256_serde, Address, DataEncoding, RegistryEvent, RequestGate, Withdrawal, U256,
};
use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    pub owner: Address,
    pub authorized_callback: Address,
    #[serde(with = "u256_serde")]
    pub fee: U256,
    #[serde(with = "u256_serde")]
    pub balance: U256,
    pub gate: RequestGate,
    pub data_encoding: DataEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_ttl_secs: Option<u64>,
    pub commitments: usize,
}

/// GET /registry - Registry parameters and balance
pub async fn registry_info_handler(State(state): State<AppState>) -> Json<RegistryInfo> {
    let registry = state.registry.lock().await;
    Json(RegistryInfo {
        owner: registry.owner(),
        authorized_callback: registry.authorized_callback(),
        fee: registry.fee(),
        balance: registry.balance(),
        gate: registry.gate(),
        data_encoding: registry.data_encoding(),
        request_ttl_secs: registry.request_ttl_secs(),
        commitments: registry.commitment_count(),
    })
}

/// POST /withdraw - Move the whole balance to the owner (owner only)
pub async fn withdraw_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Withdrawal>, ApiError> {
    let withdrawal = state.registry.lock().await.withdraw(&caller.context())?;
    Ok(Json(withdrawal))
}

/// GET /events - Audit event log, oldest first
pub async fn events_handler(State(state): State<AppState>) -> Json<Vec<RegistryEvent>> {
    Json(state.registry.lock().await.events().to_vec())
}
