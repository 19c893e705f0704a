//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod commitments;
pub mod health;
pub mod requests;
pub mod treasury;

pub use crate::state::AppState;
pub use commitments::{
    authenticate_handler, commit_handler, data_digest_handler, get_commitment_handler,
    AuthenticateResponse, CommitResponse, CommitmentView, DataDigestResponse,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use requests::{
    attest_handler, fulfill_handler, get_request_handler, latest_request_handler,
    open_request_handler, AttestResponse, FulfillResponse, OpenRequestResponse, RequestView,
};
pub use treasury::{events_handler, registry_info_handler, withdraw_handler, RegistryInfo};
