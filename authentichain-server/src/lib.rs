//! AuthentiChain Server Library - REST API over the commitment registry
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::Config;
pub use error::ApiError;
pub use identity::{Caller, CallerAuth};
pub use routes::{create_router, create_router_with_config};
pub use state::{AppState, AttestationStatus};
