//! HTTPS JSON gateway to the attestation network.
//!
//! ## Protocol
//!
//! - `POST {base}/requests` with `{requestId, args, secrets}` acknowledges a
//!   submission with `{requestId}`
//! - `GET {base}/requests/{id}` reports `{status, response?, error?}` where
//!   `status` is `pending`, `fulfilled` or `failed` and `response` is the
//!   verdict as a `0x`-prefixed 32-byte word
//!
//! Transport errors and 429/502/503/504 are retried with exponential
//! backoff. A `pending` status is retried the same way until `max_wait`
//! elapses.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{AttestationClient, AttestationRequest, AttestationSource, SecretsRef};
use crate::error::{RegistryError, Result};
use crate::ledger::{RequestId, Verdict};

/// Default timeout for a single HTTP call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of retry attempts for a submission.
const MAX_RETRIES: u32 = 3;

/// Initial retry interval.
const INITIAL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound between two status polls.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// How long to wait for the network to fulfill a request.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token. Never printed.
    pub api_key: Option<String>,
    /// Timeout for a single HTTP call.
    pub timeout: Duration,
    /// Maximum retry attempts for transient submission errors.
    pub max_retries: u32,
    /// Total time to keep polling a pending request.
    pub max_wait: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `ATTESTATION_GATEWAY_URL`
    /// Optional: `ATTESTATION_GATEWAY_KEY`, `ATTESTATION_MAX_WAIT_SECS` (default 300)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("ATTESTATION_GATEWAY_URL").map_err(|_| {
            RegistryError::Attestation("ATTESTATION_GATEWAY_URL environment variable not set".into())
        })?;

        let mut config = Self::new(base_url);
        config.api_key = std::env::var("ATTESTATION_GATEWAY_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        if let Some(secs) = std::env::var("ATTESTATION_MAX_WAIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_wait = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("max_wait", &self.max_wait)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    request_id: RequestId,
    args: [String; 3],
    secrets: &'a SecretsRef,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAck {
    request_id: RequestId,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RequestStatus {
    Pending,
    Fulfilled {
        response: String,
    },
    Failed {
        #[serde(default)]
        error: Option<String>,
    },
}

/// Attestation client talking to an HTTPS gateway.
///
/// Uses TLS 1.3 with HTTPS-only connections.
pub struct GatewayAttestationClient {
    client: Client,
    config: GatewayConfig,
}

impl GatewayAttestationClient {
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64,
        max_retries = config.max_retries
    ))]
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .https_only(true)
            .min_tls_version(reqwest::tls::Version::TLS_1_3)
            .build()?;

        info!("Attestation gateway client created");
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn is_transient_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    fn is_transient_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
        )
    }

    fn classify_send_error(error: reqwest::Error) -> backoff::Error<RegistryError> {
        let err = RegistryError::Attestation(format!("Gateway request failed: {error}"));
        if Self::is_transient_error(&error) {
            warn!(error = %error, "Transient error, will retry");
            backoff::Error::transient(err)
        } else {
            warn!(error = %error, "Permanent error, aborting");
            backoff::Error::permanent(err)
        }
    }

    fn check_status(status: StatusCode) -> std::result::Result<(), backoff::Error<RegistryError>> {
        if status.is_success() {
            return Ok(());
        }
        let err = RegistryError::Attestation(format!("Gateway returned status: {status}"));
        if Self::is_transient_status(status) {
            warn!(status = %status, "Transient HTTP status, will retry");
            Err(backoff::Error::transient(err))
        } else {
            warn!(status = %status, "Permanent HTTP error");
            Err(backoff::Error::permanent(err))
        }
    }

    /// Decode a `0x`-prefixed 32-byte verdict word.
    fn parse_verdict(response: &str) -> Result<Verdict> {
        let hex_str = response
            .strip_prefix("0x")
            .or_else(|| response.strip_prefix("0X"))
            .unwrap_or(response);
        let bytes = hex::decode(hex_str)
            .map_err(|e| RegistryError::Attestation(format!("Invalid verdict hex from gateway: {e}")))?;
        Verdict::from_word(&bytes)
    }

    fn submit_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }

    fn poll_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_POLL_INTERVAL,
            max_elapsed_time: Some(self.config.max_wait),
            ..Default::default()
        }
    }

    async fn submit_once(
        &self,
        body: &SubmitBody<'_>,
    ) -> std::result::Result<RequestId, backoff::Error<RegistryError>> {
        let url = format!("{}/requests", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        Self::check_status(response.status())?;

        let ack: SubmitAck = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse submission acknowledgement");
            backoff::Error::permanent(RegistryError::Attestation(format!(
                "Failed to parse gateway acknowledgement: {e}"
            )))
        })?;
        Ok(ack.request_id)
    }

    async fn poll_once(
        &self,
        request_id: RequestId,
    ) -> std::result::Result<Verdict, backoff::Error<RegistryError>> {
        let url = format!("{}/requests/{request_id}", self.config.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        Self::check_status(response.status())?;

        let status: RequestStatus = response.json().await.map_err(|e| {
            backoff::Error::permanent(RegistryError::Attestation(format!(
                "Failed to parse gateway status: {e}"
            )))
        })?;
        debug!(status = ?status, "Polled request status");

        match status {
            RequestStatus::Pending => Err(backoff::Error::transient(RegistryError::Attestation(
                format!("Request {request_id} still pending"),
            ))),
            RequestStatus::Fulfilled { response } => {
                Self::parse_verdict(&response).map_err(backoff::Error::permanent)
            }
            RequestStatus::Failed { error } => Err(backoff::Error::permanent(
                RegistryError::Attestation(format!(
                    "Request {request_id} failed: {}",
                    error.as_deref().unwrap_or("no error reported")
                )),
            )),
        }
    }
}

#[async_trait]
impl AttestationClient for GatewayAttestationClient {
    #[instrument(
        level = "info",
        skip_all,
        fields(request_id = %request.request_id, max_retries = self.config.max_retries)
    )]
    async fn submit_request(
        &self,
        request: &AttestationRequest,
        secrets: &SecretsRef,
    ) -> Result<RequestId> {
        let body = SubmitBody {
            request_id: request.request_id,
            args: request.args()?,
            secrets,
        };

        retry_notify(
            self.submit_backoff(),
            || async { self.submit_once(&body).await },
            |err: RegistryError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    #[instrument(
        level = "info",
        skip(self),
        fields(max_wait_secs = self.config.max_wait.as_secs())
    )]
    async fn await_fulfillment(&self, request_id: RequestId) -> Result<Verdict> {
        let start = Instant::now();

        let result = retry_notify(
            self.poll_backoff(),
            || async { self.poll_once(request_id).await },
            |err: RegistryError, duration: Duration| {
                debug!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Polling again"
                );
            },
        )
        .await;

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(verdict) => info!(verdict = %verdict, total_latency_ms, "Request fulfilled"),
            Err(e) => warn!(error = %e, total_latency_ms, "Gave up waiting for fulfillment"),
        }
        result
    }

    fn source_id(&self) -> AttestationSource {
        AttestationSource::Gateway {
            url: self.config.base_url.clone(),
        }
    }
}
