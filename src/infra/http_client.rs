//! HTTP client plumbing shared by the provider clients: a client factory
//! with consistent timeout configuration, and the mapping from transport and
//! HTTP failures to the error taxonomy.
//!
//! All outbound HTTP in this service must go through `try_build_client()`
//! rather than constructing `reqwest::Client` directly, so that a hung
//! provider can never hang a request indefinitely.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::app_error::AppError;

/// Connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response timeout. Provider calls (order creation, status
/// queries, rate lookups) are expected to complete within seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with bounded timeouts, for request-scoped
/// construction in the gateway adapters.
pub fn try_build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
}

/// Map a reqwest transport failure to the taxonomy. Timeouts and connection
/// failures are retryable; anything else is an internal plumbing problem.
pub fn classify_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() {
        AppError::ServiceUnavailable
    } else {
        AppError::Internal(format!("HTTP request failed: {err}"))
    }
}

/// Map a non-2xx provider response to the taxonomy: 401/403 signal a
/// credential problem upstream, gateway 5xx is retryable, everything else is
/// a business rejection carrying the provider's message.
pub fn classify_error_status(status: StatusCode, provider_message: Option<String>) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::AuthenticationFailure,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AppError::ServiceUnavailable
        }
        _ => AppError::ProviderRejected(
            provider_message.unwrap_or_else(|| format!("HTTP {status}")),
        ),
    }
}

/// Pull a human-readable message out of a provider error body. Providers
/// disagree on where it lives, so probe the known shapes in order.
pub fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let candidates = [
        &value["error"]["message"],
        &value["error"],
        &value["message"],
        &value["error_messages"][0]["description"],
    ];
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .map(|s| s.to_string())
}
