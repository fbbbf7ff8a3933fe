//! Shared HTTP client, headers, and status mapping.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::RunError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Get (or create) the shared reqwest client.
///
/// No total request timeout is set: streamed runs legitimately stay open for
/// minutes, and per-operation bounds are applied by the orchestrator.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// JSON + bearer headers with a fresh client request ID.
pub fn request_headers(api_key: &str, streaming: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(if streaming {
            "text/event-stream"
        } else {
            "application/json"
        }),
    );
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    if let Ok(val) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()) {
        headers.insert(CLIENT_REQUEST_ID_HEADER, val);
    }
    headers
}

/// Map a non-success HTTP status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> RunError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => RunError::Authentication(message),
        429 => RunError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => RunError::api(status, message),
    }
}

/// Pass successful responses through, convert the rest with [`status_to_error`].
pub async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, RunError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), &body))
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
