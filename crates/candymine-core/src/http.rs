//! Shared HTTP client and runtime.
//!
//! Requests are async reqwest calls driven to completion on one shared tokio
//! runtime, so the pipelines stay a plain sequential loop.

use std::sync::LazyLock;
use std::time::Duration;

use crate::error::RequestError;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout; a stalled node counts as a failed attempt
const REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST a JSON body and return the response text.
///
/// Non-2xx statuses are errors here; JSON-RPC nodes only answer them on
/// rate limiting or outages.
pub fn post_json(url: &str, body: Vec<u8>) -> Result<String, RequestError> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = http_client()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(RequestError::from_reqwest)?;
        resp.text().await.map_err(RequestError::from_reqwest)
    })
}

/// POST raw bytes and hand back the reply without judging its status.
///
/// Transport failures (no response at all) are errors.
pub fn post_bytes(url: &str, body: Vec<u8>, content_type: &str) -> Result<HttpReply, RequestError> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = http_client()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;

        let status = resp.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let body = resp.text().await.map_err(RequestError::from_reqwest)?;

        Ok(HttpReply {
            status: status.as_u16(),
            status_text,
            body,
        })
    })
}
