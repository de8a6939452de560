//! Common error type for remote calls made by the pipelines

/// Error from a single remote call (JSON-RPC lookup or bundler upload).
///
/// Transport failures and HTTP status failures share the `Http` variant;
/// `status` is `None` when the request never produced a response.
#[derive(Debug)]
pub enum RequestError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// JSON-RPC error object returned by the node
    Rpc { code: i64, message: String },
    /// Response body did not decode into the expected envelope
    Decode(String),
    /// Local I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Rpc { code, message } => write!(f, "RPC error {code}: {message}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped so endpoints with embedded API keys do not end up in logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<std::io::Error> for RequestError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
