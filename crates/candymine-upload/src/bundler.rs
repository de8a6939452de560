//! Bundler node client
//!
//! A bundler accepts a signed data item at `POST {url}/tx` and answers with
//! the item id once it has taken custody of it.

use std::fmt;

use candymine_core::{RequestError, post_bytes};
use serde::Deserialize;

use crate::data_item::{DataItem, Signer, Tag};

pub const DEFAULT_BUNDLER_URL: &str = "https://node2.bundlr.network";
pub const DEFAULT_GATEWAY_URL: &str = "https://arweave.net";

/// Content type tagged on every uploaded metadata file
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Why one upload produced no content id.
#[derive(Debug)]
pub enum UploadError {
    /// Local file could not be read
    Read(std::io::Error),
    /// Item could not be built or signed
    Sign(anyhow::Error),
    /// No usable response from the bundler
    Request(RequestError),
    /// Bundler answered with a non-success status
    Rejected {
        status: u16,
        status_text: String,
        body: String,
    },
}

impl UploadError {
    /// Transport failures, rate limiting and server errors are worth another
    /// attempt. Any other rejection is the bundler's answer about this item
    /// and repeats identically.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Rejected { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Read(_) | Self::Sign(_) => false,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read failed: {e}"),
            Self::Sign(e) => write!(f, "signing failed: {e:#}"),
            Self::Request(e) => write!(f, "{e}"),
            Self::Rejected {
                status,
                status_text,
                body,
            } => {
                write!(f, "bundler responded {status} / {status_text}")?;
                let body = body.trim();
                if !body.is_empty() {
                    write!(f, ": {body}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for UploadError {}

impl From<RequestError> for UploadError {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

/// Accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundlerReceipt {
    pub id: String,
}

impl BundlerReceipt {
    /// Parse a success body; `None` when it carries no usable id.
    pub fn from_body(body: &str) -> Option<Self> {
        let receipt: Self = serde_json::from_str(body).ok()?;
        if receipt.id.trim().is_empty() {
            return None;
        }
        Some(receipt)
    }
}

/// Something that stores bytes permanently and names them by content id.
pub trait Bundler {
    /// Upload one file's bytes. `Ok(None)` means the bundler accepted the
    /// request but its answer carried no id.
    fn upload(&self, data: &[u8]) -> Result<Option<BundlerReceipt>, UploadError>;
}

/// HTTP bundler signing every item with one key.
pub struct HttpBundler<S> {
    url: String,
    signer: S,
    tags: Vec<Tag>,
}

impl<S: Signer> HttpBundler<S> {
    pub fn new(url: impl Into<String>, signer: S) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            signer,
            tags: vec![Tag::new("Content-Type", JSON_CONTENT_TYPE)],
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self) -> String {
        format!("{}/tx", self.url)
    }
}

impl<S: Signer> Bundler for HttpBundler<S> {
    fn upload(&self, data: &[u8]) -> Result<Option<BundlerReceipt>, UploadError> {
        let item = DataItem::sign(data, &self.tags, &self.signer).map_err(UploadError::Sign)?;
        log::debug!("Posting item {} ({} bytes)", item.id(), item.raw().len());

        let reply = post_bytes(&self.endpoint(), item.into_raw(), "application/octet-stream")?;
        if !reply.is_success() {
            return Err(UploadError::Rejected {
                status: reply.status,
                status_text: reply.status_text,
                body: reply.body,
            });
        }
        Ok(BundlerReceipt::from_body(&reply.body))
    }
}
