//! Upload of one metadata file

use candymine_core::{Resolution, Resolver};

use crate::bundler::{Bundler, UploadError};
use crate::source::MetadataFile;

/// Uploads a file and resolves it to its permanent gateway URI.
pub struct UploadResolver<B> {
    bundler: B,
    gateway: String,
}

impl<B: Bundler> UploadResolver<B> {
    pub fn new(bundler: B, gateway: &str) -> Self {
        Self {
            bundler,
            gateway: gateway.trim_end_matches('/').to_string(),
        }
    }

    /// Gateway URI of a content id
    pub fn uri_of(&self, id: &str) -> String {
        format!("{}/{id}", self.gateway)
    }
}

impl<B: Bundler> Resolver for UploadResolver<B> {
    type Item = MetadataFile;
    type Value = String;
    type Error = UploadError;

    fn resolve(&self, item: &MetadataFile) -> Result<Resolution<String>, UploadError> {
        // Re-read on every attempt so a file fixed mid-run is picked up
        let data = std::fs::read(&item.path).map_err(UploadError::Read)?;
        match self.bundler.upload(&data)? {
            Some(receipt) => Ok(Resolution::Resolved(self.uri_of(&receipt.id))),
            None => Ok(Resolution::Unresolved(
                "bundler response carried no id".to_string(),
            )),
        }
    }

    fn is_retryable(&self, error: &UploadError) -> bool {
        error.is_retryable()
    }
}
