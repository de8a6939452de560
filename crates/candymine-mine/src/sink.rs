//! Database writer for both mining passes

use anyhow::Result;
use candymine_core::Sink;
use candymine_store::{MetadataDb, TokenMetadata, TokenRecord};

use crate::metadata::TokenRow;
use crate::tokens::MetadataAccount;

/// Records every resolved token or metadata account as soon as it arrives,
/// so an interrupted run resumes where it stopped.
pub struct MinedRows<'a> {
    db: &'a MetadataDb,
}

impl<'a> MinedRows<'a> {
    pub fn new(db: &'a MetadataDb) -> Self {
        Self { db }
    }
}

impl Sink<MetadataAccount, TokenRecord> for MinedRows<'_> {
    fn emit(&mut self, _item: &MetadataAccount, token: &TokenRecord) -> Result<()> {
        self.db.record_token(token)?;
        log::debug!("{} -> token {}", token.metadata_address, token.token_address);
        Ok(())
    }
}

impl Sink<TokenRow, TokenMetadata> for MinedRows<'_> {
    fn emit(&mut self, item: &TokenRow, metadata: &TokenMetadata) -> Result<()> {
        self.db
            .record_metadata(&item.token_address, &item.metadata_address, metadata)?;
        log::debug!("{}: {} ({})", item.token_address, metadata.name, metadata.uri);
        Ok(())
    }
}
