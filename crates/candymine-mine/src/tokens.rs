//! Token pass: metadata account -> the mint it describes

use candymine_core::{RequestError, Resolution, Resolver, WorkItem, unresolved_on_decode};
use candymine_store::TokenRecord;

use crate::rpc::{MetadataRpc, SIGNATURE_PAGE_LIMIT};

/// Candy machine mint transactions carry exactly this many instructions
pub const MINT_INSTRUCTION_COUNT: usize = 5;

/// Position of the new mint among the accounts of a mint transaction
const MINT_ACCOUNT_INDEX: usize = 1;

/// A metadata account listed under the update authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataAccount {
    pub address: String,
}

impl MetadataAccount {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl WorkItem for MetadataAccount {
    fn label(&self) -> &str {
        &self.address
    }
}

/// Finds the token of a metadata account through its genesis transaction.
pub struct TokenMiner<C> {
    rpc: C,
}

impl<C: MetadataRpc> TokenMiner<C> {
    pub fn new(rpc: C) -> Self {
        Self { rpc }
    }

    /// The oldest signature on the metadata account is the mint transaction.
    /// Its second account is the token.
    ///
    /// Accounts with a full page of signatures, or whose oldest transaction
    /// does not look like a candy machine mint, are `Unresolved`.
    pub fn genesis(&self, metadata_address: &str) -> Result<Resolution<TokenRecord>, RequestError> {
        unresolved_on_decode(self.lookup(metadata_address))
    }

    fn lookup(&self, metadata_address: &str) -> Result<Resolution<TokenRecord>, RequestError> {
        let sigs = self.rpc.signatures_for_address(metadata_address)?;
        if sigs.len() >= SIGNATURE_PAGE_LIMIT {
            return Ok(Resolution::Unresolved(format!(
                "{} signatures, genesis is out of reach",
                sigs.len()
            )));
        }
        let Some(genesis) = sigs.last() else {
            return Ok(Resolution::Unresolved("no signatures".to_string()));
        };

        let Some(tx) = self.rpc.transaction(&genesis.signature)? else {
            return Ok(Resolution::Unresolved(format!(
                "genesis transaction {} not found",
                genesis.signature
            )));
        };
        if tx.instruction_count != MINT_INSTRUCTION_COUNT {
            return Ok(Resolution::Unresolved(format!(
                "genesis transaction has {} instructions, expected {MINT_INSTRUCTION_COUNT}",
                tx.instruction_count
            )));
        }
        let Some(token_address) = tx.account_keys.get(MINT_ACCOUNT_INDEX) else {
            return Ok(Resolution::Unresolved(format!(
                "genesis transaction {} has no token account",
                genesis.signature
            )));
        };

        Ok(Resolution::Resolved(TokenRecord {
            token_address: token_address.clone(),
            metadata_address: metadata_address.to_string(),
            genesis_signature: genesis.signature.clone(),
            genesis_block_time: genesis.block_time,
        }))
    }
}

impl<C: MetadataRpc> Resolver for TokenMiner<C> {
    type Item = MetadataAccount;
    type Value = TokenRecord;
    type Error = RequestError;

    fn resolve(&self, item: &MetadataAccount) -> Result<Resolution<TokenRecord>, RequestError> {
        self.genesis(&item.address)
    }
}
