//! Metadata pass: mined token -> decoded metadata account

use candymine_core::{RequestError, Resolution, Resolver, WorkItem, unresolved_on_decode};
use candymine_store::{TokenMetadata, TokenRecord};

use crate::metaplex::decode_metadata;
use crate::rpc::MetadataRpc;

/// A mined token still missing its metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    pub token_address: String,
    pub metadata_address: String,
}

impl From<TokenRecord> for TokenRow {
    fn from(record: TokenRecord) -> Self {
        Self {
            token_address: record.token_address,
            metadata_address: record.metadata_address,
        }
    }
}

impl WorkItem for TokenRow {
    fn label(&self) -> &str {
        &self.token_address
    }
}

/// Fetches and decodes the metadata account of a token.
pub struct MetadataMiner<C> {
    rpc: C,
}

impl<C: MetadataRpc> MetadataMiner<C> {
    pub fn new(rpc: C) -> Self {
        Self { rpc }
    }

    /// A missing account, undecodable data or metadata naming another mint
    /// is `Unresolved`.
    pub fn metadata(&self, token: &TokenRow) -> Result<Resolution<TokenMetadata>, RequestError> {
        unresolved_on_decode(self.lookup(token))
    }

    fn lookup(&self, token: &TokenRow) -> Result<Resolution<TokenMetadata>, RequestError> {
        let Some(data) = self.rpc.account_data(&token.metadata_address)? else {
            return Ok(Resolution::Unresolved(format!(
                "metadata account {} not found",
                token.metadata_address
            )));
        };
        let metadata = match decode_metadata(&data) {
            Ok(metadata) => metadata,
            Err(e) => {
                return Ok(Resolution::Unresolved(format!(
                    "metadata account {}: {e}",
                    token.metadata_address
                )));
            }
        };
        if metadata.mint != token.token_address {
            return Ok(Resolution::Unresolved(format!(
                "metadata account {} describes mint {}",
                token.metadata_address, metadata.mint
            )));
        }
        Ok(Resolution::Resolved(metadata))
    }
}

impl<C: MetadataRpc> Resolver for MetadataMiner<C> {
    type Item = TokenRow;
    type Value = TokenMetadata;
    type Error = RequestError;

    fn resolve(&self, item: &TokenRow) -> Result<Resolution<TokenMetadata>, RequestError> {
        self.metadata(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaplex::METADATA_V1_KEY;
    use crate::rpc::{SignatureInfo, TransactionInfo};

    struct Fixed(Option<Vec<u8>>);

    impl MetadataRpc for Fixed {
        fn metadata_accounts_by_update_authority(&self, _authority: &str) -> Result<Vec<String>, RequestError> {
            unreachable!()
        }

        fn signatures_for_address(&self, _address: &str) -> Result<Vec<SignatureInfo>, RequestError> {
            unreachable!()
        }

        fn transaction(&self, _signature: &str) -> Result<Option<TransactionInfo>, RequestError> {
            unreachable!()
        }

        fn account_data(&self, address: &str) -> Result<Option<Vec<u8>>, RequestError> {
            assert_eq!(address, "meta1");
            Ok(self.0.clone())
        }
    }

    fn minimal_account(mint: [u8; 32]) -> Vec<u8> {
        let mut data = vec![METADATA_V1_KEY];
        data.extend_from_slice(&[1; 32]);
        data.extend_from_slice(&mint);
        for s in ["Candy", "C", "https://x/1.json"] {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        data.extend_from_slice(&250u16.to_le_bytes());
        data.extend_from_slice(&[0, 1, 0]);
        data
    }

    fn row(token: &str) -> TokenRow {
        TokenRow {
            token_address: token.into(),
            metadata_address: "meta1".into(),
        }
    }

    #[test]
    fn decodes_account_of_token() {
        let mint = bs58::encode([2u8; 32]).into_string();
        let miner = MetadataMiner::new(Fixed(Some(minimal_account([2; 32]))));
        let Resolution::Resolved(metadata) = miner.metadata(&row(&mint)).unwrap() else {
            panic!("expected metadata");
        };
        assert_eq!(metadata.uri, "https://x/1.json");
        assert_eq!(metadata.seller_fee_basis_points, 250);
        assert!(metadata.primary_sale_happened);
    }

    #[test]
    fn missing_or_foreign_account_is_unresolved() {
        let mint = bs58::encode([2u8; 32]).into_string();
        let miner = MetadataMiner::new(Fixed(None));
        assert!(matches!(miner.metadata(&row(&mint)).unwrap(), Resolution::Unresolved(_)));

        let miner = MetadataMiner::new(Fixed(Some(minimal_account([3; 32]))));
        assert!(matches!(
            miner.metadata(&row(&mint)).unwrap(),
            Resolution::Unresolved(reason) if reason.contains("describes mint")
        ));
    }

    #[test]
    fn undecodable_account_is_unresolved() {
        let miner = MetadataMiner::new(Fixed(Some(vec![METADATA_V1_KEY, 0, 0])));
        assert!(matches!(
            miner.metadata(&row("t")).unwrap(),
            Resolution::Unresolved(reason) if reason.contains("data ends inside update_authority")
        ));
    }
}
