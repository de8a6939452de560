//! Token Metadata program queries over JSON-RPC

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use candymine_core::RequestError;
use candymine_holders::RpcClient;
use serde::Deserialize;
use serde_json::json;

/// Metaplex Token Metadata program
pub const METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Byte offset of the update authority in a metadata account (after the key)
pub const UPDATE_AUTHORITY_OFFSET: usize = 1;

/// Most signatures one `getSignaturesForAddress` page returns
pub const SIGNATURE_PAGE_LIMIT: usize = 1000;

const COMMITMENT: &str = "confirmed";

/// The chain queries both mining passes depend on.
pub trait MetadataRpc {
    /// Addresses of every metadata account whose update authority is `authority`.
    fn metadata_accounts_by_update_authority(&self, authority: &str) -> Result<Vec<String>, RequestError>;

    /// Signatures touching `address`, newest first, at most one page.
    fn signatures_for_address(&self, address: &str) -> Result<Vec<SignatureInfo>, RequestError>;

    /// Confirmed transaction by signature; `None` if the node does not know it.
    fn transaction(&self, signature: &str) -> Result<Option<TransactionInfo>, RequestError>;

    /// Raw data of the account at `address`; `None` if it does not exist.
    fn account_data(&self, address: &str) -> Result<Option<Vec<u8>>, RequestError>;
}

/// One entry of `getSignaturesForAddress`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// The parts of a transaction the token pass reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub account_keys: Vec<String>,
    pub instruction_count: usize,
}

#[derive(Deserialize)]
struct ProgramAccount {
    pubkey: String,
}

#[derive(Deserialize)]
struct ConfirmedTransaction {
    transaction: TransactionBody,
}

#[derive(Deserialize)]
struct TransactionBody {
    message: Message,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    account_keys: Vec<String>,
    instructions: Vec<serde_json::Value>,
}

impl From<ConfirmedTransaction> for TransactionInfo {
    fn from(tx: ConfirmedTransaction) -> Self {
        let Message {
            account_keys,
            instructions,
        } = tx.transaction.message;
        Self {
            account_keys,
            instruction_count: instructions.len(),
        }
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct RawAccount {
    /// `[payload, encoding]`
    data: (String, String),
}

impl RawAccount {
    fn decode(self) -> Result<Vec<u8>, RequestError> {
        let (payload, encoding) = self.data;
        if encoding != "base64" {
            return Err(RequestError::Decode(format!(
                "account data encoded as {encoding}, expected base64"
            )));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| RequestError::Decode(format!("account data: {e}")))
    }
}

impl MetadataRpc for RpcClient {
    fn metadata_accounts_by_update_authority(&self, authority: &str) -> Result<Vec<String>, RequestError> {
        // Only the addresses matter; an empty data slice keeps the reply small
        let params = json!([
            METADATA_PROGRAM_ID,
            {
                "commitment": COMMITMENT,
                "encoding": "base64",
                "dataSlice": { "offset": 0, "length": 0 },
                "filters": [
                    { "memcmp": { "offset": UPDATE_AUTHORITY_OFFSET, "bytes": authority } }
                ]
            }
        ]);
        let accounts: Vec<ProgramAccount> = self.call("getProgramAccounts", params)?;
        Ok(accounts.into_iter().map(|a| a.pubkey).collect())
    }

    fn signatures_for_address(&self, address: &str) -> Result<Vec<SignatureInfo>, RequestError> {
        let params = json!([
            address,
            { "commitment": COMMITMENT, "limit": SIGNATURE_PAGE_LIMIT }
        ]);
        self.call("getSignaturesForAddress", params)
    }

    fn transaction(&self, signature: &str) -> Result<Option<TransactionInfo>, RequestError> {
        let params = json!([
            signature,
            {
                "commitment": COMMITMENT,
                "encoding": "json",
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let tx: Option<ConfirmedTransaction> = self.call("getTransaction", params)?;
        Ok(tx.map(TransactionInfo::from))
    }

    fn account_data(&self, address: &str) -> Result<Option<Vec<u8>>, RequestError> {
        let params = json!([address, { "commitment": COMMITMENT, "encoding": "base64" }]);
        let resp: WithContext<Option<RawAccount>> = self.call("getAccountInfo", params)?;
        resp.value.map(RawAccount::decode).transpose()
    }
}
