//! Solana JSON-RPC client
//!
//! Only the two calls the holder lookup needs. Responses are decoded into
//! typed structures; anything the node sends beyond them is ignored.

use std::sync::atomic::{AtomicU64, Ordering};

use candymine_core::{RequestError, post_json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Public mainnet endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

const COMMITMENT: &str = "confirmed";

/// The chain queries a holder lookup depends on.
pub trait ChainRpc {
    /// Largest token accounts of a mint, biggest balance first.
    fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<TokenAccountBalance>, RequestError>;

    /// Account at `address` with `jsonParsed` data; `None` if it does not exist.
    fn get_parsed_account_info(&self, address: &str) -> Result<Option<AccountInfo>, RequestError>;
}

/// One entry of `getTokenLargestAccounts`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountBalance {
    pub address: String,
    /// Raw balance; not needed to pick the holder, so tolerated when absent
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub decimals: u8,
}

/// `getAccountInfo` value. `data` stays untyped until a caller asks for a
/// specific parsed shape.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub data: serde_json::Value,
    pub owner: String,
    #[serde(default)]
    pub lamports: u64,
}

/// Parsed SPL token account, the only account shape the holder lookup reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTokenAccount {
    pub owner: String,
    pub mint: Option<String>,
}

#[derive(Deserialize)]
struct ParsedData {
    parsed: ParsedBody,
}

#[derive(Deserialize)]
struct ParsedBody {
    info: TokenInfo,
}

#[derive(Deserialize)]
struct TokenInfo {
    owner: String,
    #[serde(default)]
    mint: Option<String>,
}

impl ParsedTokenAccount {
    /// Extract the token account fields, or `None` if the data is not a
    /// parsed token account (raw base64 data, a different program, empty owner).
    pub fn from_account(account: &AccountInfo) -> Option<Self> {
        let data = ParsedData::deserialize(&account.data).ok()?;
        let TokenInfo { owner, mint } = data.parsed.info;
        if owner.trim().is_empty() {
            return None;
        }
        Some(Self { owner, mint })
    }
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// `{ "context": ..., "value": ... }` wrapper used by most RPC results.
#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

/// Decode a JSON-RPC response body into its `result`.
///
/// A body carrying `error` becomes [`RequestError::Rpc`]; a body with neither
/// field, or one that does not match `T`, is a decode error.
pub fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, RequestError> {
    let resp: RpcResponse<T> =
        serde_json::from_str(body).map_err(|e| RequestError::Decode(e.to_string()))?;
    if let Some(err) = resp.error {
        return Err(RequestError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    resp.result
        .ok_or_else(|| RequestError::Decode("response has neither result nor error".to_string()))
}

/// JSON-RPC 2.0 client over the shared HTTP runtime.
pub struct RpcClient {
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and decode its `result` as `T`.
    pub fn call<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: P) -> Result<T, RequestError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let body = serde_json::to_vec(&request).map_err(|e| RequestError::Decode(e.to_string()))?;
        log::debug!("{method} #{}", request.id);
        let text = post_json(&self.url, body)?;
        decode_response(&text)
    }
}

impl ChainRpc for RpcClient {
    fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<TokenAccountBalance>, RequestError> {
        let params = serde_json::json!([mint, { "commitment": COMMITMENT }]);
        let resp: WithContext<Vec<TokenAccountBalance>> = self.call("getTokenLargestAccounts", params)?;
        Ok(resp.value)
    }

    fn get_parsed_account_info(&self, address: &str) -> Result<Option<AccountInfo>, RequestError> {
        let params = serde_json::json!([
            address,
            { "commitment": COMMITMENT, "encoding": "jsonParsed" }
        ]);
        let resp: WithContext<Option<AccountInfo>> = self.call("getAccountInfo", params)?;
        Ok(resp.value)
    }
}
