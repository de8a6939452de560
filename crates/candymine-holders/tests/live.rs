//! Calls against a public mainnet node. Run with `cargo test -- --ignored`.

use candymine_holders::rpc::DEFAULT_RPC_URL;
use candymine_holders::{ChainRpc, HolderResolver, RpcClient};

/// Wrapped SOL mint: always exists, always has token accounts.
const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[test]
#[ignore = "requires network"]
fn largest_accounts_of_wrapped_sol() {
    let rpc = RpcClient::new(DEFAULT_RPC_URL);
    let accounts = rpc.get_token_largest_accounts(WSOL_MINT).unwrap();
    assert!(!accounts.is_empty());
}

#[test]
#[ignore = "requires network"]
fn wrapped_sol_has_a_holder() {
    let resolver = HolderResolver::new(RpcClient::new(DEFAULT_RPC_URL));
    let resolution = resolver.current_holder(WSOL_MINT).unwrap();
    assert!(matches!(resolution, candymine_core::Resolution::Resolved(_)));
}
