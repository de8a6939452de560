//! Current-holder lookup for one mint

use candymine_core::{RequestError, Resolution, Resolver, unresolved_on_decode};

use crate::input::TokenLine;
use crate::rpc::{ChainRpc, ParsedTokenAccount};

/// Resolves a mint to the wallet owning its largest token account.
pub struct HolderResolver<C> {
    rpc: C,
}

impl<C: ChainRpc> HolderResolver<C> {
    pub fn new(rpc: C) -> Self {
        Self { rpc }
    }

    /// Two round trips: largest token account of the mint, then that
    /// account's parsed owner.
    ///
    /// A reply that does not decode is `Unresolved`, like an empty one.
    pub fn current_holder(&self, mint: &str) -> Result<Resolution<String>, RequestError> {
        unresolved_on_decode(self.lookup(mint))
    }

    fn lookup(&self, mint: &str) -> Result<Resolution<String>, RequestError> {
        let largest = self.rpc.get_token_largest_accounts(mint)?;
        let Some(top) = largest.first() else {
            return Ok(Resolution::Unresolved("mint has no token accounts".to_string()));
        };

        let Some(account) = self.rpc.get_parsed_account_info(&top.address)? else {
            return Ok(Resolution::Unresolved(format!(
                "token account {} not found",
                top.address
            )));
        };

        match ParsedTokenAccount::from_account(&account) {
            Some(parsed) => Ok(Resolution::Resolved(parsed.owner)),
            None => Ok(Resolution::Unresolved(format!(
                "account {} is not a parsed token account",
                top.address
            ))),
        }
    }
}

impl<C: ChainRpc> Resolver for HolderResolver<C> {
    type Item = TokenLine;
    type Value = String;
    type Error = RequestError;

    fn resolve(&self, item: &TokenLine) -> Result<Resolution<String>, RequestError> {
        self.current_holder(&item.mint)
    }
}
