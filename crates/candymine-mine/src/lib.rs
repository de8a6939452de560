//! Candymine Mine - token and metadata discovery for one collection
//!
//! Two passes fill the metadata database:
//!
//! 1. `tokens`: list the Token Metadata accounts of an update authority and
//!    find the mint of each through its oldest (genesis) transaction.
//! 2. `metadata`: fetch and decode the metadata account of every mined token
//!    that has none recorded yet, creators included.
//!
//! Both passes go through the shared driver: one account at a time, five
//! attempts on transport errors, a chill after every item.

pub mod config;
pub mod metadata;
pub mod metaplex;
pub mod rpc;
pub mod runner;
pub mod sink;
pub mod tokens;

// Re-exports
pub use config::Config;
pub use metadata::{MetadataMiner, TokenRow};
pub use metaplex::{MetadataError, decode_metadata, pubkey_bytes};
pub use rpc::{METADATA_PROGRAM_ID, MetadataRpc, SignatureInfo, TransactionInfo};
pub use runner::{run_metadata, run_tokens};
pub use sink::MinedRows;
pub use tokens::{MetadataAccount, TokenMiner};
