//! Candymine Upload - permanent storage for token metadata files
//!
//! Signs each file of a directory as an ANS-104 data item with an Arweave
//! wallet, posts it to a bundler node and prints the gateway URI it gets.
//! Optionally records every mapping in the metadata database so an
//! interrupted run can be resumed.

pub mod bundler;
pub mod config;
pub mod data_item;
pub mod key;
pub mod resolve;
pub mod runner;
pub mod sink;
pub mod source;

// Re-exports
pub use bundler::{
    Bundler, BundlerReceipt, DEFAULT_BUNDLER_URL, DEFAULT_GATEWAY_URL, HttpBundler, UploadError,
};
pub use config::Config;
pub use data_item::{DataItem, Signer, Tag};
pub use key::ArweaveKey;
pub use resolve::UploadResolver;
pub use runner::run;
pub use sink::UploadLines;
pub use source::{MetadataFile, identifier_of, metadata_files};
