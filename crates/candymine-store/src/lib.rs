//! candymine-store: SQLite persistence for uploaded metadata
//!
//! Holds mined tokens and their decoded metadata, records which metadata
//! accounts got a re-uploaded JSON file, and lists the effective URI of
//! every known token.

pub mod store;

pub use store::{Creator, DEFAULT_DB_PATH, Link, MetadataDb, TokenMetadata, TokenRecord};
