//! SQLite database shared by the mining, upload and link-listing tools

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

/// Database file used when no path is configured
pub const DEFAULT_DB_PATH: &str = "candy-holders.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tokens (
        token_address      TEXT PRIMARY KEY,
        metadata_address   TEXT UNIQUE,
        genesis_signature  TEXT UNIQUE,
        genesis_block_time NUMERIC
    );
    CREATE TABLE IF NOT EXISTS creators (
        metadata_address TEXT NOT NULL,
        address          TEXT NOT NULL,
        verified         INTEGER,
        share            INTEGER,
        idx              INTEGER NOT NULL,
        PRIMARY KEY (metadata_address, idx)
    );
    CREATE TABLE IF NOT EXISTS repairs (
        metadata_address TEXT PRIMARY KEY,
        new_uri          TEXT NOT NULL,
        uploaded_at      TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS metadatas (
        token_address           TEXT PRIMARY KEY,
        metadata_address        TEXT UNIQUE,
        key                     TEXT,
        update_authority        TEXT,
        mint                    TEXT,
        name                    TEXT,
        symbol                  TEXT,
        uri                     TEXT,
        seller_fee_basis_points NUMERIC,
        primary_sale_happened   INTEGER,
        is_mutable              INTEGER,
        edition_nonce           INTEGER
    );
";

/// Effective metadata URI of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub token_address: String,
    pub metadata_address: Option<String>,
    pub uri: String,
    /// `true` when `uri` comes from a recorded re-upload
    pub repaired: bool,
}

/// Token found by the mining pass: mint plus the transaction that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token_address: String,
    pub metadata_address: String,
    pub genesis_signature: String,
    pub genesis_block_time: Option<i64>,
}

/// One creator entry of a metadata account, in on-chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub address: String,
    pub verified: bool,
    pub share: u8,
}

/// Decoded metadata account as stored in `metadatas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub key: String,
    pub update_authority: String,
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    pub edition_nonce: Option<u8>,
}

/// Handle on the metadata database.
///
/// `tokens`, `metadatas` and `creators` are filled by the mining passes;
/// `repairs` maps a metadata address to the URI its re-uploaded JSON got.
pub struct MetadataDb {
    conn: Connection,
    path: PathBuf,
}

impl MetadataDb {
    /// Open (or create) the database at `path` and make sure both tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .with_context(|| format!("Failed to create tables in {}", path.display()))?;
        log::debug!("Opened metadata database at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing database without creating or altering anything.
    ///
    /// Fails when the file is missing; every write through the handle fails.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
        log::debug!("Opened metadata database read-only at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a mined token. A token already present is left untouched.
    pub fn record_token(&self, token: &TokenRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO tokens
                    (token_address, metadata_address, genesis_signature, genesis_block_time)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    token.token_address,
                    token.metadata_address,
                    token.genesis_signature,
                    token.genesis_block_time
                ],
            )
            .with_context(|| format!("Failed to record token {}", token.token_address))?;
        Ok(())
    }

    /// Metadata addresses whose token is already mined.
    pub fn known_metadata_addresses(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT metadata_address FROM tokens WHERE metadata_address IS NOT NULL")
            .context("Failed to query tokens")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()
            .context("Failed to read tokens")
    }

    /// Mined tokens with no `metadatas` row yet, oldest first.
    pub fn tokens_missing_metadata(&self) -> Result<Vec<TokenRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.token_address, t.metadata_address, t.genesis_signature, t.genesis_block_time
                 FROM tokens t
                 LEFT JOIN metadatas m ON m.token_address = t.token_address
                 WHERE m.token_address IS NULL AND t.metadata_address IS NOT NULL
                 ORDER BY t.genesis_block_time, t.token_address",
            )
            .context("Failed to query tokens")?;
        let rows = stmt.query_map([], |row| {
            Ok(TokenRecord {
                token_address: row.get(0)?,
                metadata_address: row.get(1)?,
                genesis_signature: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                genesis_block_time: row.get(3)?,
            })
        })?;
        rows.collect::<rusqlite::Result<_>>()
            .context("Failed to read tokens")
    }

    /// Store the decoded metadata of a token together with its creators.
    ///
    /// Metadata and creators are written in one transaction. Creator `idx`
    /// starts at 1.
    pub fn record_metadata(
        &self,
        token_address: &str,
        metadata_address: &str,
        metadata: &TokenMetadata,
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        tx.execute(
            "INSERT OR REPLACE INTO metadatas
                (token_address, metadata_address, key, update_authority, mint, name, symbol,
                 uri, seller_fee_basis_points, primary_sale_happened, is_mutable, edition_nonce)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                token_address,
                metadata_address,
                metadata.key,
                metadata.update_authority,
                metadata.mint,
                metadata.name,
                metadata.symbol,
                metadata.uri,
                metadata.seller_fee_basis_points,
                metadata.primary_sale_happened,
                metadata.is_mutable,
                metadata.edition_nonce,
            ],
        )
        .with_context(|| format!("Failed to record metadata of {token_address}"))?;
        tx.execute(
            "DELETE FROM creators WHERE metadata_address = ?1",
            params![metadata_address],
        )
        .context("Failed to clear creators")?;
        for (idx, creator) in metadata.creators.iter().enumerate() {
            tx.execute(
                "INSERT INTO creators (metadata_address, address, verified, share, idx)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    metadata_address,
                    creator.address,
                    creator.verified,
                    creator.share,
                    idx as i64 + 1
                ],
            )
            .with_context(|| format!("Failed to record creator of {metadata_address}"))?;
        }
        tx.commit().context("Failed to commit metadata")?;
        Ok(())
    }

    /// Creators of a metadata account in on-chain order.
    pub fn creators(&self, metadata_address: &str) -> Result<Vec<Creator>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT address, verified, share FROM creators
                 WHERE metadata_address = ?1 ORDER BY idx",
            )
            .context("Failed to query creators")?;
        let rows = stmt.query_map(params![metadata_address], |row| {
            Ok(Creator {
                address: row.get(0)?,
                verified: row.get(1)?,
                share: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<_>>()
            .context("Failed to read creators")
    }

    /// Record (or replace) the re-uploaded URI of a metadata account.
    ///
    /// Each call is its own implicit transaction, so a crash never loses an
    /// already recorded row.
    pub fn record_repair(&self, metadata_address: &str, new_uri: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO repairs (metadata_address, new_uri, uploaded_at)
                 VALUES (?1, ?2, ?3)",
                params![metadata_address, new_uri, now],
            )
            .with_context(|| format!("Failed to record upload of {metadata_address}"))?;
        Ok(())
    }

    /// Re-uploaded URI of a metadata account, if one was recorded.
    pub fn repair(&self, metadata_address: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT new_uri FROM repairs WHERE metadata_address = ?1",
                params![metadata_address],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query repairs")
    }

    /// Every metadata address with a recorded re-upload.
    pub fn repaired_addresses(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT metadata_address FROM repairs")
            .context("Failed to query repairs")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()
            .context("Failed to read repairs")
    }

    /// Effective URI of every known token, ordered by token address.
    ///
    /// A recorded re-upload wins over the on-chain URI. Tokens with neither
    /// are skipped with a warning.
    pub fn links(&self) -> Result<Vec<Link>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT m.token_address, m.metadata_address, m.uri, r.new_uri
                 FROM metadatas m
                 LEFT JOIN repairs r ON r.metadata_address = m.metadata_address
                 ORDER BY m.token_address",
            )
            .context("Failed to query metadatas")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut links = Vec::new();
        for row in rows {
            let (token_address, metadata_address, uri, new_uri) =
                row.context("Failed to read metadatas row")?;
            let (uri, repaired) = match (new_uri, uri) {
                (Some(new_uri), _) => (new_uri, true),
                (None, Some(uri)) => (uri, false),
                (None, None) => {
                    log::warn!("{token_address}: no uri recorded, skipping");
                    continue;
                }
            };
            links.push(Link {
                token_address,
                metadata_address,
                // On-chain strings are NUL padded to a fixed width
                uri: uri.trim_matches(char::from(0)).to_string(),
                repaired,
            });
        }
        Ok(links)
    }
}
