//! Token Metadata account decoding
//!
//! A metadata account is the Borsh encoding of:
//!
//! ```text
//! key u8 | update_authority [u8; 32] | mint [u8; 32]
//! name string | symbol string | uri string | seller_fee_basis_points u16
//! creators Option<Vec<(address [u8; 32], verified bool, share u8)>>
//! primary_sale_happened bool | is_mutable bool | edition_nonce Option<u8>
//! ```
//!
//! Strings are a little-endian u32 length followed by UTF-8 bytes, NUL
//! padded to a fixed width. Accounts are zero filled past the last field.

use std::fmt;

use candymine_store::{Creator, TokenMetadata};

/// Account key of a `MetadataV1` account
pub const METADATA_V1_KEY: u8 = 4;

const PUBKEY_LENGTH: usize = 32;

/// Why a metadata account did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// Account data ends inside `field`
    Truncated { field: &'static str },
    /// Account is not a `MetadataV1` account
    WrongKey(u8),
    InvalidUtf8 { field: &'static str },
    InvalidBool { field: &'static str, value: u8 },
    InvalidOption { field: &'static str, tag: u8 },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { field } => write!(f, "data ends inside {field}"),
            Self::WrongKey(key) => write!(f, "account key {key} is not MetadataV1"),
            Self::InvalidUtf8 { field } => write!(f, "{field} is not UTF-8"),
            Self::InvalidBool { field, value } => write!(f, "{field} has bool value {value}"),
            Self::InvalidOption { field, tag } => write!(f, "{field} has option tag {tag}"),
        }
    }
}

impl std::error::Error for MetadataError {}

/// Decode a base58 address into its 32 bytes.
pub fn pubkey_bytes(address: &str) -> anyhow::Result<[u8; PUBKEY_LENGTH]> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| anyhow::anyhow!("'{address}' is not base58: {e}"))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("'{address}' is {} bytes, expected {PUBKEY_LENGTH}", b.len()))
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], MetadataError> {
        if self.buf.len() < n {
            return Err(MetadataError::Truncated { field });
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, MetadataError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, MetadataError> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, MetadataError> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bool(&mut self, field: &'static str) -> Result<bool, MetadataError> {
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(MetadataError::InvalidBool { field, value }),
        }
    }

    fn pubkey(&mut self, field: &'static str) -> Result<String, MetadataError> {
        Ok(bs58::encode(self.take(PUBKEY_LENGTH, field)?).into_string())
    }

    /// Length-prefixed string with its NUL padding stripped
    fn string(&mut self, field: &'static str) -> Result<String, MetadataError> {
        let len = self.u32(field)? as usize;
        let bytes = self.take(len, field)?;
        let s = std::str::from_utf8(bytes).map_err(|_| MetadataError::InvalidUtf8 { field })?;
        Ok(s.trim_matches(char::from(0)).to_string())
    }

    fn option_tag(&mut self, field: &'static str) -> Result<bool, MetadataError> {
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(MetadataError::InvalidOption { field, tag }),
        }
    }
}

/// Decode the data of a `MetadataV1` account.
///
/// Accounts written before editions existed end after `is_mutable`; their
/// `edition_nonce` is `None`.
pub fn decode_metadata(data: &[u8]) -> Result<TokenMetadata, MetadataError> {
    let mut r = Reader { buf: data };

    let key = r.u8("key")?;
    if key != METADATA_V1_KEY {
        return Err(MetadataError::WrongKey(key));
    }
    let update_authority = r.pubkey("update_authority")?;
    let mint = r.pubkey("mint")?;
    let name = r.string("name")?;
    let symbol = r.string("symbol")?;
    let uri = r.string("uri")?;
    let seller_fee_basis_points = r.u16("seller_fee_basis_points")?;

    let mut creators = Vec::new();
    if r.option_tag("creators")? {
        let count = r.u32("creators")?;
        for _ in 0..count {
            creators.push(Creator {
                address: r.pubkey("creator address")?,
                verified: r.bool("creator verified")?,
                share: r.u8("creator share")?,
            });
        }
    }

    let primary_sale_happened = r.bool("primary_sale_happened")?;
    let is_mutable = r.bool("is_mutable")?;
    let edition_nonce = if r.is_empty() {
        None
    } else if r.option_tag("edition_nonce")? {
        Some(r.u8("edition_nonce")?)
    } else {
        None
    };

    Ok(TokenMetadata {
        key: "MetadataV1".to_string(),
        update_authority,
        mint,
        name,
        symbol,
        uri,
        seller_fee_basis_points,
        creators,
        primary_sale_happened,
        is_mutable,
        edition_nonce,
    })
}
