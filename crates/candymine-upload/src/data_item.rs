//! ANS-104 data items: the signed envelope a bundler accepts.
//!
//! Layout of a serialized item (integers little-endian):
//!
//! ```text
//! u16 signature type | signature | owner | u8 target? | u8 anchor? |
//! u64 tag count | u64 tag bytes | avro tags | data
//! ```
//!
//! The signature covers the deep hash of every field.

use anyhow::{Result, ensure};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256, Sha384};

/// Arweave (RSA-PSS, 4096-bit) signature type
pub const SIGNATURE_TYPE_ARWEAVE: u16 = 1;

/// Signature and owner (modulus) length for the Arweave signature type
pub const SIGNATURE_LENGTH: usize = 512;
pub const OWNER_LENGTH: usize = 512;

/// Something able to sign data items.
pub trait Signer {
    /// Public key bytes embedded as the item owner
    fn owner(&self) -> &[u8];

    /// Sign the deep-hash message of an item
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Avro zig-zag varint.
fn encode_long(n: i64, out: &mut Vec<u8>) {
    let mut z = ((n << 1) ^ (n >> 63)) as u64;
    while z >= 0x80 {
        out.push((z as u8 & 0x7f) | 0x80);
        z >>= 7;
    }
    out.push(z as u8);
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_long(bytes.len() as i64, out);
    out.extend_from_slice(bytes);
}

/// Avro encoding of `array<record { name: bytes, value: bytes }>`.
///
/// No tags encodes to nothing at all rather than an empty array block.
pub fn encode_tags(tags: &[Tag]) -> Vec<u8> {
    let mut out = Vec::new();
    if tags.is_empty() {
        return out;
    }
    encode_long(tags.len() as i64, &mut out);
    for tag in tags {
        encode_bytes(tag.name.as_bytes(), &mut out);
        encode_bytes(tag.value.as_bytes(), &mut out);
    }
    encode_long(0, &mut out);
    out
}

/// Input to [`deep_hash`]: a byte blob or a nested list.
#[derive(Debug)]
pub enum Chunk<'a> {
    Blob(&'a [u8]),
    List(Vec<Chunk<'a>>),
}

fn sha384(parts: &[&[u8]]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 48];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Arweave deep hash (SHA-384 based, length-tagged).
pub fn deep_hash(chunk: &Chunk<'_>) -> [u8; 48] {
    match chunk {
        Chunk::Blob(data) => {
            let tag = format!("blob{}", data.len());
            let tag_hash = sha384(&[tag.as_bytes()]);
            let data_hash = sha384(&[*data]);
            sha384(&[&tag_hash[..], &data_hash[..]])
        }
        Chunk::List(items) => {
            let tag = format!("list{}", items.len());
            items
                .iter()
                .fold(sha384(&[tag.as_bytes()]), |acc, item| {
                    sha384(&[&acc[..], &deep_hash(item)[..]])
                })
        }
    }
}

/// Base64url (unpadded) of SHA-256, the form Arweave uses for ids and addresses.
pub fn b64_sha256(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(bytes))
}

/// Message an item's signature covers: deep hash of its fields, with no
/// target and no anchor.
pub fn signing_message(owner: &[u8], raw_tags: &[u8], data: &[u8]) -> [u8; 48] {
    let signature_type = SIGNATURE_TYPE_ARWEAVE.to_string();
    deep_hash(&Chunk::List(vec![
        Chunk::Blob(b"dataitem"),
        Chunk::Blob(b"1"),
        Chunk::Blob(signature_type.as_bytes()),
        Chunk::Blob(owner),
        Chunk::Blob(&[]),
        Chunk::Blob(&[]),
        Chunk::Blob(raw_tags),
        Chunk::Blob(data),
    ]))
}

/// A signed, serialized data item.
#[derive(Debug, Clone)]
pub struct DataItem {
    raw: Vec<u8>,
    id: String,
}

impl DataItem {
    /// Build and sign an item carrying `data` with `tags`. No target, no anchor.
    pub fn sign(data: &[u8], tags: &[Tag], signer: &impl Signer) -> Result<Self> {
        let owner = signer.owner();
        ensure!(
            owner.len() == OWNER_LENGTH,
            "owner must be {OWNER_LENGTH} bytes, got {}",
            owner.len()
        );
        let raw_tags = encode_tags(tags);
        let signature = signer.sign(&signing_message(owner, &raw_tags, data))?;
        ensure!(
            signature.len() == SIGNATURE_LENGTH,
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        );

        let mut raw =
            Vec::with_capacity(2 + SIGNATURE_LENGTH + OWNER_LENGTH + 2 + 16 + raw_tags.len() + data.len());
        raw.extend_from_slice(&SIGNATURE_TYPE_ARWEAVE.to_le_bytes());
        raw.extend_from_slice(&signature);
        raw.extend_from_slice(owner);
        raw.push(0); // no target
        raw.push(0); // no anchor
        raw.extend_from_slice(&(tags.len() as u64).to_le_bytes());
        raw.extend_from_slice(&(raw_tags.len() as u64).to_le_bytes());
        raw.extend_from_slice(&raw_tags);
        raw.extend_from_slice(data);

        Ok(Self {
            id: b64_sha256(&signature),
            raw,
        })
    }

    /// Item id: base64url SHA-256 of the signature
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }
}
