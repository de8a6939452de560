//! Arweave wallet key loaded from a JWK file

use std::path::Path;

use anyhow::{Context, Result, ensure};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pss, RsaPrivateKey};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::data_item::{OWNER_LENGTH, Signer, b64_sha256};

/// PSS salt length Arweave signatures use
const PSS_SALT_LENGTH: usize = 32;

#[derive(Deserialize)]
struct Jwk {
    kty: String,
    n: String,
    e: String,
    d: String,
    p: String,
    q: String,
}

fn decode_component(name: &str, value: &str) -> Result<BigUint> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .with_context(|| format!("JWK field '{name}' is not base64url"))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// 4096-bit RSA key of an Arweave wallet.
pub struct ArweaveKey {
    key: RsaPrivateKey,
    owner: Vec<u8>,
}

impl ArweaveKey {
    /// Read and validate the JWK at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        Self::from_jwk(&text).with_context(|| format!("Invalid key file: {}", path.display()))
    }

    pub fn from_jwk(json: &str) -> Result<Self> {
        let jwk: Jwk = serde_json::from_str(json).context("Failed to parse JWK")?;
        ensure!(jwk.kty == "RSA", "unsupported key type '{}'", jwk.kty);

        let key = RsaPrivateKey::from_components(
            decode_component("n", &jwk.n)?,
            decode_component("e", &jwk.e)?,
            decode_component("d", &jwk.d)?,
            vec![
                decode_component("p", &jwk.p)?,
                decode_component("q", &jwk.q)?,
            ],
        )
        .context("Inconsistent RSA key components")?;
        key.validate().context("RSA key failed validation")?;

        let owner = key.n().to_bytes_be();
        ensure!(
            owner.len() == OWNER_LENGTH,
            "expected a {}-bit key, got {} bits",
            OWNER_LENGTH * 8,
            owner.len() * 8
        );
        Ok(Self { key, owner })
    }

    /// Wallet address: base64url SHA-256 of the modulus
    pub fn address(&self) -> String {
        b64_sha256(&self.owner)
    }
}

impl Signer for ArweaveKey {
    fn owner(&self) -> &[u8] {
        &self.owner
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha256::digest(message);
        self.key
            .sign_with_rng(
                &mut rand::thread_rng(),
                Pss::new_with_salt::<Sha256>(PSS_SALT_LENGTH),
                &digest,
            )
            .context("RSA-PSS signing failed")
    }
}

impl std::fmt::Debug for ArweaveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArweaveKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
