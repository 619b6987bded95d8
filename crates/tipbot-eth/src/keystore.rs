//! Web3 secret storage (v3 keystore) decryption and transaction signing keys.
//!
//! Supports the `scrypt` and `pbkdf2` (hmac-sha256) key derivations with the
//! `aes-128-ctr` cipher, which covers keystores written by geth and friends.

use std::fmt;

use aes::cipher::{KeyIvInit, StreamCipher};
use k256::ecdsa::SigningKey;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use tipbot_core::{errors::Error, Result};

use crate::abi::{format_address, keccak256, parse_address, Address};

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

#[derive(Debug, Deserialize)]
struct KeystoreDoc {
    #[serde(default)]
    address: Option<String>,
    #[serde(alias = "Crypto")]
    crypto: CryptoSection,
}

#[derive(Debug, Deserialize)]
struct CryptoSection {
    cipher: String,
    cipherparams: CipherParams,
    ciphertext: String,
    kdf: String,
    kdfparams: Value,
    mac: String,
}

#[derive(Debug, Deserialize)]
struct CipherParams {
    iv: String,
}

#[derive(Debug, Deserialize)]
struct ScryptParams {
    dklen: usize,
    n: u64,
    r: u32,
    p: u32,
    salt: String,
}

#[derive(Debug, Deserialize)]
struct Pbkdf2Params {
    c: u32,
    dklen: usize,
    #[serde(default)]
    prf: Option<String>,
    salt: String,
}

/// Signing authority for payouts: the decrypted account key.
pub struct Transactor {
    pub from: Address,
    key: SigningKey,
}

impl Transactor {
    /// Decrypt `key_json` with `password`. A wrong password fails the MAC check.
    pub fn from_keystore(key_json: &str, password: &str) -> Result<Self> {
        let doc: KeystoreDoc = serde_json::from_str(key_json)?;
        let secret = decrypt(&doc.crypto, password)?;
        let transactor = Self::from_secret(&secret)?;

        if let Some(declared) = doc.address.as_deref() {
            if parse_address(declared)? != transactor.from {
                return Err(Error::Payout(format!(
                    "keystore address {declared} does not match its key"
                )));
            }
        }
        Ok(transactor)
    }

    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        let key = SigningKey::from_slice(secret)
            .map_err(|e| Error::Payout(format!("invalid private key: {e}")))?;
        let point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut from = [0u8; 20];
        from.copy_from_slice(&hash[12..]);
        Ok(Self { from, key })
    }

    /// Sign a 32-byte digest; returns `r || s` and the recovery id.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<([u8; 64], u8)> {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| Error::Payout(format!("signing failed: {e}")))?;
        let mut rs = [0u8; 64];
        rs.copy_from_slice(&sig.to_bytes());
        Ok((rs, recid.to_byte()))
    }
}

impl fmt::Debug for Transactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transactor")
            .field("from", &format_address(&self.from))
            .field("key", &"<redacted>")
            .finish()
    }
}

fn decode_hex(field: &str, raw: &str) -> Result<Vec<u8>> {
    hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
        .map_err(|e| Error::Payout(format!("keystore {field} is not hex: {e}")))
}

fn derive_key(crypto: &CryptoSection, password: &str) -> Result<Vec<u8>> {
    match crypto.kdf.as_str() {
        "scrypt" => {
            let p: ScryptParams = serde_json::from_value(crypto.kdfparams.clone())?;
            if !p.n.is_power_of_two() || p.n < 2 {
                return Err(Error::Payout(format!("invalid scrypt n: {}", p.n)));
            }
            let log_n = p.n.trailing_zeros() as u8;
            let params = scrypt::Params::new(log_n, p.r, p.p, p.dklen)
                .map_err(|e| Error::Payout(format!("invalid scrypt params: {e}")))?;
            let mut dk = vec![0u8; p.dklen];
            scrypt::scrypt(
                password.as_bytes(),
                &decode_hex("salt", &p.salt)?,
                &params,
                &mut dk,
            )
            .map_err(|e| Error::Payout(format!("scrypt failed: {e}")))?;
            Ok(dk)
        }
        "pbkdf2" => {
            let p: Pbkdf2Params = serde_json::from_value(crypto.kdfparams.clone())?;
            if let Some(prf) = p.prf.as_deref().filter(|prf| *prf != "hmac-sha256") {
                return Err(Error::Payout(format!("unsupported pbkdf2 prf: {prf}")));
            }
            let mut dk = vec![0u8; p.dklen];
            pbkdf2::pbkdf2_hmac::<Sha256>(
                password.as_bytes(),
                &decode_hex("salt", &p.salt)?,
                p.c,
                &mut dk,
            );
            Ok(dk)
        }
        other => Err(Error::Payout(format!("unsupported keystore kdf: {other}"))),
    }
}

fn decrypt(crypto: &CryptoSection, password: &str) -> Result<Vec<u8>> {
    if crypto.cipher != "aes-128-ctr" {
        return Err(Error::Payout(format!(
            "unsupported keystore cipher: {}",
            crypto.cipher
        )));
    }

    let dk = derive_key(crypto, password)?;
    if dk.len() < 32 {
        return Err(Error::Payout("keystore dklen must be at least 32".to_string()));
    }

    let mut ciphertext = decode_hex("ciphertext", &crypto.ciphertext)?;
    let mut mac_input = dk[16..32].to_vec();
    mac_input.extend_from_slice(&ciphertext);
    if keccak256(&mac_input)[..] != decode_hex("mac", &crypto.mac)?[..] {
        return Err(Error::Payout(
            "could not decrypt key with given password".to_string(),
        ));
    }

    let iv = decode_hex("iv", &crypto.cipherparams.iv)?;
    let mut cipher = Aes128Ctr::new_from_slices(&dk[..16], &iv)
        .map_err(|e| Error::Payout(format!("invalid keystore iv: {e}")))?;
    cipher.apply_keystream(&mut ciphertext);
    Ok(ciphertext)
}

/// Encrypt `secret` into a cheap pbkdf2 keystore for tests.
#[cfg(test)]
pub(crate) fn test_keystore(secret: &[u8; 32], password: &str) -> String {
    let salt = [7u8; 32];
    let iv = [9u8; 16];
    let mut dk = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, 2, &mut dk);

    let mut ciphertext = secret.to_vec();
    Aes128Ctr::new_from_slices(&dk[..16], &iv)
        .unwrap()
        .apply_keystream(&mut ciphertext);
    let mut mac_input = dk[16..32].to_vec();
    mac_input.extend_from_slice(&ciphertext);

    let from = Transactor::from_secret(secret).unwrap().from;
    serde_json::json!({
        "address": hex::encode(from),
        "crypto": {
            "cipher": "aes-128-ctr",
            "cipherparams": {"iv": hex::encode(iv)},
            "ciphertext": hex::encode(&ciphertext),
            "kdf": "pbkdf2",
            "kdfparams": {"c": 2, "dklen": 32, "prf": "hmac-sha256", "salt": hex::encode(salt)},
            "mac": hex::encode(keccak256(&mac_input)),
        },
        "version": 3
    })
    .to_string()
}
