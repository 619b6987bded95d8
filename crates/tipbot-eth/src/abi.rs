//! Minimal ERC-20 call encoding and hex helpers.

use std::sync::OnceLock;

use regex::Regex;
use sha3::{Digest, Keccak256};

use tipbot_core::{errors::Error, Result};

/// First four bytes of `keccak256("transfer(address,uint256)")`.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

pub type Address = [u8; 20];

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0x|0X)?[0-9a-fA-F]{40}$").expect("static regex"))
}

/// Parse a 20-byte hex address, `0x` prefix optional.
pub fn parse_address(raw: &str) -> Result<Address> {
    let raw = raw.trim();
    if !address_re().is_match(raw) {
        return Err(Error::Payout(format!("invalid ethereum address: {raw}")));
    }
    let digits = &raw[raw.len() - 40..];
    let mut out = [0u8; 20];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| Error::Payout(format!("invalid ethereum address {raw}: {e}")))?;
    Ok(out)
}

pub fn format_address(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Calldata for `transfer(to, amount)`.
pub fn encode_transfer(to: &Address, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to);
    data.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&amount.to_be_bytes());
    data
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a JSON-RPC quantity such as `0x1a`.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Payout(format!("invalid quantity {raw:?}: {e}")))
}
