//! Legacy transactions with EIP-155 replay protection.

use rlp::RlpStream;

use tipbot_core::{errors::Error, Result};

use crate::{
    abi::{keccak256, Address},
    keystore::Transactor,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    pub nonce: u64,
    pub gas_price: u64,
    pub gas: u64,
    pub to: Address,
    pub value: u64,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTx {
    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        s.append(&self.to.to_vec());
        s.append(&self.value);
        s.append(&self.data);
    }

    /// RLP of the nine fields hashed for signing: body, chain id, 0, 0.
    fn signing_payload(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&self.chain_id);
        s.append(&0u8);
        s.append(&0u8);
        s.out().to_vec()
    }

    /// Sign and return the raw transaction bytes for `eth_sendRawTransaction`.
    pub fn sign(&self, signer: &Transactor) -> Result<Vec<u8>> {
        let hash = keccak256(&self.signing_payload());
        let (rs, recid) = signer.sign_hash(&hash)?;
        let v = self
            .chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + u64::from(recid)))
            .ok_or_else(|| Error::Payout(format!("chain id too large: {}", self.chain_id)))?;

        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&v);
        s.append(&trim_leading_zeros(&rs[..32]).to_vec());
        s.append(&trim_leading_zeros(&rs[32..]).to_vec());
        Ok(s.out().to_vec())
    }
}

/// r and s are RLP integers, so no leading zero bytes.
fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
