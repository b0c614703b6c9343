use std::str::FromStr;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use xchain_controller_types::CrossChainRequest;

/// JSON form of a cross-chain request, using the field names of the on-chain permit type.
///
/// Integers are strings (decimal or `0x` hex) so 256-bit values survive JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFile {
    pub dst_chain: u16,
    pub dst_pool_id: String,
    #[serde(rename = "remoteControllerXChain", alias = "dstController")]
    pub dst_controller: String,
    pub vault: String,
    pub origin_wallet: String,
    pub dst_wallet: String,
    pub amount: String,
    pub slippage_factor: String,
    pub dst_gas_for_call: String,
    /// Hex routing hints; empty when omitted.
    #[serde(default)]
    pub data: String,
}

impl RequestFile {
    pub fn to_request(&self) -> Result<CrossChainRequest> {
        Ok(CrossChainRequest {
            dst_chain: self.dst_chain,
            dst_pool_id: parse_u256("dstPoolId", &self.dst_pool_id)?,
            dst_controller: parse_hex("remoteControllerXChain", &self.dst_controller)?,
            vault: parse_address("vault", &self.vault)?,
            origin_wallet: parse_address("originWallet", &self.origin_wallet)?,
            dst_wallet: parse_address("dstWallet", &self.dst_wallet)?,
            amount: parse_u256("amount", &self.amount)?,
            slippage_factor: parse_u256("slippageFactor", &self.slippage_factor)?,
            dst_gas_for_call: parse_u256("dstGasForCall", &self.dst_gas_for_call)?,
            data: parse_hex("data", &self.data)?,
        })
    }
}

pub fn parse_address(field: &str, s: &str) -> Result<Address> {
    Address::from_str(s.trim()).with_context(|| format!("invalid address in `{field}`: {s}"))
}

pub fn parse_u256(field: &str, s: &str) -> Result<U256> {
    U256::from_str(s.trim()).with_context(|| format!("invalid integer in `{field}`: {s}"))
}

pub fn parse_hex(field: &str, s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .with_context(|| format!("invalid hex in `{field}`"))
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Detached permit signature, ready to pass as `(v, r, s)` to `sendRequestWithPermit`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SignedPermit {
    pub v: u8,
    pub r: String,
    pub s: String,
    pub signer: String,
    pub digest: String,
}
