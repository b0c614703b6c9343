//! Configuration registry: the addresses and limits the controller operates with, plus the
//! persistent counters (signer nonces, packet sequence, delivery ledger).
//!
//! The storage itself lives on the entrypoint; protocol code reads it through `ControllerState`
//! so it can run against an in-memory state in tests.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

use xchain_controller_types::request::{DEFAULT_DST_GAS_CEILING, SLIPPAGE_DENOMINATOR};

use crate::errors::XChainError;

/// Transport wiring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyXChainParams {
    /// Only address allowed to invoke the receive callback.
    pub transport_endpoint: Address,
    /// Router used to quote and send.
    pub value_transfer_router: Address,
    pub current_chain: u16,
    /// Source pool of the value leg.
    pub pool_id: U256,
}

/// Settlement asset, price sources and default bridge slippage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapParams {
    pub router: Address,
    pub stablecoin: Address,
    pub wrapped_native: Address,
    pub stablecoin_price_feed: Address,
    pub native_price_feed: Address,
    /// Basis points; zero means unset.
    pub default_slippage: U256,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XChainConfig {
    pub owner: Address,
    pub key: KeyXChainParams,
    pub swap: SwapParams,
    /// Zero means unset.
    pub dst_gas_ceiling: U256,
}

impl XChainConfig {
    pub fn effective_dst_gas_ceiling(&self) -> U256 {
        if self.dst_gas_ceiling.is_zero() {
            DEFAULT_DST_GAS_CEILING
        } else {
            self.dst_gas_ceiling
        }
    }

    /// Slippage applied to the value leg: the registry default, else the request's own factor.
    pub fn bridge_slippage(&self, request_slippage: U256) -> U256 {
        if self.swap.default_slippage.is_zero() {
            request_slippage
        } else {
            self.swap.default_slippage
        }
    }

    /// Router and stablecoin, both required before anything can be sent.
    pub fn outbound_route(&self) -> Result<(Address, Address), XChainError> {
        let router = self.key.value_transfer_router;
        let stablecoin = self.swap.stablecoin;
        if router == Address::ZERO || stablecoin == Address::ZERO {
            return Err(XChainError::TransportNotConfigured);
        }
        Ok((router, stablecoin))
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<(), XChainError> {
        if self.owner != caller {
            return Err(XChainError::NotOwner { caller });
        }
        Ok(())
    }
}

/// Persistent controller state as seen by the protocol logic.
pub trait ControllerState {
    fn config(&self) -> XChainConfig;

    /// Next nonce expected from `signer`.
    fn nonce_of(&self, signer: Address) -> U256;
    fn set_nonce(&mut self, signer: Address, nonce: U256);

    /// Advance the outbound packet counter and return the new value (first packet is 1).
    fn next_sequence(&mut self) -> u64;

    /// Mark a delivery as processed; `false` if it already was.
    fn record_delivery(&mut self, key: B256) -> bool;
}

/// `defaultSlippage` may be zero (unset) or a factor in `(0, 10_000]`.
pub fn validate_default_slippage(default_slippage: U256) -> Result<(), XChainError> {
    if default_slippage > SLIPPAGE_DENOMINATOR {
        return Err(XChainError::InvalidDefaultSlippage);
    }
    Ok(())
}

/// Ledger key of an inbound delivery: `keccak256(srcChain ‖ srcAddress ‖ nonce)`.
pub fn delivery_key(src_chain: u16, src_address: &[u8], nonce: U256) -> B256 {
    let mut buf = Vec::with_capacity(2 + src_address.len() + 32);
    buf.extend_from_slice(&src_chain.to_be_bytes());
    buf.extend_from_slice(src_address);
    buf.extend_from_slice(&nonce.to_be_bytes::<32>());
    keccak256(buf)
}
