use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

/// Slippage factors are expressed out of this denominator (9_900 = 1% max slippage).
pub const SLIPPAGE_DENOMINATOR: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Destination gas ceiling applied when the registry has none configured.
pub const DEFAULT_DST_GAS_CEILING: U256 = U256::from_limbs([2_000_000, 0, 0, 0]);

/// Longest destination controller address accepted (one ABI word).
pub const MAX_DST_CONTROLLER_LEN: usize = 32;

/// Which way a request moves funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Deposit = 0,
    Withdraw = 1,
}

impl TryFrom<u8> for Direction {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Deposit),
            1 => Ok(Direction::Withdraw),
            _ => Err(()),
        }
    }
}

/// Reasons a request is rejected before any funds move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestError {
    ZeroAmount,
    InvalidSlippageFactor,
    DstGasTooHigh,
    InvalidDestination,
}

/// A deposit or withdrawal intent, as signed by the origin wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossChainRequest {
    /// Destination chain id in transport numbering.
    pub dst_chain: u16,
    /// Liquidity pool the value leg lands in on the destination chain.
    pub dst_pool_id: U256,
    /// Destination controller, kept opaque since the remote address format may differ.
    pub dst_controller: Vec<u8>,
    pub vault: Address,
    pub origin_wallet: Address,
    pub dst_wallet: Address,
    /// Token-native units of the escrowed asset (stablecoin or vault shares).
    pub amount: U256,
    pub slippage_factor: U256,
    /// Native gas allowance for the destination-side callback.
    pub dst_gas_for_call: U256,
    /// Routing hints forwarded untouched to the destination vault.
    pub data: Vec<u8>,
}

impl CrossChainRequest {
    /// Check the request invariants against the given destination gas ceiling.
    pub fn validate(&self, dst_gas_ceiling: U256) -> Result<(), RequestError> {
        if self.amount.is_zero() {
            return Err(RequestError::ZeroAmount);
        }
        validate_slippage_factor(self.slippage_factor)?;
        if self.dst_gas_for_call > dst_gas_ceiling {
            return Err(RequestError::DstGasTooHigh);
        }
        if self.dst_controller.is_empty() || self.dst_controller.len() > MAX_DST_CONTROLLER_LEN {
            return Err(RequestError::InvalidDestination);
        }
        Ok(())
    }
}

/// A slippage factor must lie in `(0, SLIPPAGE_DENOMINATOR]`.
pub fn validate_slippage_factor(factor: U256) -> Result<(), RequestError> {
    if factor.is_zero() || factor > SLIPPAGE_DENOMINATOR {
        return Err(RequestError::InvalidSlippageFactor);
    }
    Ok(())
}

/// Minimum amount accepted after applying `factor` to `amount` (rounded down).
pub fn apply_slippage(amount: U256, factor: U256) -> U256 {
    amount.saturating_mul(factor) / SLIPPAGE_DENOMINATOR
}
