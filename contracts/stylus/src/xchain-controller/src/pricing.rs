//! Converts the native fee a relayer fronted into stablecoin units, using the registry's
//! Chainlink-style price feeds.

use alloy_primitives::{Address, U256};

use crate::{
    errors::XChainError,
    host::{Erc20, PriceFeed, PriceQuote, Runtime},
    registry::SwapParams,
};

/// Feed answers older than this are refused.
pub const MAX_PRICE_AGE: u64 = 86_400;

/// Native token decimals (wei).
pub const NATIVE_DECIMALS: u8 = 18;

/// A positive, fresh feed answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Price {
    pub value: U256,
    pub decimals: u8,
}

fn checked_price(feed: Address, quote: PriceQuote, now: u64) -> Result<Price, XChainError> {
    if !quote.answer.is_positive() {
        return Err(XChainError::InvalidPrice { feed });
    }
    if now.saturating_sub(quote.updated_at) > MAX_PRICE_AGE {
        return Err(XChainError::StalePrice {
            feed,
            updated_at: quote.updated_at,
        });
    }
    Ok(Price {
        value: quote.answer.into_raw(),
        decimals: quote.decimals,
    })
}

fn read_price<H: PriceFeed + Runtime>(host: &H, feed: Address) -> Result<Price, XChainError> {
    if feed == Address::ZERO {
        return Err(XChainError::PriceFeedNotConfigured);
    }
    let quote = host.latest_price(feed)?;
    checked_price(feed, quote, host.block_timestamp())
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).saturating_pow(U256::from(exp))
}

/// `xc_fee * pNative * 10^(stableDec + stableFeedDec) / (10^18 * 10^nativeFeedDec * pStable)`,
/// rounded down.
pub fn convert_native_fee(xc_fee: U256, native: Price, stable: Price, stable_decimals: u8) -> U256 {
    let numerator = xc_fee
        .saturating_mul(native.value)
        .saturating_mul(pow10(stable_decimals as u32 + stable.decimals as u32));
    let denominator =
        pow10(NATIVE_DECIMALS as u32 + native.decimals as u32).saturating_mul(stable.value);
    if denominator.is_zero() {
        return U256::ZERO;
    }
    numerator / denominator
}

/// Stablecoin owed to the relayer for fronting `xc_fee` of native gas. Zero fee reads no feeds.
pub fn relayer_reimbursement<H>(
    host: &H,
    swap: &SwapParams,
    xc_fee: U256,
) -> Result<U256, XChainError>
where
    H: Erc20 + PriceFeed + Runtime,
{
    if xc_fee.is_zero() {
        return Ok(U256::ZERO);
    }
    let native = read_price(host, swap.native_price_feed)?;
    let stable = read_price(host, swap.stablecoin_price_feed)?;
    let stable_decimals = host.decimals(swap.stablecoin)?;
    Ok(convert_native_fee(xc_fee, native, stable, stable_decimals))
}
