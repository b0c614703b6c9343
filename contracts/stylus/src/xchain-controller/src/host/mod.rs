//! Seams to everything the controller does not own: the token contracts, the transport router,
//! the vault, the price feeds, and the execution environment itself.
//!
//! The protocol logic is written against these traits; `onchain` implements them with raw EVM
//! calls, and the test harness implements them with an in-memory ledger.

use alloc::vec::Vec;

use alloy_primitives::{Address, B256, I256, U256};

use xchain_controller_types::{DepositInstruction, PermitSignature};

pub mod interfaces;
pub mod onchain;

/// Stargate function type for a remote swap (value + payload).
pub const TYPE_SWAP_REMOTE: u8 = 1;

/// Failure of a call into an external contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalCallError {
    /// The callee reverted; `data` is its revert payload, kept verbatim.
    Reverted { target: Address, data: Vec<u8> },
    /// Return data could not be decoded.
    MalformedReturn { target: Address },
    /// A token call returned `false`.
    Rejected { target: Address },
}

/// Everything the transport needs to quote or deliver one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeQuoteRequest<'a> {
    pub dst_chain: u16,
    pub dst_controller: &'a [u8],
    pub payload: &'a [u8],
    pub dst_gas_for_call: U256,
}

/// Value leg of a send: escrowed tokens moved from `src_pool_id` to `dst_pool_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeTransfer {
    pub dst_chain: u16,
    pub src_pool_id: U256,
    pub dst_pool_id: U256,
    pub refund_address: Address,
    pub amount: U256,
    pub min_amount: U256,
    pub dst_gas_for_call: U256,
    pub dst_controller: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Latest answer of a price feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceQuote {
    /// Raw answer; may be non-positive if the feed misbehaves.
    pub answer: I256,
    pub decimals: u8,
    pub updated_at: u64,
}

/// Execution environment of the current call.
pub trait Runtime {
    fn contract_address(&self) -> Address;
    fn chain_id(&self) -> u64;
    fn block_timestamp(&self) -> u64;
    /// `ecrecover` over a prehashed digest; `None` when recovery fails.
    fn recover_signer(&self, digest: B256, signature: &PermitSignature) -> Option<Address>;
}

pub trait Erc20 {
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ExternalCallError>;
    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ExternalCallError>;
    fn decimals(&self, token: Address) -> Result<u8, ExternalCallError>;
    fn transfer(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError>;
    fn transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError>;
    fn approve(
        &mut self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExternalCallError>;
}

/// Value + message transport (a Stargate-style router).
pub trait Transport {
    /// Native fee required to deliver `request`. Pure query.
    fn quote_fee(
        &self,
        router: Address,
        request: &FeeQuoteRequest<'_>,
    ) -> Result<U256, ExternalCallError>;
    /// Hand escrowed tokens and the payload to the router, paying `native_fee`.
    fn send(
        &mut self,
        router: Address,
        native_fee: U256,
        transfer: &BridgeTransfer,
    ) -> Result<(), ExternalCallError>;
}

pub trait Vault {
    /// Credit `amount` (already approved to the vault) and mint shares to `instruction.dst_wallet`.
    fn credit_deposit(
        &mut self,
        vault: Address,
        amount: U256,
        instruction: &DepositInstruction,
    ) -> Result<U256, ExternalCallError>;
    /// Burn `shares` held by the caller and release the settlement asset to `recipient`.
    fn debit_for_withdrawal(
        &mut self,
        vault: Address,
        shares: U256,
        recipient: Address,
    ) -> Result<U256, ExternalCallError>;
}

pub trait PriceFeed {
    fn latest_price(&self, feed: Address) -> Result<PriceQuote, ExternalCallError>;
}

/// The full set of collaborators the controller drives.
pub trait Host: Runtime + Erc20 + Transport + Vault + PriceFeed {}

impl<T: Runtime + Erc20 + Transport + Vault + PriceFeed> Host for T {}
