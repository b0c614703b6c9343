//! Cross-chain vault controller for Arbitrum Stylus.
//!
//! Layout:
//! - `controller`: the `#[entrypoint]` contract (storage, public ABI, events)
//! - `coordinator`: outbound quote / escrow / bridge
//! - `reconcile`: inbound transport callback
//! - `authorization`: EIP-712 permits with sequential nonces
//! - `pricing`: relayer fee reimbursement from price feeds
//! - `registry`: configuration and persistent counters
//! - `host`: seams to tokens, transport, vault and price feeds

#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

pub mod authorization;
pub mod controller;
pub mod coordinator;
pub mod errors;
pub mod host;
pub mod pricing;
pub mod reconcile;
pub mod registry;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::ControllerXChain;
