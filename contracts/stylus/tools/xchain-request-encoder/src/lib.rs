//! Off-chain counterpart of the controller: builds the exact payload bytes and EIP-712 digests
//! the contract computes, and signs relayed requests on behalf of the origin wallet.

pub mod encoder;
pub mod types;
