//! Shared request, payload and permit types for the cross-chain vault controller.
//!
//! Used by the Stylus controller on-chain and by the relayer tooling off-chain, so the payload
//! bytes and EIP-712 digests are produced by one implementation.

#![no_std]

extern crate alloc;

pub mod payload;
pub mod permit;
pub mod request;

pub use payload::{
    decode_payload, encode_deposit_request, encode_withdrawal_request, DepositInstruction, Payload,
    PayloadError, PayloadKind, WithdrawalInstruction,
};
pub use permit::{permit_digest, PermitDomain, PermitSignature, SendRequestPermit};
pub use request::{CrossChainRequest, Direction, RequestError};
