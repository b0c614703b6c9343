//! Wire format for the instruction carried alongside the bridged value.
//!
//! Layout (big-endian for integer fields):
//! - u8 version (= 1)
//! - u8 kind (0x01 deposit, 0x02 withdrawal)
//! - deposit: bytes20 vault | u256 amount | u256 slippage_factor | bytes20 dst_wallet
//!   | u32 data_len | bytes data
//! - withdrawal: bytes20 dst_wallet
//!
//! Only the two controller instances read this format, so decoding is strict: unknown
//! versions, unknown kinds, truncation and trailing bytes are all rejected.

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

pub const PAYLOAD_VERSION: u8 = 1;

/// Leading discriminator of a payload (also reported as the `SendMsg` packet type).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PayloadKind {
    Deposit = 0x01,
    Withdrawal = 0x02,
}

impl TryFrom<u8> for PayloadKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PayloadKind::Deposit),
            0x02 => Ok(PayloadKind::Withdrawal),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositInstruction {
    pub vault: Address,
    pub amount: U256,
    pub slippage_factor: U256,
    pub dst_wallet: Address,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalInstruction {
    pub dst_wallet: Address,
}

/// Decoded instruction, one of exactly two shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Deposit(DepositInstruction),
    Withdrawal(WithdrawalInstruction),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Deposit(_) => PayloadKind::Deposit,
            Payload::Withdrawal(_) => PayloadKind::Withdrawal,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Payload::Deposit(d) => {
                encode_deposit_request(d.vault, d.amount, d.slippage_factor, d.dst_wallet, &d.data)
            }
            Payload::Withdrawal(w) => encode_withdrawal_request(w.dst_wallet),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadError {
    Truncated,
    UnsupportedVersion(u8),
    UnknownKind(u8),
    TrailingBytes,
}

/// Encode a "receive deposit" instruction.
pub fn encode_deposit_request(
    vault: Address,
    amount: U256,
    slippage_factor: U256,
    dst_wallet: Address,
    data: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + 20 + 32 + 32 + 20 + 4 + data.len());
    buf.push(PAYLOAD_VERSION);
    buf.push(PayloadKind::Deposit as u8);
    buf.extend_from_slice(vault.as_slice());
    buf.extend_from_slice(&amount.to_be_bytes::<32>());
    buf.extend_from_slice(&slippage_factor.to_be_bytes::<32>());
    buf.extend_from_slice(dst_wallet.as_slice());
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(data);
    buf
}

/// Encode a "receive withdrawal" instruction. The bridged amount travels on the value leg.
pub fn encode_withdrawal_request(dst_wallet: Address) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + 20);
    buf.push(PAYLOAD_VERSION);
    buf.push(PayloadKind::Withdrawal as u8);
    buf.extend_from_slice(dst_wallet.as_slice());
    buf
}

pub fn decode_payload(bytes: &[u8]) -> Result<Payload, PayloadError> {
    let mut i = 0usize;
    let version = read_u8(bytes, &mut i)?;
    if version != PAYLOAD_VERSION {
        return Err(PayloadError::UnsupportedVersion(version));
    }
    let tag = read_u8(bytes, &mut i)?;
    let kind = PayloadKind::try_from(tag).map_err(|_| PayloadError::UnknownKind(tag))?;

    let payload = match kind {
        PayloadKind::Deposit => {
            let vault = read_address(bytes, &mut i)?;
            let amount = read_u256(bytes, &mut i)?;
            let slippage_factor = read_u256(bytes, &mut i)?;
            let dst_wallet = read_address(bytes, &mut i)?;
            let data_len = read_u32(bytes, &mut i)? as usize;
            let data = read_vec(bytes, &mut i, data_len)?;
            Payload::Deposit(DepositInstruction {
                vault,
                amount,
                slippage_factor,
                dst_wallet,
                data,
            })
        }
        PayloadKind::Withdrawal => {
            let dst_wallet = read_address(bytes, &mut i)?;
            Payload::Withdrawal(WithdrawalInstruction { dst_wallet })
        }
    };

    if i != bytes.len() {
        return Err(PayloadError::TrailingBytes);
    }
    Ok(payload)
}

fn read_u8(bytes: &[u8], i: &mut usize) -> Result<u8, PayloadError> {
    let b = *bytes.get(*i).ok_or(PayloadError::Truncated)?;
    *i += 1;
    Ok(b)
}

fn read_u32(bytes: &[u8], i: &mut usize) -> Result<u32, PayloadError> {
    if bytes.len() < *i + 4 {
        return Err(PayloadError::Truncated);
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*i..*i + 4]);
    *i += 4;
    Ok(u32::from_be_bytes(buf))
}

fn read_u256(bytes: &[u8], i: &mut usize) -> Result<U256, PayloadError> {
    if bytes.len() < *i + 32 {
        return Err(PayloadError::Truncated);
    }
    let word = &bytes[*i..*i + 32];
    *i += 32;
    Ok(U256::from_be_slice(word))
}

fn read_address(bytes: &[u8], i: &mut usize) -> Result<Address, PayloadError> {
    if bytes.len() < *i + 20 {
        return Err(PayloadError::Truncated);
    }
    let addr = Address::from_slice(&bytes[*i..*i + 20]);
    *i += 20;
    Ok(addr)
}

fn read_vec(bytes: &[u8], i: &mut usize, len: usize) -> Result<Vec<u8>, PayloadError> {
    // `len` comes from the wire; compare without overflowing `*i + len`.
    if bytes.len() - *i < len {
        return Err(PayloadError::Truncated);
    }
    let out = bytes[*i..*i + len].to_vec();
    *i += len;
    Ok(out)
}
