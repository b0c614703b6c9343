//! EIP-712 hashing for relayed (gasless) cross-chain requests.
//!
//! The digest produced here is what the origin wallet signs off-chain and what the controller
//! recomputes on-chain; both sides must use this module so the bytes agree exactly.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::request::{CrossChainRequest, Direction};

pub const DOMAIN_NAME: &str = "XChain Vault Controller";
pub const DOMAIN_VERSION: &str = "1";

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const REQUEST_TYPE: &str = concat!(
    "XCPermitRequest(uint16 dstChain,uint256 dstPoolId,bytes remoteControllerXChain,",
    "address vault,address originWallet,address dstWallet,uint256 amount,",
    "uint256 slippageFactor,uint256 dstGasForCall,bytes data)"
);

/// Primary type followed by its referenced struct type, per EIP-712 `encodeType`.
pub const PERMIT_TYPE: &str = concat!(
    "SendRequestPermit(XCPermitRequest request,uint8 direction,uint256 xcfee,",
    "uint256 nonce,uint256 deadline)",
    "XCPermitRequest(uint16 dstChain,uint256 dstPoolId,bytes remoteControllerXChain,",
    "address vault,address originWallet,address dstWallet,uint256 amount,",
    "uint256 slippageFactor,uint256 dstGasForCall,bytes data)"
);

/// Upper bound for `s` (secp256k1 order / 2); higher values are malleable (EIP-2).
pub const SECP256K1_HALF_ORDER: U256 = U256::from_limbs([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Domain separation parameters: the verifying controller on a given EVM chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermitDomain {
    pub chain_id: u64,
    pub verifying_contract: Address,
}

/// A request wrapped with the replay and expiry bounds the signer agreed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendRequestPermit {
    pub request: CrossChainRequest,
    pub direction: Direction,
    /// Native fee the relayer fronts and the signer reimburses.
    pub xc_fee: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Detached `(v, r, s)` signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermitSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl PermitSignature {
    /// Recovery parity as 27/28, accepting the raw 0/1 form too.
    pub fn normalized_v(&self) -> Option<u8> {
        match self.v {
            27 | 28 => Some(self.v),
            0 | 1 => Some(self.v + 27),
            _ => None,
        }
    }

    /// Non-zero `r`/`s`, low-`s`, and a recognised `v`.
    pub fn is_canonical(&self) -> bool {
        let r = U256::from_be_bytes(self.r.0);
        let s = U256::from_be_bytes(self.s.0);
        self.normalized_v().is_some() && !r.is_zero() && !s.is_zero() && s <= SECP256K1_HALF_ORDER
    }
}

pub fn domain_separator(domain: &PermitDomain) -> B256 {
    let mut enc = WordEncoder::with_words(5);
    enc.push_b256(keccak256(DOMAIN_TYPE.as_bytes()));
    enc.push_b256(keccak256(DOMAIN_NAME.as_bytes()));
    enc.push_b256(keccak256(DOMAIN_VERSION.as_bytes()));
    enc.push_u256(U256::from(domain.chain_id));
    enc.push_address(domain.verifying_contract);
    keccak256(enc.finish())
}

pub fn request_struct_hash(request: &CrossChainRequest) -> B256 {
    let mut enc = WordEncoder::with_words(11);
    enc.push_b256(keccak256(REQUEST_TYPE.as_bytes()));
    enc.push_u256(U256::from(request.dst_chain));
    enc.push_u256(request.dst_pool_id);
    enc.push_b256(keccak256(&request.dst_controller));
    enc.push_address(request.vault);
    enc.push_address(request.origin_wallet);
    enc.push_address(request.dst_wallet);
    enc.push_u256(request.amount);
    enc.push_u256(request.slippage_factor);
    enc.push_u256(request.dst_gas_for_call);
    enc.push_b256(keccak256(&request.data));
    keccak256(enc.finish())
}

pub fn permit_struct_hash(permit: &SendRequestPermit) -> B256 {
    let mut enc = WordEncoder::with_words(6);
    enc.push_b256(keccak256(PERMIT_TYPE.as_bytes()));
    enc.push_b256(request_struct_hash(&permit.request));
    enc.push_u256(U256::from(permit.direction as u8));
    enc.push_u256(permit.xc_fee);
    enc.push_u256(permit.nonce);
    enc.push_u256(permit.deadline);
    keccak256(enc.finish())
}

/// Final digest: keccak256("\x19\x01" || domainSeparator || structHash).
pub fn permit_digest(domain: &PermitDomain, permit: &SendRequestPermit) -> B256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain_separator(domain).as_slice());
    buf.extend_from_slice(permit_struct_hash(permit).as_slice());
    keccak256(buf)
}

/// ABI word encoder for the static members of an EIP-712 struct.
struct WordEncoder {
    buf: Vec<u8>,
}

impl WordEncoder {
    fn with_words(n: usize) -> Self {
        Self { buf: Vec::with_capacity(32 * n) }
    }

    fn push_b256(&mut self, v: B256) {
        self.buf.extend_from_slice(v.as_slice());
    }

    fn push_u256(&mut self, v: U256) {
        self.buf.extend_from_slice(&v.to_be_bytes::<32>());
    }

    fn push_address(&mut self, a: Address) {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(a.as_slice());
        self.buf.extend_from_slice(&word);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}
