use alloy_primitives::{Address, B256, U256};
use anyhow::{ensure, Context, Result};
use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use xchain_controller_types::{
    encode_deposit_request, encode_withdrawal_request, permit_digest,
    CrossChainRequest, Direction, PermitDomain, PermitSignature, SendRequestPermit,
};

use crate::types::{parse_hex, to_hex, SignedPermit};

/// Payload the controller will send for `request`.
///
/// Relayed deposits carry the amount net of the relayer reimbursement; pass it as `net_amount`
/// to reproduce those bytes.
pub fn payload_for(
    request: &CrossChainRequest,
    direction: Direction,
    net_amount: Option<U256>,
) -> Vec<u8> {
    match direction {
        Direction::Deposit => encode_deposit_request(
            request.vault,
            net_amount.unwrap_or(request.amount),
            request.slippage_factor,
            request.dst_wallet,
            &request.data,
        ),
        Direction::Withdraw => encode_withdrawal_request(request.dst_wallet),
    }
}

pub fn domain(chain_id: u64, controller: Address) -> PermitDomain {
    PermitDomain {
        chain_id,
        verifying_contract: controller,
    }
}

pub fn parse_signing_key(s: &str) -> Result<SigningKey> {
    let bytes = parse_hex("private key", s)?;
    ensure!(bytes.len() == 32, "private key must be 32 bytes, got {}", bytes.len());
    SigningKey::from_slice(&bytes).context("invalid secp256k1 private key")
}

/// Ethereum address of a public key: low 20 bytes of keccak256(uncompressed point without prefix).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let mut h = Keccak256::new();
    h.update(&point.as_bytes()[1..]);
    let out = h.finalize();
    Address::from_slice(&out[12..32])
}

/// Sign `permit` for `domain`, producing a low-`s` signature with `v` in {27, 28}.
///
/// Refuses to sign for a key that is not the request's origin wallet, since the controller
/// would reject the result.
pub fn sign_permit(
    key: &SigningKey,
    domain: &PermitDomain,
    permit: &SendRequestPermit,
) -> Result<SignedPermit> {
    let signer = address_of(key.verifying_key());
    ensure!(
        signer == permit.request.origin_wallet,
        "signing key belongs to {signer}, but the request's originWallet is {}",
        permit.request.origin_wallet
    );

    let digest = permit_digest(domain, permit);
    let (mut sig, mut recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .context("failed to sign permit digest")?;
    if let Some(low) = sig.normalize_s() {
        sig = low;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }
    let (r, s) = sig.split_bytes();

    Ok(SignedPermit {
        v: 27 + recovery_id.to_byte(),
        r: to_hex(&r),
        s: to_hex(&s),
        signer: signer.to_string(),
        digest: to_hex(digest.as_slice()),
    })
}

/// Recover the signer the controller will see for `signature` over `digest`.
pub fn recover_signer(digest: B256, signature: &PermitSignature) -> Result<Address> {
    ensure!(signature.is_canonical(), "signature is not canonical (v, zero r/s or high s)");
    let v = signature.normalized_v().context("invalid v")?;
    let recovery_id = RecoveryId::from_byte(v - 27).context("invalid recovery id")?;
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(signature.r.as_slice());
    rs[32..].copy_from_slice(signature.s.as_slice());
    let sig = k256::ecdsa::Signature::from_slice(&rs).context("invalid signature scalars")?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .context("signature recovery failed")?;
    Ok(address_of(&key))
}
