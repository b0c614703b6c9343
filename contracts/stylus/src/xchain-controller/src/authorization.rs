//! Verification of relayed requests: EIP-712 signature, sequential per-signer nonce, deadline.

use alloy_primitives::{Address, U256};

use xchain_controller_types::{permit_digest, PermitDomain, PermitSignature, SendRequestPermit};

use crate::{errors::XChainError, host::Runtime, registry::ControllerState};

/// Signing domain of this controller instance.
pub fn permit_domain<R: Runtime>(rt: &R) -> PermitDomain {
    PermitDomain {
        chain_id: rt.chain_id(),
        verifying_contract: rt.contract_address(),
    }
}

/// Verify `permit` and consume the signer's nonce.
///
/// Returns the signer, which is the request's origin wallet.
///
/// Checks run in a fixed order so the reported failure is deterministic:
/// deadline, then nonce, then signature.
pub fn authorize<S, R>(
    state: &mut S,
    rt: &R,
    permit: &SendRequestPermit,
    signature: &PermitSignature,
) -> Result<Address, XChainError>
where
    S: ControllerState,
    R: Runtime,
{
    let now = rt.block_timestamp();
    if permit.deadline < U256::from(now) {
        return Err(XChainError::ExpiredSignature {
            deadline: permit.deadline,
            now,
        });
    }

    let signer = permit.request.origin_wallet;
    let expected = state.nonce_of(signer);
    if permit.nonce != expected {
        return Err(XChainError::InvalidNonce {
            signer,
            expected,
            provided: permit.nonce,
        });
    }

    if !signature.is_canonical() {
        return Err(XChainError::InvalidSignature);
    }
    let digest = permit_digest(&permit_domain(rt), permit);
    match rt.recover_signer(digest, signature) {
        Some(recovered) if recovered == signer && signer != Address::ZERO => {}
        _ => return Err(XChainError::InvalidSignature),
    }

    state.set_nonce(signer, expected.saturating_add(U256::from(1u64)));
    Ok(signer)
}
