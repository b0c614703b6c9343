//! Signer recovery for relayed requests.

use stylus_sdk::{
    alloy_primitives::{Address, B256},
    call::RawCall,
};

use xchain_controller_types::PermitSignature;

/// Gas forwarded to the `ecrecover` precompile (it costs 3000).
const ECRECOVER_GAS: u64 = 50_000;

/// Recover an EOA address from a 32-byte digest and a detached `(v, r, s)` signature.
///
/// Notes:
/// - We use the EVM `ecrecover` precompile at address `0x01`.
/// - `v` may be given as 0/1 or 27/28; anything else fails.
/// - Malleability (high-`s`) is rejected by the caller before this is reached.
pub fn ecrecover(digest: B256, signature: &PermitSignature) -> Option<Address> {
    let v = signature.normalized_v()?;

    let mut precompile = [0u8; 20];
    precompile[19] = 1;
    let to = Address::from_slice(&precompile);

    let mut input = [0u8; 128];
    input[0..32].copy_from_slice(digest.as_slice());
    // v as 32-byte big-endian word.
    input[63] = v;
    input[64..96].copy_from_slice(signature.r.as_slice());
    input[96..128].copy_from_slice(signature.s.as_slice());

    let out = unsafe { RawCall::new_static().gas(ECRECOVER_GAS).call(to, &input) }.ok()?;
    // precompile returns 32-byte word with address in the low 20 bytes, or nothing on failure.
    if out.len() < 32 {
        return None;
    }
    let recovered = Address::from_slice(&out[12..32]);
    if recovered == Address::ZERO {
        return None;
    }
    Some(recovered)
}
