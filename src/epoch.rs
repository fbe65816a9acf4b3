use crate::{
    errors::ValidationError,
    hashers::{compute_epoch_hash, ct_eq_hash},
    types::{EpochHash, OutputValidityProof},
};

/// Check that the trusted epoch hash commits to the roots and machine state carried by `proof`.
///
/// # Errors
///
/// Returns `ValidationError::CommitmentMismatch` if
/// `keccak256(vouchers_root || notices_root || machine_state_hash) != epoch_hash`.
pub fn verify_epoch_commitment(
    proof: &OutputValidityProof,
    epoch_hash: &EpochHash,
) -> Result<(), ValidationError> {
    let computed = compute_epoch_hash(
        &proof.vouchers_epoch_root_hash,
        &proof.notices_epoch_root_hash,
        &proof.machine_state_hash,
    );
    if !ct_eq_hash(&computed.0, &epoch_hash.0) {
        return Err(ValidationError::CommitmentMismatch);
    }
    Ok(())
}
