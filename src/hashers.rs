use sha3::{Digest, Keccak256};
use subtle::ConstantTimeEq;
use crate::types::{EpochHash, Hash256};

#[inline]
fn finalize(h: Keccak256) -> Hash256 {
    let digest = h.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Keccak-256 (the pre-standard padding used by the EVM, not SHA3-256).
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut h = Keccak256::new();
    h.update(data);
    finalize(h)
}

/// Parent node: `keccak256(left || right)`.
#[inline]
#[must_use]
pub fn keccak_node(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut h = Keccak256::new();
    h.update(left);
    h.update(right);
    finalize(h)
}

/// E = keccak256( vouchers_epoch_root || notices_epoch_root || machine_state_hash )
#[must_use]
pub fn compute_epoch_hash(
    vouchers_epoch_root_hash: &Hash256,
    notices_epoch_root_hash: &Hash256,
    machine_state_hash: &Hash256,
) -> EpochHash {
    let mut h = Keccak256::new();
    h.update(vouchers_epoch_root_hash);
    h.update(notices_epoch_root_hash);
    h.update(machine_state_hash);
    EpochHash(finalize(h))
}

/// Constant-time equality for two 32-byte hashes.
#[must_use]
pub fn ct_eq_hash(a: &Hash256, b: &Hash256) -> bool {
    a.ct_eq(b).into()
}
