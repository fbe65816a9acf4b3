use crate::{
    errors::ValidationError,
    hashers::ct_eq_hash,
    layout::{MachineLayout, KECCAK_LOG2_SIZE},
    merkle::MerklePrimitives,
    types::{Hash256, InclusionLevel, OutputKind},
};

/// One positional inclusion claim: `leaf` sits in hash slot `index` of a drive whose root is `root`.
#[derive(Clone, Copy, Debug)]
pub struct DriveInclusion<'a> {
    pub level: InclusionLevel,
    pub kind: OutputKind,
    pub index: u64,
    pub leaf: &'a Hash256,
    pub siblings: &'a [Hash256],
    pub root: &'a Hash256,
}

impl DriveInclusion<'_> {
    const fn mismatch(&self) -> ValidationError {
        match self.level {
            InclusionLevel::Epoch => ValidationError::OutputsRootMismatch { kind: self.kind },
            InclusionLevel::Metadata => ValidationError::OutputHashesRootMismatch { kind: self.kind },
        }
    }
}

/// Recompute the drive root with `claim.leaf` at its slot and compare it with `claim.root`.
///
/// # Errors
///
/// Returns `ValidationError::MalformedProof` when the slot offset overflows or the sibling
/// path does not fit the drive, and the level's mismatch error when the roots differ.
pub fn verify_drive_inclusion<M: MerklePrimitives + ?Sized>(
    merkle: &M,
    layout: &MachineLayout,
    claim: &DriveInclusion<'_>,
) -> Result<(), ValidationError> {
    let position = layout.slot_position(claim.index)?;
    let drive_log2_size = layout.drive_log2_size(claim.level, claim.kind);
    let computed = merkle.root_after_replacement(
        position,
        KECCAK_LOG2_SIZE,
        drive_log2_size,
        claim.leaf,
        claim.siblings,
    )?;
    if !ct_eq_hash(&computed, claim.root) {
        return Err(claim.mismatch());
    }
    Ok(())
}
