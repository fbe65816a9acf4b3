use tracing::{debug, trace};
use crate::{
    drive::{verify_drive_inclusion, DriveInclusion},
    epoch::verify_epoch_commitment,
    errors::{LayoutError, ValidationError},
    hashers::keccak256,
    layout::MachineLayout,
    merkle::{KeccakMerkle, MerklePrimitives},
    types::{EpochHash, InclusionLevel, OutputKind, OutputValidityProof},
};

/// Verifies output proofs for one machine layout.
#[derive(Clone, Debug)]
pub struct OutputValidator<M = KeccakMerkle> {
    layout: MachineLayout,
    merkle: M,
}

impl OutputValidator {
    /// Validator for the canonical layout with Keccak primitives.
    #[must_use]
    pub const fn canonical() -> Self {
        Self { layout: MachineLayout::CANONICAL, merkle: KeccakMerkle }
    }

    pub fn new(layout: MachineLayout) -> Result<Self, LayoutError> {
        Self::with_primitives(layout, KeccakMerkle)
    }
}

impl Default for OutputValidator {
    fn default() -> Self {
        Self::canonical()
    }
}

impl<M: MerklePrimitives> OutputValidator<M> {
    pub fn with_primitives(layout: MachineLayout, merkle: M) -> Result<Self, LayoutError> {
        layout.validate()?;
        Ok(Self { layout, merkle })
    }

    #[must_use]
    pub const fn layout(&self) -> &MachineLayout {
        &self.layout
    }

    /// Verify that `output` was emitted as output `proof.output_index` of input
    /// `proof.epoch_input_index` in the epoch committed by `epoch_hash`.
    ///
    /// Steps: epoch commitment → per-input root in epoch root → output hash in per-input root.
    ///
    /// # Errors
    ///
    /// Returns the first failing step as a `ValidationError`.
    pub fn validate(
        &self,
        kind: OutputKind,
        proof: &OutputValidityProof,
        output: &[u8],
        epoch_hash: &EpochHash,
    ) -> Result<(), ValidationError> {
        match self.check(kind, proof, output, epoch_hash) {
            Ok(()) => {
                trace!(
                    %kind,
                    input = proof.epoch_input_index,
                    output = proof.output_index,
                    "output proof accepted"
                );
                Ok(())
            }
            Err(error) => {
                debug!(
                    %kind,
                    input = proof.epoch_input_index,
                    output = proof.output_index,
                    %error,
                    "output proof rejected"
                );
                Err(error)
            }
        }
    }

    pub fn validate_voucher(
        &self,
        proof: &OutputValidityProof,
        output: &[u8],
        epoch_hash: &EpochHash,
    ) -> Result<(), ValidationError> {
        self.validate(OutputKind::Voucher, proof, output, epoch_hash)
    }

    pub fn validate_notice(
        &self,
        proof: &OutputValidityProof,
        output: &[u8],
        epoch_hash: &EpochHash,
    ) -> Result<(), ValidationError> {
        self.validate(OutputKind::Notice, proof, output, epoch_hash)
    }

    fn check(
        &self,
        kind: OutputKind,
        proof: &OutputValidityProof,
        output: &[u8],
        epoch_hash: &EpochHash,
    ) -> Result<(), ValidationError> {
        verify_epoch_commitment(proof, epoch_hash)?;

        verify_drive_inclusion(&self.merkle, &self.layout, &DriveInclusion {
            level: InclusionLevel::Epoch,
            kind,
            index: proof.epoch_input_index,
            leaf: &proof.output_hashes_root_hash,
            siblings: &proof.output_hashes_in_epoch_siblings,
            root: proof.epoch_root_hash(kind),
        })?;

        // The metadata drive stores the output hash as raw bytes, so the slot content is the
        // word-granular root of those 32 bytes, not the hash itself.
        let output_hash = keccak256(output);
        let slot_root = self.merkle.root_from_bytes(&output_hash, self.layout.word_log2_size)?;

        verify_drive_inclusion(&self.merkle, &self.layout, &DriveInclusion {
            level: InclusionLevel::Metadata,
            kind,
            index: proof.output_index,
            leaf: &slot_root,
            siblings: &proof.keccak_in_hashes_siblings,
            root: &proof.output_hashes_root_hash,
        })
    }
}

/// Validate a voucher against the canonical layout.
///
/// # Errors
///
/// See [`OutputValidator::validate`].
pub fn validate_voucher(
    proof: &OutputValidityProof,
    voucher: &[u8],
    epoch_hash: &EpochHash,
) -> Result<(), ValidationError> {
    OutputValidator::canonical().validate_voucher(proof, voucher, epoch_hash)
}

/// Validate a notice against the canonical layout.
///
/// # Errors
///
/// See [`OutputValidator::validate`].
pub fn validate_notice(
    proof: &OutputValidityProof,
    notice: &[u8],
    epoch_hash: &EpochHash,
) -> Result<(), ValidationError> {
    OutputValidator::canonical().validate_notice(proof, notice, epoch_hash)
}
