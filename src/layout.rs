//! Machine memory layout: leaf granularity and drive sizes of the output ranges.
//!
//! All sizes are log2 of a byte count. Output hashes occupy 32-byte slots
//! (`KECCAK_LOG2_SIZE`) whose contents are hashed at word granularity
//! (`WORD_LOG2_SIZE`).

use crate::{
    errors::{LayoutError, MerkleError},
    types::{InclusionLevel, OutputKind},
};

pub const WORD_LOG2_SIZE: u32 = 3;                // 8-byte machine word
pub const KECCAK_LOG2_SIZE: u32 = 5;              // 32-byte hash slot
pub const EPOCH_VOUCHER_LOG2_SIZE: u32 = 37;
pub const EPOCH_NOTICE_LOG2_SIZE: u32 = 37;
pub const VOUCHER_METADATA_LOG2_SIZE: u32 = 21;
pub const NOTICE_METADATA_LOG2_SIZE: u32 = 21;
pub const MAX_LOG2_SIZE: u32 = 64;

/// Byte offset of slot `index` when slots are `2^log2_size` bytes wide.
#[inline]
#[must_use]
pub const fn position(index: u64, log2_size: u32) -> Option<u64> {
    match 1u64.checked_shl(log2_size) {
        Some(stride) => index.checked_mul(stride),
        None => None,
    }
}

/// Number of `2^leaf_log2_size`-byte leaves in a `2^log2_size`-byte range.
#[inline]
#[must_use]
pub const fn size_in_leaves(log2_size: u32, leaf_log2_size: u32) -> Option<u64> {
    if leaf_log2_size > log2_size {
        return None;
    }
    1u64.checked_shl(log2_size - leaf_log2_size)
}

/// Drive sizes used by one deployment. Passed explicitly to every validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MachineLayout {
    pub word_log2_size: u32,
    pub epoch_voucher_log2_size: u32,
    pub epoch_notice_log2_size: u32,
    pub voucher_metadata_log2_size: u32,
    pub notice_metadata_log2_size: u32,
}

impl MachineLayout {
    /// Layout of the canonical rollups machine.
    pub const CANONICAL: Self = Self {
        word_log2_size: WORD_LOG2_SIZE,
        epoch_voucher_log2_size: EPOCH_VOUCHER_LOG2_SIZE,
        epoch_notice_log2_size: EPOCH_NOTICE_LOG2_SIZE,
        voucher_metadata_log2_size: VOUCHER_METADATA_LOG2_SIZE,
        notice_metadata_log2_size: NOTICE_METADATA_LOG2_SIZE,
    };

    /// Check that every drive can hold at least one hash slot and that a hash slot
    /// splits into whole words.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.word_log2_size > KECCAK_LOG2_SIZE {
            return Err(LayoutError::WordLargerThanHash {
                word_log2_size: self.word_log2_size,
                hash_log2_size: KECCAK_LOG2_SIZE,
            });
        }
        let drives = [
            ("epoch voucher", self.epoch_voucher_log2_size),
            ("epoch notice", self.epoch_notice_log2_size),
            ("voucher metadata", self.voucher_metadata_log2_size),
            ("notice metadata", self.notice_metadata_log2_size),
        ];
        for (drive, log2_size) in drives {
            if !(KECCAK_LOG2_SIZE..=MAX_LOG2_SIZE).contains(&log2_size) {
                return Err(LayoutError::DriveSizeOutOfRange {
                    drive,
                    log2_size,
                    min: KECCAK_LOG2_SIZE,
                    max: MAX_LOG2_SIZE,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn epoch_log2_size(&self, kind: OutputKind) -> u32 {
        match kind {
            OutputKind::Voucher => self.epoch_voucher_log2_size,
            OutputKind::Notice => self.epoch_notice_log2_size,
        }
    }

    #[must_use]
    pub const fn metadata_log2_size(&self, kind: OutputKind) -> u32 {
        match kind {
            OutputKind::Voucher => self.voucher_metadata_log2_size,
            OutputKind::Notice => self.notice_metadata_log2_size,
        }
    }

    #[must_use]
    pub const fn drive_log2_size(&self, level: InclusionLevel, kind: OutputKind) -> u32 {
        match level {
            InclusionLevel::Epoch => self.epoch_log2_size(kind),
            InclusionLevel::Metadata => self.metadata_log2_size(kind),
        }
    }

    /// Number of hash slots in the given drive, `None` when it exceeds `u64`.
    #[must_use]
    pub const fn slot_capacity(&self, level: InclusionLevel, kind: OutputKind) -> Option<u64> {
        size_in_leaves(self.drive_log2_size(level, kind), KECCAK_LOG2_SIZE)
    }

    /// Byte offset of hash slot `index`.
    pub const fn slot_position(&self, index: u64) -> Result<u64, MerkleError> {
        match position(index, KECCAK_LOG2_SIZE) {
            Some(p) => Ok(p),
            None => Err(MerkleError::OffsetOverflow { index, log2_size: KECCAK_LOG2_SIZE }),
        }
    }
}

impl Default for MachineLayout {
    fn default() -> Self {
        Self::CANONICAL
    }
}
