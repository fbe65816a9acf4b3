//! Keccak-256 Merkle trees over machine memory ranges.
//!
//! A drive of `2^d` bytes is a complete binary tree whose leaves are `2^l`-byte chunks hashed
//! with `keccak256(chunk)` and whose inner nodes are `keccak256(left || right)`. Regions that
//! were never written hash to the pristine (all-zero) root of their size.

use crate::{
    errors::MerkleError,
    hashers::{keccak256, keccak_node},
    layout::{size_in_leaves, MAX_LOG2_SIZE},
    types::Hash256,
};

/// Largest leaf hashed directly from bytes (one memory page).
pub const MAX_LEAF_LOG2_SIZE: u32 = 12;

/// The two tree operations the output validator relies on.
pub trait MerklePrimitives {
    /// Root of a `2^drive_log2_size`-byte drive after the `2^replacement_log2_size`-byte
    /// subtree at `position` is replaced by one hashing to `replacement`.
    fn root_after_replacement(
        &self,
        position: u64,
        replacement_log2_size: u32,
        drive_log2_size: u32,
        replacement: &Hash256,
        siblings: &[Hash256],
    ) -> Result<Hash256, MerkleError>;

    /// Root of `data` split into `2^leaf_log2_size`-byte leaves.
    fn root_from_bytes(&self, data: &[u8], leaf_log2_size: u32) -> Result<Hash256, MerkleError>;
}

impl<M: MerklePrimitives + ?Sized> MerklePrimitives for &M {
    fn root_after_replacement(
        &self,
        position: u64,
        replacement_log2_size: u32,
        drive_log2_size: u32,
        replacement: &Hash256,
        siblings: &[Hash256],
    ) -> Result<Hash256, MerkleError> {
        (**self).root_after_replacement(
            position,
            replacement_log2_size,
            drive_log2_size,
            replacement,
            siblings,
        )
    }

    fn root_from_bytes(&self, data: &[u8], leaf_log2_size: u32) -> Result<Hash256, MerkleError> {
        (**self).root_from_bytes(data, leaf_log2_size)
    }
}

/// Default primitives backed by the free functions of this module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeccakMerkle;

impl MerklePrimitives for KeccakMerkle {
    fn root_after_replacement(
        &self,
        position: u64,
        replacement_log2_size: u32,
        drive_log2_size: u32,
        replacement: &Hash256,
        siblings: &[Hash256],
    ) -> Result<Hash256, MerkleError> {
        root_after_replacement(position, replacement_log2_size, drive_log2_size, replacement, siblings)
    }

    fn root_from_bytes(&self, data: &[u8], leaf_log2_size: u32) -> Result<Hash256, MerkleError> {
        root_from_bytes(data, leaf_log2_size)
    }
}

/// Recompute a drive root from one subtree and its siblings, ordered from the subtree upwards.
///
/// # Errors
///
/// Returns `MerkleError` if the sizes are inconsistent, `position` is not aligned to the
/// replacement size or lies outside the drive, or `siblings` does not have exactly
/// `drive_log2_size - replacement_log2_size` entries.
pub fn root_after_replacement(
    position: u64,
    replacement_log2_size: u32,
    drive_log2_size: u32,
    replacement: &Hash256,
    siblings: &[Hash256],
) -> Result<Hash256, MerkleError> {
    if replacement_log2_size > drive_log2_size || drive_log2_size > MAX_LOG2_SIZE {
        return Err(MerkleError::InvalidLog2Size {
            leaf_log2_size: replacement_log2_size,
            drive_log2_size,
        });
    }
    let align_mask = 1u64.checked_shl(replacement_log2_size).map_or(u64::MAX, |size| size - 1);
    if position & align_mask != 0 {
        return Err(MerkleError::MisalignedPosition { position, log2_size: replacement_log2_size });
    }
    // Bits above the drive size would otherwise be ignored, aliasing distinct positions.
    if position.checked_shr(drive_log2_size).unwrap_or(0) != 0 {
        return Err(MerkleError::PositionOutOfRange { position, drive_log2_size });
    }
    let expected = (drive_log2_size - replacement_log2_size) as usize;
    if siblings.len() != expected {
        return Err(MerkleError::SiblingCountMismatch { expected, got: siblings.len() });
    }

    let mut acc = *replacement;
    for (bit, sib) in (replacement_log2_size..drive_log2_size).zip(siblings) {
        acc = if (position >> bit) & 1 == 0 {
            keccak_node(&acc, sib)
        } else {
            keccak_node(sib, &acc)
        };
    }
    Ok(acc)
}

/// Merkle root of `data` taken as consecutive `2^leaf_log2_size`-byte leaves.
///
/// A trailing partial leaf is zero-padded and the leaf count is padded to the next power of
/// two with pristine subtrees. Empty data hashes to a single pristine leaf.
///
/// # Errors
///
/// Returns `MerkleError` if the leaf size is above [`MAX_LEAF_LOG2_SIZE`] or the data would
/// need a tree larger than `2^64` bytes.
pub fn root_from_bytes(data: &[u8], leaf_log2_size: u32) -> Result<Hash256, MerkleError> {
    if leaf_log2_size > MAX_LEAF_LOG2_SIZE {
        return Err(MerkleError::InvalidLog2Size {
            leaf_log2_size,
            drive_log2_size: leaf_log2_size,
        });
    }
    let leaf_len = 1usize << leaf_log2_size;
    let leaves: Vec<Hash256> = data
        .chunks(leaf_len)
        .map(|chunk| {
            if chunk.len() == leaf_len {
                keccak256(chunk)
            } else {
                let mut padded = vec![0u8; leaf_len];
                padded[..chunk.len()].copy_from_slice(chunk);
                keccak256(&padded)
            }
        })
        .collect();

    let height = leaves.len().max(1).next_power_of_two().trailing_zeros();
    let drive_log2_size = leaf_log2_size + height;
    if drive_log2_size > MAX_LOG2_SIZE {
        return Err(MerkleError::DataTooLarge { len: data.len(), log2_size: MAX_LOG2_SIZE });
    }
    let pristine = PristineHashes::new(leaf_log2_size, drive_log2_size)?;
    Ok(SparseTree::new(leaves, leaf_log2_size, drive_log2_size, &pristine)?.root())
}

/// Roots of all-zero regions from the leaf size up to a maximum size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PristineHashes {
    leaf_log2_size: u32,
    hashes: Vec<Hash256>,
}

impl PristineHashes {
    /// # Errors
    ///
    /// Returns `MerkleError::InvalidLog2Size` unless
    /// `leaf_log2_size <= MAX_LEAF_LOG2_SIZE` and `leaf_log2_size <= max_log2_size <= 64`.
    pub fn new(leaf_log2_size: u32, max_log2_size: u32) -> Result<Self, MerkleError> {
        if leaf_log2_size > MAX_LEAF_LOG2_SIZE
            || leaf_log2_size > max_log2_size
            || max_log2_size > MAX_LOG2_SIZE
        {
            return Err(MerkleError::InvalidLog2Size {
                leaf_log2_size,
                drive_log2_size: max_log2_size,
            });
        }
        let mut hashes = Vec::with_capacity((max_log2_size - leaf_log2_size + 1) as usize);
        let mut h = keccak256(&vec![0u8; 1usize << leaf_log2_size]);
        hashes.push(h);
        for _ in leaf_log2_size..max_log2_size {
            h = keccak_node(&h, &h);
            hashes.push(h);
        }
        Ok(Self { leaf_log2_size, hashes })
    }

    /// Pristine root of a `2^log2_size`-byte region, if covered by this table.
    #[must_use]
    pub fn at(&self, log2_size: u32) -> Option<Hash256> {
        let i = log2_size.checked_sub(self.leaf_log2_size)?;
        self.hashes.get(i as usize).copied()
    }
}

/// Drive whose written leaves form a dense prefix; everything after them is pristine.
#[derive(Clone, Debug)]
pub struct SparseTree {
    height: usize,
    capacity: Option<u64>,
    // levels[0] are the leaves, levels[height] holds the root when any leaf is present
    levels: Vec<Vec<Hash256>>,
    pristine: Vec<Hash256>,
}

impl SparseTree {
    /// Build a drive of `2^drive_log2_size` bytes from already hashed
    /// `2^leaf_log2_size`-byte leaves.
    ///
    /// # Errors
    ///
    /// Returns `MerkleError` if the sizes are not covered by `pristine` or there are more
    /// leaves than the drive holds.
    pub fn new(
        leaves: Vec<Hash256>,
        leaf_log2_size: u32,
        drive_log2_size: u32,
        pristine: &PristineHashes,
    ) -> Result<Self, MerkleError> {
        let bad_sizes = MerkleError::InvalidLog2Size { leaf_log2_size, drive_log2_size };
        if leaf_log2_size > drive_log2_size || drive_log2_size > MAX_LOG2_SIZE {
            return Err(bad_sizes);
        }
        let capacity = size_in_leaves(drive_log2_size, leaf_log2_size);
        if let Some(capacity) = capacity {
            if leaves.len() as u64 > capacity {
                return Err(MerkleError::TooManyLeaves { count: leaves.len(), capacity });
            }
        }
        let pristine = (leaf_log2_size..=drive_log2_size)
            .map(|log2_size| pristine.at(log2_size).ok_or_else(|| bad_sizes.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let height = (drive_log2_size - leaf_log2_size) as usize;
        let mut levels = Vec::with_capacity(height + 1);
        let mut current = leaves;
        for empty in &pristine[..height] {
            let next = current
                .chunks(2)
                .map(|pair| keccak_node(&pair[0], pair.get(1).unwrap_or(empty)))
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);
        Ok(Self { height, capacity, levels, pristine })
    }

    #[must_use]
    pub fn root(&self) -> Hash256 {
        self.levels[self.height].first().copied().unwrap_or(self.pristine[self.height])
    }

    /// Number of written leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Leaf hash at `index`, pristine when past the written prefix.
    #[must_use]
    pub fn leaf(&self, index: u64) -> Hash256 {
        self.node(0, index)
    }

    /// Sibling path of leaf `index`, from the leaf level upwards.
    ///
    /// # Errors
    ///
    /// Returns `MerkleError::LeafOutOfRange` if `index` is outside the drive.
    pub fn siblings(&self, index: u64) -> Result<Vec<Hash256>, MerkleError> {
        if let Some(capacity) = self.capacity.filter(|&capacity| index >= capacity) {
            return Err(MerkleError::LeafOutOfRange { index, capacity });
        }
        let mut idx = index;
        let mut path = Vec::with_capacity(self.height);
        for level in 0..self.height {
            path.push(self.node(level, idx ^ 1));
            idx >>= 1;
        }
        Ok(path)
    }

    fn node(&self, level: usize, index: u64) -> Hash256 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.levels[level].get(i))
            .copied()
            .unwrap_or(self.pristine[level])
    }
}
