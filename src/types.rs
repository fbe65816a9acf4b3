use core::fmt;
use primitive_types::U256;
use crate::{errors::DecodeError, replay::output_replay_key};

/// 32-byte hash (Keccak-256 output).
pub type Hash256 = [u8; 32];

pub const HASH_LEN: usize = 32;

/// Trusted commitment to one epoch: `keccak256(vouchers_root || notices_root || machine_state_hash)`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EpochHash(pub Hash256);

// Exact-sized decode helpers
macro_rules! impl_tryfrom_slice {
    ($t:ty, $len:expr) => {
        impl TryFrom<&[u8]> for $t {
            type Error = DecodeError;
            fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
                if b.len() != $len {
                    return Err(DecodeError::InvalidLength { expected: $len, got: b.len() });
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(b);
                Ok(Self(arr))
            }
        }
    }
}
impl_tryfrom_slice!(EpochHash, HASH_LEN);

impl From<Hash256> for EpochHash {
    fn from(h: Hash256) -> Self {
        Self(h)
    }
}

/// Output category. Each kind has its own epoch-wide tree and its own per-input metadata drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Voucher,
    Notice,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voucher => f.write_str("voucher"),
            Self::Notice => f.write_str("notice"),
        }
    }
}

/// Which of the two nested inclusion arguments a drive check belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InclusionLevel {
    /// Per-input output hashes root inside the epoch-wide category root.
    Epoch,
    /// Output hash inside the per-input output hashes root.
    Metadata,
}

impl fmt::Display for InclusionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch => f.write_str("epoch"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Proof that an output was emitted by a given input of a committed epoch.
///
/// Produced off-chain by whoever holds the full output trees (see [`crate::prover`]) and
/// consumed read-only by the validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputValidityProof {
    /// Index of the input within the epoch, in submission order.
    pub epoch_input_index: u64,
    /// Index of the output within its input, in emission order.
    pub output_index: u64,
    /// Root of the output hashes metadata drive of that input.
    pub output_hashes_root_hash: Hash256,
    pub vouchers_epoch_root_hash: Hash256,
    pub notices_epoch_root_hash: Hash256,
    pub machine_state_hash: Hash256,
    /// Siblings from the output hash slot up to `output_hashes_root_hash`.
    pub keccak_in_hashes_siblings: Vec<Hash256>,
    /// Siblings from the input's slot up to the epoch-wide category root.
    pub output_hashes_in_epoch_siblings: Vec<Hash256>,
}

impl OutputValidityProof {
    /// Epoch-wide root the proof claims for `kind`.
    #[must_use]
    pub const fn epoch_root_hash(&self, kind: OutputKind) -> &Hash256 {
        match kind {
            OutputKind::Voucher => &self.vouchers_epoch_root_hash,
            OutputKind::Notice => &self.notices_epoch_root_hash,
        }
    }

    /// Replay-protection key of this output given the global (input box) index of its input.
    #[must_use]
    pub fn replay_key(&self, input_index: u128) -> U256 {
        output_replay_key(u128::from(self.output_index), input_index)
    }
}
