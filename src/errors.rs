use thiserror::Error;
use crate::types::OutputKind;

/// Reasons an output proof is rejected. Every variant means "the claim is false"; none is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("epoch hash does not commit to the claimed roots and machine state")]
    CommitmentMismatch,

    #[error("output hashes root is not included in the epoch {kind} root")]
    OutputsRootMismatch { kind: OutputKind },

    #[error("{kind} hash is not included in the output hashes root")]
    OutputHashesRootMismatch { kind: OutputKind },

    #[error("malformed proof: {0}")]
    MalformedProof(#[from] MerkleError),
}

/// Byte-level decoding failures of fixed-size values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid length: expected {expected} got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Precondition failures of the Merkle primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("invalid log2 sizes: leaf 2^{leaf_log2_size} in drive 2^{drive_log2_size}")]
    InvalidLog2Size { leaf_log2_size: u32, drive_log2_size: u32 },

    #[error("position {position:#x} is not aligned to 2^{log2_size} bytes")]
    MisalignedPosition { position: u64, log2_size: u32 },

    #[error("position {position:#x} lies outside a drive of 2^{drive_log2_size} bytes")]
    PositionOutOfRange { position: u64, drive_log2_size: u32 },

    #[error("index {index} overflows a 64-bit offset at 2^{log2_size} bytes per slot")]
    OffsetOverflow { index: u64, log2_size: u32 },

    #[error("sibling count mismatch: expected {expected} got {got}")]
    SiblingCountMismatch { expected: usize, got: usize },

    #[error("{len} bytes do not fit in 2^{log2_size} bytes")]
    DataTooLarge { len: usize, log2_size: u32 },

    #[error("{count} leaves exceed a drive of {capacity} leaves")]
    TooManyLeaves { count: usize, capacity: u64 },

    #[error("leaf {index} is outside a drive of {capacity} leaves")]
    LeafOutOfRange { index: u64, capacity: u64 },
}

/// Rejected machine layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("word size 2^{word_log2_size} exceeds the 2^{hash_log2_size}-byte hash slot")]
    WordLargerThanHash { word_log2_size: u32, hash_log2_size: u32 },

    #[error("{drive} drive of 2^{log2_size} bytes must lie within [2^{min}, 2^{max}]")]
    DriveSizeOutOfRange { drive: &'static str, log2_size: u32, min: u32, max: u32 },
}

/// Failures while building epoch trees or extracting proofs from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProverError {
    #[error("no input has been opened in this epoch")]
    NoOpenInput,

    #[error("epoch {kind} drive holds at most {max} inputs")]
    TooManyInputs { kind: OutputKind, max: u64 },

    #[error("input {input} already holds the maximum of {max} {kind}s")]
    TooManyOutputs { kind: OutputKind, input: u64, max: u64 },

    #[error("no {kind} {output} for input {input}")]
    UnknownOutput { kind: OutputKind, input: u64, output: u64 },

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}
