#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

//! Rollup output validity
//!
//! Verifies that a voucher or notice emitted off-chain by the rollup machine was included in
//! the outputs of a committed epoch. Validation is a pure function of the claimed output, a
//! proof and the trusted epoch hash:
//!
//! ```text
//! epoch hash ── keccak256(vouchers root || notices root || machine state hash)
//!    └─ epoch voucher/notice drive   (slot = epoch input index)
//!         └─ per-input metadata drive (slot = output index)
//!              └─ word-granular root of keccak256(output)
//! ```
//!
// Fixed choices:
// - Hash: Keccak-256 (32-byte output), node = keccak256(left || right)
// - Leaves: 8-byte machine words, output hashes in 32-byte slots
// - Drive sizes: epoch 2^37 bytes, per-input metadata 2^21 bytes (see `layout`)
// - Replay key: (output index << 128) | input index

// Core modules
pub mod types;
pub mod errors;
pub mod layout;
pub mod hashers;
pub mod merkle;
pub mod epoch;
pub mod drive;
pub mod validator;
pub mod replay;
pub mod prover;

// Re-export commonly used types and functions
pub use types::*;
pub use errors::{DecodeError, LayoutError, MerkleError, ProverError, ValidationError};
pub use layout::MachineLayout;
pub use hashers::{compute_epoch_hash, keccak256};
pub use merkle::{root_after_replacement, root_from_bytes, KeccakMerkle, MerklePrimitives};
pub use validator::{validate_notice, validate_voucher, OutputValidator};
pub use replay::{output_replay_key, split_replay_key};
pub use prover::{EpochCommitment, EpochOutputs};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
