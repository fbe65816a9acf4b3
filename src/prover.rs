//! Off-chain side of the protocol: build the output trees of an epoch and extract proofs.
//!
//! Each input owns one metadata drive per output kind; slot `j` of that drive holds the
//! word-granular root of `keccak256(output_j)`. Slot `i` of the epoch drive of a kind holds the
//! root of input `i`'s metadata drive. Slots never written are pristine.

use tracing::debug;
use crate::{
    errors::{LayoutError, MerkleError, ProverError},
    hashers::{compute_epoch_hash, keccak256},
    layout::{MachineLayout, KECCAK_LOG2_SIZE, MAX_LOG2_SIZE},
    merkle::{root_from_bytes, PristineHashes, SparseTree},
    types::{EpochHash, Hash256, InclusionLevel, OutputKind, OutputValidityProof},
};

#[derive(Clone, Debug, Default)]
struct InputOutputs {
    vouchers: Vec<Hash256>,
    notices: Vec<Hash256>,
}

impl InputOutputs {
    fn of_mut(&mut self, kind: OutputKind) -> &mut Vec<Hash256> {
        match kind {
            OutputKind::Voucher => &mut self.vouchers,
            OutputKind::Notice => &mut self.notices,
        }
    }

    fn of(&self, kind: OutputKind) -> &[Hash256] {
        match kind {
            OutputKind::Voucher => &self.vouchers,
            OutputKind::Notice => &self.notices,
        }
    }
}

/// Outputs of the inputs of one epoch, in processing order.
#[derive(Clone, Debug)]
pub struct EpochOutputs {
    layout: MachineLayout,
    inputs: Vec<InputOutputs>,
}

impl EpochOutputs {
    pub fn new(layout: MachineLayout) -> Result<Self, LayoutError> {
        layout.validate()?;
        Ok(Self { layout, inputs: Vec::new() })
    }

    #[must_use]
    pub const fn canonical() -> Self {
        Self { layout: MachineLayout::CANONICAL, inputs: Vec::new() }
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Start a new input; subsequent outputs belong to it. Returns its epoch input index.
    pub fn push_input(&mut self) -> Result<u64, ProverError> {
        let index = self.inputs.len() as u64;
        for kind in [OutputKind::Voucher, OutputKind::Notice] {
            if let Some(max) = self.layout.slot_capacity(InclusionLevel::Epoch, kind) {
                if index >= max {
                    return Err(ProverError::TooManyInputs { kind, max });
                }
            }
        }
        self.inputs.push(InputOutputs::default());
        Ok(index)
    }

    /// Record an output of the latest input. Returns its index within that input.
    pub fn push_output(&mut self, kind: OutputKind, output: &[u8]) -> Result<u64, ProverError> {
        let max = self.layout.slot_capacity(InclusionLevel::Metadata, kind);
        let input = self.inputs.len().checked_sub(1).ok_or(ProverError::NoOpenInput)? as u64;
        let outputs = self.inputs.last_mut().ok_or(ProverError::NoOpenInput)?.of_mut(kind);
        let index = outputs.len() as u64;
        if let Some(max) = max.filter(|&max| index >= max) {
            return Err(ProverError::TooManyOutputs { kind, input, max });
        }
        outputs.push(keccak256(output));
        Ok(index)
    }

    /// Build every tree of the epoch and bind them to `machine_state_hash`.
    pub fn commit(&self, machine_state_hash: Hash256) -> Result<EpochCommitment, ProverError> {
        let pristine = PristineHashes::new(self.layout.word_log2_size, MAX_LOG2_SIZE)?;
        let vouchers = self.build(OutputKind::Voucher, &pristine)?;
        let notices = self.build(OutputKind::Notice, &pristine)?;
        let epoch_hash =
            compute_epoch_hash(&vouchers.epoch.root(), &notices.epoch.root(), &machine_state_hash);
        debug!(
            inputs = self.inputs.len(),
            vouchers = vouchers.output_count(),
            notices = notices.output_count(),
            "epoch outputs committed"
        );
        Ok(EpochCommitment { machine_state_hash, epoch_hash, vouchers, notices })
    }

    fn build(&self, kind: OutputKind, pristine: &PristineHashes) -> Result<KindTrees, MerkleError> {
        let metadata = self
            .inputs
            .iter()
            .map(|input| {
                let slots = input
                    .of(kind)
                    .iter()
                    .map(|hash| root_from_bytes(hash, self.layout.word_log2_size))
                    .collect::<Result<Vec<_>, _>>()?;
                let drive_log2_size = self.layout.metadata_log2_size(kind);
                SparseTree::new(slots, KECCAK_LOG2_SIZE, drive_log2_size, pristine)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let roots = metadata.iter().map(SparseTree::root).collect();
        let drive_log2_size = self.layout.epoch_log2_size(kind);
        let epoch = SparseTree::new(roots, KECCAK_LOG2_SIZE, drive_log2_size, pristine)?;
        Ok(KindTrees { epoch, metadata })
    }
}

impl Default for EpochOutputs {
    fn default() -> Self {
        Self::canonical()
    }
}

#[derive(Clone, Debug)]
struct KindTrees {
    epoch: SparseTree,
    metadata: Vec<SparseTree>,
}

impl KindTrees {
    fn output_count(&self) -> usize {
        self.metadata.iter().map(SparseTree::len).sum()
    }
}

/// Committed trees of an epoch, ready to prove any of its outputs.
#[derive(Clone, Debug)]
pub struct EpochCommitment {
    machine_state_hash: Hash256,
    epoch_hash: EpochHash,
    vouchers: KindTrees,
    notices: KindTrees,
}

impl EpochCommitment {
    #[must_use]
    pub const fn epoch_hash(&self) -> EpochHash {
        self.epoch_hash
    }

    #[must_use]
    pub fn vouchers_root(&self) -> Hash256 {
        self.vouchers.epoch.root()
    }

    #[must_use]
    pub fn notices_root(&self) -> Hash256 {
        self.notices.epoch.root()
    }

    #[must_use]
    pub const fn machine_state_hash(&self) -> Hash256 {
        self.machine_state_hash
    }

    /// Root of the `kind` metadata drive of input `input`, if that input exists.
    #[must_use]
    pub fn output_hashes_root(&self, kind: OutputKind, input: u64) -> Option<Hash256> {
        let i = usize::try_from(input).ok()?;
        self.trees(kind).metadata.get(i).map(SparseTree::root)
    }

    /// Proof for output `output` of kind `kind` emitted by input `input`.
    pub fn proof(
        &self,
        kind: OutputKind,
        input: u64,
        output: u64,
    ) -> Result<OutputValidityProof, ProverError> {
        let unknown = ProverError::UnknownOutput { kind, input, output };
        let trees = self.trees(kind);
        let metadata = usize::try_from(input)
            .ok()
            .and_then(|i| trees.metadata.get(i))
            .ok_or_else(|| unknown.clone())?;
        if output >= metadata.len() as u64 {
            return Err(unknown);
        }
        Ok(OutputValidityProof {
            epoch_input_index: input,
            output_index: output,
            output_hashes_root_hash: metadata.root(),
            vouchers_epoch_root_hash: self.vouchers_root(),
            notices_epoch_root_hash: self.notices_root(),
            machine_state_hash: self.machine_state_hash,
            keccak_in_hashes_siblings: metadata.siblings(output)?,
            output_hashes_in_epoch_siblings: trees.epoch.siblings(input)?,
        })
    }

    const fn trees(&self, kind: OutputKind) -> &KindTrees {
        match kind {
            OutputKind::Voucher => &self.vouchers,
            OutputKind::Notice => &self.notices,
        }
    }
}
