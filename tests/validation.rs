use std::cell::Cell;

use rollup_output_validity::{
    compute_epoch_hash, keccak256,
    layout::{
        EPOCH_NOTICE_LOG2_SIZE, EPOCH_VOUCHER_LOG2_SIZE, KECCAK_LOG2_SIZE, NOTICE_METADATA_LOG2_SIZE,
        VOUCHER_METADATA_LOG2_SIZE, WORD_LOG2_SIZE,
    },
    merkle::PristineHashes,
    root_after_replacement, root_from_bytes, validate_notice, validate_voucher, EpochHash, EpochOutputs,
    Hash256, KeccakMerkle, MachineLayout, MerkleError, MerklePrimitives, OutputKind, OutputValidator,
    OutputValidityProof, ValidationError,
};

const STATE: Hash256 = [0x5Au8; 32];

fn pristine_path(pristine: &PristineHashes, from: u32, to: u32) -> Vec<Hash256> {
    (from..to).map(|log2| pristine.at(log2).unwrap()).collect()
}

/// One input emitting one voucher, assembled without the prover.
fn single_voucher_epoch(voucher: &[u8]) -> (OutputValidityProof, EpochHash) {
    let pristine = PristineHashes::new(WORD_LOG2_SIZE, 64).unwrap();
    let slot = root_from_bytes(&keccak256(voucher), WORD_LOG2_SIZE).unwrap();

    let keccak_in_hashes_siblings =
        pristine_path(&pristine, KECCAK_LOG2_SIZE, VOUCHER_METADATA_LOG2_SIZE);
    let output_hashes_root_hash = root_after_replacement(
        0,
        KECCAK_LOG2_SIZE,
        VOUCHER_METADATA_LOG2_SIZE,
        &slot,
        &keccak_in_hashes_siblings,
    )
    .unwrap();

    let output_hashes_in_epoch_siblings =
        pristine_path(&pristine, KECCAK_LOG2_SIZE, EPOCH_VOUCHER_LOG2_SIZE);
    let vouchers_epoch_root_hash = root_after_replacement(
        0,
        KECCAK_LOG2_SIZE,
        EPOCH_VOUCHER_LOG2_SIZE,
        &output_hashes_root_hash,
        &output_hashes_in_epoch_siblings,
    )
    .unwrap();
    // The input emitted no notice, so its notice metadata drive is pristine
    let notices_epoch_root_hash = root_after_replacement(
        0,
        KECCAK_LOG2_SIZE,
        EPOCH_NOTICE_LOG2_SIZE,
        &pristine.at(NOTICE_METADATA_LOG2_SIZE).unwrap(),
        &pristine_path(&pristine, KECCAK_LOG2_SIZE, EPOCH_NOTICE_LOG2_SIZE),
    )
    .unwrap();

    let epoch_hash = compute_epoch_hash(&vouchers_epoch_root_hash, &notices_epoch_root_hash, &STATE);
    let proof = OutputValidityProof {
        epoch_input_index: 0,
        output_index: 0,
        output_hashes_root_hash,
        vouchers_epoch_root_hash,
        notices_epoch_root_hash,
        machine_state_hash: STATE,
        keccak_in_hashes_siblings,
        output_hashes_in_epoch_siblings,
    };
    (proof, epoch_hash)
}

#[test]
fn hand_built_single_voucher_validates() {
    let voucher = b"transfer 100 to 0xabc";
    let (proof, epoch_hash) = single_voucher_epoch(voucher);
    assert_eq!(validate_voucher(&proof, voucher, &epoch_hash), Ok(()));
}

#[test]
fn hand_built_tree_matches_prover() {
    let voucher = b"transfer 100 to 0xabc";
    let (proof, epoch_hash) = single_voucher_epoch(voucher);

    let mut epoch = EpochOutputs::canonical();
    epoch.push_input().unwrap();
    epoch.push_output(OutputKind::Voucher, voucher).unwrap();
    let commitment = epoch.commit(STATE).unwrap();

    assert_eq!(commitment.epoch_hash(), epoch_hash);
    assert_eq!(commitment.proof(OutputKind::Voucher, 0, 0).unwrap(), proof);
}

#[test]
fn missing_output_index_is_rejected() {
    let voucher = b"transfer 100 to 0xabc";
    let (mut proof, epoch_hash) = single_voucher_epoch(voucher);
    proof.output_index += 1;
    assert_eq!(
        validate_voucher(&proof, voucher, &epoch_hash),
        Err(ValidationError::OutputHashesRootMismatch { kind: OutputKind::Voucher })
    );
}

#[test]
fn wrong_category_is_rejected() {
    let mut epoch = EpochOutputs::canonical();
    epoch.push_input().unwrap();
    epoch.push_output(OutputKind::Voucher, b"first input voucher").unwrap();
    epoch.push_input().unwrap();
    epoch.push_output(OutputKind::Notice, b"second input notice").unwrap();
    let commitment = epoch.commit(STATE).unwrap();
    let epoch_hash = commitment.epoch_hash();

    let notice_proof = commitment.proof(OutputKind::Notice, 1, 0).unwrap();
    assert_eq!(validate_notice(&notice_proof, b"second input notice", &epoch_hash), Ok(()));
    assert_eq!(
        validate_voucher(&notice_proof, b"second input notice", &epoch_hash),
        Err(ValidationError::OutputsRootMismatch { kind: OutputKind::Voucher })
    );

    // The second input has no vouchers: its voucher metadata drive is pristine
    let pristine = PristineHashes::new(WORD_LOG2_SIZE, 64).unwrap();
    assert_eq!(
        commitment.output_hashes_root(OutputKind::Voucher, 1),
        pristine.at(VOUCHER_METADATA_LOG2_SIZE)
    );
    assert!(commitment.proof(OutputKind::Voucher, 1, 0).is_err());

    let voucher_proof = commitment.proof(OutputKind::Voucher, 0, 0).unwrap();
    assert_eq!(validate_voucher(&voucher_proof, b"first input voucher", &epoch_hash), Ok(()));
    assert!(validate_notice(&voucher_proof, b"first input voucher", &epoch_hash).is_err());
}

#[test]
fn many_outputs_across_inputs() {
    let mut epoch = EpochOutputs::canonical();
    let mut expected = Vec::new();
    for input in 0u64..5 {
        epoch.push_input().unwrap();
        for n in 0..input {
            let v = format!("voucher {input}/{n}").into_bytes();
            let index = epoch.push_output(OutputKind::Voucher, &v).unwrap();
            expected.push((OutputKind::Voucher, input, index, v));
        }
        let notice = format!("notice {input}").into_bytes();
        let index = epoch.push_output(OutputKind::Notice, &notice).unwrap();
        expected.push((OutputKind::Notice, input, index, notice));
    }
    let commitment = epoch.commit(STATE).unwrap();
    let validator = OutputValidator::canonical();
    for (kind, input, output, bytes) in &expected {
        let proof = commitment.proof(*kind, *input, *output).unwrap();
        assert_eq!(
            validator.validate(*kind, &proof, bytes, &commitment.epoch_hash()),
            Ok(()),
            "{kind} {input}/{output}"
        );
    }
}

#[test]
fn wrong_epoch_hash_is_commitment_mismatch() {
    let voucher = b"v";
    let (proof, epoch_hash) = single_voucher_epoch(voucher);
    let mut other = epoch_hash;
    other.0[0] ^= 0x80;
    assert_eq!(validate_voucher(&proof, voucher, &other), Err(ValidationError::CommitmentMismatch));
}

#[test]
fn truncated_siblings_are_malformed() {
    let voucher = b"v";
    let (mut proof, epoch_hash) = single_voucher_epoch(voucher);
    proof.output_hashes_in_epoch_siblings.pop();
    assert_eq!(
        validate_voucher(&proof, voucher, &epoch_hash),
        Err(ValidationError::MalformedProof(MerkleError::SiblingCountMismatch {
            expected: 32,
            got: 31
        }))
    );

    let (mut proof, epoch_hash) = single_voucher_epoch(voucher);
    proof.keccak_in_hashes_siblings.push([0u8; 32]);
    assert_eq!(
        validate_voucher(&proof, voucher, &epoch_hash),
        Err(ValidationError::MalformedProof(MerkleError::SiblingCountMismatch {
            expected: 16,
            got: 17
        }))
    );
}

#[test]
fn custom_layout_end_to_end() {
    let layout = MachineLayout {
        word_log2_size: 4,
        epoch_voucher_log2_size: 12,
        epoch_notice_log2_size: 10,
        voucher_metadata_log2_size: 9,
        notice_metadata_log2_size: 7,
    };
    let mut epoch = EpochOutputs::new(layout).unwrap();
    for i in 0u8..3 {
        epoch.push_input().unwrap();
        epoch.push_output(OutputKind::Voucher, &[i; 40]).unwrap();
        epoch.push_output(OutputKind::Notice, &[i; 3]).unwrap();
        epoch.push_output(OutputKind::Notice, &[i; 4]).unwrap();
    }
    let commitment = epoch.commit(STATE).unwrap();
    let validator = OutputValidator::new(layout).unwrap();
    assert_eq!(validator.layout(), &layout);

    let proof = commitment.proof(OutputKind::Notice, 2, 1).unwrap();
    assert_eq!(proof.keccak_in_hashes_siblings.len(), 2);
    assert_eq!(proof.output_hashes_in_epoch_siblings.len(), 5);
    assert_eq!(validator.validate_notice(&proof, &[2; 4], &commitment.epoch_hash()), Ok(()));

    // Same proof under the canonical layout has the wrong depth
    assert!(matches!(
        validate_notice(&proof, &[2; 4], &commitment.epoch_hash()),
        Err(ValidationError::MalformedProof(_))
    ));
}

#[test]
fn rejects_invalid_layout() {
    let layout = MachineLayout { word_log2_size: 6, ..MachineLayout::CANONICAL };
    assert!(OutputValidator::new(layout).is_err());
    assert!(EpochOutputs::new(layout).is_err());
}

struct Counting {
    replacements: Cell<usize>,
    from_bytes: Cell<usize>,
}

impl MerklePrimitives for Counting {
    fn root_after_replacement(
        &self,
        position: u64,
        replacement_log2_size: u32,
        drive_log2_size: u32,
        replacement: &Hash256,
        siblings: &[Hash256],
    ) -> Result<Hash256, MerkleError> {
        self.replacements.set(self.replacements.get() + 1);
        KeccakMerkle.root_after_replacement(
            position,
            replacement_log2_size,
            drive_log2_size,
            replacement,
            siblings,
        )
    }

    fn root_from_bytes(&self, data: &[u8], leaf_log2_size: u32) -> Result<Hash256, MerkleError> {
        self.from_bytes.set(self.from_bytes.get() + 1);
        assert_eq!(data.len(), 32);
        assert_eq!(leaf_log2_size, WORD_LOG2_SIZE);
        KeccakMerkle.root_from_bytes(data, leaf_log2_size)
    }
}

#[test]
fn validator_delegates_to_primitives() {
    let counting = Counting { replacements: Cell::new(0), from_bytes: Cell::new(0) };
    let validator = OutputValidator::with_primitives(MachineLayout::CANONICAL, &counting).unwrap();
    let (proof, epoch_hash) = single_voucher_epoch(b"v");
    assert_eq!(validator.validate_voucher(&proof, b"v", &epoch_hash), Ok(()));
    assert_eq!(counting.replacements.get(), 2);
    assert_eq!(counting.from_bytes.get(), 1);

    // A bad commitment stops before any tree work
    let mut bad = epoch_hash;
    bad.0[31] ^= 1;
    assert_eq!(
        validator.validate_voucher(&proof, b"v", &bad),
        Err(ValidationError::CommitmentMismatch)
    );
    assert_eq!(counting.replacements.get(), 2);
    assert_eq!(counting.from_bytes.get(), 1);
}

#[test]
fn replay_key_uses_output_index() {
    let (proof, _) = single_voucher_epoch(b"v");
    let key = proof.replay_key(42);
    assert_eq!(rollup_output_validity::split_replay_key(key), (0, 42));
}
