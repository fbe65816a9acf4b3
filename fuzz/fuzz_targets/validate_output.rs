#![no_main]

use libfuzzer_sys::fuzz_target;
use rollup_output_validity::{
    types::*,
    validator::OutputValidator,
};

fn take<'a, const N: usize>(data: &mut &'a [u8]) -> [u8; N] {
    let src: &'a [u8] = *data;
    let n = N.min(src.len());
    let mut out = [0u8; N];
    out[..n].copy_from_slice(&src[..n]);
    *data = &src[n..];
    out
}

fn siblings(data: &mut &[u8], count: usize) -> Vec<Hash256> {
    (0..count).map(|_| take::<32>(data)).collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 { return; }
    let mut rest = data;

    // Header: kind, sibling counts (kept near the canonical depths), indices
    let header = take::<4>(&mut rest);
    let kind = if header[0] & 1 == 0 { OutputKind::Voucher } else { OutputKind::Notice };
    let epoch_len = usize::from(header[1] % 40);
    let metadata_len = usize::from(header[2] % 24);
    let epoch_input_index = u64::from_le_bytes(take::<8>(&mut rest));
    let output_index = u64::from_le_bytes(take::<8>(&mut rest));

    let proof = OutputValidityProof {
        epoch_input_index,
        output_index,
        output_hashes_root_hash: take::<32>(&mut rest),
        vouchers_epoch_root_hash: take::<32>(&mut rest),
        notices_epoch_root_hash: take::<32>(&mut rest),
        machine_state_hash: take::<32>(&mut rest),
        keccak_in_hashes_siblings: siblings(&mut rest, metadata_len),
        output_hashes_in_epoch_siblings: siblings(&mut rest, epoch_len),
    };
    let epoch_hash = if header[3] & 1 == 0 {
        // Make the commitment check pass so the tree checks get exercised
        rollup_output_validity::compute_epoch_hash(
            &proof.vouchers_epoch_root_hash,
            &proof.notices_epoch_root_hash,
            &proof.machine_state_hash,
        )
    } else {
        EpochHash(take::<32>(&mut rest))
    };

    // Whatever is left is the claimed output
    let _ = OutputValidator::canonical().validate(kind, &proof, rest, &epoch_hash);
});
