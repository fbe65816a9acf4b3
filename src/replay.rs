use primitive_types::U256;

/// Replay-protection key of an output: `(output_index << 128) | input_index`.
///
/// Both indices are 128-bit, so distinct pairs always map to distinct keys.
#[must_use]
pub fn output_replay_key(output_index: u128, input_index: u128) -> U256 {
    (U256::from(output_index) << 128u32) | U256::from(input_index)
}

/// Inverse of [`output_replay_key`]: `(output_index, input_index)`.
#[must_use]
pub fn split_replay_key(key: U256) -> (u128, u128) {
    let output_index = (key >> 128u32).low_u128();
    let input_index = key.low_u128();
    (output_index, input_index)
}
