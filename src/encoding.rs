//! The buffer encoding shared by the input builder and the circuit.
//!
//! Padding, chunking, byte weighting and the fold order are defined here and
//! nowhere else. The circuit's chunk accumulator evaluates [`encode_chunk`]
//! in the same Horner order, and its Poseidon fold mirrors [`commit`].

use crate::error::BuildError;
use crate::utils::poseidon_hash;
use pasta_curves::pallas;

/// Bytes per chunk. 31 bytes always fit below the Pallas modulus.
pub const CHUNK_SIZE: usize = 31;

/// Weight between consecutive bytes of a chunk.
pub const BYTE_BASE: u64 = 256;

/// Number of chunks covering a buffer of `max_len` bytes.
#[must_use]
pub const fn chunk_count(max_len: usize) -> usize {
    max_len.div_ceil(CHUNK_SIZE)
}

/// Zero-pads or truncates `raw` to exactly `max_len` bytes.
#[must_use]
pub fn pad_buffer(raw: &[u8], max_len: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; max_len];
    let len = raw.len().min(max_len);
    buffer[..len].copy_from_slice(&raw[..len]);
    buffer
}

/// Converts a signal value to a byte, rejecting anything above 255.
///
/// # Errors
/// Returns [`BuildError::ByteOutOfRange`] carrying `index` and the value.
pub fn checked_byte(index: usize, value: u64) -> Result<u8, BuildError> {
    u8::try_from(value).map_err(|_| BuildError::ByteOutOfRange { index, value })
}

/// Encodes up to [`CHUNK_SIZE`] bytes as `Σ chunk[i] * 256^i`.
///
/// Missing trailing bytes contribute zero, which is the implicit padding of
/// the final chunk.
#[must_use]
pub fn encode_chunk(chunk: &[u8]) -> pallas::Base {
    debug_assert!(chunk.len() <= CHUNK_SIZE);
    let base = pallas::Base::from(BYTE_BASE);
    chunk
        .iter()
        .rev()
        .fold(pallas::Base::zero(), |acc, &byte| {
            acc * base + pallas::Base::from(u64::from(byte))
        })
}

/// Chunk encodings of a padded buffer, in fold order.
#[must_use]
pub fn chunk_encodings(buffer: &[u8]) -> Vec<pallas::Base> {
    buffer.chunks(CHUNK_SIZE).map(encode_chunk).collect()
}

/// Folds the chunk encodings through Poseidon starting from zero:
/// `h_0 = 0`, `h_{i+1} = H(h_i, chunk_i)`.
#[must_use]
pub fn commit(buffer: &[u8]) -> pallas::Base {
    chunk_encodings(buffer)
        .into_iter()
        .fold(pallas::Base::zero(), poseidon_hash)
}

/// Commitment of raw input after padding/truncation to `max_len`.
#[must_use]
pub fn commit_raw(raw: &[u8], max_len: usize) -> pallas::Base {
    commit(&pad_buffer(raw, max_len))
}
