//! Hex helpers and the off-circuit Poseidon primitive.

use anyhow::Result;
use halo2_gadgets::poseidon::primitives::{
    self as poseidon, ConstantLength, P128Pow5T3 as PoseidonSpec,
};
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;

/// Number of hex characters in an encoded field element.
pub const FIELD_HEX_LEN: usize = 64;

fn is_valid_hex_string(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .trim()
        .strip_prefix("0x")
        .or_else(|| input.trim().strip_prefix("0X"))
        .unwrap_or_else(|| input.trim())
}

/// Validates and strips hex prefix from a string.
///
/// # Errors
/// Returns an error if:
/// - The hex string has incorrect length
/// - The hex string contains non-hex characters
///
/// # Examples
///
/// ```
/// use zkp_email_presence::utils::validate_and_strip_hex;
///
/// let result = validate_and_strip_hex("0x1234abcd", 8).unwrap();
/// assert_eq!(result, "1234abcd");
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let stripped = strip_hex_prefix(input);

    if stripped.len() != expected_len {
        return Err(anyhow::anyhow!(
            "Invalid hex string: must be {} characters (got {})",
            expected_len,
            stripped.len()
        ));
    }

    if !is_valid_hex_string(stripped) {
        return Err(anyhow::anyhow!(
            "Invalid hex string: contains non-hex characters"
        ));
    }

    Ok(stripped.to_string())
}

/// Encodes a field element as a `0x`-prefixed big-endian hex integer.
///
/// This is the wire form of the public commitment in signal sets and proof
/// output files.
#[must_use]
pub fn field_to_hex(field: pallas::Base) -> String {
    let mut bytes = field.to_repr();
    bytes.reverse();
    format!("0x{}", hex::encode(bytes))
}

/// Parses a big-endian hex integer produced by [`field_to_hex`].
///
/// # Errors
/// Returns an error if the string is not 64 hex characters or encodes a value
/// that is not a canonical field element.
pub fn field_from_hex(input: &str) -> Result<pallas::Base> {
    let stripped = validate_and_strip_hex(input, FIELD_HEX_LEN)?;
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(&stripped, &mut bytes)
        .map_err(|e| anyhow::anyhow!("Invalid field element hex '{input}': {e}"))?;
    bytes.reverse();

    Option::from(pallas::Base::from_repr(bytes)).ok_or_else(|| {
        anyhow::anyhow!("Value '{input}' is not a canonical Pallas base field element")
    })
}

/// Poseidon hash of two field elements using the `P128Pow5T3` specification
/// with a constant-length-2 domain.
///
/// This is the exact permutation the in-circuit `Pow5Chip` evaluates, so the
/// off-circuit commitment fold and the constraint system agree.
///
/// # Example
///
/// ```
/// use zkp_email_presence::utils::poseidon_hash;
/// use pasta_curves::pallas;
///
/// let hash = poseidon_hash(pallas::Base::from(1), pallas::Base::from(2));
/// assert_ne!(hash, pallas::Base::zero());
/// ```
#[inline]
#[must_use]
pub fn poseidon_hash(left: pallas::Base, right: pallas::Base) -> pallas::Base {
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<2>, 3, 2>::init().hash([left, right])
}
