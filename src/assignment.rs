//! The signal assignment handed to the proving backend.
//!
//! [`Assignment`] is the strongly typed form produced by the input builder.
//! [`SignalSet`] is its JSON wire form, one array per circuit signal, and can
//! be turned back into an [`Assignment`] only through full re-validation.

use crate::encoding::{checked_byte, commit};
use crate::error::BuildError;
use crate::patterns::{display_pattern, valid_window, PatternKind, PatternSet};
use crate::utils::{field_from_hex, field_to_hex};
use anyhow::{Context, Result};
use pasta_curves::pallas;
use serde::{Deserialize, Serialize};

/// A one-hot position selector over the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    len: usize,
    offset: usize,
}

impl Selector {
    /// Builds a selector of `max_len` entries with its single 1 at `offset`.
    ///
    /// # Errors
    /// Returns [`BuildError::SelectorWindowViolation`] if a pattern of
    /// `pattern`'s length cannot start at `offset`.
    pub fn one_hot(pattern: &[u8], max_len: usize, offset: usize) -> Result<Self, BuildError> {
        let window = valid_window(max_len, pattern.len()).ok_or(BuildError::InvalidMaxLen {
            max_len,
            min: pattern.len().max(1),
        })?;
        if !window.contains(&offset) {
            return Err(BuildError::SelectorWindowViolation {
                pattern: display_pattern(pattern),
                offset,
                last_valid: *window.end(),
            });
        }
        Ok(Self {
            len: max_len,
            offset,
        })
    }

    /// Claimed start offset of the pattern.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn value_at(&self, index: usize) -> u8 {
        u8::from(index == self.offset)
    }

    /// Dense 0/1 vector, as carried by the circuit signal.
    #[must_use]
    pub fn to_values(&self) -> Vec<u64> {
        (0..self.len).map(|i| u64::from(self.value_at(i))).collect()
    }
}

/// Complete private and public signal set for one proof attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    buffer: Vec<u8>,
    patterns: PatternSet,
    selectors: [Selector; 3],
    commitment: pallas::Base,
}

impl Assignment {
    pub(crate) fn new(
        buffer: Vec<u8>,
        patterns: PatternSet,
        selectors: [Selector; 3],
        commitment: pallas::Base,
    ) -> Self {
        Self {
            buffer,
            patterns,
            selectors,
            commitment,
        }
    }

    /// Padded buffer, exactly `max_len` bytes.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    #[must_use]
    pub fn selector(&self, kind: PatternKind) -> &Selector {
        &self.selectors[kind.index()]
    }

    /// The only public value.
    #[must_use]
    pub fn commitment(&self) -> pallas::Base {
        self.commitment
    }

    /// Public inputs in the order the circuit's instance column expects.
    #[must_use]
    pub fn public_inputs(&self) -> Vec<pallas::Base> {
        vec![self.commitment]
    }

    /// Wire form of the assignment.
    #[must_use]
    pub fn to_signals(&self) -> SignalSet {
        let bytes = |b: &[u8]| b.iter().map(|&v| u64::from(v)).collect::<Vec<_>>();
        SignalSet {
            commitment: field_to_hex(self.commitment),
            buffer: bytes(&self.buffer),
            pattern_from: bytes(self.patterns.get(PatternKind::From)),
            pattern_to: bytes(self.patterns.get(PatternKind::To)),
            pattern_domain: bytes(self.patterns.get(PatternKind::Domain)),
            selector_from: self.selector(PatternKind::From).to_values(),
            selector_to: self.selector(PatternKind::To).to_values(),
            selector_domain: self.selector(PatternKind::Domain).to_values(),
        }
    }
}

/// JSON signal set, one field per circuit signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    /// Public commitment as a `0x`-prefixed big-endian hex integer.
    pub commitment: String,
    pub buffer: Vec<u64>,
    pub pattern_from: Vec<u64>,
    pub pattern_to: Vec<u64>,
    pub pattern_domain: Vec<u64>,
    pub selector_from: Vec<u64>,
    pub selector_to: Vec<u64>,
    pub selector_domain: Vec<u64>,
}

impl SignalSet {
    #[must_use]
    pub fn pattern(&self, kind: PatternKind) -> &[u64] {
        match kind {
            PatternKind::From => &self.pattern_from,
            PatternKind::To => &self.pattern_to,
            PatternKind::Domain => &self.pattern_domain,
        }
    }

    #[must_use]
    pub fn selector(&self, kind: PatternKind) -> &[u64] {
        match kind {
            PatternKind::From => &self.selector_from,
            PatternKind::To => &self.selector_to,
            PatternKind::Domain => &self.selector_domain,
        }
    }

    /// Re-validates an externally supplied signal set against a circuit of
    /// `max_len` bytes.
    ///
    /// Checks byte ranges, lengths, selector shape and windows, that every
    /// selected window really holds its pattern, and that the stated
    /// commitment equals the fold over the buffer.
    ///
    /// # Errors
    /// Returns the first [`BuildError`] encountered.
    pub fn into_assignment(self, max_len: usize) -> Result<Assignment, BuildError> {
        if self.buffer.len() != max_len {
            return Err(BuildError::InvalidSignal {
                name: "buffer".to_string(),
                reason: format!("expected {max_len} values, got {}", self.buffer.len()),
            });
        }
        let buffer = self
            .buffer
            .iter()
            .enumerate()
            .map(|(i, &v)| checked_byte(i, v))
            .collect::<Result<Vec<u8>, _>>()?;

        let mut literals: [Vec<u8>; 3] = Default::default();
        for kind in PatternKind::ALL {
            literals[kind.index()] = self
                .pattern(kind)
                .iter()
                .enumerate()
                .map(|(i, &v)| checked_byte(i, v))
                .collect::<Result<Vec<u8>, _>>()?;
        }
        let patterns = PatternSet::new(&literals[0], &literals[1], &literals[2])?;

        let mut selectors = Vec::with_capacity(3);
        for (kind, pattern) in patterns.iter() {
            let name = format!("selector_{}", kind.signal_suffix());
            let selector = parse_selector(&name, self.selector(kind), pattern, max_len)?;
            let offset = selector.offset();
            if buffer[offset..offset + pattern.len()] != *pattern {
                return Err(BuildError::InvalidSignal {
                    name,
                    reason: format!(
                        "window at offset {offset} does not hold {:?}",
                        display_pattern(pattern)
                    ),
                });
            }
            selectors.push(selector);
        }
        let selectors: [Selector; 3] =
            selectors
                .try_into()
                .map_err(|_| BuildError::InvalidSignal {
                    name: "selectors".to_string(),
                    reason: "expected three selectors".to_string(),
                })?;

        let stated = field_from_hex(&self.commitment).map_err(|e| BuildError::InvalidSignal {
            name: "commitment".to_string(),
            reason: e.to_string(),
        })?;
        let computed = commit(&buffer);
        if stated != computed {
            return Err(BuildError::CommitmentMismatch {
                stated: self.commitment,
                computed: field_to_hex(computed),
            });
        }

        Ok(Assignment::new(buffer, patterns, selectors, computed))
    }

    /// Serializes the signal set as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize signal set to JSON")
    }

    /// Parses a signal set from JSON without validating it.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse signal set JSON")
    }
}

fn parse_selector(
    name: &str,
    values: &[u64],
    pattern: &[u8],
    max_len: usize,
) -> Result<Selector, BuildError> {
    if values.len() != max_len {
        return Err(BuildError::InvalidSignal {
            name: name.to_string(),
            reason: format!("expected {max_len} values, got {}", values.len()),
        });
    }
    if let Some((index, value)) = values.iter().enumerate().find(|(_, &v)| v > 1) {
        return Err(BuildError::InvalidSignal {
            name: name.to_string(),
            reason: format!("value {value} at index {index} is not boolean"),
        });
    }

    let ones: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == 1)
        .map(|(i, _)| i)
        .collect();
    match ones.as_slice() {
        [offset] => Selector::one_hot(pattern, max_len, *offset),
        _ => Err(BuildError::InvalidSignal {
            name: name.to_string(),
            reason: format!("expected exactly one set entry, found {}", ones.len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InputBuilder;

    const TEST_LEN: usize = 64;

    fn sample_signals() -> SignalSet {
        let builder = InputBuilder::new(TEST_LEN, PatternSet::default()).unwrap();
        builder
            .build(b"From: a@x.com\r\nTo: b@gmail.com\r\n")
            .unwrap()
            .to_signals()
    }

    #[test]
    fn test_selector_one_hot_values() {
        let selector = Selector::one_hot(b"To:", 8, 5).unwrap();
        assert_eq!(selector.to_values(), vec![0, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(selector.offset(), 5);
    }

    #[test]
    fn test_selector_outside_window_is_rejected() {
        let err = Selector::one_hot(b"To:", 8, 6).unwrap_err();
        assert_eq!(
            err,
            BuildError::SelectorWindowViolation {
                pattern: "To:".to_string(),
                offset: 6,
                last_valid: 5,
            }
        );
    }

    #[test]
    fn test_signal_field_names() {
        let json = sample_signals().to_json().unwrap();
        for name in [
            "commitment",
            "buffer",
            "pattern_from",
            "pattern_to",
            "pattern_domain",
            "selector_from",
            "selector_to",
            "selector_domain",
        ] {
            assert!(json.contains(&format!("\"{name}\"")), "missing {name}");
        }
    }

    #[test]
    fn test_signals_revalidate_into_same_assignment() {
        let signals = sample_signals();
        let parsed = SignalSet::from_json(&signals.to_json().unwrap()).unwrap();
        let assignment = parsed.into_assignment(TEST_LEN).unwrap();
        assert_eq!(assignment.to_signals(), signals);
    }

    #[test]
    fn test_out_of_range_byte_is_rejected() {
        let mut signals = sample_signals();
        signals.buffer[40] = 300;
        assert_eq!(
            signals.into_assignment(TEST_LEN).unwrap_err(),
            BuildError::ByteOutOfRange {
                index: 40,
                value: 300
            }
        );
    }

    #[test]
    fn test_non_boolean_selector_is_rejected() {
        let mut signals = sample_signals();
        signals.selector_to[1] = 2;
        assert!(matches!(
            signals.into_assignment(TEST_LEN),
            Err(BuildError::InvalidSignal { name, .. }) if name == "selector_to"
        ));
    }

    #[test]
    fn test_two_hot_selector_is_rejected() {
        let mut signals = sample_signals();
        signals.selector_from[30] = 1;
        assert!(matches!(
            signals.into_assignment(TEST_LEN),
            Err(BuildError::InvalidSignal { name, .. }) if name == "selector_from"
        ));
    }

    #[test]
    fn test_selector_past_window_is_rejected() {
        let mut signals = sample_signals();
        signals.selector_domain = vec![0; TEST_LEN];
        signals.selector_domain[TEST_LEN - 2] = 1;
        assert!(matches!(
            signals.into_assignment(TEST_LEN),
            Err(BuildError::SelectorWindowViolation { offset, .. }) if offset == TEST_LEN - 2
        ));
    }

    #[test]
    fn test_selector_pointing_at_wrong_bytes_is_rejected() {
        let mut signals = sample_signals();
        signals.selector_from = vec![0; TEST_LEN];
        signals.selector_from[1] = 1;
        assert!(signals.into_assignment(TEST_LEN).is_err());
    }

    #[test]
    fn test_commitment_mismatch_is_rejected() {
        let mut signals = sample_signals();
        signals.buffer[50] = u64::from(b'z');
        assert!(matches!(
            signals.into_assignment(TEST_LEN),
            Err(BuildError::CommitmentMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_buffer_length_is_rejected() {
        let signals = sample_signals();
        assert!(matches!(
            signals.into_assignment(TEST_LEN * 2),
            Err(BuildError::InvalidSignal { name, .. }) if name == "buffer"
        ));
    }
}
