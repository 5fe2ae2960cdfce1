//! Off-circuit construction of the signal assignment.

use crate::assignment::{Assignment, Selector};
use crate::circuit::CircuitParams;
use crate::encoding::{commit, pad_buffer};
use crate::error::BuildError;
use crate::patterns::{display_pattern, find_first, PatternKind, PatternSet};
use crate::MAX_LEN;
use log::{debug, info};

/// Builds assignments for one circuit size variant.
///
/// The buffer length and the pattern literals are fixed at construction and
/// must match the [`CircuitParams`](crate::circuit::CircuitParams) the
/// assignment is later proven against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuilder {
    max_len: usize,
    patterns: PatternSet,
}

impl Default for InputBuilder {
    fn default() -> Self {
        Self {
            max_len: MAX_LEN,
            patterns: PatternSet::default(),
        }
    }
}

impl From<&CircuitParams> for InputBuilder {
    fn from(params: &CircuitParams) -> Self {
        Self {
            max_len: params.max_len(),
            patterns: params.patterns().clone(),
        }
    }
}

impl InputBuilder {
    /// # Errors
    /// Returns [`BuildError::InvalidMaxLen`] if `max_len` cannot hold the
    /// longest pattern.
    pub fn new(max_len: usize, patterns: PatternSet) -> Result<Self, BuildError> {
        let min = patterns.max_pattern_len();
        if max_len < min {
            return Err(BuildError::InvalidMaxLen { max_len, min });
        }
        Ok(Self { max_len, patterns })
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Produces the full assignment for `raw`.
    ///
    /// The input is padded or truncated first; the pattern search and the
    /// commitment both run over that padded buffer. Every pattern is located
    /// before the commitment is computed, so a missing pattern costs no
    /// hashing.
    ///
    /// # Errors
    /// - [`BuildError::PatternNotFound`] if any pattern is absent
    /// - [`BuildError::SelectorWindowViolation`] if an offset falls outside
    ///   its window (internal consistency failure)
    pub fn build(&self, raw: &[u8]) -> Result<Assignment, BuildError> {
        debug!(
            "Building assignment from {} input bytes (max_len {})",
            raw.len(),
            self.max_len
        );
        let buffer = pad_buffer(raw, self.max_len);

        let mut offsets = [0usize; 3];
        for (kind, pattern) in self.patterns.iter() {
            let offset = find_first(&buffer, pattern)
                .ok_or_else(|| BuildError::PatternNotFound(display_pattern(pattern)))?;
            debug!("Pattern {kind} found at offset {offset}");
            offsets[kind.index()] = offset;
        }

        let selector = |kind: PatternKind| {
            Selector::one_hot(self.patterns.get(kind), self.max_len, offsets[kind.index()])
        };
        let selectors = [
            selector(PatternKind::From)?,
            selector(PatternKind::To)?,
            selector(PatternKind::Domain)?,
        ];

        let commitment = commit(&buffer);
        info!("Assignment built, commitment {:?}", commitment);

        Ok(Assignment::new(
            buffer,
            self.patterns.clone(),
            selectors,
            commitment,
        ))
    }
}

/// Builds an assignment with the reference configuration: `MAX_LEN` bytes and
/// the default patterns.
///
/// # Errors
/// See [`InputBuilder::build`].
pub fn build(raw: &[u8]) -> Result<Assignment, BuildError> {
    InputBuilder::default().build(raw)
}
