//! The three fixed header patterns and the substring search the builder uses.
//!
//! Pattern *lengths* are part of the circuit shape: the constraint system
//! allocates one broadcast column per pattern byte. Pattern *values* are
//! configuration, carried into both the builder and the circuit through
//! [`PatternSet`].

use crate::error::BuildError;
use std::fmt;
use std::ops::RangeInclusive;

pub const FROM_PATTERN: &[u8] = b"From:";
pub const TO_PATTERN: &[u8] = b"To:";
pub const DOMAIN_PATTERN: &[u8] = b"@gmail.com";

pub const FROM_LEN: usize = FROM_PATTERN.len();
pub const TO_LEN: usize = TO_PATTERN.len();
pub const DOMAIN_LEN: usize = DOMAIN_PATTERN.len();

/// Identifies one of the three pattern slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    From,
    To,
    Domain,
}

impl PatternKind {
    /// All slots in signal order.
    pub const ALL: [PatternKind; 3] = [PatternKind::From, PatternKind::To, PatternKind::Domain];

    /// Fixed byte length of the slot.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            PatternKind::From => FROM_LEN,
            PatternKind::To => TO_LEN,
            PatternKind::Domain => DOMAIN_LEN,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            PatternKind::From => 0,
            PatternKind::To => 1,
            PatternKind::Domain => 2,
        }
    }

    /// Suffix used in signal names, e.g. `pattern_from` / `selector_from`.
    #[must_use]
    pub const fn signal_suffix(self) -> &'static str {
        match self {
            PatternKind::From => "from",
            PatternKind::To => "to",
            PatternKind::Domain => "domain",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal_suffix())
    }
}

/// The literal bytes of the three patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSet {
    from: Vec<u8>,
    to: Vec<u8>,
    domain: Vec<u8>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            from: FROM_PATTERN.to_vec(),
            to: TO_PATTERN.to_vec(),
            domain: DOMAIN_PATTERN.to_vec(),
        }
    }
}

impl PatternSet {
    /// Creates a pattern set, checking each literal against its slot length.
    ///
    /// # Errors
    /// Returns [`BuildError::PatternLength`] if a literal does not match the
    /// fixed length of its slot.
    pub fn new(from: &[u8], to: &[u8], domain: &[u8]) -> Result<Self, BuildError> {
        let set = Self {
            from: from.to_vec(),
            to: to.to_vec(),
            domain: domain.to_vec(),
        };
        for (kind, bytes) in set.iter() {
            if bytes.len() != kind.len() {
                return Err(BuildError::PatternLength {
                    pattern: display_pattern(bytes),
                    expected: kind.len(),
                    actual: bytes.len(),
                });
            }
        }
        Ok(set)
    }

    #[must_use]
    pub fn get(&self, kind: PatternKind) -> &[u8] {
        match kind {
            PatternKind::From => &self.from,
            PatternKind::To => &self.to,
            PatternKind::Domain => &self.domain,
        }
    }

    /// Iterates the slots in signal order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternKind, &[u8])> + '_ {
        PatternKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Length of the longest pattern; the smallest usable buffer length.
    #[must_use]
    pub fn max_pattern_len(&self) -> usize {
        PatternKind::ALL.iter().map(|kind| kind.len()).max().unwrap_or(0)
    }
}

/// Renders pattern bytes for error messages and logs.
#[must_use]
pub fn display_pattern(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Start offsets at which a pattern of `pattern_len` bytes fits inside a
/// buffer of `max_len` bytes, or `None` if it never fits.
#[must_use]
pub fn valid_window(max_len: usize, pattern_len: usize) -> Option<RangeInclusive<usize>> {
    if pattern_len == 0 || pattern_len > max_len {
        return None;
    }
    Some(0..=max_len - pattern_len)
}

/// Offset of the first occurrence of `needle` in `haystack`.
#[must_use]
pub fn find_first(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_lengths() {
        let set = PatternSet::default();
        assert_eq!(set.get(PatternKind::From), b"From:");
        assert_eq!(set.get(PatternKind::To).len(), 3);
        assert_eq!(set.get(PatternKind::Domain).len(), 10);
        assert_eq!(set.max_pattern_len(), 10);
    }

    #[test]
    fn test_pattern_set_accepts_same_length_literals() {
        let set = PatternSet::new(b"FROM:", b"TO:", b"@yahoo.com").unwrap();
        assert_eq!(set.get(PatternKind::Domain), b"@yahoo.com");
    }

    #[test]
    fn test_pattern_set_rejects_wrong_length() {
        let err = PatternSet::new(b"From:", b"To:", b"@proton.me.uk").unwrap_err();
        assert_eq!(
            err,
            BuildError::PatternLength {
                pattern: "@proton.me.uk".to_string(),
                expected: 10,
                actual: 13,
            }
        );
    }

    #[test]
    fn test_valid_window_bounds() {
        assert_eq!(valid_window(8192, 5), Some(0..=8187));
        assert_eq!(valid_window(10, 10), Some(0..=0));
        assert_eq!(valid_window(9, 10), None);
    }

    #[test]
    fn test_find_first_returns_earliest_offset() {
        assert_eq!(find_first(b"To: a To: b", b"To:"), Some(0));
        assert_eq!(find_first(b"xxTo:", b"To:"), Some(2));
        assert_eq!(find_first(b"T", b"To:"), None);
        assert_eq!(find_first(b"To", b"To:"), None);
    }
}
