//! Results produced by the region scanner.

use aes_core::{AesKey, KeySize};

/// A seed key whose schedule was found directly after it in a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Offset of the seed key inside the scanned buffer.
    pub offset: usize,
    /// The seed key.
    pub key: AesKey,
}

impl CandidateMatch {
    /// Key size that validated at this offset.
    #[inline]
    pub fn size(&self) -> KeySize {
        self.key.size()
    }
}

/// Accepted matches for one allocation, in ascending offset order.
///
/// Holds one or two entries. With two, the first is nominally the FVEK and
/// the second the tweak key; nothing beyond position tells them apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    matches: Vec<CandidateMatch>,
}

impl Detection {
    pub(crate) fn new(matches: Vec<CandidateMatch>) -> Self {
        debug_assert!(!matches.is_empty());
        debug_assert!(matches.windows(2).all(|w| w[0].offset <= w[1].offset));
        Self { matches }
    }

    /// All accepted matches.
    pub fn matches(&self) -> &[CandidateMatch] {
        &self.matches
    }

    /// First match by offset.
    pub fn primary(&self) -> &CandidateMatch {
        &self.matches[0]
    }

    /// Second match by offset, if any.
    pub fn secondary(&self) -> Option<&CandidateMatch> {
        self.matches.get(1)
    }
}

/// What gets reported for an accepted allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyReport {
    /// Allocation address supplied by the caller.
    pub address: u64,
    /// First key found (FVEK).
    pub primary: AesKey,
    /// Second key found (tweak), when present.
    pub secondary: Option<AesKey>,
}

impl KeyReport {
    /// Builds the report for `detection` found at `address`.
    pub fn new(address: u64, detection: &Detection) -> Self {
        Self {
            address,
            primary: detection.primary().key,
            secondary: detection.secondary().map(|m| m.key),
        }
    }

    /// Cipher label derived from the primary key length.
    pub fn cipher(&self) -> KeySize {
        self.primary.size()
    }

    /// `primary || secondary` as written to dump files.
    pub fn key_material(&self) -> Vec<u8> {
        let mut bytes = self.primary.as_bytes().to_vec();
        if let Some(secondary) = &self.secondary {
            bytes.extend_from_slice(secondary.as_bytes());
        }
        bytes
    }
}
