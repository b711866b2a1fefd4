//! Interface to the memory substrate that isolates candidate pool allocations.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScanError};

/// Windows version as reported by the memory profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsVersion {
    /// Major version (6 for Vista through 8.1, 10 for Windows 10/11).
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl OsVersion {
    /// Windows 7 / Server 2008 R2, the last release using the `FVEc` tag.
    pub const WIN7: OsVersion = OsVersion::new(6, 1);

    /// Creates a version from its parts.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Rejects profiles older than Vista.
    pub fn ensure_supported(self) -> Result<Self> {
        if self.major >= 6 {
            Ok(self)
        } else {
            Err(ScanError::UnsupportedProfile(self))
        }
    }

    /// Pool tag under which the BitLocker driver keeps its key material.
    pub fn pool_tag(self) -> PoolTag {
        if self <= Self::WIN7 {
            PoolTag::FVEC
        } else {
            PoolTag::CNGB
        }
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for OsVersion {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ScanError::InvalidVersion(s.to_owned());
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

/// Four-byte kernel pool tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolTag(pub [u8; 4]);

impl PoolTag {
    /// Full-volume encryption context (Vista and 7).
    pub const FVEC: PoolTag = PoolTag(*b"FVEc");
    /// CNG key blob (8 and later).
    pub const CNGB: PoolTag = PoolTag(*b"Cngb");

    /// Raw tag bytes as they appear in a pool header.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for PoolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl FromStr for PoolTag {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ScanError::InvalidPoolTag(s.to_owned()))?;
        if !bytes.is_ascii() {
            return Err(ScanError::InvalidPoolTag(s.to_owned()));
        }
        Ok(PoolTag(bytes))
    }
}

/// One isolated pool allocation: where it lives and what it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Address of the allocation, passed through to reports untouched.
    pub address: u64,
    /// Allocation contents, starting at the pool header.
    pub bytes: Vec<u8>,
}

/// Something that can enumerate tagged pool allocations.
///
/// Implementations own address translation and pool-header parsing; the
/// scanner only ever sees the resulting byte buffers.
pub trait AllocationSource {
    /// Returns every allocation carrying `tag` whose size exceeds `min_size`.
    fn allocations(&self, tag: PoolTag, min_size: usize) -> Result<Vec<Allocation>>;
}
