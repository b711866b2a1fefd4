//! Key and key-schedule types for AES-128 and AES-256.

use thiserror::Error;

/// Largest expanded schedule in bytes (AES-256).
pub const MAX_SCHEDULE_LEN: usize = 240;

/// Supported AES key sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySize {
    /// 128-bit key, 11 round keys.
    Aes128,
    /// 256-bit key, 15 round keys.
    Aes256,
}

impl KeySize {
    /// Both sizes, smallest first.
    pub const ALL: [KeySize; 2] = [KeySize::Aes128, KeySize::Aes256];

    /// Seed key length in bytes (16 or 32).
    #[inline]
    pub const fn key_len(self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes256 => 32,
        }
    }

    /// Expanded schedule length in bytes, seed included (176 or 240).
    #[inline]
    pub const fn schedule_len(self) -> usize {
        self.round_keys() * 16
    }

    /// Number of 16-byte round keys in the schedule.
    #[inline]
    pub const fn round_keys(self) -> usize {
        match self {
            KeySize::Aes128 => 11,
            KeySize::Aes256 => 15,
        }
    }

    /// Key strength in bits.
    #[inline]
    pub const fn bits(self) -> usize {
        self.key_len() * 8
    }

    /// Maps a seed length to its key size.
    pub const fn from_key_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(KeySize::Aes128),
            32 => Some(KeySize::Aes256),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AES-{}", self.bits())
    }
}

/// Returned when a byte slice is neither 16 nor 32 bytes long.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("AES key must be 16 or 32 bytes, got {0}")]
pub struct KeyLengthError(pub usize);

/// AES seed key of either supported size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AesKey {
    /// AES-128 key.
    Aes128([u8; 16]),
    /// AES-256 key.
    Aes256([u8; 32]),
}

impl AesKey {
    /// Size class of this key.
    pub fn size(&self) -> KeySize {
        match self {
            AesKey::Aes128(_) => KeySize::Aes128,
            AesKey::Aes256(_) => KeySize::Aes256,
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AesKey::Aes128(bytes) => bytes,
            AesKey::Aes256(bytes) => bytes,
        }
    }
}

impl From<[u8; 16]> for AesKey {
    fn from(value: [u8; 16]) -> Self {
        AesKey::Aes128(value)
    }
}

impl From<[u8; 32]> for AesKey {
    fn from(value: [u8; 32]) -> Self {
        AesKey::Aes256(value)
    }
}

impl TryFrom<&[u8]> for AesKey {
    type Error = KeyLengthError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if let Ok(bytes) = <[u8; 16]>::try_from(value) {
            Ok(AesKey::Aes128(bytes))
        } else if let Ok(bytes) = <[u8; 32]>::try_from(value) {
            Ok(AesKey::Aes256(bytes))
        } else {
            Err(KeyLengthError(value.len()))
        }
    }
}

/// Fully expanded key schedule. The first `key_len` bytes are the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySchedule {
    pub(crate) bytes: [u8; MAX_SCHEDULE_LEN],
    pub(crate) size: KeySize,
}

impl KeySchedule {
    /// Size class the schedule was expanded for.
    #[inline]
    pub fn size(&self) -> KeySize {
        self.size
    }

    /// The schedule bytes (176 or 240).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.size.schedule_len()]
    }

    /// Returns the round key at `round` (0 is the first half of the seed).
    ///
    /// # Panics
    ///
    /// Panics if `round` is not below [`KeySize::round_keys`].
    #[inline]
    pub fn round_key(&self, round: usize) -> &[u8; 16] {
        assert!(round < self.size.round_keys(), "round {round} out of range");
        let start = round * 16;
        self.bytes[start..start + 16]
            .try_into()
            .expect("round key slice is 16 bytes")
    }

    /// Iterates over all round keys in order.
    pub fn round_keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.as_bytes().chunks_exact(16)
    }
}
