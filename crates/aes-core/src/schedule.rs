//! AES-128/AES-256 key expansion and schedule validation.

use crate::key::{AesKey, KeySchedule, KeySize, MAX_SCHEDULE_LEN};
use crate::sbox::{sbox, RCON};

type Word = [u8; 4];

#[inline]
fn rot_word(word: Word) -> Word {
    [word[1], word[2], word[3], word[0]]
}

#[inline]
fn sub_word(word: Word) -> Word {
    [sbox(word[0]), sbox(word[1]), sbox(word[2]), sbox(word[3])]
}

/// Expands `seed` into `out`, passing every derived byte and its offset to
/// `emit`. Returns `false` as soon as `emit` does, leaving `out` partially
/// filled.
///
/// `seed` must hold at least `size.key_len()` bytes.
#[inline]
fn run_expansion<F>(
    seed: &[u8],
    size: KeySize,
    out: &mut [u8; MAX_SCHEDULE_LEN],
    mut emit: F,
) -> bool
where
    F: FnMut(usize, u8) -> bool,
{
    let key_len = size.key_len();
    let total = size.schedule_len();
    out[..key_len].copy_from_slice(&seed[..key_len]);

    let mut rcon_idx = 0;
    let mut current = key_len;
    while current < total {
        let mut t: Word = [
            out[current - 4],
            out[current - 3],
            out[current - 2],
            out[current - 1],
        ];

        if current % key_len == 0 {
            t = sub_word(rot_word(t));
            t[0] ^= RCON[rcon_idx];
            rcon_idx += 1;
        } else if size == KeySize::Aes256 && current % key_len == 16 {
            t = sub_word(t);
        }

        for byte in t {
            let next = out[current - key_len] ^ byte;
            out[current] = next;
            if !emit(current, next) {
                return false;
            }
            current += 1;
        }
    }
    true
}

/// Expands a 128- or 256-bit key into its full round-key schedule.
pub fn expand_key(key: &AesKey) -> KeySchedule {
    let size = key.size();
    let mut bytes = [0u8; MAX_SCHEDULE_LEN];
    run_expansion(key.as_bytes(), size, &mut bytes, |_, _| true);
    KeySchedule { bytes, size }
}

/// Checks whether `window` starts with a seed key of `size` immediately
/// followed by that key's expanded schedule.
///
/// Windows shorter than [`KeySize::schedule_len`] never match. Comparison
/// stops at the first differing byte and nothing is allocated, so this is
/// cheap enough to call at every offset of a buffer.
pub fn validate(window: &[u8], size: KeySize) -> bool {
    let Some(candidate) = window.get(..size.schedule_len()) else {
        return false;
    };
    let mut scratch = [0u8; MAX_SCHEDULE_LEN];
    run_expansion(candidate, size, &mut scratch, |offset, byte| {
        candidate[offset] == byte
    })
}
