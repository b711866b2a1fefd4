//! AES key expansion for AES-128 and AES-256, plus a validator that checks
//! whether a byte window holds a seed key followed by its own schedule.
//!
//! This crate mirrors the FIPS-197 key schedule and provides:
//! - Key and schedule types for both key sizes.
//! - Key expansion.
//! - Allocation-free schedule validation with early exit.
//!
//! No block encryption is implemented; the schedule is all that is needed to
//! recognise keys left in memory.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod key;
mod sbox;
mod schedule;

pub use crate::key::{AesKey, KeyLengthError, KeySchedule, KeySize, MAX_SCHEDULE_LEN};
pub use crate::sbox::sbox;
pub use crate::schedule::{expand_key, validate};
