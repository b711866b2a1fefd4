//! BitLocker key recovery from memory images.
//!
//! Drivers that hold a live AES key keep its expanded round-key schedule next
//! to it. This crate slides an [`aes_core::validate`] window over every
//! offset of a kernel pool allocation and reports seed keys whose own
//! schedule follows them byte for byte:
//!
//! - [`scanner`]: the per-allocation search and acceptance heuristic.
//! - [`source`]: the interface to whatever isolates pool allocations.
//! - [`image`]: a pool walker over flat memory images.
//! - [`report`]: text/JSON rendering and key dumps.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod detection;
mod error;
pub mod image;
pub mod report;
pub mod scanner;
pub mod source;

pub use config::{ScanConfig, DEFAULT_HEADER_SKIP, DEFAULT_MAX_MATCHES, DEFAULT_MIN_POOL_SIZE};
pub use detection::{CandidateMatch, Detection, KeyReport};
pub use error::{Result, ScanError};
pub use image::{PoolLayout, RawImage};
pub use scanner::{find_candidates, scan_allocation, Scanner};
pub use source::{Allocation, AllocationSource, OsVersion, PoolTag};
