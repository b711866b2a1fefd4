//! Sliding-window key schedule search over pool allocations.

use aes_core::{validate, AesKey, KeySize};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::detection::{CandidateMatch, Detection, KeyReport};
use crate::error::Result;
use crate::source::{AllocationSource, PoolTag};

/// Tests offsets from `skip` up to, but excluding, `len - schedule_len`.
fn sweep(buffer: &[u8], size: KeySize, skip: usize, out: &mut Vec<CandidateMatch>) {
    let Some(end) = buffer.len().checked_sub(size.schedule_len()) else {
        return;
    };
    for offset in skip..end {
        let window = &buffer[offset..];
        if validate(window, size) {
            let key = AesKey::try_from(&window[..size.key_len()])
                .expect("seed slice is 16 or 32 bytes");
            out.push(CandidateMatch { offset, key });
        }
    }
}

/// Runs both the 128-bit and 256-bit sweeps and returns every match in
/// ascending offset order.
pub fn find_candidates(buffer: &[u8], header_skip: usize) -> Vec<CandidateMatch> {
    let mut matches = Vec::new();
    for size in KeySize::ALL {
        sweep(buffer, size, header_skip, &mut matches);
    }
    matches.sort_by_key(|m| m.offset);
    matches
}

/// Scans one allocation and applies the acceptance heuristic.
///
/// Returns `None` when no key is present or when the match count exceeds
/// `config.max_matches`, in which case the whole allocation is treated as
/// noise.
pub fn scan_allocation(buffer: &[u8], config: &ScanConfig) -> Option<Detection> {
    let matches = find_candidates(buffer, config.header_skip);
    if config.accepts(matches.len()) {
        Some(Detection::new(matches))
    } else {
        if matches.len() > config.max_matches {
            debug!(
                found = matches.len(),
                limit = config.max_matches,
                "discarding allocation with too many candidate keys"
            );
        }
        None
    }
}

/// Entry point tying the engine to allocation addresses.
#[derive(Clone, Debug, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Creates a scanner with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scanner with explicit configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans `buffer`, the contents of the allocation at `address`.
    ///
    /// Yields at most one report; the address is passed through as given.
    pub fn scan(&self, buffer: &[u8], address: u64) -> Vec<KeyReport> {
        debug!(
            address = %format!("{address:#010x}"),
            len = buffer.len(),
            "scanning potential BitLocker pool"
        );
        let detection = scan_allocation(buffer, &self.config);
        debug!(
            found = detection.as_ref().map_or(0, |d| d.matches().len()),
            "AES keys found"
        );
        detection
            .map(|d| KeyReport::new(address, &d))
            .into_iter()
            .collect()
    }

    /// Enumerates `tag` allocations from `source` and scans them in parallel.
    ///
    /// The size floor is left to the source; every allocation it returns is
    /// scanned. Reports come back in the source's enumeration order.
    pub fn scan_source<S>(&self, source: &S, tag: PoolTag) -> Result<Vec<KeyReport>>
    where
        S: AllocationSource + ?Sized,
    {
        let allocations = source.allocations(tag, self.config.min_pool_size)?;
        let reports: Vec<KeyReport> = allocations
            .par_iter()
            .flat_map_iter(|alloc| self.scan(&alloc.bytes, alloc.address))
            .collect();
        info!(
            %tag,
            scanned = allocations.len(),
            reported = reports.len(),
            "pool scan complete"
        );
        Ok(reports)
    }
}
