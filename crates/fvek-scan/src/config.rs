//! Scanner tuning knobs.

/// Bytes skipped at the start of every allocation (pool bookkeeping).
pub const DEFAULT_HEADER_SKIP: usize = 8;

/// Allocations this size or smaller are not worth scanning.
pub const DEFAULT_MIN_POOL_SIZE: usize = 184;

/// Most candidate keys one allocation may yield before it is treated as noise.
pub const DEFAULT_MAX_MATCHES: usize = 2;

/// Configuration for [`crate::Scanner`].
///
/// The defaults are empirical thresholds tied to the Windows kernel pool
/// layout; adjust them when scanning a different allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// First offset tested inside an allocation.
    pub header_skip: usize,
    /// Allocations of at most this many bytes are skipped. Passed to the
    /// [`crate::AllocationSource`], which is the only place it is applied.
    pub min_pool_size: usize,
    /// Upper bound (inclusive) on accepted matches per allocation.
    pub max_matches: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_skip: DEFAULT_HEADER_SKIP,
            min_pool_size: DEFAULT_MIN_POOL_SIZE,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

impl ScanConfig {
    /// Whether `count` matches in one allocation should be reported.
    #[inline]
    pub fn accepts(&self, count: usize) -> bool {
        count > 0 && count <= self.max_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = ScanConfig::default();
        assert_eq!(config.min_pool_size, 184);
        assert!(!config.accepts(0));
        assert!(config.accepts(1));
        assert!(config.accepts(2));
        assert!(!config.accepts(3));
    }
}
