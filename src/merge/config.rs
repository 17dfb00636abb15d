//! [`MergeConfig`]: the tunables `MappingMergeScheme`'s constructor used to
//! take as positional arguments, gathered into one struct the CLI fills in.

/// Configuration for one merge-mapping run against a target genome.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// The genome (as numbered in the contig table) to map every other
    /// contig against.
    pub genome: usize,
    /// Minimum context length (in bases) a mapping must achieve before it
    /// is trusted.
    pub min_context: usize,
    /// Use the two-sided "credit" map (`cmap`) instead of the one-sided
    /// right-extension map when generating merges.
    pub credit: bool,
    /// Maximum number of mismatches tolerated per mapped position; `0`
    /// disables mismatch-tolerant mapping entirely.
    pub mismatches: u32,
    /// Whether to emit merges generated from a one-sided (tagged
    /// non-reversible) match rather than dropping them.
    pub include_non_reversible: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            genome: 0,
            min_context: 1,
            credit: false,
            mismatches: 0,
            include_non_reversible: false,
        }
    }
}
