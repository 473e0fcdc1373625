//! Byte multiset statistics that bound the hash search.

/// Distribution of byte values over one column of the key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteDistribution {
    /// Number of distinct byte values. A perfect hash needs at least this many slots.
    pub unique_bytes: usize,
    /// Largest number of occurrences of any single value.
    ///
    /// No hash can split equal bytes apart, so this is the best differential
    /// score any candidate table can reach. When it equals the column length,
    /// the column is degenerate (a single repeated value).
    pub max_multiplicity: usize,
}

impl ByteDistribution {
    /// Counts `bytes` in a single pass.
    pub fn of(bytes: &[u8]) -> Self {
        let mut counts = [0usize; 256];
        let mut unique_bytes = 0;
        let mut max_multiplicity = 0;
        for &b in bytes {
            let c = &mut counts[b as usize];
            if *c == 0 { unique_bytes += 1; }
            *c += 1;
            if *c > max_multiplicity { max_multiplicity = *c; }
        }
        Self { unique_bytes, max_multiplicity }
    }
}
