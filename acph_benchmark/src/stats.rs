use std::fmt::{Display, Formatter};

/// Per-lookup averages over one probe set: tree levels visited, time (seconds),
/// and the fraction of probes that were not found.
pub struct SearchStats {
    /// average number of nodes visited per lookup
    pub avg_deep: f64,
    /// average lookup time
    pub avg_lookup_time: f64,
    /// proportion of probes not found
    pub absences: f64,
}

impl SearchStats {
    pub fn nan() -> Self {
        Self { avg_deep: f64::NAN, avg_lookup_time: f64::NAN, absences: f64::NAN }
    }
}

/// All statistics/results of one benchmarked build.
pub struct BenchmarkResult {
    pub included: SearchStats,
    pub foreign: SearchStats,
    pub size_bytes: usize,
    pub bits_per_key: f64,
    /// Construction time in seconds.
    pub build_time: f64,
    pub efficiency: acph::Efficiency,
}

impl Display for BenchmarkResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "size [bits/key]: {:.2}\tbuild time [ms]: {:.1}", self.bits_per_key, self.build_time * 1_000.0)?;
        if !self.included.avg_lookup_time.is_nan() {
            write!(f, "\tlookup time [ns]: {:.0}\tavg depth: {:.2}",
                   self.included.avg_lookup_time * 1_000_000_000.0, self.included.avg_deep)?;
        }
        if !self.foreign.avg_lookup_time.is_nan() {
            write!(f, "\tforeign lookup time [ns]: {:.0} (missing: {:.1}%)",
                   self.foreign.avg_lookup_time * 1_000_000_000.0, self.foreign.absences * 100.0)?;
        }
        write!(f, "\n{}", self.efficiency)
    }
}
