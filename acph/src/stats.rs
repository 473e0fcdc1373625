//! Collecting and reporting construction and lookup statistics.

use std::io::Write;

/// Trait for collecting (and summarizing or reporting) events during tree construction.
pub trait BuildStatsCollector {
    /// Called once per constructed node with the number of keys routed through it,
    /// the byte column it discriminates on, and its table width. Default implementation does nothing.
    #[inline(always)] fn node(&mut self, _keys: usize, _column: usize, _slots: usize) {}

    /// Called once when the whole tree has been built. Default implementation does nothing.
    #[inline(always)] fn end(&mut self) {}
}

/// Ignores all events and does nothing.
impl BuildStatsCollector for () {}

/// Reports construction events to the wrapped writer, one node per line.
pub struct BuildStatsPrinter<W: Write = std::io::Stdout>(W);

impl BuildStatsPrinter<std::io::Stdout> {
    /// Reports construction events to the standard output.
    pub fn stdout() -> Self { Self(std::io::stdout()) }
}

impl<W: Write> BuildStatsPrinter<W> {
    /// Reports construction events to `writer`.
    pub fn new(writer: W) -> Self { Self(writer) }
}

impl<W: Write> BuildStatsCollector for BuildStatsPrinter<W> {
    fn node(&mut self, keys: usize, column: usize, slots: usize) {
        writeln!(self.0, "{} keys, column {}, {} slots", keys, column, slots).unwrap();
    }

    fn end(&mut self) {
        writeln!(self.0, "Tree completed.").unwrap();
    }
}

/// Trait for collecting (and summarizing or reporting) events during lookups.
pub trait LookupStatsCollector {
    /// Called once per lookup, when the descent ends: `nodes_visited` nodes
    /// were entered (so that many bytes of the probed key were hashed), and
    /// the probe either matched a leaf (`found`) or ran into an empty slot or
    /// a differing leaf key. Default implementation does nothing.
    #[inline(always)] fn lookup(&mut self, _nodes_visited: usize, _found: bool) {}
}

/// Ignores all events and does nothing.
impl LookupStatsCollector for () {}

/// Sums the nodes visited over all lookups, hits and misses alike.
impl LookupStatsCollector for usize {
    #[inline(always)] fn lookup(&mut self, nodes_visited: usize, _found: bool) { *self += nodes_visited; }
}
