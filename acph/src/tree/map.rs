use std::fmt;

use dyn_size_of::GetSize;

use crate::error::DuplicateKey;
use crate::stats::{BuildStatsCollector, LookupStatsCollector};

use super::builder::build_node;
use super::node::{Node, Slot};

/// A static byte-keyed map: a tree of per-column perfect hash tables.
///
/// Built once from a set of distinct keys with parallel payloads; immutable
/// afterwards. A lookup reads one byte of the probed key per visited node,
/// hashes it into the node's table and either misses, descends, or compares
/// the probe against the single stored key, so its cost is bounded by the tree
/// depth. Lookups never allocate and the map can be shared freely between
/// threads.
pub struct Map<P> {
    root: Box<Node<P>>,
}

impl<P: Clone> Map<P> {
    /// Builds a map over byte-string `keys` with parallel `payloads`.
    ///
    /// Accepts any key type viewable as bytes (`&[u8]`, `&str`, arrays).
    /// An empty input yields a map whose every lookup misses.
    ///
    /// # Panics
    /// When `keys` and `payloads` differ in length.
    pub fn try_from_entries<K: AsRef<[u8]>>(keys: &[K], payloads: &[P]) -> Result<Self, DuplicateKey> {
        Self::try_with_stats(keys, payloads, &mut ())
    }

    /// Like [`Self::try_from_entries`], reporting per-node construction events to `stats`.
    pub fn try_with_stats<K, S>(keys: &[K], payloads: &[P], stats: &mut S) -> Result<Self, DuplicateKey>
        where K: AsRef<[u8]>, S: BuildStatsCollector
    {
        assert_eq!(keys.len(), payloads.len(), "one payload per key required");
        let key_slices: Vec<&[u8]> = keys.iter().map(|key| key.as_ref()).collect();
        let payload_refs: Vec<&P> = payloads.iter().collect();
        let root = build_node(&key_slices, &payload_refs, stats)?;
        stats.end();
        Ok(Self { root })
    }

    /// Builds a map keyed by UTF-8 strings; equivalent to building over their bytes.
    pub fn try_from_strs(keys: &[&str], payloads: &[P]) -> Result<Self, DuplicateKey> {
        Self::try_from_entries(keys, payloads)
    }

    /// Builds a map keyed by the machine byte image of each integer.
    ///
    /// The image is endian-dependent: probe a map only with [`Self::get_int`]
    /// on the architecture it was built on.
    pub fn try_from_ints(keys: &[i64], payloads: &[P]) -> Result<Self, DuplicateKey> {
        let images: Vec<[u8; 8]> = keys.iter().map(|key| key.to_ne_bytes()).collect();
        Self::try_from_entries(&images, payloads)
    }

    /// Builds a map keyed by the machine byte image of each double.
    ///
    /// Endian-dependent, like [`Self::try_from_ints`]. Note that `0.0` and
    /// `-0.0` have distinct images, and a `NaN` only matches its own bit
    /// pattern.
    pub fn try_from_doubles(keys: &[f64], payloads: &[P]) -> Result<Self, DuplicateKey> {
        let images: Vec<[u8; 8]> = keys.iter().map(|key| key.to_ne_bytes()).collect();
        Self::try_from_entries(&images, payloads)
    }
}

impl<P> Map<P> {
    /// Returns the payload stored for `key`, or `None` when the map does not contain it.
    #[inline]
    pub fn get(&self, key: &[u8]) -> Option<&P> {
        self.get_stats(key, &mut ())
    }

    /// Like [`Self::get`], reporting the number of nodes the descent visited
    /// to `lookup_stats`.
    pub fn get_stats<L: LookupStatsCollector>(&self, key: &[u8], lookup_stats: &mut L) -> Option<&P> {
        let mut node = &*self.root;
        let mut visited = 1;
        loop {
            match node.slot_of(key) {
                Slot::Empty => {
                    lookup_stats.lookup(visited, false);
                    return None;
                }
                Slot::Leaf { key: stored, payload, .. } => {
                    return if **stored == *key {
                        lookup_stats.lookup(visited, true);
                        Some(payload)
                    } else {
                        lookup_stats.lookup(visited, false);
                        None
                    };
                }
                Slot::Branch { child, .. } => {
                    node = child;
                    visited += 1;
                }
            }
        }
    }

    /// Looks up a string key.
    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&P> { self.get(key.as_bytes()) }

    /// Looks up an integer key by its machine byte image.
    #[inline]
    pub fn get_int(&self, key: i64) -> Option<&P> { self.get(&key.to_ne_bytes()) }

    /// Looks up a double key by its machine byte image.
    #[inline]
    pub fn get_double(&self, key: f64) -> Option<&P> { self.get(&key.to_ne_bytes()) }

    /// Walks the tree and reports slot occupancy and the worst-case lookup depth.
    pub fn efficiency(&self) -> Efficiency {
        let mut slots_used = 0;
        let mut empty_slots = 0;
        let max_comparisons = self.root.survey_slots(&mut slots_used, &mut empty_slots);
        Efficiency { slots_used, empty_slots, max_comparisons }
    }
}

/// Occupancy and depth statistics of a built [`Map`], from [`Map::efficiency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Efficiency {
    /// Occupied (leaf or branch) slots over the whole tree.
    pub slots_used: usize,
    /// Empty slots over the whole tree.
    pub empty_slots: usize,
    /// Number of nodes on the longest root-to-leaf path, which bounds the
    /// byte comparisons a lookup can make.
    pub max_comparisons: usize,
}

impl Efficiency {
    /// Fraction of slots that are occupied, in `0.0..=1.0`.
    pub fn slot_efficiency(&self) -> f64 {
        self.slots_used as f64 / (self.slots_used + self.empty_slots) as f64
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slots used: {}, Slot efficiency: {:.0}%, Max comparisons: {}",
               self.slots_used, self.slot_efficiency() * 100.0, self.max_comparisons)
    }
}

/// Tears the tree down with an explicit work list, so that trees built from
/// very long keys cannot overflow the stack.
impl<P> Drop for Map<P> {
    fn drop(&mut self) {
        let mut pending = vec![std::mem::take(&mut self.root.slots)];
        while let Some(slots) = pending.pop() {
            for slot in slots.into_vec() {
                if let Slot::Branch { mut child, .. } = slot {
                    pending.push(std::mem::take(&mut child.slots));
                }
            }
        }
    }
}

/// Renders the whole tree, one slot per line, children indented under their slot.
impl<P: fmt::Debug> fmt::Debug for Map<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt_tree(f, 0)
    }
}

impl<P: GetSize> GetSize for Map<P> {
    fn size_bytes_dyn(&self) -> usize { self.root.size_bytes_dyn() }
    const USES_DYN_MEM: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::node::column_byte;
    use bitm::{BitAccess, BitVec};
    use rand::prelude::*;
    use rand_pcg::Pcg64Mcg;
    use rayon::prelude::*;

    /// Checks every structural bound on a built tree: slot counts in 1..=256,
    /// per-node key partitioning, complete leaf keys.
    fn check_structure<P>(map: &Map<P>) {
        fn check_node<P>(node: &Node<P>) {
            assert!((1..=256).contains(&node.slots.len()));
            for slot in node.slots.iter() {
                match slot {
                    Slot::Empty => {}
                    Slot::Leaf { byte, key, .. } => assert_eq!(column_byte(key, node.column), *byte),
                    Slot::Branch { child, .. } => check_node(child),
                }
            }
        }
        check_node(&map.root);
    }

    fn build_indexed<K: AsRef<[u8]>>(keys: &[K]) -> Map<usize> {
        let payloads: Vec<usize> = (0..keys.len()).collect();
        let map = Map::try_from_entries(keys, &payloads).unwrap();
        check_structure(&map);
        for (nr, key) in keys.iter().enumerate() {
            assert_eq!(map.get(key.as_ref()), Some(&nr), "key {} must map to its payload", nr);
        }
        map
    }

    #[test]
    fn titles() {
        let keys = ["Mr Smith", "Mr Jones", "Ms Leonard", "Ms James", "Mrs Peabody", "Mr Smile"];
        let map = build_indexed(&keys);
        assert_eq!(map.get_str("Mr Smyth"), None);
        assert_eq!(map.get_str("Mr Smil"), None);
        assert_eq!(map.get_str(""), None);
        let eff = map.efficiency();
        assert!(eff.max_comparisons <= keys.iter().map(|key| key.len()).max().unwrap() + 1);
    }

    #[test]
    fn single_empty_key() {
        let map = Map::try_from_entries(&[""], &[42]).unwrap();
        assert_eq!(map.get(b""), Some(&42));
        assert_eq!(map.get(b"x"), None);
        let eff = map.efficiency();
        assert_eq!(eff.max_comparisons, 1);
        assert_eq!(eff.slots_used, 1);
    }

    #[test]
    fn duplicate_strings_signal() {
        let keys = ["AB", "ABC", "AB", "ABCD", "ABCDE"];
        let payloads = [0, 1, 2, 3, 4];
        assert_eq!(Map::try_from_strs(&keys, &payloads).err(), Some(DuplicateKey));
    }

    #[test]
    fn empty_input_builds_a_missing_everything_map() {
        let map = Map::<u64>::try_from_entries::<&[u8]>(&[], &[]).unwrap();
        assert_eq!(map.get(b""), None);
        assert_eq!(map.get(b"anything"), None);
        assert_eq!(map.efficiency().slots_used, 0);
    }

    #[test]
    fn prefix_family_1000() {
        let keys: Vec<String> = (0..1000).map(|nr| format!("PrefixString{}", nr)).collect();
        let map = build_indexed(&keys);
        for nr in 1000..1100 {
            assert_eq!(map.get_str(&format!("PrefixString{}", nr)), None);
        }
        let eff = map.efficiency();
        println!("prefix family: {}", eff);
        assert!(eff.max_comparisons <= 3, "lookup depth {} exceeds the typical regime", eff.max_comparisons);
        assert!(eff.slot_efficiency() >= 0.7, "slot efficiency {:.2} below the typical regime", eff.slot_efficiency());
        let max_len = keys.iter().map(|key| key.len()).max().unwrap();
        assert!(eff.max_comparisons <= max_len + 1);
        // Every payload index must be reachable exactly once.
        let mut seen = Box::<[u64]>::with_zeroed_bits(keys.len());
        for key in keys.iter() {
            let nr = *map.get_str(key).unwrap();
            assert!(!seen.get_bit(nr));
            seen.set_bit(nr);
        }
    }

    #[test]
    fn integers() {
        let keys = [1i64, 2, 3, 4, 5, 6, 7, 8, 9000, 100000];
        let payloads: Vec<usize> = (0..keys.len()).collect();
        let map = Map::try_from_ints(&keys, &payloads).unwrap();
        for (nr, &key) in keys.iter().enumerate() {
            assert_eq!(map.get_int(key), Some(&nr));
        }
        assert_eq!(map.get_int(0), None);
        assert_eq!(map.get_int(9001), None);
        assert_eq!(map.get_int(-1), None);
    }

    #[test]
    fn doubles() {
        let keys = [0.5f64, -0.5, 3.25, 9000.0, 1e300];
        let payloads: Vec<usize> = (0..keys.len()).collect();
        let map = Map::try_from_doubles(&keys, &payloads).unwrap();
        for (nr, &key) in keys.iter().enumerate() {
            assert_eq!(map.get_double(key), Some(&nr));
        }
        assert_eq!(map.get_double(0.25), None);
        assert_eq!(map.get_double(-3.25), None);
    }

    #[test]
    fn random_probes_miss() {
        let keys: Vec<String> = (0..200).map(|nr| format!("key-{}", nr * 3)).collect();
        let map = build_indexed(&keys);
        let mut rng = Pcg64Mcg::seed_from_u64(5678);
        for _ in 0..10_000 {
            let len = rng.gen_range(0..20);
            let probe: Vec<u8> = (&mut rng).sample_iter(rand::distributions::Standard).take(len).collect();
            let expected = keys.iter().position(|key| key.as_bytes() == &probe[..]);
            assert_eq!(map.get(&probe).copied(), expected);
        }
    }

    #[test]
    fn builds_are_deterministic() {
        let keys = ["Mr Smith", "Mr Jones", "Ms Leonard", "Ms James", "Mrs Peabody", "Mr Smile"];
        let payloads = [10, 11, 12, 13, 14, 15];
        let first = Map::try_from_strs(&keys, &payloads).unwrap();
        let second = Map::try_from_strs(&keys, &payloads).unwrap();
        assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }

    #[test]
    fn depth_is_observable_through_lookup_stats() {
        let keys = ["aa", "ab", "ba", "bb"];
        let map = build_indexed(&keys);
        let eff = map.efficiency();
        for key in keys {
            let mut visited = 0usize;
            assert!(map.get_stats(key.as_bytes(), &mut visited).is_some());
            assert!(visited <= eff.max_comparisons);
        }
    }

    #[test]
    fn parallel_readers() {
        let keys: Vec<String> = (0..500).map(|nr| format!("shared/{}", nr)).collect();
        let map = build_indexed(&keys);
        keys.par_iter().enumerate().for_each(|(nr, key)| {
            assert_eq!(map.get_str(key), Some(&nr));
        });
    }

    #[test]
    fn duplicate_mid_build_releases_the_partial_tree() {
        // The duplicate pair collides deep in one branch; siblings are already built.
        let keys = ["left-a", "left-b", "right-dup", "right-dup", "middle"];
        let payloads = [0, 1, 2, 3, 4];
        assert_eq!(Map::try_from_strs(&keys, &payloads).err(), Some(DuplicateKey));
    }

    #[test]
    fn build_stats_see_every_node() {
        struct Counting { nodes: usize, keys_at_root: usize, ended: bool }
        impl crate::stats::BuildStatsCollector for Counting {
            fn node(&mut self, keys: usize, _column: usize, _slots: usize) {
                if self.nodes == 0 { self.keys_at_root = keys; }
                self.nodes += 1;
            }
            fn end(&mut self) { self.ended = true; }
        }
        let keys = ["Mr Smith", "Mr Jones", "Ms Leonard", "Ms James", "Mrs Peabody", "Mr Smile"];
        let payloads = [0, 1, 2, 3, 4, 5];
        let mut stats = Counting { nodes: 0, keys_at_root: 0, ended: false };
        let map = Map::try_with_stats(&keys, &payloads, &mut stats).unwrap();
        assert!(stats.nodes >= 1);
        assert_eq!(stats.keys_at_root, keys.len());
        assert!(stats.ended);
        drop(map);
    }

    #[test]
    fn debug_dump_shows_leaves() {
        let map = Map::try_from_strs(&["ab", "cd"], &[1, 2]).unwrap();
        let dump = format!("{:?}", map);
        assert!(dump.contains("column 0"));
        assert!(dump.contains("b\"ab\""));
        assert!(dump.contains("= 2"));
    }

    #[test]
    fn size_accounting_includes_keys() {
        let map = Map::try_from_strs(&["a-rather-long-key", "b"], &[1u64, 2]).unwrap();
        assert!(map.size_bytes_dyn() > "a-rather-long-key".len());
    }

    #[test]
    fn deep_tree_teardown() {
        // One odd byte per key makes every node split off a single leaf, so
        // the tree degenerates into a chain of n - 1 nodes.
        let n = 300;
        let keys: Vec<Vec<u8>> = (0..n).map(|nr| {
            let mut key = vec![b'x'; n];
            key[nr] = b'y';
            key
        }).collect();
        let payloads: Vec<usize> = (0..n).collect();
        let map = Map::try_from_entries(&keys, &payloads).unwrap();
        for (nr, key) in keys.iter().enumerate() {
            assert_eq!(map.get(key), Some(&nr));
        }
        let eff = map.efficiency();
        assert_eq!(eff.max_comparisons, n - 1);
        drop(map);
    }
}
