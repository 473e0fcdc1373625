//! Search for the smallest collision-free table over one byte column.

use crate::distribution::ByteDistribution;
use crate::hash::{byte_hash, PRIMES};

/// Occupancy of one slot after routing a byte column through a candidate hash.
///
/// `count == 0` marks an empty slot. Otherwise every routed occurrence of
/// `byte` landed here; distinct bytes never share a slot.
#[derive(Clone, Copy, Default)]
pub(crate) struct SlotFill {
    pub byte: u8,
    pub count: usize,
}

/// The selected hash parameters together with the slot occupancy they produce.
pub(crate) struct HashChoice {
    pub prime: u8,
    /// Zero-based: the table has `num_slots + 1` slots.
    pub num_slots: u8,
    /// Slot occupancy, `num_slots + 1` entries.
    pub fills: Box<[SlotFill]>,
}

/// Returns the smallest table that routes `bytes` without placing two distinct
/// values in one slot.
///
/// Scans table sizes outward from the number of distinct values (nothing
/// smaller can be perfect) and, within a size, the primes in `PRIMES` order.
/// Each candidate is scored by its heaviest slot; a score equal to
/// `max_multiplicity` cannot be improved (duplicate bytes cannot be split), so
/// the scan stops there. The 256-slot identity table accepts any byte set,
/// which bounds the search.
pub(crate) fn select_hash(bytes: &[u8], dist: &ByteDistribution) -> HashChoice {
    let mut work = [SlotFill::default(); 256];
    let mut best: Option<(usize, HashChoice)> = None;

    'sizes: for num_slots in dist.unique_bytes.saturating_sub(1)..=255 {
        let width = num_slots + 1;
        'candidate: for &prime in PRIMES.iter() {
            work[..width].fill(SlotFill::default());
            let mut score = 0;
            for &b in bytes {
                let fill = &mut work[byte_hash(b, prime, num_slots as u8) as usize];
                if fill.count == 0 {
                    *fill = SlotFill { byte: b, count: 1 };
                    if score == 0 { score = 1; }
                } else if fill.byte != b {
                    continue 'candidate; // false positive
                } else {
                    fill.count += 1;
                    if fill.count > score { score = fill.count; }
                }
            }
            if best.as_ref().map_or(true, |(best_score, _)| score < *best_score) {
                best = Some((score, HashChoice {
                    prime,
                    num_slots: num_slots as u8,
                    fills: work[..width].to_vec().into_boxed_slice(),
                }));
            }
            if score == dist.max_multiplicity { break 'sizes; }
        }
    }

    // The identity table at num_slots == 255 routes every byte to itself and
    // scores exactly max_multiplicity, so the scan above always sets a best.
    best.expect("identity fallback accepts any byte column").1
}
