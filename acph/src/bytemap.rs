//! Single-byte keys: one perfect hash table, no tree.

use std::fmt;

use dyn_size_of::GetSize;

use crate::distribution::ByteDistribution;
use crate::hash::byte_hash;
use crate::selector::select_hash;
use crate::tree::DisplayByte;

struct ByteSlot<P> {
    byte: u8,
    payload: P,
}

/// A map from single bytes to payloads, backed by one perfect hash table.
///
/// The simple path for byte-sized keys: construction cannot fail, because a
/// byte column is always perfectly hashable (the 256-slot identity table at
/// worst). Repeated bytes in the input coalesce; each byte keeps the payload
/// of its last occurrence.
pub struct ByteMap<P> {
    prime: u8,
    slots: Box<[Option<ByteSlot<P>>]>,
}

impl<P: Clone> ByteMap<P> {
    /// Builds a map over `bytes` with parallel `payloads`.
    ///
    /// # Panics
    /// When `bytes` and `payloads` differ in length.
    pub fn from_bytes(bytes: &[u8], payloads: &[P]) -> Self {
        assert_eq!(bytes.len(), payloads.len(), "one payload per byte required");
        let dist = ByteDistribution::of(bytes);
        let choice = select_hash(bytes, &dist);
        let mut slots: Box<[Option<ByteSlot<P>>]> =
            (0..choice.fills.len()).map(|_| None).collect();
        for (&byte, payload) in bytes.iter().zip(payloads.iter()) {
            let slot = byte_hash(byte, choice.prime, choice.num_slots) as usize;
            slots[slot] = Some(ByteSlot { byte, payload: payload.clone() });
        }
        Self { prime: choice.prime, slots }
    }
}

impl<P> ByteMap<P> {
    /// Returns the payload stored for `byte`, or `None`.
    #[inline]
    pub fn get(&self, byte: u8) -> Option<&P> {
        let slot = self.slots[byte_hash(byte, self.prime, self.num_slots_zero_based()) as usize].as_ref()?;
        (slot.byte == byte).then(|| &slot.payload)
    }

    /// Number of slots in the table, 1 to 256.
    #[inline]
    pub fn num_slots(&self) -> usize { self.slots.len() }

    /// The selected hash multiplier.
    #[inline]
    pub fn prime(&self) -> u8 { self.prime }

    #[inline(always)]
    fn num_slots_zero_based(&self) -> u8 { (self.slots.len() - 1) as u8 }
}

impl<P: fmt::Debug> fmt::Debug for ByteMap<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "prime {}, {} slots", self.prime, self.slots.len())?;
        for (nr, slot) in self.slots.iter().enumerate() {
            match slot {
                None => writeln!(f, "slot {}: empty", nr)?,
                Some(slot) => writeln!(f, "slot {}: {} = {:?}", nr, DisplayByte(slot.byte), slot.payload)?,
            }
        }
        Ok(())
    }
}

impl<P: GetSize> GetSize for ByteMap<P> {
    fn size_bytes_dyn(&self) -> usize {
        self.slots.iter().map(|slot| {
            std::mem::size_of_val(slot) + slot.as_ref().map_or(0, |s| s.payload.size_bytes_dyn())
        }).sum()
    }
    const USES_DYN_MEM: bool = true;
}
