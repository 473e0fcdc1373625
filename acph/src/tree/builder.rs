//! Recursive construction of the columnar hash tree.

use crate::distribution::ByteDistribution;
use crate::error::DuplicateKey;
use crate::selector::select_hash;
use crate::stats::BuildStatsCollector;

use super::node::{column_byte, Node, Slot};

/// The column survey's pick: the byte image of the winning column and its distribution.
struct ColumnChoice {
    column: usize,
    image: Box<[u8]>,
    dist: ByteDistribution,
}

/// Scans every column of `keys` (up to the first column no key reaches) and
/// returns the one with the smallest maximum multiplicity, earliest column
/// winning ties.
///
/// The terminating all-virtual column is itself surveyed; with more than one
/// key it never wins (its multiplicity is the key count), but for a single
/// key it legitimately can.
fn survey_columns(keys: &[&[u8]]) -> ColumnChoice {
    let mut image = vec![0u8; keys.len()];
    let mut best: Option<ColumnChoice> = None;
    let mut column = 0;
    loop {
        let mut last_column = true;
        for (dst, key) in image.iter_mut().zip(keys.iter()) {
            *dst = match key.get(column) {
                Some(&b) => { last_column = false; b }
                None => 0,
            };
        }
        let dist = ByteDistribution::of(&image);
        if best.as_ref().map_or(true, |b| dist.max_multiplicity < b.dist.max_multiplicity) {
            best = Some(ColumnChoice { column, image: image.clone().into_boxed_slice(), dist });
        }
        if last_column { break; }
        column += 1;
    }
    best.expect("the survey visits at least the all-virtual column")
}

/// Builds the subtree for `keys` and their parallel `payloads`.
///
/// Returns [`DuplicateKey`] when two keys cannot be told apart by any column;
/// the partially built subtree is dropped on the way out.
pub(super) fn build_node<P: Clone, S: BuildStatsCollector>(
    keys: &[&[u8]],
    payloads: &[&P],
    stats: &mut S,
) -> Result<Box<Node<P>>, DuplicateKey> {
    let choice = survey_columns(keys);
    if choice.dist.unique_bytes == 1 && keys.len() > 1 {
        // Every key presents the same byte in its best column, hence in every
        // column: at least two keys are byte-identical.
        return Err(DuplicateKey);
    }

    let hash = select_hash(&choice.image, &choice.dist);
    let column = choice.column;
    stats.node(keys.len(), column, hash.fills.len());

    let mut slots = Vec::with_capacity(hash.fills.len());
    for fill in hash.fills.iter() {
        slots.push(match fill.count {
            0 => Slot::Empty,
            1 => {
                let (key, payload) = keys.iter().zip(payloads.iter())
                    .find(|(key, _)| column_byte(key, column) == fill.byte)
                    .expect("routed byte originates from a surveyed key");
                Slot::Leaf { byte: fill.byte, key: (*key).into(), payload: (**payload).clone() }
            }
            _ => {
                let mut group_keys = Vec::with_capacity(fill.count);
                let mut group_payloads = Vec::with_capacity(fill.count);
                for (key, payload) in keys.iter().zip(payloads.iter()) {
                    if column_byte(key, column) == fill.byte {
                        group_keys.push(*key);
                        group_payloads.push(*payload);
                    }
                }
                let child = build_node(&group_keys, &group_payloads, stats)?;
                Slot::Branch { byte: fill.byte, child }
            }
        });
    }

    Ok(Box::new(Node { column, prime: hash.prime, slots: slots.into_boxed_slice() }))
}
