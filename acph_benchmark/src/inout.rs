//! Key sources for the benchmark: generated binary keys and piped-in lines.

use std::io::BufRead;

use butils::XorShift64;

/// 8-byte binary keys drawn from a xor-shift sequence.
pub struct RandomKeys(XorShift64);

impl RandomKeys {
    pub fn new(seed: u64) -> Self { Self(XorShift64(seed)) }

    /// Takes `keys_num` keys to build the map from, then `foreign_num` more to
    /// probe it for absences. The generator does not repeat before it cycles,
    /// so the included keys are distinct and no foreign key is among them.
    pub fn split(mut self, keys_num: usize, foreign_num: usize) -> (Vec<Box<[u8]>>, Vec<Box<[u8]>>) {
        let keys = self.by_ref().take(keys_num).collect();
        let foreign = self.take(foreign_num).collect();
        (keys, foreign)
    }
}

impl Iterator for RandomKeys {
    type Item = Box<[u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|value| value.to_ne_bytes().to_vec().into_boxed_slice())
    }
}

/// Reads newline-separated keys from `input`, at most `max` of them when given.
///
/// Each key keeps its exact bytes apart from the stripped line ending (a `\r`
/// before the `\n` is stripped too), so a word list pipes in unmodified. An
/// empty line is a legal empty key; duplicate lines are left for map
/// construction to reject.
pub fn read_keys<R: BufRead>(mut input: R, max: Option<usize>) -> std::io::Result<Vec<Box<[u8]>>> {
    let mut keys = Vec::new();
    let mut line = Vec::new();
    while max.map_or(true, |max| keys.len() < max) {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 { break; }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') { line.pop(); }
        }
        keys.push(line.as_slice().into());
    }
    Ok(keys)
}
