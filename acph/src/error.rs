use thiserror::Error;

/// Construction found two byte-identical keys in the input.
///
/// The partially built tree is released before this is returned. Note that two
/// keys which differ only by trailing zero bytes (such as `"A"` and `"A\0"`)
/// present the same byte at every surveyed column and are reported as
/// duplicates as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duplicate key in construction input")]
pub struct DuplicateKey;
