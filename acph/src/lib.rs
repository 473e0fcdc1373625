#![doc = include_str!("../README.md")]

pub mod hash;
mod distribution;
mod selector;
pub mod stats;

mod error;
pub use error::DuplicateKey;

mod tree;
pub use tree::{Efficiency, Map};

mod bytemap;
pub use bytemap::ByteMap;

pub use dyn_size_of::GetSize;
