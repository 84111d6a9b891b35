//! Frame encoding and decoding

pub mod core;
pub mod types;
