//! Umbrella crate re-exporting the cryptopipe engines.
//!
//! - [`aes`]: table-driven AES with timing-attack countermeasures and a
//!   bulk block-processing path.
//! - [`codec`]: streaming Base-N codecs and grouping filters.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub use aes_engine as aes;
pub use basen_codec as codec;
