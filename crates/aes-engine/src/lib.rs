//! Table-driven AES (Rijndael) block cipher.
//!
//! This crate provides:
//! - Key schedule for AES-128/192/256, including the inverted schedule used
//!   for decryption.
//! - Single-block encryption and decryption over precomputed T-tables, with
//!   a cache-preload countermeasure against table-lookup timing attacks.
//! - A bulk block-processing path with flags for XOR composition, pointer
//!   stepping, and counter-mode chaining.
//!
//! The block size is fixed at 16 bytes. Input and output bytes are
//! interpreted big-endian per FIPS-197; the FIPS-197 appendix vectors pass
//! bit-exactly for all three key sizes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod bulk;
mod cipher;
mod error;
mod key;
mod sbox;
mod tables;

pub use crate::block::{xor_in_place, Block, BLOCK_SIZE};
pub use crate::bulk::BulkFlags;
pub use crate::cipher::AesCipher;
pub use crate::error::KeyError;
pub use crate::key::{Direction, RoundKeys};
pub use crate::sbox::{xtime, SD, SE};
