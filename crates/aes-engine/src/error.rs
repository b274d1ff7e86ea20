//! Error types for key setup.

use thiserror::Error;

/// Errors produced when installing key material.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The user key is not 16, 24, or 32 bytes long.
    #[error("invalid key length: {length} bytes (AES accepts 16, 24, or 32)")]
    InvalidKeyLength {
        /// The rejected length.
        length: usize,
    },
}
