//! Streaming Base-N codecs.
//!
//! This crate provides push-style filter nodes that plug into a pipeline:
//! - [`BaseNEncoder`]: bit-packs bytes into symbols of any power-of-two
//!   alphabet (Base-2 through Base-128), with optional padding.
//! - [`BaseNDecoder`]: the streaming inverse, skipping unmapped input bytes
//!   so whitespace-tolerant decoding comes for free.
//! - [`Grouper`]: inserts a separator every N output bytes and a terminator
//!   at end of message.
//!
//! Every filter owns its downstream, so filters compose by nesting; a
//! [`VecSink`] terminates a chain. Output is byte-identical no matter how
//! the input is split across [`Filter::put2`] calls, and a blocked
//! downstream is resumed exactly where it stopped.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod alphabets;
mod basen;
mod error;
mod filter;
mod grouper;

pub use crate::alphabets::{
    base16_decode, base16_decoder, base16_encode, base16_encoder, base32_decode, base32_decoder,
    base32_encode, base32_encoder, base64_decode, base64_decoder, base64_encode, base64_encoder,
    base64url_decode, base64url_decoder, base64url_encode, base64url_encoder, BASE16_ALPHABET,
    BASE32_ALPHABET, BASE64_ALPHABET, BASE64_URL_ALPHABET,
};
pub use crate::basen::{decoding_lookup, BaseNDecoder, BaseNEncoder, DecoderConfig, EncoderConfig};
pub use crate::error::ConfigError;
pub use crate::filter::{Filter, MeteredSink, VecSink};
pub use crate::grouper::{Grouper, GrouperConfig};
