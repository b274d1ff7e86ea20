//! Stock codec configurations.
//!
//! | codec | bits | alphabet | padding |
//! |---|---|---|---|
//! | Base64 | 6 | `A-Za-z0-9+/` | `=` |
//! | Base64 (URL) | 6 | `A-Za-z0-9-_` | `=` |
//! | Base32 | 5 | `A-Z2-7` | `=` |
//! | Base16 | 4 | `0-9A-F` | none |
//!
//! Encoders always emit the canonical case; decoders for Base32 and Base16
//! take a case-insensitivity switch.

use crate::basen::{decoding_lookup, BaseNDecoder, BaseNEncoder, DecoderConfig, EncoderConfig};
use crate::filter::{Filter, VecSink};

/// Standard Base64 alphabet.
pub const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// URL-safe Base64 alphabet.
pub const BASE64_URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// RFC 4648 Base32 alphabet.
pub const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Upper-case hexadecimal alphabet.
pub const BASE16_ALPHABET: &[u8; 16] = b"0123456789ABCDEF";

/// Standard Base64 encoder with `=` padding.
pub fn base64_encoder<S: Filter>(sink: S) -> BaseNEncoder<S> {
    BaseNEncoder::new(
        EncoderConfig::new(&BASE64_ALPHABET[..], 6).with_padding(b'='),
        sink,
    )
    .expect("stock base64 parameters are valid")
}

/// Standard Base64 decoder; unmapped bytes (including `=`) are skipped.
pub fn base64_decoder<S: Filter>(sink: S) -> BaseNDecoder<S> {
    BaseNDecoder::new(
        DecoderConfig::new(decoding_lookup(&BASE64_ALPHABET[..], false), 6),
        sink,
    )
    .expect("stock base64 parameters are valid")
}

/// URL-safe Base64 encoder with `=` padding.
pub fn base64url_encoder<S: Filter>(sink: S) -> BaseNEncoder<S> {
    BaseNEncoder::new(
        EncoderConfig::new(&BASE64_URL_ALPHABET[..], 6).with_padding(b'='),
        sink,
    )
    .expect("stock base64url parameters are valid")
}

/// URL-safe Base64 decoder.
pub fn base64url_decoder<S: Filter>(sink: S) -> BaseNDecoder<S> {
    BaseNDecoder::new(
        DecoderConfig::new(decoding_lookup(&BASE64_URL_ALPHABET[..], false), 6),
        sink,
    )
    .expect("stock base64url parameters are valid")
}

/// Base32 encoder with `=` padding.
pub fn base32_encoder<S: Filter>(sink: S) -> BaseNEncoder<S> {
    BaseNEncoder::new(
        EncoderConfig::new(&BASE32_ALPHABET[..], 5).with_padding(b'='),
        sink,
    )
    .expect("stock base32 parameters are valid")
}

/// Base32 decoder, optionally accepting lower-case input.
pub fn base32_decoder<S: Filter>(sink: S, case_insensitive: bool) -> BaseNDecoder<S> {
    BaseNDecoder::new(
        DecoderConfig::new(decoding_lookup(&BASE32_ALPHABET[..], case_insensitive), 5),
        sink,
    )
    .expect("stock base32 parameters are valid")
}

/// Hexadecimal encoder (upper case, no padding).
pub fn base16_encoder<S: Filter>(sink: S) -> BaseNEncoder<S> {
    BaseNEncoder::new(EncoderConfig::new(&BASE16_ALPHABET[..], 4), sink)
        .expect("stock base16 parameters are valid")
}

/// Hexadecimal decoder, optionally accepting lower-case input.
pub fn base16_decoder<S: Filter>(sink: S, case_insensitive: bool) -> BaseNDecoder<S> {
    BaseNDecoder::new(
        DecoderConfig::new(decoding_lookup(&BASE16_ALPHABET[..], case_insensitive), 4),
        sink,
    )
    .expect("stock base16 parameters are valid")
}

fn run_message<F: Filter>(mut filter: F, data: &[u8]) -> F {
    let residual = filter.put2(data, 1, true);
    debug_assert_eq!(residual, 0, "VecSink never blocks");
    filter
}

/// Base64-encodes a whole buffer.
pub fn base64_encode(data: &[u8]) -> Vec<u8> {
    run_message(base64_encoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// Decodes a whole Base64 buffer, skipping unmapped bytes.
pub fn base64_decode(data: &[u8]) -> Vec<u8> {
    run_message(base64_decoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// URL-safe Base64-encodes a whole buffer.
pub fn base64url_encode(data: &[u8]) -> Vec<u8> {
    run_message(base64url_encoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// Decodes a whole URL-safe Base64 buffer.
pub fn base64url_decode(data: &[u8]) -> Vec<u8> {
    run_message(base64url_decoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// Base32-encodes a whole buffer.
pub fn base32_encode(data: &[u8]) -> Vec<u8> {
    run_message(base32_encoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// Decodes a whole Base32 buffer, case-insensitively.
pub fn base32_decode(data: &[u8]) -> Vec<u8> {
    run_message(base32_decoder(VecSink::new(), true), data)
        .into_sink()
        .into_vec()
}

/// Hex-encodes a whole buffer.
pub fn base16_encode(data: &[u8]) -> Vec<u8> {
    run_message(base16_encoder(VecSink::new()), data)
        .into_sink()
        .into_vec()
}

/// Decodes a whole hex buffer, case-insensitively.
pub fn base16_decode(data: &[u8]) -> Vec<u8> {
    run_message(base16_decoder(VecSink::new(), true), data)
        .into_sink()
        .into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_man_is_twfu() {
        assert_eq!(base64_encode(b"Man"), b"TWFu");
    }

    #[test]
    fn base64_padding_variants() {
        assert_eq!(base64_encode(b"M"), b"TQ==");
        let unpadded = BaseNEncoder::new(
            EncoderConfig::new(&BASE64_ALPHABET[..], 6)
                .with_padding(b'=')
                .without_padding(),
            VecSink::new(),
        )
        .unwrap();
        let enc = run_message(unpadded, b"M");
        assert_eq!(enc.sink().data(), b"TQ");
    }

    #[test]
    fn base64_decode_is_whitespace_tolerant() {
        assert_eq!(base64_decode(b"TW Fu\n"), b"Man");
    }

    #[test]
    fn base32_foo() {
        assert_eq!(base32_encode(b"foo"), b"MZXW6===");
    }

    #[test]
    fn base16_round_trip() {
        assert_eq!(base16_encode(b"\x00\xff\x10"), b"00FF10");
        assert_eq!(base16_decode(b"00ff10"), b"\x00\xff\x10");
    }

    #[test]
    fn base64url_uses_url_symbols() {
        // 0xfb 0xff encodes to symbols 62/63 territory.
        let std = base64_encode(b"\xfb\xef\xbe");
        let url = base64url_encode(b"\xfb\xef\xbe");
        assert!(std.contains(&b'+') || std.contains(&b'/'));
        assert!(!url.contains(&b'+') && !url.contains(&b'/'));
        assert_eq!(base64url_decode(&url), b"\xfb\xef\xbe");
    }
}
