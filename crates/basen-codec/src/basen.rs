//! Streaming Base-N encoder and decoder.
//!
//! Both sides work on an LCM-sized group so that block boundaries always
//! coincide with input-byte boundaries: the encoder emits
//! `lcm(8,b)/b` symbols per `lcm(8,b)/8` input bytes, the decoder the
//! reverse. The cursor pair `(byte_pos, bit_pos)` carries partial symbols
//! across calls, which is what makes arbitrarily chunked input produce
//! identical output.

use crate::error::ConfigError;
use crate::filter::{drain, unconsumed, Filter, FsmState};

const SITE_BLOCK: u8 = 1;
const SITE_FINAL: u8 = 2;

/// Configuration for [`BaseNEncoder`].
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Output symbol table; must hold at least `2^bits_per_char` entries.
    pub alphabet: Vec<u8>,
    /// Bits per output symbol, 1 through 7.
    pub bits_per_char: usize,
    /// Padding byte appended to align the final group, if any.
    pub padding: Option<u8>,
    /// Set false to suppress padding even when a padding byte is given.
    pub pad: bool,
}

impl EncoderConfig {
    /// Starts a configuration with no padding.
    pub fn new(alphabet: impl Into<Vec<u8>>, bits_per_char: usize) -> Self {
        Self {
            alphabet: alphabet.into(),
            bits_per_char,
            padding: None,
            pad: true,
        }
    }

    /// Pads the final group with `padding`.
    pub fn with_padding(mut self, padding: u8) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Suppresses padding.
    pub fn without_padding(mut self) -> Self {
        self.pad = false;
        self
    }

    fn effective_padding(&self) -> Option<u8> {
        if self.pad {
            self.padding
        } else {
            None
        }
    }
}

/// Configuration for [`BaseNDecoder`].
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    /// Byte-to-value table; `None` entries are skipped in the input.
    pub lookup: Box<[Option<u8>; 256]>,
    /// Bits per input symbol, 1 through 7.
    pub bits_per_char: usize,
}

impl DecoderConfig {
    /// Builds a configuration from a lookup table.
    pub fn new(lookup: Box<[Option<u8>; 256]>, bits_per_char: usize) -> Self {
        Self {
            lookup,
            bits_per_char,
        }
    }
}

/// Builds a decoding lookup table for `alphabet`.
///
/// Every byte not in the alphabet maps to `None` and is skipped by the
/// decoder, which is what makes decoding whitespace-tolerant. With
/// `case_insensitive`, alphabetic symbols map from both cases. Assigning
/// two symbols to the same slot is a programmer error.
pub fn decoding_lookup(alphabet: &[u8], case_insensitive: bool) -> Box<[Option<u8>; 256]> {
    let mut lookup = Box::new([None; 256]);
    for (value, &symbol) in alphabet.iter().enumerate() {
        let value = value as u8;
        if case_insensitive && symbol.is_ascii_alphabetic() {
            assign(&mut lookup, symbol.to_ascii_uppercase(), value);
            assign(&mut lookup, symbol.to_ascii_lowercase(), value);
        } else {
            assign(&mut lookup, symbol, value);
        }
    }
    lookup
}

fn assign(lookup: &mut [Option<u8>; 256], symbol: u8, value: u8) {
    debug_assert!(
        lookup[symbol as usize].is_none(),
        "symbol {symbol:#04x} assigned twice in decoding alphabet"
    );
    lookup[symbol as usize] = Some(value);
}

fn validate_bits(filter: &'static str, bits_per_char: usize) -> Result<(), ConfigError> {
    if !(1..=7).contains(&bits_per_char) {
        return Err(ConfigError::InvalidArgument {
            filter,
            parameter: "bits_per_char",
            message: format!("must be between 1 and 7 inclusive, got {bits_per_char}"),
        });
    }
    Ok(())
}

/// Streaming bit-packer from bytes to alphabet symbols.
pub struct BaseNEncoder<S> {
    sink: S,
    alphabet: Box<[u8]>,
    bits_per_char: usize,
    padding: Option<u8>,
    output_block_size: usize,
    out_buf: Box<[u8]>,
    byte_pos: usize,
    bit_pos: usize,
    fsm: FsmState,
    final_len: usize,
    final_end: u32,
}

impl<S: Filter> BaseNEncoder<S> {
    /// Configures an encoder writing to `sink`.
    pub fn new(config: EncoderConfig, sink: S) -> Result<Self, ConfigError> {
        validate_bits("BaseNEncoder", config.bits_per_char)?;
        if config.alphabet.len() < 1 << config.bits_per_char {
            return Err(ConfigError::InvalidArgument {
                filter: "BaseNEncoder",
                parameter: "alphabet",
                message: format!(
                    "needs {} symbols for {} bits per character, got {}",
                    1 << config.bits_per_char,
                    config.bits_per_char,
                    config.alphabet.len()
                ),
            });
        }

        // Smallest whole number of symbols covering whole input bytes.
        let mut bits = 8;
        while bits % config.bits_per_char != 0 {
            bits += 8;
        }
        let output_block_size = bits / config.bits_per_char;

        let padding = config.effective_padding();
        Ok(Self {
            sink,
            alphabet: config.alphabet.into_boxed_slice(),
            bits_per_char: config.bits_per_char,
            padding,
            output_block_size,
            out_buf: vec![0u8; output_block_size].into_boxed_slice(),
            byte_pos: 0,
            bit_pos: 0,
            fsm: FsmState::default(),
            final_len: 0,
            final_end: 0,
        })
    }

    /// Symbols emitted per full group.
    pub fn output_block_size(&self) -> usize {
        self.output_block_size
    }

    /// Shared reference to the downstream.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the encoder, returning the downstream.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: Filter> Filter for BaseNEncoder<S> {
    fn put2(&mut self, input: &[u8], message_end: u32, blocking: bool) -> usize {
        match self.fsm.site {
            SITE_BLOCK => {
                if !drain(
                    &mut self.sink,
                    &self.out_buf,
                    &mut self.fsm.emit_offset,
                    0,
                    blocking,
                ) {
                    return unconsumed(input.len(), self.fsm.input_position);
                }
                self.fsm.site = 0;
                self.fsm.emit_offset = 0;
                self.byte_pos = 0;
                self.bit_pos = 0;
            }
            SITE_FINAL => {
                let final_len = self.final_len;
                if !drain(
                    &mut self.sink,
                    &self.out_buf[..final_len],
                    &mut self.fsm.emit_offset,
                    self.final_end,
                    blocking,
                ) {
                    return 1;
                }
                // The message end was already delivered; this call only
                // completed it.
                self.byte_pos = 0;
                self.bit_pos = 0;
                self.fsm.clear();
                return 0;
            }
            _ => {}
        }

        let mut pos = self.fsm.input_position;
        while pos < input.len() {
            if self.byte_pos == 0 {
                self.out_buf.fill(0);
            }

            let mut b = input[pos] as u32;
            pos += 1;
            let mut bits_left_in_source = 8;
            loop {
                debug_assert!(self.bit_pos < self.bits_per_char);
                let bits_left_in_target = self.bits_per_char - self.bit_pos;
                self.out_buf[self.byte_pos] |= (b >> (8 - bits_left_in_target)) as u8;
                if bits_left_in_source >= bits_left_in_target {
                    self.bit_pos = 0;
                    self.byte_pos += 1;
                    bits_left_in_source -= bits_left_in_target;
                    if bits_left_in_source == 0 {
                        break;
                    }
                    b = (b << bits_left_in_target) & 0xff;
                } else {
                    self.bit_pos += bits_left_in_source;
                    break;
                }
            }

            debug_assert!(self.byte_pos <= self.output_block_size);
            if self.byte_pos == self.output_block_size {
                for value in self.out_buf.iter_mut() {
                    debug_assert!((*value as usize) < (1 << self.bits_per_char));
                    *value = self.alphabet[*value as usize];
                }
                self.fsm.input_position = pos;
                if !drain(
                    &mut self.sink,
                    &self.out_buf,
                    &mut self.fsm.emit_offset,
                    0,
                    blocking,
                ) {
                    self.fsm.site = SITE_BLOCK;
                    return unconsumed(input.len(), pos);
                }
                self.fsm.emit_offset = 0;
                self.byte_pos = 0;
                self.bit_pos = 0;
            }
        }

        if message_end > 0 {
            if self.bit_pos > 0 {
                self.byte_pos += 1;
            }
            for value in self.out_buf[..self.byte_pos].iter_mut() {
                *value = self.alphabet[*value as usize];
            }
            if let Some(padding) = self.padding {
                if self.byte_pos > 0 {
                    self.out_buf[self.byte_pos..].fill(padding);
                    self.byte_pos = self.output_block_size;
                }
            }
            self.final_len = self.byte_pos;
            self.final_end = message_end;
            self.fsm.input_position = pos;
            let final_len = self.final_len;
            if !drain(
                &mut self.sink,
                &self.out_buf[..final_len],
                &mut self.fsm.emit_offset,
                message_end,
                blocking,
            ) {
                self.fsm.site = SITE_FINAL;
                return 1;
            }
            self.byte_pos = 0;
            self.bit_pos = 0;
        }
        self.fsm.clear();
        0
    }
}

/// Streaming inverse of [`BaseNEncoder`].
pub struct BaseNDecoder<S> {
    sink: S,
    lookup: Box<[Option<u8>; 256]>,
    bits_per_char: usize,
    output_block_size: usize,
    out_buf: Box<[u8]>,
    byte_pos: usize,
    bit_pos: usize,
    fsm: FsmState,
    final_len: usize,
    final_end: u32,
}

impl<S: Filter> BaseNDecoder<S> {
    /// Configures a decoder writing to `sink`.
    pub fn new(config: DecoderConfig, sink: S) -> Result<Self, ConfigError> {
        validate_bits("BaseNDecoder", config.bits_per_char)?;

        // Smallest whole number of input symbols covering whole output bytes.
        let mut bits = config.bits_per_char;
        while bits % 8 != 0 {
            bits += config.bits_per_char;
        }
        let output_block_size = bits / 8;

        Ok(Self {
            sink,
            lookup: config.lookup,
            bits_per_char: config.bits_per_char,
            output_block_size,
            out_buf: vec![0u8; output_block_size].into_boxed_slice(),
            byte_pos: 0,
            bit_pos: 0,
            fsm: FsmState::default(),
            final_len: 0,
            final_end: 0,
        })
    }

    /// Bytes emitted per full group.
    pub fn output_block_size(&self) -> usize {
        self.output_block_size
    }

    /// Shared reference to the downstream.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the decoder, returning the downstream.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: Filter> Filter for BaseNDecoder<S> {
    fn put2(&mut self, input: &[u8], message_end: u32, blocking: bool) -> usize {
        match self.fsm.site {
            SITE_BLOCK => {
                if !drain(
                    &mut self.sink,
                    &self.out_buf,
                    &mut self.fsm.emit_offset,
                    0,
                    blocking,
                ) {
                    return unconsumed(input.len(), self.fsm.input_position);
                }
                self.fsm.site = 0;
                self.fsm.emit_offset = 0;
                self.byte_pos = 0;
                self.bit_pos = 0;
            }
            SITE_FINAL => {
                let final_len = self.final_len;
                if !drain(
                    &mut self.sink,
                    &self.out_buf[..final_len],
                    &mut self.fsm.emit_offset,
                    self.final_end,
                    blocking,
                ) {
                    return 1;
                }
                self.byte_pos = 0;
                self.bit_pos = 0;
                self.fsm.clear();
                return 0;
            }
            _ => {}
        }

        let mut pos = self.fsm.input_position;
        while pos < input.len() {
            let value = match self.lookup[input[pos] as usize] {
                Some(value) => value as u32,
                // Unmapped bytes are ignored entirely.
                None => {
                    pos += 1;
                    continue;
                }
            };
            pos += 1;

            if self.byte_pos == 0 && self.bit_pos == 0 {
                self.out_buf.fill(0);
            }

            let new_bit_pos = self.bit_pos + self.bits_per_char;
            if new_bit_pos <= 8 {
                self.out_buf[self.byte_pos] |= (value << (8 - new_bit_pos)) as u8;
            } else {
                self.out_buf[self.byte_pos] |= (value >> (new_bit_pos - 8)) as u8;
                self.out_buf[self.byte_pos + 1] |= (value << (16 - new_bit_pos)) as u8;
            }
            self.bit_pos = new_bit_pos;
            while self.bit_pos >= 8 {
                self.bit_pos -= 8;
                self.byte_pos += 1;
            }

            if self.byte_pos == self.output_block_size {
                self.fsm.input_position = pos;
                if !drain(
                    &mut self.sink,
                    &self.out_buf,
                    &mut self.fsm.emit_offset,
                    0,
                    blocking,
                ) {
                    self.fsm.site = SITE_BLOCK;
                    return unconsumed(input.len(), pos);
                }
                self.fsm.emit_offset = 0;
                self.byte_pos = 0;
                self.bit_pos = 0;
            }
        }

        if message_end > 0 {
            // Whole bytes only; trailing bits that do not fill a byte are
            // discarded.
            self.final_len = self.byte_pos;
            self.final_end = message_end;
            self.fsm.input_position = pos;
            let final_len = self.final_len;
            if !drain(
                &mut self.sink,
                &self.out_buf[..final_len],
                &mut self.fsm.emit_offset,
                message_end,
                blocking,
            ) {
                self.fsm.site = SITE_FINAL;
                return 1;
            }
            self.byte_pos = 0;
            self.bit_pos = 0;
        }
        self.fsm.clear();
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::VecSink;

    fn encoder(bits: usize, alphabet: &[u8], padding: Option<u8>) -> BaseNEncoder<VecSink> {
        let mut config = EncoderConfig::new(alphabet, bits);
        if let Some(p) = padding {
            config = config.with_padding(p);
        }
        BaseNEncoder::new(config, VecSink::new()).unwrap()
    }

    fn parameter_of<T>(result: Result<T, ConfigError>) -> &'static str {
        match result {
            Err(ConfigError::InvalidArgument { parameter, .. }) => parameter,
            Ok(_) => panic!("configuration was accepted"),
        }
    }

    #[test]
    fn rejects_out_of_range_bits() {
        for bits in [0usize, 8, 9] {
            let result =
                BaseNEncoder::new(EncoderConfig::new(vec![b'a'; 256], bits), VecSink::new());
            assert_eq!(parameter_of(result), "bits_per_char");
            let result = BaseNDecoder::new(
                DecoderConfig::new(Box::new([None; 256]), bits),
                VecSink::new(),
            );
            assert_eq!(parameter_of(result), "bits_per_char");
        }
    }

    #[test]
    fn rejects_short_alphabet() {
        let result = BaseNEncoder::new(EncoderConfig::new(vec![b'a'; 31], 5), VecSink::new());
        assert_eq!(parameter_of(result), "alphabet");
    }

    #[test]
    fn output_block_sizes_follow_lcm() {
        // lcm(8,b)/b symbols out, lcm(8,b)/8 bytes in.
        let expect = [(1, 8, 1), (2, 4, 1), (3, 8, 3), (4, 2, 1), (5, 8, 5), (6, 4, 3), (7, 8, 7)];
        for (bits, symbols, bytes) in expect {
            let enc = encoder(bits, &vec![b'a'; 1 << bits], None);
            assert_eq!(enc.output_block_size(), symbols, "bits {bits}");
            let dec = BaseNDecoder::new(
                DecoderConfig::new(Box::new([None; 256]), bits),
                VecSink::new(),
            )
            .unwrap();
            assert_eq!(dec.output_block_size(), bytes, "bits {bits}");
        }
    }

    #[test]
    fn pad_flag_overrides_padding_byte() {
        let config = EncoderConfig::new(&b"0123456789ABCDEF"[..], 4)
            .with_padding(b'=')
            .without_padding();
        let mut enc = BaseNEncoder::new(config, VecSink::new()).unwrap();
        enc.put2(b"\x0f", 1, true);
        assert_eq!(enc.sink().data(), b"0F");
    }

    #[test]
    fn duplicate_free_lookup_roundtrips_all_bases() {
        for bits in 1..=7usize {
            let base = 1usize << bits;
            let alphabet: Vec<u8> = (0..base as u8).map(|i| b'\x21' + i).collect();
            let lookup = decoding_lookup(&alphabet, false);
            for (i, &symbol) in alphabet.iter().enumerate() {
                assert_eq!(lookup[symbol as usize], Some(i as u8));
            }
            assert_eq!(lookup.iter().filter(|v| v.is_some()).count(), base);
        }
    }

    #[test]
    fn case_insensitive_lookup_maps_both_cases() {
        let lookup = decoding_lookup(b"0123456789ABCDEF", true);
        assert_eq!(lookup[b'a' as usize], Some(10));
        assert_eq!(lookup[b'A' as usize], Some(10));
        assert_eq!(lookup[b'f' as usize], Some(15));
        assert_eq!(lookup[b'0' as usize], Some(0));
        assert_eq!(lookup[b'g' as usize], None);
    }
}
