//! Bulk block processing.
//!
//! One call transforms `length / 16` adjacent blocks with a single table
//! preload, composing XOR input/output and counter-mode chaining the same
//! way a caller would by looping the single-block engine. Anything the
//! flags enable here is bit-identical to that loop.

use bitflags::bitflags;

use crate::block::{Block, BLOCK_SIZE};
use crate::cipher::AesCipher;
use crate::key::Direction;
use crate::sbox::SD;
use crate::tables::{preload_sbox, preload_table, TD, TE};

bitflags! {
    /// Flags controlling [`AesCipher::process_blocks`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BulkFlags: u32 {
        /// XOR `xor_blocks` into the plaintext before the cipher instead
        /// of into the output after it.
        const XOR_INPUT = 1;
        /// Reuse the same input and output positions for every block
        /// (the caller manages chaining, as in CBC).
        const DONT_INCREMENT = 2;
        /// `in_blocks` holds a single 16-byte counter, incremented as a
        /// big-endian integer over its low eight bytes once per block.
        /// The post-call counter is left in the caller's buffer.
        const IN_IS_COUNTER = 4;
    }
}

impl AesCipher {
    /// Transforms as many whole blocks of `length` as fit.
    ///
    /// Returns the unprocessed remainder `length % 16`; if `length < 16`
    /// nothing is touched and `length` is returned unchanged.
    ///
    /// `in_blocks` is written only when [`BulkFlags::IN_IS_COUNTER`] is
    /// set. `length` is explicit because [`BulkFlags::DONT_INCREMENT`]
    /// and counter mode legitimately pass 16-byte buffers with a longer
    /// logical length.
    pub fn process_blocks(
        &self,
        in_blocks: &mut [u8],
        xor_blocks: Option<&[u8]>,
        out_blocks: &mut [u8],
        length: usize,
        flags: BulkFlags,
    ) -> usize {
        if length < BLOCK_SIZE {
            return length;
        }

        // Share one preload across the whole run; the per-block preload
        // inside the engine then finds the table already resident.
        match self.direction() {
            Direction::Encrypt => {
                preload_table(&TE);
            }
            Direction::Decrypt => {
                preload_table(&TD);
                preload_sbox(&SD);
            }
        }

        let in_increment = if flags.intersects(BulkFlags::DONT_INCREMENT | BulkFlags::IN_IS_COUNTER)
        {
            0
        } else {
            BLOCK_SIZE
        };
        let out_increment = if flags.contains(BulkFlags::DONT_INCREMENT) {
            0
        } else {
            BLOCK_SIZE
        };
        let xor_increment = if xor_blocks.is_some() { BLOCK_SIZE } else { 0 };

        let mut in_off = 0;
        let mut out_off = 0;
        let mut xor_off = 0;
        let mut remaining = length;

        while remaining >= BLOCK_SIZE {
            let mut input: Block = in_blocks[in_off..in_off + BLOCK_SIZE]
                .try_into()
                .expect("block slice");
            let xor = xor_blocks.map(|x| {
                let b: Block = x[xor_off..xor_off + BLOCK_SIZE].try_into().expect("block slice");
                b
            });

            let out: &mut Block = (&mut out_blocks[out_off..out_off + BLOCK_SIZE])
                .try_into()
                .expect("block slice");
            if flags.contains(BulkFlags::XOR_INPUT) {
                if let Some(x) = &xor {
                    crate::block::xor_in_place(&mut input, x);
                }
                self.process_and_xor_block(&input, None, out);
            } else {
                self.process_and_xor_block(&input, xor.as_ref(), out);
            }

            if flags.contains(BulkFlags::IN_IS_COUNTER) {
                increment_counter(
                    (&mut in_blocks[in_off..in_off + BLOCK_SIZE])
                        .try_into()
                        .expect("block slice"),
                );
            }

            in_off += in_increment;
            out_off += out_increment;
            xor_off += xor_increment;
            remaining -= BLOCK_SIZE;
        }
        remaining
    }
}

/// Increments the low eight bytes of `counter` as one big-endian integer.
#[inline]
fn increment_counter(counter: &mut Block) {
    let low = u64::from_be_bytes(counter[8..16].try_into().expect("counter tail"));
    counter[8..16].copy_from_slice(&low.wrapping_add(1).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Direction;
    use hex_literal::hex;
    use rand::RngCore;

    const KEY: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    fn cipher() -> AesCipher {
        AesCipher::new(&KEY, Direction::Encrypt).unwrap()
    }

    /// Reference composition: the same flag semantics, one block at a time
    /// through the single-block engine.
    fn reference(
        cipher: &AesCipher,
        in_blocks: &mut [u8],
        xor_blocks: Option<&[u8]>,
        out_blocks: &mut [u8],
        length: usize,
        flags: BulkFlags,
    ) {
        let blocks = length / BLOCK_SIZE;
        for i in 0..blocks {
            let in_off = if flags.intersects(BulkFlags::DONT_INCREMENT | BulkFlags::IN_IS_COUNTER) {
                0
            } else {
                i * BLOCK_SIZE
            };
            let out_off = if flags.contains(BulkFlags::DONT_INCREMENT) {
                0
            } else {
                i * BLOCK_SIZE
            };
            let mut input: Block = in_blocks[in_off..in_off + BLOCK_SIZE].try_into().unwrap();
            let xor: Option<Block> = xor_blocks
                .map(|x| x[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE].try_into().unwrap());
            let mut out = [0u8; BLOCK_SIZE];
            if flags.contains(BulkFlags::XOR_INPUT) {
                if let Some(x) = &xor {
                    crate::block::xor_in_place(&mut input, x);
                }
                cipher.process_and_xor_block(&input, None, &mut out);
            } else {
                cipher.process_and_xor_block(&input, xor.as_ref(), &mut out);
            }
            out_blocks[out_off..out_off + BLOCK_SIZE].copy_from_slice(&out);
            if flags.contains(BulkFlags::IN_IS_COUNTER) {
                increment_counter((&mut in_blocks[..BLOCK_SIZE]).try_into().unwrap());
            }
        }
    }

    #[test]
    fn short_input_is_returned_untouched() {
        let c = cipher();
        let mut input = [0u8; 15];
        let mut out = [0u8; 15];
        let residual = c.process_blocks(&mut input, None, &mut out, 15, BulkFlags::empty());
        assert_eq!(residual, 15);
        assert_eq!(out, [0u8; 15]);
    }

    #[test]
    fn residual_is_length_mod_block() {
        let c = cipher();
        let mut input = vec![0u8; 48];
        let mut out = vec![0u8; 48];
        let residual = c.process_blocks(&mut input, None, &mut out, 35, BulkFlags::empty());
        assert_eq!(residual, 3);
        // The tail past the last whole block is untouched.
        assert_eq!(&out[32..], &[0u8; 16][..]);
    }

    #[test]
    fn matches_single_block_loop_across_flags() {
        let mut rng = rand::thread_rng();
        let c = cipher();
        let flag_sets = [
            BulkFlags::empty(),
            BulkFlags::XOR_INPUT,
            BulkFlags::DONT_INCREMENT,
            BulkFlags::IN_IS_COUNTER,
            BulkFlags::IN_IS_COUNTER | BulkFlags::XOR_INPUT,
            BulkFlags::XOR_INPUT | BulkFlags::DONT_INCREMENT,
        ];
        for flags in flag_sets {
            for blocks in [1usize, 2, 5] {
                let length = blocks * BLOCK_SIZE;
                let mut input = vec![0u8; length.max(BLOCK_SIZE)];
                rng.fill_bytes(&mut input);
                let mut xor = vec![0u8; length];
                rng.fill_bytes(&mut xor);

                let mut input_bulk = input.clone();
                let mut input_ref = input.clone();
                let mut out_bulk = vec![0u8; length];
                let mut out_ref = vec![0u8; length];

                let residual =
                    c.process_blocks(&mut input_bulk, Some(&xor), &mut out_bulk, length, flags);
                reference(&c, &mut input_ref, Some(&xor), &mut out_ref, length, flags);

                assert_eq!(residual, 0, "flags {flags:?}");
                assert_eq!(out_bulk, out_ref, "flags {flags:?} blocks {blocks}");
                assert_eq!(input_bulk, input_ref, "counter state, flags {flags:?}");
            }
        }
    }

    #[test]
    fn counter_is_incremented_per_block() {
        let c = cipher();
        let mut counter = hex!("000102030405060708090a0b0c0d0eff");
        let mut out = [0u8; 48];
        c.process_blocks(&mut counter, None, &mut out, 48, BulkFlags::IN_IS_COUNTER);
        // Three blocks: 0x...0eff + 3 = 0x...0f02, carrying into byte 14.
        assert_eq!(counter, hex!("000102030405060708090a0b0c0d0f02"));
    }

    #[test]
    fn counter_mode_keystream_matches_manual_encryption() {
        let c = cipher();
        let counter0 = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");

        let mut counter = counter0;
        let mut keystream = [0u8; 32];
        c.process_blocks(&mut counter, None, &mut keystream, 32, BulkFlags::IN_IS_COUNTER);

        let mut expect0 = [0u8; 16];
        c.process_and_xor_block(&counter0, None, &mut expect0);
        let mut next = counter0;
        increment_counter(&mut next);
        let mut expect1 = [0u8; 16];
        c.process_and_xor_block(&next, None, &mut expect1);

        assert_eq!(&keystream[..16], &expect0);
        assert_eq!(&keystream[16..], &expect1);
    }

    #[test]
    fn counter_xor_output_is_ctr_mode() {
        // CTR: ct = E(counter) ^ pt, passing the plaintext as xor_blocks
        // without XOR_INPUT.
        let c = cipher();
        let mut pt = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut pt);
        let counter0 = hex!("00000000000000000000000000000001");

        let mut counter = counter0;
        let mut ct = [0u8; 32];
        c.process_blocks(&mut counter, Some(&pt), &mut ct, 32, BulkFlags::IN_IS_COUNTER);

        let mut counter2 = counter0;
        let mut keystream = [0u8; 32];
        c.process_blocks(&mut counter2, None, &mut keystream, 32, BulkFlags::IN_IS_COUNTER);
        for i in 0..32 {
            assert_eq!(ct[i], keystream[i] ^ pt[i]);
        }
    }

    #[test]
    fn increment_carries_through_low_eight_bytes() {
        let mut counter = hex!("00112233445566778899aabbccddeeff");
        increment_counter(&mut counter);
        assert_eq!(counter, hex!("00112233445566778899aabbccddef00"));

        let mut wrap = hex!("0011223344556677ffffffffffffffff");
        increment_counter(&mut wrap);
        assert_eq!(wrap, hex!("00112233445566770000000000000000"));
    }
}
