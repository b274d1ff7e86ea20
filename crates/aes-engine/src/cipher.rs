//! Single-block AES encryption and decryption.
//!
//! The hot paths are branch-free in the data: every table index is an
//! 8-bit extract, and both tables are walked once (the cache preload)
//! before the first data-dependent lookup.

use crate::block::{load_be_u32, store_be_u32, Block, BLOCK_SIZE};
use crate::error::KeyError;
use crate::key::{Direction, RoundKeys};
use crate::sbox::SD;
use crate::tables::{preload_sbox, preload_table, TD, TE};

/// AES cipher instance for one key and direction.
pub struct AesCipher {
    keys: RoundKeys,
}

impl AesCipher {
    /// The block size in bytes.
    pub const BLOCK_SIZE: usize = BLOCK_SIZE;

    /// Expands `user_key` for `direction`.
    pub fn new(user_key: &[u8], direction: Direction) -> Result<Self, KeyError> {
        Ok(Self {
            keys: RoundKeys::new(user_key, direction)?,
        })
    }

    /// Wraps an already-expanded key schedule.
    pub fn from_round_keys(keys: RoundKeys) -> Self {
        Self { keys }
    }

    /// Direction this instance transforms in.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.keys.direction()
    }

    /// Number of rounds.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.keys.rounds()
    }

    /// Transforms one block: `out = AES(input) ⊕ (xor or 0)`.
    pub fn process_and_xor_block(
        &self,
        input: &Block,
        xor: Option<&Block>,
        out: &mut Block,
    ) {
        match self.keys.direction() {
            Direction::Encrypt => self.encrypt(input, xor, out),
            Direction::Decrypt => self.decrypt(input, xor, out),
        }
    }

    /// Transforms one block in place.
    pub fn process_block(&self, block: &mut Block) {
        let input = *block;
        self.process_and_xor_block(&input, None, block);
    }

    fn encrypt(&self, input: &Block, xor: Option<&Block>, out: &mut Block) {
        let rk = self.keys.words();
        let rounds = self.keys.rounds();

        let mut s0 = load_be_u32(input, 0) ^ rk[0];
        let mut s1 = load_be_u32(input, 4) ^ rk[1];
        let mut s2 = load_be_u32(input, 8) ^ rk[2];
        let mut s3 = load_be_u32(input, 12) ^ rk[3];
        let mut t0 = rk[4];
        let mut t1 = rk[5];
        let mut t2 = rk[6];
        let mut t3 = rk[7];

        // Timing countermeasure: pull the whole table into L1 before the
        // first data-dependent index. The mask is always zero.
        let u = preload_table(&TE);
        s0 |= u;
        s1 |= u;
        s2 |= u;
        s3 |= u;

        t0 ^= enc_quarter(s0, s1, s2, s3);
        t1 ^= enc_quarter(s1, s2, s3, s0);
        t2 ^= enc_quarter(s2, s3, s0, s1);
        t3 ^= enc_quarter(s3, s0, s1, s2);

        // Nr - 2 full rounds, two per iteration.
        let mut rk_off = 8;
        for _ in 0..rounds / 2 - 1 {
            s0 = rk[rk_off] ^ enc_quarter(t0, t1, t2, t3);
            s1 = rk[rk_off + 1] ^ enc_quarter(t1, t2, t3, t0);
            s2 = rk[rk_off + 2] ^ enc_quarter(t2, t3, t0, t1);
            s3 = rk[rk_off + 3] ^ enc_quarter(t3, t0, t1, t2);

            t0 = rk[rk_off + 4] ^ enc_quarter(s0, s1, s2, s3);
            t1 = rk[rk_off + 5] ^ enc_quarter(s1, s2, s3, s0);
            t2 = rk[rk_off + 6] ^ enc_quarter(s2, s3, s0, s1);
            t3 = rk[rk_off + 7] ^ enc_quarter(s3, s0, s1, s2);

            rk_off += 8;
        }

        // Final round: no MixColumns; the S-box byte is read out of the
        // table entry itself.
        let x0 = enc_final(t0, t1, t2, t3) ^ rk[rk_off];
        let x1 = enc_final(t1, t2, t3, t0) ^ rk[rk_off + 1];
        let x2 = enc_final(t2, t3, t0, t1) ^ rk[rk_off + 2];
        let x3 = enc_final(t3, t0, t1, t2) ^ rk[rk_off + 3];

        store_out(out, [x0, x1, x2, x3], xor);
    }

    fn decrypt(&self, input: &Block, xor: Option<&Block>, out: &mut Block) {
        let rk = self.keys.words();
        let rounds = self.keys.rounds();

        let mut s0 = load_be_u32(input, 0) ^ rk[0];
        let mut s1 = load_be_u32(input, 4) ^ rk[1];
        let mut s2 = load_be_u32(input, 8) ^ rk[2];
        let mut s3 = load_be_u32(input, 12) ^ rk[3];
        let mut t0 = rk[4];
        let mut t1 = rk[5];
        let mut t2 = rk[6];
        let mut t3 = rk[7];

        let u = preload_table(&TD);
        s0 |= u;
        s1 |= u;
        s2 |= u;
        s3 |= u;

        t0 ^= dec_quarter(s0, s3, s2, s1);
        t1 ^= dec_quarter(s1, s0, s3, s2);
        t2 ^= dec_quarter(s2, s1, s0, s3);
        t3 ^= dec_quarter(s3, s2, s1, s0);

        let mut rk_off = 8;
        for _ in 0..rounds / 2 - 1 {
            s0 = rk[rk_off] ^ dec_quarter(t0, t3, t2, t1);
            s1 = rk[rk_off + 1] ^ dec_quarter(t1, t0, t3, t2);
            s2 = rk[rk_off + 2] ^ dec_quarter(t2, t1, t0, t3);
            s3 = rk[rk_off + 3] ^ dec_quarter(t3, t2, t1, t0);

            t0 = rk[rk_off + 4] ^ dec_quarter(s0, s3, s2, s1);
            t1 = rk[rk_off + 5] ^ dec_quarter(s1, s0, s3, s2);
            t2 = rk[rk_off + 6] ^ dec_quarter(s2, s1, s0, s3);
            t3 = rk[rk_off + 7] ^ dec_quarter(s3, s2, s1, s0);

            rk_off += 8;
        }

        // The final round reads the byte-wide inverse S-box, so it gets its
        // own preload.
        let u = preload_sbox(&SD);
        t0 |= u;
        t1 |= u;
        t2 |= u;
        t3 |= u;

        let x0 = dec_final(t0, t3, t2, t1) ^ rk[rk_off];
        let x1 = dec_final(t1, t0, t3, t2) ^ rk[rk_off + 1];
        let x2 = dec_final(t2, t1, t0, t3) ^ rk[rk_off + 2];
        let x3 = dec_final(t3, t2, t1, t0) ^ rk[rk_off + 3];

        store_out(out, [x0, x1, x2, x3], xor);
    }
}

#[inline(always)]
fn te(slice: usize, x: u32) -> u32 {
    TE[slice * 256 + x as usize]
}

#[inline(always)]
fn td(slice: usize, x: u32) -> u32 {
    TD[slice * 256 + x as usize]
}

/// One column of an encryption round: `a` contributes its top byte through
/// slice 0, `d` its bottom byte through slice 3.
#[inline(always)]
fn enc_quarter(a: u32, b: u32, c: u32, d: u32) -> u32 {
    te(0, a >> 24) ^ te(1, (b >> 16) & 0xff) ^ te(2, (c >> 8) & 0xff) ^ te(3, d & 0xff)
}

#[inline(always)]
fn dec_quarter(a: u32, b: u32, c: u32, d: u32) -> u32 {
    td(0, a >> 24) ^ td(1, (b >> 16) & 0xff) ^ td(2, (c >> 8) & 0xff) ^ td(3, d & 0xff)
}

/// One column of the final encryption round, substituting through the
/// S-box byte embedded in each `TE` entry.
#[inline(always)]
fn enc_final(a: u32, b: u32, c: u32, d: u32) -> u32 {
    let sub = |x: u32| (TE[x as usize] >> 8) & 0xff;
    (sub(a >> 24) << 24) | (sub((b >> 16) & 0xff) << 16) | (sub((c >> 8) & 0xff) << 8) | sub(d & 0xff)
}

#[inline(always)]
fn dec_final(a: u32, b: u32, c: u32, d: u32) -> u32 {
    let sub = |x: u32| SD[x as usize] as u32;
    (sub(a >> 24) << 24) | (sub((b >> 16) & 0xff) << 16) | (sub((c >> 8) & 0xff) << 8) | sub(d & 0xff)
}

#[inline]
fn store_out(out: &mut Block, words: [u32; 4], xor: Option<&Block>) {
    match xor {
        Some(xor) => {
            for (i, w) in words.into_iter().enumerate() {
                store_be_u32(out, i * 4, w ^ load_be_u32(xor, i * 4));
            }
        }
        None => {
            for (i, w) in words.into_iter().enumerate() {
                store_be_u32(out, i * 4, w);
            }
        }
    }
}
