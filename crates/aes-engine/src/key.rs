//! AES key schedule.

use zeroize::Zeroize;

use crate::block::load_be_u32;
use crate::error::KeyError;
use crate::sbox::SE;
use crate::tables::TD;

/// Maximum number of round-key words (AES-256: 4·(14+1)).
const MAX_WORDS: usize = 60;

const RCON: [u32; 10] = [
    0x0100_0000,
    0x0200_0000,
    0x0400_0000,
    0x0800_0000,
    0x1000_0000,
    0x2000_0000,
    0x4000_0000,
    0x8000_0000,
    0x1b00_0000,
    0x3600_0000,
];

/// Whether a key schedule drives encryption or decryption.
///
/// Decryption stores the inverted schedule: round keys in reverse order
/// with InvMixColumns folded into the interior rounds, so the inner loop
/// is the same shape in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Forward transformation.
    Encrypt,
    /// Inverse transformation.
    Decrypt,
}

/// Expanded round keys for one key and direction.
///
/// Words are held in the FIPS-197 big-endian domain; byte boundaries are
/// crossed only through big-endian loads and stores. The words are wiped
/// on drop.
#[derive(Clone)]
pub struct RoundKeys {
    words: [u32; MAX_WORDS],
    rounds: usize,
    direction: Direction,
}

impl RoundKeys {
    /// Expands a 16/24/32-byte user key.
    ///
    /// Any other length fails with [`KeyError::InvalidKeyLength`].
    pub fn new(user_key: &[u8], direction: Direction) -> Result<Self, KeyError> {
        let nk = match user_key.len() {
            16 | 24 | 32 => user_key.len() / 4,
            length => return Err(KeyError::InvalidKeyLength { length }),
        };
        let rounds = nk + 6;
        let total = 4 * (rounds + 1);

        let mut w = [0u32; MAX_WORDS];
        for i in 0..nk {
            w[i] = load_be_u32(user_key, i * 4);
        }

        let mut rc = 0;
        let mut base = 0;
        loop {
            let temp = w[base + nk - 1];
            w[base + nk] = w[base] ^ sub_word(rot_word(temp)) ^ RCON[rc];
            rc += 1;
            w[base + nk + 1] = w[base + 1] ^ w[base + nk];
            w[base + nk + 2] = w[base + 2] ^ w[base + nk + 1];
            w[base + nk + 3] = w[base + 3] ^ w[base + nk + 2];

            if base + nk + 4 == total {
                break;
            }

            match nk {
                6 => {
                    w[base + 10] = w[base + 4] ^ w[base + 9];
                    w[base + 11] = w[base + 5] ^ w[base + 10];
                }
                8 => {
                    w[base + 12] = w[base + 4] ^ sub_word(w[base + 11]);
                    w[base + 13] = w[base + 5] ^ w[base + 12];
                    w[base + 14] = w[base + 6] ^ w[base + 13];
                    w[base + 15] = w[base + 7] ^ w[base + 14];
                }
                _ => {}
            }
            base += nk;
        }

        let mut keys = Self {
            words: w,
            rounds,
            direction,
        };
        if direction == Direction::Decrypt {
            keys.invert_schedule();
        }
        Ok(keys)
    }

    /// Number of rounds `Nr` (10, 12, or 14).
    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Direction this schedule was expanded for.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub(crate) fn words(&self) -> &[u32] {
        &self.words[..4 * (self.rounds + 1)]
    }

    /// Reverses the round keys four-at-a-time, then applies InvMixColumns
    /// to every interior round via the decryption table.
    fn invert_schedule(&mut self) {
        let w = &mut self.words;
        let (mut i, mut j) = (0, 4 * self.rounds);
        while i < j {
            for k in 0..4 {
                w.swap(i + k, j + k);
            }
            i += 4;
            j -= 4;
        }
        for round in 1..self.rounds {
            for k in 0..4 {
                let idx = 4 * round + k;
                w[idx] = inv_mix_word(w[idx]);
            }
        }
    }
}

impl Drop for RoundKeys {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}

#[inline]
fn rot_word(word: u32) -> u32 {
    word.rotate_left(8)
}

#[inline]
fn sub_word(word: u32) -> u32 {
    let b0 = SE[(word >> 24) as usize] as u32;
    let b1 = SE[((word >> 16) & 0xff) as usize] as u32;
    let b2 = SE[((word >> 8) & 0xff) as usize] as u32;
    let b3 = SE[(word & 0xff) as usize] as u32;
    (b0 << 24) | (b1 << 16) | (b2 << 8) | b3
}

/// InvMixColumns of one round-key word, computed as four `TD ∘ SE`
/// lookups (the S-box cancels the one folded into `TD`).
#[inline]
fn inv_mix_word(w: u32) -> u32 {
    TD[SE[(w >> 24) as usize] as usize]
        ^ TD[256 + SE[((w >> 16) & 0xff) as usize] as usize]
        ^ TD[512 + SE[((w >> 8) & 0xff) as usize] as usize]
        ^ TD[768 + SE[(w & 0xff) as usize] as usize]
}
