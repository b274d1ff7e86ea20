//! Precomputed T-tables and the cache-preload timing countermeasure.
//!
//! `TE` and `TD` combine the S-box lookup with the MixColumns (resp.
//! InvMixColumns) linear step. Both tables are generated by `const fn` and
//! live in read-only memory, so every thread observes fully populated
//! tables without any runtime initialization.
//!
//! Layout is the portable four-rotation scheme: slice `j` of each table is
//! the base word rotated right by `8·j` bits, `T[i + j*256] = rotr(t0(i), 8j)`.

use core::hint::black_box;

use crate::sbox::{f2, f3, f9, fb, fd, fe, SD, SE};

/// Encryption table: for `x = SE[i]`, the base word is
/// `f2(x)‖x‖x‖f3(x)` (big-endian byte order within the word).
pub(crate) static TE: [u32; 1024] = build_te();

/// Decryption table: for `x = SD[i]`, the base word is
/// `fe(x)‖f9(x)‖fd(x)‖fb(x)`.
pub(crate) static TD: [u32; 1024] = build_td();

const fn build_te() -> [u32; 1024] {
    let mut table = [0u32; 1024];
    let mut i = 0;
    while i < 256 {
        let x = SE[i];
        let base = ((f2(x) as u32) << 24)
            | ((x as u32) << 16)
            | ((x as u32) << 8)
            | (f3(x) as u32);
        let mut j = 0;
        while j < 4 {
            table[i + j * 256] = base.rotate_right(8 * j as u32);
            j += 1;
        }
        i += 1;
    }
    table
}

const fn build_td() -> [u32; 1024] {
    let mut table = [0u32; 1024];
    let mut i = 0;
    while i < 256 {
        let x = SD[i];
        let base = ((fe(x) as u32) << 24)
            | ((f9(x) as u32) << 16)
            | ((fd(x) as u32) << 8)
            | (fb(x) as u32);
        let mut j = 0;
        while j < 4 {
            table[i + j * 256] = base.rotate_right(8 * j as u32);
            j += 1;
        }
        i += 1;
    }
    table
}

// Stride must not exceed the smallest cache-line size in the field, or some
// lines would escape the preload.
const CACHE_LINE_BYTES: usize = 32;

/// Walks the whole table, touching one word per cache line, and returns a
/// mask that is always zero.
///
/// AND-accumulating through `black_box` keeps the reads observable, so the
/// optimizer can neither skip the walk nor conclude the result early. The
/// caller ORs the returned mask into its state words, delaying every
/// data-dependent table index until the table sits in L1.
#[inline]
pub(crate) fn preload_table(table: &[u32; 1024]) -> u32 {
    let mut u = 0u32;
    let mut i = 0;
    while i < table.len() {
        u = black_box(u & table[i]);
        i += CACHE_LINE_BYTES / 4;
    }
    black_box(u & table[255])
}

/// Same countermeasure for a byte-wide S-box, used before the final
/// decryption round.
#[inline]
pub(crate) fn preload_sbox(table: &[u8; 256]) -> u32 {
    let mut u = 0u32;
    let mut i = 0;
    while i < table.len() {
        u = black_box(u & table[i] as u32);
        i += CACHE_LINE_BYTES;
    }
    black_box(u & table[252] as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn te_embeds_forward_sbox() {
        // Byte 1 of every base entry is the S-box value itself; the final
        // encryption round reads it from there.
        for i in 0..256 {
            assert_eq!(((TE[i] >> 8) & 0xff) as u8, SE[i]);
        }
    }

    #[test]
    fn slices_are_rotations() {
        for i in 0..256 {
            for j in 1..4usize {
                assert_eq!(TE[i + j * 256], TE[i].rotate_right(8 * j as u32));
                assert_eq!(TD[i + j * 256], TD[i].rotate_right(8 * j as u32));
            }
        }
    }

    #[test]
    fn td_entry_is_inv_mix_of_unit_column() {
        // TD[SE[b]] must be InvMixColumns applied to the column (b,0,0,0).
        use crate::sbox::{f9, fb, fd, fe};
        for b in 0..=255u8 {
            let entry = TD[SE[b as usize] as usize];
            let expect = ((fe(b) as u32) << 24)
                | ((f9(b) as u32) << 16)
                | ((fd(b) as u32) << 8)
                | (fb(b) as u32);
            assert_eq!(entry, expect);
        }
    }

    #[test]
    fn preload_masks_are_zero() {
        assert_eq!(preload_table(&TE), 0);
        assert_eq!(preload_table(&TD), 0);
        assert_eq!(preload_sbox(&SD), 0);
    }
}
