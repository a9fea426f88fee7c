//! Arithmetic shift kernels.
//!
//! A shift amount splits into a whole-word offset and an in-word bit
//! offset. Word-aligned shifts relocate the limb array with a block copy;
//! otherwise every output limb is cut from a double-width window over two
//! adjacent source words, which pulls bits across limb boundaries without
//! a separate carry limb. The guard word supplies the bits past the
//! logical end.

use crate::consts;
use crate::pool::AllocError;
use crate::raw::RawInt;
use crate::value::BigInt;
use crate::word::{DWord, WORD_BITS, Word};

/// Round a bit count up to a whole number of words.
#[inline(always)]
fn round_up_bits(bits: usize) -> usize {
    bits + (bits.wrapping_neg() & (WORD_BITS - 1))
}

impl BigInt {
    /// `self << bit_count`. Grows to hold the new bit length plus guards.
    pub fn shl(&self, bit_count: usize) -> Result<BigInt, AllocError> {
        if bit_count == 0 {
            return Ok(self.clone());
        }
        let a = self.raw();
        let len = a.len();
        let rlen = round_up_bits(len * WORD_BITS + bit_count) / WORD_BITS;
        let offset = bit_count / WORD_BITS;
        let shift = bit_count & (WORD_BITS - 1);

        let raw = RawInt::alloc(rlen)?;
        // SAFETY: exclusive until from_raw; every buffer word is written.
        unsafe {
            let r = (*raw.as_ptr()).buf_mut();
            let s = a.buf();
            for w in r[..offset].iter_mut() {
                *w = 0;
            }
            if shift == 0 {
                // rlen == len + offset
                r[offset..offset + len].copy_from_slice(&s[..len]);
            } else {
                // rlen == len + offset + 1; the window at k == len reads
                // the guard word for the spill limb
                for k in 0..=len {
                    let lo = if k == 0 { 0 } else { s[k - 1] as DWord };
                    let hi = s[k] as DWord;
                    r[offset + k] =
                        (((hi << WORD_BITS | lo) << shift) >> WORD_BITS) as Word;
                }
            }
            let sw = a.sign_word();
            r[rlen] = sw;
            r[rlen + 1] = sw;
            (*raw.as_ptr()).normalize();
        }
        // SAFETY: initialized, refcount 1.
        Ok(unsafe { BigInt::from_raw(raw) })
    }

    /// `self >> bit_count`, arithmetic (sign-preserving within the limb
    /// window). A shift meeting or exceeding the total bit width returns
    /// the zero singleton.
    pub fn sar(&self, bit_count: usize) -> Result<BigInt, AllocError> {
        if bit_count == 0 {
            return Ok(self.clone());
        }
        let a = self.raw();
        let bits = a.len() * WORD_BITS;
        if bit_count >= bits {
            return Ok(consts::zero());
        }
        let rlen = round_up_bits(bits - bit_count) / WORD_BITS;
        let offset = bit_count / WORD_BITS;
        let shift = bit_count & (WORD_BITS - 1);

        let raw = RawInt::alloc(rlen)?;
        // SAFETY: as in shl; the window at k == rlen - 1 may read the
        // first guard word, never past it.
        unsafe {
            let r = (*raw.as_ptr()).buf_mut();
            let s = a.buf();
            if shift == 0 {
                r[..rlen].copy_from_slice(&s[offset..offset + rlen]);
            } else {
                for k in 0..rlen {
                    let lo = s[offset + k] as DWord;
                    let hi = s[offset + k + 1] as DWord;
                    r[k] = ((hi << WORD_BITS | lo) >> shift) as Word;
                }
            }
            let sw = a.sign_word();
            r[rlen] = sw;
            r[rlen + 1] = sw;
            (*raw.as_ptr()).normalize();
        }
        // SAFETY: initialized, refcount 1.
        Ok(unsafe { BigInt::from_raw(raw) })
    }
}
