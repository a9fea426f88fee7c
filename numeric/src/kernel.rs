//! Addition, subtraction, multiplication and comparison kernels.
//!
//! Each additive kernel picks one of three loop shapes up front by
//! comparing operand lengths, so the hot carry loop never asks whether it
//! has run past the shorter operand: the common prefix runs limb against
//! limb, the tail runs against the shorter operand's sign word as a
//! constant digit, and two further sign-word iterations emit the overflow
//! limb and the guard words. Results are allocated one limb longer than
//! the longest operand; `normalize` shrinks them back when no overflow
//! materialized.

use std::cmp::Ordering;

use crate::consts;
use crate::pool::AllocError;
use crate::raw::RawInt;
use crate::value::BigInt;
use crate::word::{DWord, WORD_BITS, Word};

impl BigInt {
    /// Sum of `self` and `rhs` as a fresh value; operands untouched.
    pub fn add(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        let (a, b) = (self.raw(), rhs.raw());
        match a.len().cmp(&b.len()) {
            // addition commutes, so one mixed-length loop serves both
            Ordering::Greater => add_mixed(a, b),
            Ordering::Less => add_mixed(b, a),
            Ordering::Equal => add_equal(a, b),
        }
    }

    /// Difference `self - rhs` as a fresh value; operands untouched.
    pub fn sub(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        let (a, b) = (self.raw(), rhs.raw());
        match a.len().cmp(&b.len()) {
            Ordering::Greater => sub_longer(a, b),
            Ordering::Less => sub_shorter(a, b),
            Ordering::Equal => sub_equal(a, b),
        }
    }

    /// Additive inverse, computed as `0 - self`.
    pub fn neg(&self) -> Result<BigInt, AllocError> {
        consts::zero().sub(self)
    }

    /// Schoolbook product. Nonzero-limb skipping is a shortcut only; the
    /// result is identical without it. For non-negative operands the
    /// sign-extension tail is all zeros and costs nothing; for negative
    /// ones it is what makes the truncated product come out right.
    pub fn mul(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        let (a, b) = (self.raw(), rhs.raw());
        let rlen = a.len() + b.len() + 1;
        let raw = RawInt::alloc_zeroed(rlen)?;
        let total = rlen + 2;
        // SAFETY: exclusive until from_raw.
        unsafe {
            let r = raw.as_ptr();
            for i in 0..total {
                let m = a.limb_ext(i);
                if m == 0 {
                    continue;
                }
                for j in 0..total - i {
                    let d = b.limb_ext(j);
                    if d == 0 {
                        continue;
                    }
                    let q = m as DWord * d as DWord;
                    (*r).accumulate_with_carry(i + j, q as Word);
                    (*r).accumulate_with_carry(i + j + 1, (q >> WORD_BITS) as Word);
                }
            }
            (*r).normalize();
        }
        // SAFETY: initialized, refcount 1.
        Ok(unsafe { BigInt::from_raw(raw) })
    }

    /// Ordering of `self` against `rhs`, read off the sign and zero-ness
    /// of their difference. Inherits subtraction's cost and its
    /// allocation, deliberately.
    pub fn compare(&self, rhs: &BigInt) -> Result<Ordering, AllocError> {
        let diff = self.sub(rhs)?;
        Ok(if diff.raw().is_negative() {
            Ordering::Less
        } else if diff.is_zero() {
            Ordering::Equal
        } else {
            Ordering::Greater
        })
    }
}

#[inline(always)]
fn carry(q: DWord) -> Word {
    (q >> WORD_BITS) as Word & 1
}

/// `long + short` where `long.len() > short.len()`.
fn add_mixed(long: &RawInt, short: &RawInt) -> Result<BigInt, AllocError> {
    let rlen = long.len() + 1;
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: exclusive until from_raw; every buffer word is written.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (long.buf(), short.buf());
        let s0 = la[long.len()];
        let s1 = lb[short.len()];
        let mut cf: Word = 0;
        let mut i = 0;
        while i < short.len() {
            let q = la[i] as DWord + lb[i] as DWord + cf as DWord;
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < long.len() {
            let q = la[i] as DWord + s1 as DWord + cf as DWord;
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        // overflow limb plus both guards, all from the sign words
        while i < rlen + 2 {
            let q = s0 as DWord + s1 as DWord + cf as DWord;
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}

/// `a + b` where `a.len() == b.len()`.
fn add_equal(a: &RawInt, b: &RawInt) -> Result<BigInt, AllocError> {
    let rlen = a.len() + 1;
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: as in add_mixed.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (a.buf(), b.buf());
        let s0 = la[a.len()];
        let s1 = lb[b.len()];
        let mut cf: Word = 0;
        let mut i = 0;
        while i < a.len() {
            let q = la[i] as DWord + lb[i] as DWord + cf as DWord;
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < rlen + 2 {
            let q = s0 as DWord + s1 as DWord + cf as DWord;
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}

/// `a - b` where `a.len() > b.len()`.
fn sub_longer(a: &RawInt, b: &RawInt) -> Result<BigInt, AllocError> {
    let rlen = a.len() + 1;
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: as in add_mixed.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (a.buf(), b.buf());
        let s0 = la[a.len()];
        let s1 = lb[b.len()];
        let mut cf: Word = 0;
        let mut i = 0;
        while i < b.len() {
            let q = (la[i] as DWord)
                .wrapping_sub(lb[i] as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < a.len() {
            let q = (la[i] as DWord)
                .wrapping_sub(s1 as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < rlen + 2 {
            let q = (s0 as DWord)
                .wrapping_sub(s1 as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}

/// `a - b` where `a.len() < b.len()`.
fn sub_shorter(a: &RawInt, b: &RawInt) -> Result<BigInt, AllocError> {
    let rlen = b.len() + 1;
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: as in add_mixed.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (a.buf(), b.buf());
        let s0 = la[a.len()];
        let s1 = lb[b.len()];
        let mut cf: Word = 0;
        let mut i = 0;
        while i < a.len() {
            let q = (la[i] as DWord)
                .wrapping_sub(lb[i] as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < b.len() {
            let q = (s0 as DWord)
                .wrapping_sub(lb[i] as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < rlen + 2 {
            let q = (s0 as DWord)
                .wrapping_sub(s1 as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}

/// `a - b` where `a.len() == b.len()`.
fn sub_equal(a: &RawInt, b: &RawInt) -> Result<BigInt, AllocError> {
    let rlen = a.len() + 1;
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: as in add_mixed.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (a.buf(), b.buf());
        let s0 = la[a.len()];
        let s1 = lb[b.len()];
        let mut cf: Word = 0;
        let mut i = 0;
        while i < a.len() {
            let q = (la[i] as DWord)
                .wrapping_sub(lb[i] as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        while i < rlen + 2 {
            let q = (s0 as DWord)
                .wrapping_sub(s1 as DWord)
                .wrapping_sub(cf as DWord);
            r[i] = q as Word;
            cf = carry(q);
            i += 1;
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}
