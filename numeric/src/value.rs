//! Public handles over the raw representation.
//!
//! [`BigInt`] is the shared, immutable value: cloning bumps the refcount,
//! dropping decrements it, and kernels never touch their operands. The
//! one sanctioned exception is [`BigIntMut`], a uniquely owned handle that
//! may flip bits in place; the type cannot be cloned, so exclusivity is
//! enforced by construction rather than by a runtime check.

use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::consts;
use crate::pool::AllocError;
use crate::raw::RawInt;
use crate::word::{WORD_BITS, Word};

/// A reference-counted, immutable, variable-length two's-complement
/// integer. Safe to share across threads for concurrent reads.
pub struct BigInt {
    raw: NonNull<RawInt>,
}

// SAFETY: the magnitude is immutable after construction and the refcount
// is atomic.
unsafe impl Send for BigInt {}
// SAFETY: see above.
unsafe impl Sync for BigInt {}

impl BigInt {
    /// Wrap a raw instance, taking over its reference.
    ///
    /// # Safety
    ///
    /// `raw` must be live, fully initialized, and the caller must hand
    /// over exactly one reference.
    #[inline(always)]
    pub(crate) unsafe fn from_raw(raw: NonNull<RawInt>) -> Self {
        Self { raw }
    }

    #[inline(always)]
    pub(crate) fn raw(&self) -> &RawInt {
        // SAFETY: we hold a reference, so the instance is live.
        unsafe { self.raw.as_ref() }
    }

    /// Construct from a native unsigned integer. Small frequently used
    /// values come out of the constant cache without allocating.
    pub fn from_u64(v: u64) -> Result<BigInt, AllocError> {
        match consts::small_u64(v) {
            Some(cached) => Ok(cached),
            None => Self::encode_u64(v),
        }
    }

    /// Construct from a native signed integer, sign-extended.
    pub fn from_i64(v: i64) -> Result<BigInt, AllocError> {
        match consts::small_i64(v) {
            Some(cached) => Ok(cached),
            None => Self::encode_i64(v),
        }
    }

    /// Encode without consulting the cache; also used to seed it.
    pub(crate) fn encode_u64(v: u64) -> Result<BigInt, AllocError> {
        Self::encode(v, 0)
    }

    pub(crate) fn encode_i64(v: i64) -> Result<BigInt, AllocError> {
        let sign = if v < 0 { Word::MAX } else { 0 };
        Self::encode(v as u64, sign)
    }

    fn encode(mut v: u64, sign: Word) -> Result<BigInt, AllocError> {
        let len = 64 / WORD_BITS;
        let raw = RawInt::alloc(len)?;
        // SAFETY: exclusive until from_raw; all len + 2 words written.
        unsafe {
            let b = (*raw.as_ptr()).buf_mut();
            for w in b[..len].iter_mut() {
                *w = v as Word;
                v = (v >> (WORD_BITS - 1)) >> 1;
            }
            b[len] = sign;
            b[len + 1] = sign;
            (*raw.as_ptr()).normalize();
        }
        // SAFETY: initialized above, refcount 1.
        Ok(unsafe { BigInt::from_raw(raw) })
    }

    /// The low 64 bits of the value, sign bits filling past the end.
    pub fn to_u64(&self) -> u64 {
        let r = self.raw();
        let mut v = 0u64;
        for i in (0..64 / WORD_BITS).rev() {
            v = (v << (WORD_BITS - 1)) << 1;
            v |= r.limb_ext(i) as u64;
        }
        v
    }

    /// The low 64 bits reinterpreted as a native signed integer.
    pub fn to_i64(&self) -> i64 {
        self.to_u64() as i64
    }

    /// Count of significant limbs, always >= 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw().len()
    }

    /// Magnitude limbs, little-endian by word, without the guards.
    #[inline]
    pub fn limbs(&self) -> &[Word] {
        self.raw().limbs()
    }

    /// The two guard words: the value's sign extension.
    #[inline]
    pub fn guards(&self) -> [Word; 2] {
        let b = self.raw().buf();
        [b[self.len()], b[self.len() + 1]]
    }

    /// The most significant limb.
    #[inline]
    pub fn high_word(&self) -> Word {
        self.raw().high_word()
    }

    pub fn is_zero(&self) -> bool {
        self.raw().is_zero()
    }

    pub fn is_nonzero(&self) -> bool {
        self.raw().is_nonzero()
    }

    /// −1, 0 or +1, from the sign bit of the high guard word.
    pub fn sign(&self) -> i32 {
        let r = self.raw();
        if r.is_negative() {
            -1
        } else if r.is_nonzero() {
            1
        } else {
            0
        }
    }

    /// Read bit `i`. Indexes past `len() * WORD_BITS` are a caller bug.
    pub fn bit(&self, i: usize) -> bool {
        let r = self.raw();
        debug_assert!(i < r.len() * WORD_BITS, "bit index {i} out of range");
        r.buf()[i / WORD_BITS] >> (i % WORD_BITS) & 1 == 1
    }

    /// Number of zero bits below the lowest set bit. A value of zero has
    /// no set bit; by policy the result is then the total scanned width,
    /// `len() * WORD_BITS`.
    pub fn count_trailing_zeros(&self) -> usize {
        let r = self.raw();
        for (i, &w) in r.limbs().iter().enumerate() {
            if w != 0 {
                return i * WORD_BITS + w.trailing_zeros() as usize;
            }
        }
        r.len() * WORD_BITS
    }

    /// Whether two handles share one underlying instance (as constant
    /// cache hits do).
    #[inline]
    pub fn ptr_eq(&self, other: &BigInt) -> bool {
        self.raw.as_ptr() == other.raw.as_ptr()
    }

    /// Take exclusive ownership for in-place bit mutation. Succeeds iff
    /// this handle is the only reference; otherwise the value is handed
    /// back untouched.
    pub fn try_exclusive(self) -> Result<BigIntMut, BigInt> {
        if self.raw().ref_count() == 1 {
            let raw = self.raw;
            mem::forget(self);
            Ok(BigIntMut { raw })
        } else {
            Err(self)
        }
    }
}

impl Clone for BigInt {
    fn clone(&self) -> Self {
        self.raw().add_ref();
        Self { raw: self.raw }
    }
}

impl Drop for BigInt {
    fn drop(&mut self) {
        // SAFETY: we give up the reference this handle held.
        unsafe { RawInt::release(self.raw) };
    }
}

impl PartialEq for BigInt {
    /// Structural equality: kernels normalize their results, so equal
    /// values always carry equal lengths. The first guard word joins the
    /// comparison to separate sign variants with identical limbs.
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.raw(), other.raw());
        a.len() == b.len() && a.buf()[..=a.len()] == b.buf()[..=b.len()]
    }
}

impl Eq for BigInt {}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.raw();
        write!(
            f,
            "BigInt {{ sign: {}, len: {}, limbs: {:x?} }}",
            self.sign(),
            r.len(),
            r.limbs()
        )
    }
}

/// A uniquely owned integer, the only handle allowed to mutate storage in
/// place. Obtained from [`BigInt::try_exclusive`]; [`BigIntMut::freeze`]
/// returns it to the shared world.
#[derive(Debug)]
pub struct BigIntMut {
    raw: NonNull<RawInt>,
}

// SAFETY: sole owner of the instance.
unsafe impl Send for BigIntMut {}

impl BigIntMut {
    #[inline(always)]
    fn raw_mut(&mut self) -> &mut RawInt {
        // SAFETY: unique ownership by construction.
        unsafe { self.raw.as_mut() }
    }

    /// Write bit `i`. Same index contract as [`BigInt::bit`].
    pub fn set_bit(&mut self, i: usize, v: bool) {
        let r = self.raw_mut();
        debug_assert!(i < r.len() * WORD_BITS, "bit index {i} out of range");
        let mask = (1 as Word) << (i % WORD_BITS);
        let b = r.buf_mut();
        if v {
            b[i / WORD_BITS] |= mask;
        } else {
            b[i / WORD_BITS] &= !mask;
        }
    }

    /// Give the value back to the shared world. Renormalizes first, since
    /// bit edits near the top limb can leave redundant sign limbs.
    pub fn freeze(mut self) -> BigInt {
        self.raw_mut().normalize();
        let raw = self.raw;
        mem::forget(self);
        // SAFETY: still refcount 1, handed to the shared handle.
        unsafe { BigInt::from_raw(raw) }
    }
}

impl Drop for BigIntMut {
    fn drop(&mut self) {
        // SAFETY: we give up the only reference.
        unsafe { RawInt::release(self.raw) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn minus_one_is_a_single_all_ones_limb() {
        let v = BigInt::from_i64(-1).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.limbs()[0] as crate::SWord, -1);
        assert_eq!(v.guards(), [Word::MAX, Word::MAX]);
        assert_eq!(v.sign(), -1);
    }

    #[test]
    fn native_round_trips() {
        for v in [
            0i64,
            1,
            -1,
            2,
            -3,
            42,
            i64::MAX,
            i64::MIN,
            0x0123_4567_89AB_CDEF,
            -0x0123_4567_89AB_CDEF,
        ] {
            assert_eq!(BigInt::from_i64(v).unwrap().to_i64(), v, "value {v}");
        }
        for v in [0u64, 1, 10, u64::MAX, u64::MAX - 1, 1 << 63] {
            assert_eq!(BigInt::from_u64(v).unwrap().to_u64(), v, "value {v}");
        }
    }

    #[test]
    fn unsigned_top_bit_is_not_a_sign() {
        let v = BigInt::from_u64(u64::MAX).unwrap();
        assert_eq!(v.sign(), 1);
        let w = BigInt::from_i64(-1).unwrap();
        assert_ne!(v, w);
    }

    #[test]
    fn zero_tests_and_sign() {
        let zero = BigInt::from_u64(0).unwrap();
        assert!(zero.is_zero());
        assert!(!zero.is_nonzero());
        assert_eq!(zero.sign(), 0);

        let five = BigInt::from_u64(5).unwrap();
        assert!(!five.is_zero());
        assert!(five.is_nonzero());
        assert_eq!(five.sign(), 1);
    }

    #[test]
    fn bit_reads() {
        let v = BigInt::from_u64(0b1010_0100).unwrap();
        assert!(!v.bit(0));
        assert!(v.bit(2));
        assert!(v.bit(5));
        assert!(v.bit(7));
        assert!(!v.bit(8));
    }

    #[test]
    fn trailing_zeros_policy() {
        assert_eq!(BigInt::from_u64(1).unwrap().count_trailing_zeros(), 0);
        assert_eq!(BigInt::from_u64(8).unwrap().count_trailing_zeros(), 3);
        let zero = BigInt::from_u64(0).unwrap();
        assert_eq!(zero.count_trailing_zeros(), zero.len() * WORD_BITS);
    }

    #[test]
    fn exclusive_bit_set_round_trip() {
        let v = BigInt::from_u64(1024).unwrap();
        let mut m = v.try_exclusive().expect("sole owner");
        m.set_bit(0, true);
        m.set_bit(10, false);
        let v = m.freeze();
        assert_eq!(v.to_u64(), 1);
    }

    #[test]
    fn exclusive_access_denied_while_shared() {
        let v = BigInt::from_u64(77).unwrap();
        let extra = v.clone();
        let v = v.try_exclusive().expect_err("two holders");
        drop(extra);
        let mut m = v.try_exclusive().expect("back to one holder");
        m.set_bit(1, true);
        assert_eq!(m.freeze().to_u64(), 79);
    }

    #[test]
    fn freeze_renormalizes_cleared_top_bits() {
        // 2^64 occupies two limbs; clearing its bit must shrink back.
        let v = BigInt::from_u64(1).unwrap().shl(WORD_BITS).unwrap();
        assert_eq!(v.len(), 2);
        let mut m = v.try_exclusive().unwrap();
        m.set_bit(WORD_BITS, false);
        let v = m.freeze();
        assert_eq!(v.len(), 1);
        assert!(v.is_zero());
    }

    #[test]
    fn concurrent_clones_release_exactly_once() {
        const THREADS: usize = 8;
        let v = BigInt::from_u64(0xDEAD_BEEF_u64).unwrap();
        let shared = Arc::new(v.clone());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let local: BigInt = (*shared).clone();
                thread::spawn(move || {
                    assert_eq!(local.to_u64(), 0xDEAD_BEEF);
                    drop(local);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        drop(shared);

        // the original reference is the last one standing and still valid
        assert_eq!(v.to_u64(), 0xDEAD_BEEF);
        let m = v.try_exclusive();
        assert!(m.is_ok(), "all other references released");
    }
}
