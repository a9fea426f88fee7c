//! Raw storage layout: a fixed header followed by a flexible limb array.
//!
//! The buffer always holds `cap + 2` words. Limbs `[0, len)` are the
//! magnitude, little-endian by word. The words at `len` and `len + 1` are
//! the guard words: full sign extensions of the value (all zeros for
//! non-negative, all ones for negative). Every kernel reads one word past
//! the logical end without a conditional and still sees the right digit;
//! this is the central device of the whole engine.
//!
//! `normalize` only ever shrinks `len`. The words it abandons were equal
//! to the sign word above them, so both guard positions stay valid
//! without touching the buffer.

use std::ptr::{self, NonNull};
use std::slice;
use std::sync::atomic::{AtomicUsize, Ordering, fence};

use crate::pool::{AllocError, pool};
use crate::word::{DWord, SWord, WORD_BITS, WORD_BYTES, Word};

#[repr(C)]
pub(crate) struct RawInt {
    /// Shared-ownership counter; the only field mutated after a value is
    /// published.
    refs: AtomicUsize,
    /// Allocated limb capacity. `release` recomputes the byte size from
    /// this after `normalize` has shrunk `len`.
    cap: usize,
    /// Logical length in limbs, always >= 1 and <= `cap`.
    len: usize,
    limbs: [Word; 0],
}

impl RawInt {
    /// Byte size of an instance with `cap` limbs of capacity.
    #[inline]
    pub(crate) fn byte_size(cap: usize) -> usize {
        size_of::<RawInt>() + (cap + 2) * WORD_BYTES
    }

    /// Allocate an instance with logical length (and capacity) `len`,
    /// refcount 1. The buffer is uninitialized; the caller must write all
    /// `len + 2` words before the value escapes.
    pub(crate) fn alloc(len: usize) -> Result<NonNull<RawInt>, AllocError> {
        assert!(len > 0, "zero-length integer construction");
        let raw = pool().allocate(Self::byte_size(len))?.cast::<RawInt>();
        // SAFETY: freshly allocated, big enough, aligned by the pool.
        unsafe {
            ptr::write(
                raw.as_ptr(),
                RawInt {
                    refs: AtomicUsize::new(1),
                    cap: len,
                    len,
                    limbs: [],
                },
            );
        }
        Ok(raw)
    }

    /// Like [`RawInt::alloc`], with all `len + 2` buffer words zeroed.
    pub(crate) fn alloc_zeroed(len: usize) -> Result<NonNull<RawInt>, AllocError> {
        let raw = Self::alloc(len)?;
        // SAFETY: buffer has len + 2 words.
        unsafe {
            ptr::write_bytes((*raw.as_ptr()).limbs.as_mut_ptr(), 0, len + 2);
        }
        Ok(raw)
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Every buffer word of the logical value: `len` limbs plus the two
    /// guard words.
    #[inline(always)]
    pub(crate) fn buf(&self) -> &[Word] {
        // SAFETY: the buffer holds cap + 2 >= len + 2 words.
        unsafe { slice::from_raw_parts(self.limbs.as_ptr(), self.len + 2) }
    }

    #[inline(always)]
    pub(crate) fn buf_mut(&mut self) -> &mut [Word] {
        // SAFETY: as in buf(), and we hold exclusive access.
        unsafe { slice::from_raw_parts_mut(self.limbs.as_mut_ptr(), self.len + 2) }
    }

    /// Magnitude limbs only, without the guards.
    #[inline(always)]
    pub(crate) fn limbs(&self) -> &[Word] {
        &self.buf()[..self.len]
    }

    /// Limb `i`, with the sign word standing in past the logical end.
    #[inline(always)]
    pub(crate) fn limb_ext(&self, i: usize) -> Word {
        let b = self.buf();
        if i < self.len { b[i] } else { b[self.len] }
    }

    #[inline(always)]
    pub(crate) fn high_word(&self) -> Word {
        self.buf()[self.len - 1]
    }

    /// The sign extension as a full word: 0 or `Word::MAX`, replicated
    /// from the high guard's sign bit.
    #[inline(always)]
    pub(crate) fn sign_word(&self) -> Word {
        ((self.buf()[self.len] as SWord) >> (WORD_BITS - 1)) as Word
    }

    #[inline(always)]
    pub(crate) fn is_negative(&self) -> bool {
        self.buf()[self.len] >> (WORD_BITS - 1) == 1
    }

    /// Drop the top limb while it equals the sign word above it.
    pub(crate) fn normalize(&mut self) {
        let p = self.limbs.as_ptr();
        // SAFETY: indices len and len - 1 stay within the buffer.
        unsafe {
            while self.len > 1 && *p.add(self.len) == *p.add(self.len - 1) {
                self.len -= 1;
            }
        }
    }

    /// True iff every buffer word including the guards is zero. Probes
    /// limb 0 first, then scans downward from the guard.
    pub(crate) fn is_zero(&self) -> bool {
        let b = self.buf();
        if b[0] != 0 {
            return false;
        }
        for i in (1..=self.len).rev() {
            if b[i] != 0 {
                return false;
            }
        }
        true
    }

    /// Logical negation of [`RawInt::is_zero`], as its own downward scan.
    /// The two must always agree; only the early-exit order differs.
    pub(crate) fn is_nonzero(&self) -> bool {
        let b = self.buf();
        for i in (0..=self.len).rev() {
            if b[i] != 0 {
                return true;
            }
        }
        false
    }

    /// Add `value` at limb `index`, rippling the carry upward until it
    /// dies out or leaves the buffer. Shared by every multiply step.
    pub(crate) fn accumulate_with_carry(&mut self, mut index: usize, mut value: Word) {
        let end = self.len + 2;
        let b = self.buf_mut();
        while value != 0 && index < end {
            let q = b[index] as DWord + value as DWord;
            b[index] = q as Word;
            value = (q >> WORD_BITS) as Word;
            index += 1;
        }
    }

    #[inline(always)]
    pub(crate) fn add_ref(&self) {
        self.refs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Drop one reference; exactly one releaser observes the transition
    /// to zero and returns the block to the pool.
    ///
    /// # Safety
    ///
    /// `raw` must be live and the caller must give up its reference.
    pub(crate) unsafe fn release(raw: NonNull<RawInt>) {
        // Release on the decrement orders our reads before the free;
        // the acquire fence pairs with it in the freeing thread.
        // SAFETY: live by contract.
        let remaining = unsafe { raw.as_ref() }.refs.fetch_sub(1, Ordering::Release);
        if remaining == 1 {
            fence(Ordering::Acquire);
            // SAFETY: we are the unique owner now.
            let cap = unsafe { raw.as_ref() }.cap;
            // SAFETY: allocated from the pool with this exact size.
            unsafe { pool().release(raw.cast(), Self::byte_size(cap)) };
        }
    }
}
