//! Bitwise AND, OR, XOR and NOT.
//!
//! Binary ops branch once on the length relationship and then run
//! straight-line loops: limb against limb over the common prefix, the
//! shorter operand's sign word against the longer operand's tail, and the
//! guard words combined the same way. Two guard words always come out,
//! so the result survives the normalization that follows.

use crate::pool::AllocError;
use crate::raw::RawInt;
use crate::value::BigInt;
use crate::word::Word;

fn binary_op(
    a: &RawInt,
    b: &RawInt,
    op: impl Fn(Word, Word) -> Word,
) -> Result<BigInt, AllocError> {
    let rlen = a.len().max(b.len());
    let raw = RawInt::alloc(rlen)?;
    // SAFETY: exclusive until from_raw; all rlen + 2 words written.
    unsafe {
        let r = (*raw.as_ptr()).buf_mut();
        let (la, lb) = (a.buf(), b.buf());
        let mut i = 0;
        if a.len() > b.len() {
            let s1 = lb[b.len()];
            while i < b.len() {
                r[i] = op(la[i], lb[i]);
                i += 1;
            }
            while i < rlen + 2 {
                r[i] = op(la[i], s1);
                i += 1;
            }
        } else if a.len() < b.len() {
            let s0 = la[a.len()];
            while i < a.len() {
                r[i] = op(la[i], lb[i]);
                i += 1;
            }
            while i < rlen + 2 {
                r[i] = op(s0, lb[i]);
                i += 1;
            }
        } else {
            while i < rlen + 2 {
                r[i] = op(la[i], lb[i]);
                i += 1;
            }
        }
        (*raw.as_ptr()).normalize();
    }
    // SAFETY: initialized, refcount 1.
    Ok(unsafe { BigInt::from_raw(raw) })
}

impl BigInt {
    /// Bitwise AND over the sign-extended operands.
    pub fn and(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        binary_op(self.raw(), rhs.raw(), |x, y| x & y)
    }

    /// Bitwise OR over the sign-extended operands.
    pub fn or(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        binary_op(self.raw(), rhs.raw(), |x, y| x | y)
    }

    /// Bitwise XOR over the sign-extended operands.
    pub fn xor(&self, rhs: &BigInt) -> Result<BigInt, AllocError> {
        binary_op(self.raw(), rhs.raw(), |x, y| x ^ y)
    }

    /// Bitwise complement. Flipping a canonical buffer, guards included,
    /// cannot equate the top limb with its guard, so no renormalization
    /// is needed.
    pub fn not(&self) -> Result<BigInt, AllocError> {
        let a = self.raw();
        let raw = RawInt::alloc(a.len())?;
        // SAFETY: exclusive until from_raw; all len + 2 words written.
        unsafe {
            let r = (*raw.as_ptr()).buf_mut();
            let s = a.buf();
            for i in (0..=a.len() + 1).rev() {
                r[i] = !s[i];
            }
        }
        // SAFETY: initialized, refcount 1.
        Ok(unsafe { BigInt::from_raw(raw) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::WORD_BITS;

    fn from_i64(v: i64) -> BigInt {
        BigInt::from_i64(v).unwrap()
    }

    fn from_u64(v: u64) -> BigInt {
        BigInt::from_u64(v).unwrap()
    }

    #[test]
    fn and_of_nibbles() {
        let v = from_u64(0b1100).and(&from_u64(0b1010)).unwrap();
        assert_eq!(v.to_u64(), 0b1000);
    }

    #[test]
    fn or_and_xor_match_native() {
        let pairs = [
            (0x00FF_00FF_00FF_00FFu64, 0x0F0F_0F0F_0F0F_0F0Fu64),
            (u64::MAX, 0),
            (0xDEAD_BEEF, 0xFEED_FACE),
        ];
        for (x, y) in pairs {
            assert_eq!(from_u64(x).or(&from_u64(y)).unwrap().to_u64(), x | y);
            assert_eq!(from_u64(x).xor(&from_u64(y)).unwrap().to_u64(), x ^ y);
            assert_eq!(from_u64(x).and(&from_u64(y)).unwrap().to_u64(), x & y);
        }
    }

    #[test]
    fn sign_word_stands_in_for_the_short_tail() {
        // -1 is one limb; AND against a four-limb value must behave as an
        // infinite stream of one bits
        let wide = from_u64(0xABCD).shl(3 * WORD_BITS).unwrap();
        let all_ones = from_i64(-1);
        assert_eq!(wide.and(&all_ones).unwrap(), wide);
        assert_eq!(all_ones.and(&wide).unwrap(), wide);
        // OR against -1 swallows everything
        assert_eq!(wide.or(&all_ones).unwrap(), all_ones);
    }

    #[test]
    fn binary_results_are_canonical() {
        // 1 | -2 == -1, which must come out at length 1
        let v = from_i64(1).or(&from_i64(-2)).unwrap();
        assert_eq!(v.to_i64(), -1);
        assert_eq!(v.len(), 1);
        assert_eq!(v, from_i64(-1));
    }

    #[test]
    fn not_is_an_involution() {
        for v in [0i64, 1, -1, 12345, -98765, i64::MAX, i64::MIN] {
            let a = from_i64(v);
            assert_eq!(a.not().unwrap().not().unwrap(), a, "value {v}");
            assert_eq!(a.not().unwrap().to_i64(), !v, "value {v}");
        }
    }

    #[test]
    fn not_flips_the_guards() {
        let a = from_u64(7).not().unwrap();
        assert_eq!(a.guards(), [Word::MAX, Word::MAX]);
        assert_eq!(a.sign(), -1);
    }

    #[test]
    fn xor_with_self_is_zero() {
        let wide = from_u64(0x1234_5678).shl(150).unwrap();
        let z = wide.xor(&wide).unwrap();
        assert!(z.is_zero());
        assert_eq!(z.len(), 1);
    }
}
