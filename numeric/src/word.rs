//! Word model: platform-dependent limb types.
//!
//! A `Word` is one limb of an integer's magnitude array. A `DWord` is
//! exactly twice as wide; every kernel runs its carry arithmetic in
//! `DWord` and extracts the carry from the high half, so the pairing
//! must never be changed independently.

#[cfg(target_pointer_width = "64")]
mod select {
    pub type Word = u64;
    pub type SWord = i64;
    pub type DWord = u128;
    pub type SDWord = i128;
}

#[cfg(target_pointer_width = "32")]
mod select {
    pub type Word = u32;
    pub type SWord = i32;
    pub type DWord = u64;
    pub type SDWord = i64;
}

pub use select::{DWord, SDWord, SWord, Word};

pub const WORD_BYTES: usize = size_of::<Word>();
pub const WORD_BITS: usize = WORD_BYTES * 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dword_is_twice_word() {
        assert_eq!(size_of::<DWord>(), 2 * WORD_BYTES);
        assert_eq!(size_of::<SWord>(), WORD_BYTES);
        assert_eq!(size_of::<SDWord>(), 2 * WORD_BYTES);
    }

    #[test]
    fn carry_lives_in_the_high_half() {
        let q = Word::MAX as DWord + Word::MAX as DWord;
        assert_eq!((q >> WORD_BITS) as Word & 1, 1);
        assert_eq!(q as Word, Word::MAX - 1);
    }
}
