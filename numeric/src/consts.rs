//! Constant cache: process-wide singletons for small frequent values.
//!
//! The construction funnels check here first and hand out a shared
//! instance by reference increment instead of allocating. The singletons
//! themselves are ordinary pool allocations whose refcount never reaches
//! zero, so the pool needs no teardown ordering.

use std::sync::OnceLock;

use crate::value::BigInt;
use crate::word::Word;

struct ConstantCache {
    zero: BigInt,
    one: BigInt,
    two: BigInt,
    four: BigInt,
    five: BigInt,
    six: BigInt,
    eight: BigInt,
    ten: BigInt,
    word_max: BigInt,
}

fn cache() -> &'static ConstantCache {
    static CACHE: OnceLock<ConstantCache> = OnceLock::new();
    CACHE.get_or_init(|| {
        let seed = |v: u64| {
            // seeded through the uncached path; a handful of tiny blocks
            // at first use, nothing can run without them anyway
            BigInt::encode_u64(v).expect("constant cache seed")
        };
        ConstantCache {
            zero: seed(0),
            one: seed(1),
            two: seed(2),
            four: seed(4),
            five: seed(5),
            six: seed(6),
            eight: seed(8),
            ten: seed(10),
            word_max: seed(Word::MAX as u64),
        }
    })
}

/// The shared zero singleton.
pub fn zero() -> BigInt {
    cache().zero.clone()
}

/// The shared one singleton.
pub fn one() -> BigInt {
    cache().one.clone()
}

pub(crate) fn small_u64(v: u64) -> Option<BigInt> {
    let c = cache();
    let hit = match v {
        0 => &c.zero,
        1 => &c.one,
        2 => &c.two,
        4 => &c.four,
        5 => &c.five,
        6 => &c.six,
        8 => &c.eight,
        10 => &c.ten,
        _ if v == Word::MAX as u64 => &c.word_max,
        _ => return None,
    };
    Some(hit.clone())
}

pub(crate) fn small_i64(v: i64) -> Option<BigInt> {
    if v < 0 { None } else { small_u64(v as u64) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_values_share_storage() {
        for v in [0u64, 1, 2, 4, 5, 6, 8, 10, Word::MAX as u64] {
            let a = BigInt::from_u64(v).unwrap();
            let b = BigInt::from_u64(v).unwrap();
            assert!(a.ptr_eq(&b), "value {v} should be a cache hit");
            assert_eq!(a.to_u64(), v);
        }
    }

    #[test]
    fn uncached_values_get_fresh_storage() {
        let a = BigInt::from_u64(3).unwrap();
        let b = BigInt::from_u64(3).unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn signed_funnel_hits_the_cache_for_non_negatives_only() {
        let a = BigInt::from_i64(5).unwrap();
        let b = BigInt::from_u64(5).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(small_i64(-1).is_none());
    }

    #[test]
    fn singletons_survive_heavy_sharing() {
        let before = zero();
        let clones: Vec<_> = (0..1000).map(|_| zero()).collect();
        drop(clones);
        assert!(before.ptr_eq(&zero()));
        assert!(before.is_zero());
    }
}
