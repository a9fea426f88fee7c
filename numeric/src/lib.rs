//! Arbitrary-precision signed integer engine.
//!
//! Variable-length two's-complement values with reference-counted
//! immutable storage, a segregated free-list pool allocator, and
//! branch-minimized kernels for addition, subtraction, multiplication,
//! shifts, bitwise logic, comparison and bit-level queries.
//!
//! Every value carries two guard words past its logical length holding
//! its sign extension, so kernels read one word past the end without a
//! conditional and overflow is absorbed by a length increase instead of
//! a special case.

mod bits;
mod consts;
mod kernel;
mod pool;
mod raw;
mod shift;
mod value;
mod word;

pub use consts::{one, zero};
pub use pool::{AllocError, Pool, pool};
pub use value::{BigInt, BigIntMut};
pub use word::{DWord, SDWord, SWord, WORD_BITS, WORD_BYTES, Word};
