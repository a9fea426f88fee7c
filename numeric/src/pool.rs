//! Segregated free-list pool allocator.
//!
//! Integer instances are many, small, similarly sized and short lived, so
//! blocks come from per-size-class free lists carved out of large slabs.
//! Alloc and free are O(1) and never walk more than one list. Requests
//! above the largest class fall through to the global allocator.
//!
//! The pool is process wide: any thread may allocate, and the last
//! reference to a value is routinely dropped on a different thread than
//! the one that created it, so every free list sits behind its own lock.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::OnceLock;

use log::trace;
use parking_lot::Mutex;

/// The pool (or the global allocator behind it) could not satisfy a
/// request. Fatal to the operation that needed the storage, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("integer storage allocation failed")
    }
}

impl std::error::Error for AllocError {}

/// Size-class granularity in bytes. Also the block alignment, so it must
/// stay at least `align_of::<FreeNode>()` and the header alignment.
const CLASS_STEP: usize = 16;
const CLASS_COUNT: usize = 64;
/// Largest pooled request; anything bigger goes to the global allocator.
const MAX_POOLED: usize = CLASS_STEP * CLASS_COUNT;
const SLAB_SIZE: usize = 64 * 1024;

/// Free-list link, stored inside the freed block itself.
struct FreeNode {
    next: *mut FreeNode,
}

struct ClassState {
    free: *mut FreeNode,
    slabs: usize,
}

// SAFETY: the raw list head is only ever touched under the class lock.
unsafe impl Send for ClassState {}

pub struct Pool {
    classes: [Mutex<ClassState>; CLASS_COUNT],
}

impl Pool {
    fn new() -> Self {
        Self {
            classes: std::array::from_fn(|_| {
                Mutex::new(ClassState {
                    free: ptr::null_mut(),
                    slabs: 0,
                })
            }),
        }
    }

    #[inline]
    fn class_of(byte_size: usize) -> Option<usize> {
        if byte_size <= MAX_POOLED {
            Some((byte_size + CLASS_STEP - 1) / CLASS_STEP - 1)
        } else {
            None
        }
    }

    #[inline]
    fn class_size(index: usize) -> usize {
        (index + 1) * CLASS_STEP
    }

    fn large_layout(byte_size: usize) -> Layout {
        Layout::from_size_align(byte_size, CLASS_STEP)
            .expect("pool request layout")
    }

    /// Hand out a block of at least `byte_size` bytes, aligned to
    /// `CLASS_STEP`. A zero-size request is a caller bug, not a runtime
    /// condition.
    pub fn allocate(&self, byte_size: usize) -> Result<NonNull<u8>, AllocError> {
        assert!(byte_size > 0, "zero-size pool request");

        let Some(index) = Self::class_of(byte_size) else {
            trace!("pool: large fallback for {byte_size} B");
            let raw = unsafe { alloc::alloc(Self::large_layout(byte_size)) };
            return NonNull::new(raw).ok_or(AllocError);
        };

        let mut class = self.classes[index].lock();
        if class.free.is_null() {
            Self::refill(&mut class, Self::class_size(index))?;
        }
        let node = class.free;
        // SAFETY: non-null head of this class's list, written by refill or
        // release under the same lock.
        class.free = unsafe { (*node).next };
        // SAFETY: blocks are never null.
        Ok(unsafe { NonNull::new_unchecked(node.cast()) })
    }

    /// Return a block previously handed out for `byte_size` bytes.
    ///
    /// # Safety
    ///
    /// `block` must come from an `allocate(byte_size)` call on this pool
    /// (same size), and must not be used afterwards.
    pub unsafe fn release(&self, block: NonNull<u8>, byte_size: usize) {
        match Self::class_of(byte_size) {
            Some(index) => {
                let mut class = self.classes[index].lock();
                let node: *mut FreeNode = block.as_ptr().cast();
                // SAFETY: block is ours again and big enough for the link.
                unsafe { (*node).next = class.free };
                class.free = node;
            }
            // SAFETY: allocated through the same fallback layout.
            None => unsafe {
                alloc::dealloc(block.as_ptr(), Self::large_layout(byte_size))
            },
        }
    }

    /// Carve a fresh slab into `block_size` blocks and thread them onto
    /// the class free list. Slabs are retained for the process lifetime.
    fn refill(class: &mut ClassState, block_size: usize) -> Result<(), AllocError> {
        let layout = Layout::from_size_align(SLAB_SIZE, CLASS_STEP)
            .expect("slab layout");
        // SAFETY: non-zero, valid layout.
        let slab = unsafe { alloc::alloc(layout) };
        if slab.is_null() {
            return Err(AllocError);
        }
        class.slabs += 1;
        trace!(
            "pool: slab {} for {block_size} B blocks ({} blocks)",
            class.slabs,
            SLAB_SIZE / block_size
        );

        let count = SLAB_SIZE / block_size;
        let mut head = ptr::null_mut();
        for i in (0..count).rev() {
            // SAFETY: i * block_size + block_size <= SLAB_SIZE.
            let node: *mut FreeNode = unsafe { slab.add(i * block_size) }.cast();
            // SAFETY: in-bounds, exclusively owned until published.
            unsafe { (*node).next = head };
            head = node;
        }
        class.free = head;
        Ok(())
    }
}

/// The process-wide pool, initialized on first use.
pub fn pool() -> &'static Pool {
    static POOL: OnceLock<Pool> = OnceLock::new();
    POOL.get_or_init(Pool::new)
}
