//! Owned memory blocks backed by the system allocator.
//!
//! Every byte the stack owns goes through [`RawBlock`]. Zero-sized requests
//! never touch the system allocator; they get an aligned dangling pointer.

use std::alloc::{alloc, alloc_zeroed, dealloc, realloc, Layout};
use std::ptr::{self, NonNull};

use crate::api::finalizer::PtrFinalizer;
use crate::util::layout::resized;

/// Byte pattern written over released memory when poisoning is on.
pub const POISON_BYTE: u8 = 0xCD;

/// A block of memory owned by the stack, with the layout it was allocated with.
///
/// Dropping a block deallocates it; [`release`](Self::release) only adds
/// poisoning on top.
#[derive(Debug)]
pub(crate) struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawBlock {
    /// Allocate a block for `layout`, optionally zero-filled.
    ///
    /// Returns `None` if the system allocator is out of memory.
    pub fn allocate(layout: Layout, zeroed: bool) -> Option<Self> {
        if layout.size() == 0 {
            return Some(Self {
                ptr: dangling(layout.align())?,
                layout,
            });
        }

        // SAFETY: the layout has a non-zero size
        let ptr = unsafe {
            if zeroed {
                alloc_zeroed(layout)
            } else {
                alloc(layout)
            }
        };

        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    /// Resize in place or move. On failure the block is left untouched.
    pub fn resize(&mut self, new_size: usize) -> bool {
        debug_assert!(new_size > 0, "zero-size resize is a release");

        let Some(new_layout) = resized(self.layout, new_size) else {
            return false;
        };

        if self.layout.size() == 0 {
            return match Self::allocate(new_layout, false) {
                Some(fresh) => {
                    *self = fresh;
                    true
                }
                None => false,
            };
        }

        // SAFETY: ptr was allocated with self.layout and new_size is non-zero
        // and fits the alignment (checked by `resized`).
        let moved = unsafe { realloc(self.ptr.as_ptr(), self.layout, new_size) };
        match NonNull::new(moved) {
            Some(ptr) => {
                self.ptr = ptr;
                self.layout = new_layout;
                true
            }
            None => false,
        }
    }

    /// Return the memory to the system allocator, optionally overwriting it
    /// with [`POISON_BYTE`] first.
    pub fn release(self, poison: bool) {
        if poison && self.layout.size() != 0 {
            // SAFETY: the block is live and self.layout.size() bytes long
            unsafe { ptr::write_bytes(self.ptr.as_ptr(), POISON_BYTE, self.layout.size()) };
        }
    }

    pub fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        if self.layout.size() == 0 {
            return;
        }
        // SAFETY: we allocated this memory with self.layout and nobody else
        // frees it.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// An aligned, non-null pointer for zero-sized blocks.
fn dangling(align: usize) -> Option<NonNull<u8>> {
    NonNull::new(align as *mut u8)
}

/// Move `value` into freshly allocated, properly aligned memory.
///
/// # Safety
///
/// `ptr` must point to writable memory valid for a `T`.
pub(crate) unsafe fn write_value<T>(ptr: NonNull<u8>, value: T) -> NonNull<T> {
    let typed = ptr.cast::<T>();
    // SAFETY: guaranteed by the caller
    unsafe { typed.as_ptr().write(value) };
    typed
}

/// A finalizer that runs `T`'s destructor in place.
pub(crate) fn drop_finalizer<T: 'static>() -> PtrFinalizer {
    Box::new(|ptr: NonNull<u8>| {
        // SAFETY: registered only for blocks written by `write_value::<T>`
        // and run at most once, before the memory is released.
        unsafe { ptr::drop_in_place(ptr.cast::<T>().as_ptr()) }
    })
}
