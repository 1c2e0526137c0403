//! Block allocation: alloc, alloc_zeroed, realloc and free.

use std::alloc::Layout;
use std::ptr::NonNull;

use log::trace;

use crate::allocators::frame::{Block, BlockData};
use crate::allocators::raw::{drop_finalizer, write_value, RawBlock};
use crate::api::error::StackError;
use crate::api::finalizer::{Finalizers, PtrFinalizer};
use crate::api::handle::Loc;
use crate::api::stack::FrameStack;
use crate::fs_emit;
use crate::util::layout::block_layout;

impl FrameStack {
    /// Allocate `size` bytes in the top frame.
    ///
    /// The memory is aligned to [`StackConfig::alignment`](crate::StackConfig)
    /// and released when the frame is popped or the block is freed. The
    /// optional finalizer is called with the pointer just before release.
    pub fn alloc(
        &mut self,
        size: usize,
        finalizer: Option<PtrFinalizer>,
    ) -> Result<(NonNull<u8>, Loc), StackError> {
        let layout = self.untyped_layout(size)?;
        self.allocate(layout, false, finalizer.map_or_else(Finalizers::none, Finalizers::with_ptr), Block::owned)
    }

    /// Like [`alloc`](Self::alloc), with the memory zero-filled.
    pub fn alloc_zeroed(
        &mut self,
        size: usize,
        finalizer: Option<PtrFinalizer>,
    ) -> Result<(NonNull<u8>, Loc), StackError> {
        let layout = self.untyped_layout(size)?;
        self.allocate(layout, true, finalizer.map_or_else(Finalizers::none, Finalizers::with_ptr), Block::owned)
    }

    /// Allocate memory for an explicit layout.
    pub fn alloc_layout(
        &mut self,
        layout: Layout,
        finalizer: Option<PtrFinalizer>,
    ) -> Result<(NonNull<u8>, Loc), StackError> {
        self.allocate(layout, false, finalizer.map_or_else(Finalizers::none, Finalizers::with_ptr), Block::owned)
    }

    /// Move `value` into the top frame.
    ///
    /// `T`'s destructor is registered as the block's pointer finalizer, so it
    /// runs when the block is freed or its frame is popped. Replacing that
    /// finalizer with [`set_finalizer`](Self::set_finalizer) means the value
    /// is no longer dropped. The block keeps `T`'s size: [`realloc`](Self::realloc)
    /// refuses it with [`StackError::TypedValue`].
    pub fn alloc_value<T: 'static>(&mut self, value: T) -> Result<(NonNull<T>, Loc), StackError> {
        let finalizers = if std::mem::needs_drop::<T>() {
            Finalizers::with_ptr(drop_finalizer::<T>())
        } else {
            Finalizers::none()
        };
        let (ptr, loc) = self.allocate(Layout::new::<T>(), false, finalizers, Block::typed)?;

        // SAFETY: the block was allocated with T's layout and nothing has
        // read it yet.
        let typed = unsafe { write_value(ptr, value) };
        Ok((typed, loc))
    }

    fn untyped_layout(&self, size: usize) -> Result<Layout, StackError> {
        let align = self.config().alignment;
        block_layout(size, align).ok_or(StackError::InvalidLayout { size, align })
    }

    fn allocate(
        &mut self,
        layout: Layout,
        zeroed: bool,
        finalizers: Finalizers,
        make: fn(RawBlock, Finalizers) -> Block,
    ) -> Result<(NonNull<u8>, Loc), StackError> {
        if self.is_empty() {
            fs_emit!(FS101);
            return Err(StackError::EmptyStack);
        }

        // Slot first: nothing is held yet if growth fails or strict mode panics.
        let index = self.reserve_top()?;

        let Some(raw) = RawBlock::allocate(layout, zeroed) else {
            fs_emit!(FS102, "{} bytes", layout.size());
            return Err(StackError::OutOfMemory {
                size: layout.size(),
            });
        };

        let ptr = raw.ptr();
        let size = raw.size();
        let loc = self.push_into(index, make(raw, finalizers));
        self.counters.record_alloc(size);
        trace!("alloc {} bytes at {}", size, loc);
        Ok((ptr, loc))
    }

    /// Resize an owned block.
    ///
    /// - `loc == None` allocates a fresh block in the top frame.
    /// - `new_size == 0` frees the block and returns `Ok(None)`.
    ///
    /// On failure the block and its memory are left as they were. Blocks
    /// registered with [`register_external`](Self::register_external) or
    /// [`register_void`](Self::register_void) cannot be resized, and neither
    /// can values placed by [`alloc_value`](Self::alloc_value) (they can
    /// still be freed with `new_size == 0`).
    pub fn realloc(
        &mut self,
        loc: Option<Loc>,
        new_size: usize,
    ) -> Result<Option<(NonNull<u8>, Loc)>, StackError> {
        let Some(loc) = loc else {
            return self.alloc(new_size, None).map(Some);
        };

        if new_size == 0 {
            return if self.free(loc) {
                Ok(None)
            } else {
                Err(StackError::InvalidHandle(loc))
            };
        }

        let block = self.live_block_mut(loc)?;
        let raw = match &mut block.data {
            BlockData::Owned(raw) => raw,
            BlockData::Typed(_) => {
                fs_emit!(FS105, "{}", loc);
                return Err(StackError::TypedValue(loc));
            }
            BlockData::Borrowed(_) | BlockData::Detached => {
                fs_emit!(FS103, "{}", loc);
                return Err(StackError::NotOwned(loc));
            }
        };

        let old_size = raw.size();
        if !raw.resize(new_size) {
            fs_emit!(FS102, "{} bytes", new_size);
            return Err(StackError::OutOfMemory { size: new_size });
        }
        let ptr = raw.ptr();

        self.counters.record_resize(old_size, new_size);
        trace!("realloc {} from {} to {} bytes", loc, old_size, new_size);
        Ok(Some((ptr, loc)))
    }

    /// Release a block now instead of at frame pop.
    ///
    /// Runs its finalizers, releases owned memory and leaves a tombstone.
    /// Returns `false`, doing nothing, if the handle is invalid or stale.
    pub fn free(&mut self, loc: Loc) -> bool {
        match self.take(loc) {
            Some(block) => {
                trace!("free {}", loc);
                self.release(block);
                true
            }
            None => {
                fs_emit!(FS201, "{}", loc);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{FrameStack, Loc, StackConfig, StackError};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn bytes(ptr: std::ptr::NonNull<u8>, len: usize) -> &'static [u8] {
        unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }
    }

    #[test]
    fn test_alloc_without_frame_fails() {
        let mut stack = FrameStack::with_defaults();
        assert_eq!(stack.alloc(16, None), Err(StackError::EmptyStack));
        assert_eq!(stack.stats().allocations, 0);
    }

    #[test]
    fn test_alloc_is_aligned() {
        let mut stack = FrameStack::new(StackConfig::default().with_alignment(64));
        stack.push().unwrap();
        for size in [1, 3, 100] {
            let (ptr, _) = stack.alloc(size, None).unwrap();
            assert_eq!(ptr.as_ptr() as usize % 64, 0);
        }
    }

    #[test]
    fn test_alloc_zeroed_sizes() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        for size in [0, 1, 1024] {
            let (ptr, _) = stack.alloc_zeroed(size, None).unwrap();
            assert!(bytes(ptr, size).iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_free_runs_finalizer_once() {
        let hits = Rc::new(Cell::new(0));
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();

        let h = Rc::clone(&hits);
        let (ptr, loc) = stack
            .alloc(8, Some(Box::new(move |_| h.set(h.get() + 1))))
            .unwrap();
        assert_eq!(stack.resolve(loc), Some(ptr));

        assert!(stack.free(loc));
        assert!(!stack.free(loc));
        stack.pop(1);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_finalizer_receives_block_pointer() {
        let seen = Rc::new(Cell::new(0usize));
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();

        let s = Rc::clone(&seen);
        let (ptr, _) = stack
            .alloc(4, Some(Box::new(move |p| s.set(p.as_ptr() as usize))))
            .unwrap();
        stack.pop(1);

        assert_eq!(seen.get(), ptr.as_ptr() as usize);
    }

    #[test]
    fn test_realloc_grows_and_keeps_contents() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let (ptr, loc) = stack.alloc(4, None).unwrap();
        unsafe { ptr.as_ptr().copy_from([9u8, 8, 7, 6].as_ptr(), 4) };

        let (moved, same) = stack.realloc(Some(loc), 4096).unwrap().unwrap();
        assert_eq!(same, loc);
        assert_eq!(stack.resolve(loc), Some(moved));
        assert_eq!(bytes(moved, 4), &[9, 8, 7, 6]);
        assert_eq!(stack.stats().owned_bytes, 4096);
    }

    #[test]
    fn test_realloc_without_handle_allocates() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let (ptr, loc) = stack.realloc(None, 32).unwrap().unwrap();
        assert_eq!(stack.resolve(loc), Some(ptr));
    }

    #[test]
    fn test_realloc_to_zero_frees() {
        let hits = Rc::new(Cell::new(0));
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();

        let h = Rc::clone(&hits);
        let (_, loc) = stack
            .alloc(64, Some(Box::new(move |_| h.set(h.get() + 1))))
            .unwrap();

        assert_eq!(stack.realloc(Some(loc), 0), Ok(None));
        assert_eq!(hits.get(), 1);
        assert!(stack.resolve(loc).is_none());
        assert_eq!(stack.frame_len(0), Some(1));
        assert_eq!(stack.stats().tombstones, 1);
    }

    #[test]
    fn test_realloc_invalid_handle() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let bogus = Loc::dangling();
        assert_eq!(
            stack.realloc(Some(bogus), 8),
            Err(StackError::InvalidHandle(bogus))
        );
        assert_eq!(
            stack.realloc(Some(bogus), 0),
            Err(StackError::InvalidHandle(bogus))
        );
    }

    #[test]
    fn test_realloc_external_is_rejected() {
        let mut value = 1u64;
        let ptr = std::ptr::NonNull::from(&mut value).cast::<u8>();
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let loc = stack.register_external(ptr, Box::new(|_| {})).unwrap();

        assert_eq!(stack.realloc(Some(loc), 64), Err(StackError::NotOwned(loc)));
        assert_eq!(stack.resolve(loc), Some(ptr));
    }

    #[test]
    fn test_invalid_layout() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        assert!(matches!(
            stack.alloc(usize::MAX, None),
            Err(StackError::InvalidLayout { .. })
        ));
        assert_eq!(stack.frame_len(0), Some(0));
    }

    #[test]
    fn test_alloc_value_drops_on_pop() {
        let marker = Rc::new(());
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();

        let (ptr, _) = stack.alloc_value((Rc::clone(&marker), 41u32)).unwrap();
        unsafe { (*ptr.as_ptr()).1 += 1 };
        assert_eq!(unsafe { (*ptr.as_ptr()).1 }, 42);
        assert_eq!(Rc::strong_count(&marker), 2);

        let o = Rc::clone(&order);
        stack.register_void(Box::new(move || o.borrow_mut().push("hook"))).unwrap();

        stack.pop(1);
        assert_eq!(Rc::strong_count(&marker), 1);
        assert_eq!(*order.borrow(), vec!["hook"]);
    }

    #[test]
    fn test_alloc_value_plain_data_has_no_finalizer() {
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let (ptr, _) = stack.alloc_value([1u16; 8]).unwrap();
        assert_eq!(ptr.as_ptr() as usize % std::mem::align_of::<[u16; 8]>(), 0);
        stack.pop(1);
        assert_eq!(stack.stats().finalizers_run, 0);
    }

    #[test]
    fn test_realloc_typed_value_is_rejected() {
        struct Big {
            words: [u64; 32],
            marker: Rc<()>,
        }

        let marker = Rc::new(());
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let (ptr, loc) = stack
            .alloc_value(Big {
                words: [7; 32],
                marker: Rc::clone(&marker),
            })
            .unwrap();
        let size = std::mem::size_of::<Big>();

        assert_eq!(stack.realloc(Some(loc), 1), Err(StackError::TypedValue(loc)));
        assert_eq!(stack.realloc(Some(loc), size * 2), Err(StackError::TypedValue(loc)));
        assert_eq!(stack.resolve(loc), Some(ptr.cast()));
        assert_eq!(stack.stats().owned_bytes, size);
        assert_eq!(unsafe { (*ptr.as_ptr()).words[31] }, 7);
        assert_eq!(unsafe { Rc::strong_count(&(*ptr.as_ptr()).marker) }, 2);

        stack.pop(1);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn test_realloc_typed_value_to_zero_drops_it() {
        let marker = Rc::new(());
        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        let (_, loc) = stack.alloc_value(Rc::clone(&marker)).unwrap();
        assert!(stack.is_owned(loc));

        assert_eq!(stack.realloc(Some(loc), 0), Ok(None));
        assert_eq!(Rc::strong_count(&marker), 1);
        assert!(!stack.is_owned(loc));
    }

    #[test]
    fn test_out_of_memory_in_strict_mode_leaves_frame_untouched() {
        use crate::StrictModeGuard;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let mut stack = FrameStack::with_defaults();
        stack.push().unwrap();
        {
            let _strict = StrictModeGuard::panic_on_error();
            let result = catch_unwind(AssertUnwindSafe(|| stack.alloc(1 << 62, None)));
            assert!(result.is_err());
        }

        assert_eq!(stack.frame_len(0), Some(0));
        let stats = stack.stats();
        assert_eq!(stats.allocations, 0);
        assert_eq!(stats.owned_bytes, 0);
        assert!(stack.alloc(16, None).is_ok());
    }
}
