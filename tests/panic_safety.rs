//! Memory accounting when finalizers or strict-mode diagnostics panic.
//!
//! This binary installs a counting global allocator, so it holds a single
//! test to keep the byte count free of other threads' allocations.

use std::alloc::{GlobalAlloc, Layout, System};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use framestack::{FrameStack, StrictModeGuard};

struct Counting;

static LIVE: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            LIVE.fetch_add(layout.size(), Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE.fetch_sub(layout.size(), Ordering::SeqCst);
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

const MIB: usize = 1 << 20;

fn live() -> usize {
    LIVE.load(Ordering::SeqCst)
}

#[test]
fn test_panics_do_not_leak_block_memory() {
    let mut stack = FrameStack::with_defaults();
    stack.push().unwrap();
    let baseline = live();

    // A finalizer panics halfway through a frame pop.
    stack.push().unwrap();
    stack.alloc(4 * MIB, None).unwrap();
    stack.alloc_value([0u8; 4096]).unwrap();
    stack.alloc(MIB, Some(Box::new(|_| panic!("finalizer failed")))).unwrap();
    stack.alloc(4 * MIB, None).unwrap();
    assert!(live() >= baseline + 9 * MIB);

    let popped = catch_unwind(AssertUnwindSafe(|| stack.pop(1)));
    assert!(popped.is_err());
    drop(popped);
    assert_eq!(stack.depth(), 1);
    assert!(live() < baseline + MIB, "frame memory leaked after finalizer panic");

    // Strict mode turns an allocation failure into a panic.
    {
        let _strict = StrictModeGuard::panic_on_error();
        let failed = catch_unwind(AssertUnwindSafe(|| stack.alloc(1 << 62, None)));
        assert!(failed.is_err());
    }
    assert_eq!(stack.frame_len(0), Some(0));
    assert!(live() < baseline + MIB);

    stack.pop_all();
}
