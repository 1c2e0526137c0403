//! Handle resolution and reverse lookup.

use std::ptr::NonNull;

use crate::api::handle::Loc;
use crate::api::stack::FrameStack;

impl FrameStack {
    /// The data pointer stored at `loc`.
    ///
    /// `None` if the handle is invalid or stale, or the block has no data.
    pub fn resolve(&self, loc: Loc) -> Option<NonNull<u8>> {
        self.block(loc)?.data.ptr()
    }

    /// Find the handle of the first live block whose data is `ptr`.
    ///
    /// Scans every frame from the bottom up, slots in insertion order. This
    /// is linear in the number of slots; keep the handle from allocation
    /// time when you can.
    pub fn find_handle(&self, ptr: *const u8) -> Option<Loc> {
        self.frames().iter().enumerate().find_map(|(index, frame)| {
            frame
                .blocks()
                .find(|(_, block)| block.data.ptr().is_some_and(|p| p.as_ptr() as *const u8 == ptr))
                .map(|(slot, _)| Loc::new(index, slot, frame.generation()))
        })
    }

    /// Whether `loc` refers to a live block.
    pub fn is_live(&self, loc: Loc) -> bool {
        self.block(loc).is_some()
    }

    /// Whether `loc` refers to a live block whose memory the stack owns.
    pub fn is_owned(&self, loc: Loc) -> bool {
        self.block(loc)
            .is_some_and(|block| block.data.owned().is_some())
    }
}
