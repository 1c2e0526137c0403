//! Allocation backends.
//!
//! Frames, slots and owned memory blocks.
//! **`allocators::raw` is the only module that calls the system allocator.**

pub(crate) mod frame;
pub(crate) mod raw;
