//! Layout utilities.

use std::alloc::Layout;

/// Build the layout for an untyped block of `size` bytes.
///
/// Returns `None` if `align` is not a power of two or the rounded size
/// would overflow `isize`.
#[inline]
pub fn block_layout(size: usize, align: usize) -> Option<Layout> {
    Layout::from_size_align(size, align).ok()
}

/// Same alignment, different size.
#[inline]
pub fn resized(layout: Layout, new_size: usize) -> Option<Layout> {
    Layout::from_size_align(new_size, layout.align()).ok()
}
