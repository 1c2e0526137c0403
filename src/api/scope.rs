//! Frame scope guards for RAII-style frame management.

use std::ops::{Deref, DerefMut};

use crate::api::error::StackError;
use crate::api::stack::FrameStack;

/// A guard that represents a pushed frame.
///
/// When dropped, every frame above the depth recorded before the push is
/// popped, including frames pushed through the guard and not popped yet.
/// The guard dereferences to the stack, so allocations go through it.
///
/// # Example
///
/// ```rust
/// use framestack::FrameStack;
///
/// let mut stack = FrameStack::with_defaults();
/// {
///     let mut scope = stack.scope().unwrap();
///     let (_ptr, _loc) = scope.alloc(1024, None).unwrap();
/// } // released here
/// assert!(stack.is_empty());
/// ```
pub struct FrameGuard<'a> {
    stack: &'a mut FrameStack,
    depth_on_entry: usize,
}

impl<'a> FrameGuard<'a> {
    /// Depth of the stack before this guard's frame was pushed.
    pub fn depth_on_entry(&self) -> usize {
        self.depth_on_entry
    }
}

impl FrameStack {
    /// Push a frame that is popped when the returned guard is dropped.
    pub fn scope(&mut self) -> Result<FrameGuard<'_>, StackError> {
        let depth_on_entry = self.depth();
        self.push()?;
        Ok(FrameGuard {
            stack: self,
            depth_on_entry,
        })
    }
}

impl Deref for FrameGuard<'_> {
    type Target = FrameStack;

    fn deref(&self) -> &FrameStack {
        &*self.stack
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut FrameStack {
        &mut *self.stack
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let extra = self.stack.depth().saturating_sub(self.depth_on_entry);
        self.stack.pop(extra);
    }
}
