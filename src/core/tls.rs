//! Thread-local frame stack.
//!
//! Each thread gets its own [`FrameStack`], created lazily with
//! [`StackConfig::default()`] on first use. Finalizers run while the stack
//! is borrowed, so they must not call back into this module;
//! [`try_with_stack`] reports that as [`StackError::Reentrant`].

use std::cell::RefCell;

use crate::api::config::StackConfig;
use crate::api::error::StackError;
use crate::api::stack::FrameStack;

thread_local! {
    static STACK: RefCell<Option<FrameStack>> = const { RefCell::new(None) };
}

/// Run `f` against this thread's stack.
///
/// # Panics
///
/// Panics if called from inside another `with_stack` on the same thread,
/// for instance from a finalizer.
pub fn with_stack<R>(f: impl FnOnce(&mut FrameStack) -> R) -> R {
    STACK.with(|cell| {
        let mut slot = cell.borrow_mut();
        f(slot.get_or_insert_with(FrameStack::with_defaults))
    })
}

/// Like [`with_stack`], but returns an error instead of panicking on
/// re-entry.
pub fn try_with_stack<R>(f: impl FnOnce(&mut FrameStack) -> R) -> Result<R, StackError> {
    STACK.with(|cell| {
        let mut slot = cell.try_borrow_mut().map_err(|_| StackError::Reentrant)?;
        Ok(f(slot.get_or_insert_with(FrameStack::with_defaults)))
    })
}

/// Replace this thread's stack with a fresh one built from `config`.
///
/// The previous stack, if any, is dropped after the swap, which pops all of
/// its frames.
pub fn configure(config: StackConfig) -> Result<(), StackError> {
    let fresh = FrameStack::try_new(config)?;
    let previous = STACK.with(|cell| {
        cell.try_borrow_mut()
            .map(|mut slot| slot.replace(fresh))
            .map_err(|_| StackError::Reentrant)
    })?;
    drop(previous);
    Ok(())
}
