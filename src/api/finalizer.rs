//! Finalizers attached to blocks.
//!
//! A block carries at most one finalizer of each shape:
//!
//! - a **pointer finalizer**, called with the block's data pointer
//! - a **void finalizer**, called with no arguments
//!
//! When the block is released the pointer finalizer fires first, then the
//! void finalizer. Both are `FnOnce`, so each can run at most once.

use std::fmt;
use std::ptr::NonNull;

/// Callback receiving the released block's data pointer.
pub type PtrFinalizer = Box<dyn FnOnce(NonNull<u8>)>;

/// Callback with no arguments.
pub type VoidFinalizer = Box<dyn FnOnce()>;

/// The finalizer pair stored on a block.
#[derive(Default)]
pub(crate) struct Finalizers {
    on_data: Option<PtrFinalizer>,
    on_release: Option<VoidFinalizer>,
}

impl Finalizers {
    /// No finalizers.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only a pointer finalizer.
    pub fn with_ptr(f: PtrFinalizer) -> Self {
        Self {
            on_data: Some(f),
            on_release: None,
        }
    }

    /// Only a void finalizer.
    pub fn with_void(f: VoidFinalizer) -> Self {
        Self {
            on_data: None,
            on_release: Some(f),
        }
    }

    /// Replace the pointer finalizer.
    pub fn set_ptr(&mut self, f: PtrFinalizer) {
        self.on_data = Some(f);
    }

    /// Replace the void finalizer.
    pub fn set_void(&mut self, f: VoidFinalizer) {
        self.on_release = Some(f);
    }

    /// Drop both finalizers without running them.
    pub fn clear(&mut self) {
        self.on_data = None;
        self.on_release = None;
    }

    pub fn has_ptr(&self) -> bool {
        self.on_data.is_some()
    }

    pub fn has_void(&self) -> bool {
        self.on_release.is_some()
    }

    /// Run the finalizers in dispatch order. Returns how many ran.
    ///
    /// The pointer finalizer only runs when there is data to hand it.
    pub(crate) fn run(self, data: Option<NonNull<u8>>) -> u64 {
        let mut ran = 0;
        if let (Some(f), Some(ptr)) = (self.on_data, data) {
            f(ptr);
            ran += 1;
        }
        if let Some(f) = self.on_release {
            f();
            ran += 1;
        }
        ran
    }
}

impl fmt::Debug for Finalizers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finalizers")
            .field("on_data", &self.has_ptr())
            .field("on_release", &self.has_void())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_pointer_finalizer_runs_before_void() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fin = Finalizers::none();

        let l = Rc::clone(&log);
        fin.set_void(Box::new(move || l.borrow_mut().push("void")));
        let l = Rc::clone(&log);
        fin.set_ptr(Box::new(move |_| l.borrow_mut().push("ptr")));

        let mut byte = 0u8;
        let ran = fin.run(Some(NonNull::from(&mut byte)));

        assert_eq!(ran, 2);
        assert_eq!(*log.borrow(), vec!["ptr", "void"]);
    }

    #[test]
    fn test_pointer_finalizer_skipped_without_data() {
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let fin = Finalizers::with_ptr(Box::new(move |_| *h.borrow_mut() += 1));

        assert_eq!(fin.run(None), 0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_set_replaces_previous() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let mut fin = Finalizers::with_void(Box::new(move || l.borrow_mut().push(1)));
        let l = Rc::clone(&log);
        fin.set_void(Box::new(move || l.borrow_mut().push(2)));

        fin.run(None);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_clear() {
        let mut fin = Finalizers::with_void(Box::new(|| panic!("cleared finalizer ran")));
        assert!(fin.has_void());
        fin.clear();
        assert!(!fin.has_ptr() && !fin.has_void());
        assert_eq!(fin.run(None), 0);
    }
}
