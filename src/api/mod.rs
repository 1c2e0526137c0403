//! Public API for framestack.
//!
//! [`FrameStack`](stack::FrameStack) is defined in `stack`; its operations
//! are split across the sibling modules by concern.

pub mod alloc;
pub mod config;
pub mod error;
pub mod finalizer;
pub mod handle;
pub mod lower;
pub mod register;
pub mod resolve;
pub mod scope;
pub mod stack;
pub mod stats;
