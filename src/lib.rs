//! # framestack
//!
//! A LIFO region allocator: allocations are grouped into nested frames, and
//! popping a frame releases everything allocated since the matching push.
//!
//! ## Features
//!
//! - Frames pushed and popped as a stack, with a configurable depth limit
//! - `alloc` / `alloc_zeroed` / `realloc` / `free` over stable handles
//! - Finalizers per block: one taking the data pointer, one taking nothing
//! - Externally owned pointers tracked for notification only
//! - Lowering a block into an ancestor frame to extend its lifetime
//! - Handles that detect staleness instead of reading freed state
//! - RAII frame scopes and a thread-local stack per thread
//! - Diagnostics through the `log` facade, with an opt-in strict mode
//!
//! ## Release order
//!
//! Within a frame, blocks are released last-in first-out. Popping several
//! frames processes the newest frame first, so the overall order is a single
//! LIFO over every live block. For each block the pointer finalizer runs
//! first, then the no-argument finalizer, then owned memory is released.
//!
//! ## Quick Start
//!
//! ```rust
//! use framestack::{FrameStack, StackConfig};
//!
//! let mut stack = FrameStack::new(StackConfig::default());
//!
//! stack.push().unwrap();
//! let (outer, outer_loc) = stack.alloc(256, None).unwrap();
//!
//! stack.push().unwrap();
//! let (_inner, inner_loc) = stack
//!     .alloc(64, Some(Box::new(|ptr| println!("releasing {:p}", ptr))))
//!     .unwrap();
//! let kept = stack.lower(inner_loc, 1).unwrap();
//! stack.pop(1);
//!
//! assert_eq!(stack.resolve(outer_loc), Some(outer));
//! assert!(stack.is_live(kept));
//! stack.pop_all();
//! ```

pub mod api;
pub mod diagnostics;

mod allocators;
mod core;
mod util;

pub use crate::core::tls as local;

// Re-export public API at crate root for convenience
pub use api::config::StackConfig;
pub use api::error::StackError;
pub use api::finalizer::{PtrFinalizer, VoidFinalizer};
pub use api::handle::Loc;
pub use api::scope::FrameGuard;
pub use api::stack::FrameStack;
pub use api::stats::StackStats;

pub use allocators::raw::POISON_BYTE;

pub use diagnostics::{Diagnostic, DiagnosticKind, StrictMode, StrictModeGuard};
