//! Error type for stack operations.

use std::error::Error;
use std::fmt;

use crate::api::handle::Loc;

/// Errors reported by [`FrameStack`](crate::FrameStack) operations.
///
/// None of these leave the stack in a changed state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// No frame has been pushed.
    EmptyStack,
    /// The stack already holds `max_depth` frames.
    DepthExceeded {
        /// Configured limit.
        max_depth: usize,
    },
    /// The system allocator could not provide `size` bytes.
    OutOfMemory {
        /// Number of bytes requested.
        size: usize,
    },
    /// A frame's slot storage could not grow.
    GrowthFailed {
        /// Index of the frame that needed to grow.
        frame: usize,
    },
    /// `size` and `align` do not form a valid layout.
    InvalidLayout {
        /// Requested size.
        size: usize,
        /// Requested alignment.
        align: usize,
    },
    /// The handle does not refer to a live block.
    InvalidHandle(Loc),
    /// The block's memory is not owned by the stack.
    NotOwned(Loc),
    /// The block holds a value placed by `alloc_value` and cannot be resized.
    TypedValue(Loc),
    /// A configuration value is out of range.
    InvalidConfig(&'static str),
    /// The thread-local stack is already borrowed.
    Reentrant,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStack => write!(f, "no frame has been pushed"),
            Self::DepthExceeded { max_depth } => {
                write!(f, "frame stack is full ({max_depth} frames)")
            }
            Self::OutOfMemory { size } => write!(f, "out of memory allocating {size} bytes"),
            Self::GrowthFailed { frame } => write!(f, "could not grow frame {frame}"),
            Self::InvalidLayout { size, align } => {
                write!(f, "invalid layout: size {size}, align {align}")
            }
            Self::InvalidHandle(loc) => write!(f, "invalid or stale handle: {loc}"),
            Self::NotOwned(loc) => write!(f, "block at {loc} is not owned by the stack"),
            Self::TypedValue(loc) => write!(f, "block at {loc} holds a typed value and cannot be resized"),
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
            Self::Reentrant => write!(f, "thread-local frame stack is already in use"),
        }
    }
}

impl Error for StackError {}
