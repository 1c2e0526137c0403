//! Stack configuration.

use crate::api::error::StackError;

/// Default maximum number of frames.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Default number of slots reserved when a frame is pushed.
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// Default alignment for untyped allocations.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Configuration for a [`FrameStack`](crate::FrameStack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Maximum number of frames (default: 4096)
    pub max_depth: usize,

    /// Slots reserved per frame on push; doubles when exhausted (default: 64)
    pub initial_frame_capacity: usize,

    /// Alignment of `alloc`/`alloc_zeroed` memory, a power of two (default: 16)
    pub alignment: usize,

    /// Fill owned memory with `0xCD` before releasing it
    pub poison_on_release: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            initial_frame_capacity: DEFAULT_FRAME_CAPACITY,
            alignment: DEFAULT_ALIGNMENT,
            poison_on_release: cfg!(feature = "debug"),
        }
    }
}

impl StackConfig {
    /// Create a minimal config for tests or constrained environments.
    pub fn minimal() -> Self {
        Self {
            max_depth: 64,
            initial_frame_capacity: 4,
            alignment: 8,
            poison_on_release: false,
        }
    }

    /// Create a config for deeply nested, allocation-heavy callers.
    pub fn deep() -> Self {
        Self {
            max_depth: 1 << 16,
            initial_frame_capacity: 256,
            alignment: DEFAULT_ALIGNMENT,
            poison_on_release: false,
        }
    }

    /// Builder pattern: set the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder pattern: set the initial per-frame capacity.
    pub fn with_frame_capacity(mut self, capacity: usize) -> Self {
        self.initial_frame_capacity = capacity;
        self
    }

    /// Builder pattern: set the alignment for untyped allocations.
    pub fn with_alignment(mut self, align: usize) -> Self {
        self.alignment = align;
        self
    }

    /// Builder pattern: enable poisoning of released memory.
    pub fn with_poison(mut self, enable: bool) -> Self {
        self.poison_on_release = enable;
        self
    }

    /// Check every field, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), StackError> {
        if self.max_depth == 0 {
            return Err(StackError::InvalidConfig("max_depth must be at least 1"));
        }
        if self.initial_frame_capacity == 0 {
            return Err(StackError::InvalidConfig(
                "initial_frame_capacity must be at least 1",
            ));
        }
        if !self.alignment.is_power_of_two() {
            return Err(StackError::InvalidConfig("alignment must be a power of two"));
        }
        Ok(())
    }

    /// Replace out-of-range fields with their defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        if self.max_depth == 0 {
            self.max_depth = DEFAULT_MAX_DEPTH;
        }
        if self.initial_frame_capacity == 0 {
            self.initial_frame_capacity = DEFAULT_FRAME_CAPACITY;
        }
        if !self.alignment.is_power_of_two() {
            self.alignment = DEFAULT_ALIGNMENT;
        }
        self
    }
}
