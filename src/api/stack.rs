//! The frame store: a LIFO stack of frames.

use log::trace;

use crate::allocators::frame::{Block, Frame};
use crate::api::config::StackConfig;
use crate::api::error::StackError;
use crate::api::handle::Loc;
use crate::api::stats::{Counters, StackStats};
use crate::fs_emit;

/// A stack of allocation frames.
///
/// Allocations and registrations go into the top frame. Popping a frame
/// runs the finalizers of its blocks, last registered first, and releases
/// the memory the stack owns.
///
/// A `FrameStack` is single-threaded: it is neither `Send` nor `Sync`.
/// Use one instance per thread (see [`local`](crate::local)).
///
/// # Example
///
/// ```rust
/// use framestack::FrameStack;
///
/// let mut stack = FrameStack::with_defaults();
/// stack.push().unwrap();
/// let (ptr, loc) = stack.alloc_zeroed(64, None).unwrap();
/// assert_eq!(stack.resolve(loc), Some(ptr));
/// stack.pop(1);
/// assert!(stack.resolve(loc).is_none());
/// ```
pub struct FrameStack {
    config: StackConfig,
    frames: Vec<Frame>,
    next_generation: u64,
    pub(crate) counters: Counters,
}

impl FrameStack {
    /// Create a stack, replacing invalid config fields with defaults.
    pub fn new(config: StackConfig) -> Self {
        if let Err(err) = config.validate() {
            fs_emit!(FS901, "{}", err);
        }
        Self::from_valid(config.sanitized())
    }

    /// Create a stack, rejecting an invalid config.
    pub fn try_new(config: StackConfig) -> Result<Self, StackError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Create a stack with the default configuration.
    pub fn with_defaults() -> Self {
        Self::from_valid(StackConfig::default())
    }

    fn from_valid(config: StackConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            next_generation: 0,
            counters: Counters::default(),
        }
    }

    /// Push a new, empty frame. Returns its index.
    pub fn push(&mut self) -> Result<usize, StackError> {
        if self.frames.len() >= self.config.max_depth {
            fs_emit!(FS001, "depth {}", self.frames.len());
            return Err(StackError::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }

        let index = self.frames.len();
        if self.frames.try_reserve(1).is_err() {
            fs_emit!(FS002);
            return Err(StackError::GrowthFailed { frame: index });
        }
        let capacity = self.config.initial_frame_capacity;
        let Some(frame) = Frame::with_capacity(capacity, self.next_generation) else {
            fs_emit!(FS002);
            return Err(StackError::OutOfMemory {
                size: capacity.saturating_mul(std::mem::size_of::<Block>()),
            });
        };

        trace!("push frame {} (gen {})", index, frame.generation());
        self.next_generation += 1;
        self.frames.push(frame);
        self.counters.record_depth(self.frames.len());
        Ok(index)
    }

    /// Pop up to `count` frames, releasing their blocks in LIFO order.
    ///
    /// Popping more frames than exist just empties the stack. Returns the
    /// number of frames popped.
    ///
    /// Finalizers are expected not to panic. If one does, the panic
    /// propagates with its frame already off the stack: the rest of that
    /// frame's memory is deallocated while unwinding, but its remaining
    /// finalizers are dropped without running.
    pub fn pop(&mut self, count: usize) -> usize {
        let mut popped = 0;
        while popped < count {
            let Some(mut frame) = self.frames.pop() else {
                break;
            };
            trace!(
                "pop frame {} (gen {}, {} slots)",
                self.frames.len(),
                frame.generation(),
                frame.len()
            );
            for block in frame.drain_lifo() {
                self.release(block);
            }
            popped += 1;
        }
        popped
    }

    /// Pop every frame.
    pub fn pop_all(&mut self) -> usize {
        self.pop(self.frames.len())
    }

    /// Number of frames pushed.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Index of the top frame, `None` when empty.
    pub fn top(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Occupied slot count of a frame, tombstones included.
    pub fn frame_len(&self, index: usize) -> Option<usize> {
        self.frames.get(index).map(Frame::len)
    }

    /// Slot capacity of a frame.
    pub fn frame_capacity(&self, index: usize) -> Option<usize> {
        self.frames.get(index).map(Frame::capacity)
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Get current statistics.
    pub fn stats(&self) -> StackStats {
        let live_blocks = self.frames.iter().map(Frame::live_count).sum();
        let tombstones = self.frames.iter().map(Frame::tombstones).sum();

        StackStats {
            depth: self.depth(),
            peak_depth: self.counters.peak_depth,
            live_blocks,
            tombstones,
            owned_bytes: self.counters.owned_bytes,
            peak_owned_bytes: self.counters.peak_owned_bytes,
            allocations: self.counters.allocations,
            releases: self.counters.releases,
            finalizers_run: self.counters.finalizers_run,
            lowered: self.counters.lowered,
        }
    }

    // -------------------------------------------------------------------------
    // Handle validation and slot access shared by the operation modules
    // -------------------------------------------------------------------------

    /// The frame a handle points into, if it is still the same frame.
    pub(crate) fn frame_of(&self, loc: Loc) -> Option<&Frame> {
        self.frames
            .get(loc.frame_index())
            .filter(|frame| frame.generation() == loc.generation())
    }

    pub(crate) fn frame_of_mut(&mut self, loc: Loc) -> Option<&mut Frame> {
        self.frames
            .get_mut(loc.frame_index())
            .filter(|frame| frame.generation() == loc.generation())
    }

    pub(crate) fn block(&self, loc: Loc) -> Option<&Block> {
        self.frame_of(loc)?.get(loc.slot_index())
    }

    /// Like [`block_mut`](Self::block_mut) but reports an invalid handle.
    pub(crate) fn live_block_mut(&mut self, loc: Loc) -> Result<&mut Block, StackError> {
        if self.block(loc).is_none() {
            fs_emit!(FS201, "{}", loc);
            return Err(StackError::InvalidHandle(loc));
        }
        self.block_mut(loc).ok_or(StackError::InvalidHandle(loc))
    }

    pub(crate) fn block_mut(&mut self, loc: Loc) -> Option<&mut Block> {
        self.frame_of_mut(loc)?.get_mut(loc.slot_index())
    }

    /// Remove a block, leaving a tombstone.
    pub(crate) fn take(&mut self, loc: Loc) -> Option<Block> {
        self.frame_of_mut(loc)?.take(loc.slot_index())
    }

    pub(crate) fn frame_at_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    pub(crate) fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Make room for one more block in the top frame. Returns its index.
    pub(crate) fn reserve_top(&mut self) -> Result<usize, StackError> {
        let Some(index) = self.top() else {
            fs_emit!(FS101);
            return Err(StackError::EmptyStack);
        };
        if !self.frames[index].reserve_one() {
            fs_emit!(FS104, "frame {}", index);
            return Err(StackError::GrowthFailed { frame: index });
        }
        Ok(index)
    }

    /// Append to frame `index`, which must have a free slot reserved.
    pub(crate) fn push_into(&mut self, index: usize, block: Block) -> Loc {
        let frame = &mut self.frames[index];
        let slot = frame.push(block);
        Loc::new(index, slot, frame.generation())
    }

    /// Run a block's finalizers and release its memory.
    pub(crate) fn release(&mut self, block: Block) {
        let bytes = block.owned_size();
        let ran = block.release(self.config.poison_on_release);
        self.counters.record_release(bytes, ran);
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Drop for FrameStack {
    fn drop(&mut self) {
        self.pop_all();
    }
}

impl std::fmt::Debug for FrameStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStack")
            .field("depth", &self.depth())
            .field("max_depth", &self.config.max_depth)
            .field("next_generation", &self.next_generation)
            .finish()
    }
}
