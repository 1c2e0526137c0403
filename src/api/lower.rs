//! Lowering: moving a block into an ancestor frame.
//!
//! Popping a frame releases everything in it. To keep one block alive past
//! its frame, its record is moved down the stack; the block then lives as
//! long as the destination frame.

use log::trace;

use crate::api::error::StackError;
use crate::api::handle::Loc;
use crate::api::stack::FrameStack;
use crate::fs_emit;

impl FrameStack {
    /// Move a block `num_frames` frames down (clamped at the bottom frame).
    ///
    /// The block is appended to the destination frame and the source slot
    /// becomes a tombstone. Returns the block's new handle; the old one is
    /// no longer valid. With `num_frames == 0` the block moves to the end of
    /// its own frame, so it is released after everything allocated so far.
    ///
    /// Fails without moving anything if the handle is invalid or the
    /// destination frame cannot grow.
    pub fn lower(&mut self, loc: Loc, num_frames: usize) -> Result<Loc, StackError> {
        if self.block(loc).is_none() {
            fs_emit!(FS201, "{}", loc);
            return Err(StackError::InvalidHandle(loc));
        }

        let dest = loc.frame_index().saturating_sub(num_frames);
        let grown = self
            .frame_at_mut(dest)
            .is_some_and(|frame| frame.reserve_one());
        if !grown {
            fs_emit!(FS104, "frame {}", dest);
            return Err(StackError::GrowthFailed { frame: dest });
        }

        let Some(block) = self.take(loc) else {
            return Err(StackError::InvalidHandle(loc));
        };
        let new_loc = self.push_into(dest, block);

        self.counters.lowered += 1;
        trace!("lower {} to {}", loc, new_loc);
        Ok(new_loc)
    }
}
