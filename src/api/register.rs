//! External registration and finalizer management.

use std::ptr::NonNull;

use log::trace;

use crate::allocators::frame::{Block, BlockData};
use crate::api::error::StackError;
use crate::api::finalizer::{Finalizers, PtrFinalizer, VoidFinalizer};
use crate::api::handle::Loc;
use crate::api::stack::FrameStack;
use crate::fs_emit;

impl FrameStack {
    /// Track a pointer the caller owns.
    ///
    /// `finalizer` is called with `ptr` when the block is freed or its frame
    /// is popped. The stack never deallocates `ptr`.
    pub fn register_external(
        &mut self,
        ptr: NonNull<u8>,
        finalizer: PtrFinalizer,
    ) -> Result<Loc, StackError> {
        let index = self.reserve_top()?;
        let loc = self.push_into(index, Block::borrowed(ptr, Finalizers::with_ptr(finalizer)));
        trace!("register external {:p} at {}", ptr, loc);
        Ok(loc)
    }

    /// Register a callback to run when the top frame is popped.
    pub fn register_void(&mut self, finalizer: VoidFinalizer) -> Result<Loc, StackError> {
        let index = self.reserve_top()?;
        let loc = self.push_into(index, Block::detached(Finalizers::with_void(finalizer)));
        trace!("register callback at {}", loc);
        Ok(loc)
    }

    /// Replace the block's pointer finalizer.
    ///
    /// Returns `false` if the handle is invalid or the block has no data to
    /// pass to the finalizer.
    pub fn set_finalizer(&mut self, loc: Loc, finalizer: PtrFinalizer) -> bool {
        let Ok(block) = self.live_block_mut(loc) else {
            return false;
        };
        if matches!(block.data, BlockData::Detached) {
            fs_emit!(FS202, "{}", loc);
            return false;
        }
        block.finalizers.set_ptr(finalizer);
        true
    }

    /// Replace the block's no-argument finalizer.
    pub fn set_void_finalizer(&mut self, loc: Loc, finalizer: VoidFinalizer) -> bool {
        match self.live_block_mut(loc) {
            Ok(block) => {
                block.finalizers.set_void(finalizer);
                true
            }
            Err(_) => false,
        }
    }

    /// Drop both finalizers of a block without running them.
    ///
    /// The block itself stays; owned memory is still released at pop.
    pub fn unregister(&mut self, loc: Loc) -> bool {
        match self.live_block_mut(loc) {
            Ok(block) => {
                block.finalizers.clear();
                true
            }
            Err(_) => false,
        }
    }
}
