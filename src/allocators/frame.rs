//! Frames and the block slots they hold.
//!
//! A frame is an insertion-ordered list of slots. Freed slots become
//! tombstones and are never reused, so a slot index stays meaningful for as
//! long as its frame lives.

use std::ptr::NonNull;

use crate::allocators::raw::RawBlock;
use crate::api::finalizer::Finalizers;

/// What a block points at.
#[derive(Debug)]
pub(crate) enum BlockData {
    /// Memory the stack allocated and must release.
    Owned(RawBlock),
    /// Owned memory holding a value moved in by `alloc_value`. Its size is
    /// fixed to the value's layout.
    Typed(RawBlock),
    /// Memory owned by the caller; the stack only notifies.
    Borrowed(NonNull<u8>),
    /// No data, only finalizers.
    Detached,
}

impl BlockData {
    pub fn ptr(&self) -> Option<NonNull<u8>> {
        match self {
            Self::Owned(raw) | Self::Typed(raw) => Some(raw.ptr()),
            Self::Borrowed(ptr) => Some(*ptr),
            Self::Detached => None,
        }
    }

    /// The stack's own memory, typed or not.
    pub fn owned(&self) -> Option<&RawBlock> {
        match self {
            Self::Owned(raw) | Self::Typed(raw) => Some(raw),
            Self::Borrowed(_) | Self::Detached => None,
        }
    }
}

/// One tracked entry.
#[derive(Debug)]
pub(crate) struct Block {
    pub data: BlockData,
    pub finalizers: Finalizers,
}

impl Block {
    pub fn owned(raw: RawBlock, finalizers: Finalizers) -> Self {
        Self {
            data: BlockData::Owned(raw),
            finalizers,
        }
    }

    pub fn typed(raw: RawBlock, finalizers: Finalizers) -> Self {
        Self {
            data: BlockData::Typed(raw),
            finalizers,
        }
    }

    pub fn borrowed(ptr: NonNull<u8>, finalizers: Finalizers) -> Self {
        Self {
            data: BlockData::Borrowed(ptr),
            finalizers,
        }
    }

    pub fn detached(finalizers: Finalizers) -> Self {
        Self {
            data: BlockData::Detached,
            finalizers,
        }
    }

    /// Bytes of owned memory, zero for borrowed or detached blocks.
    pub fn owned_size(&self) -> usize {
        self.data.owned().map_or(0, RawBlock::size)
    }

    /// Run the finalizers, then release owned memory.
    ///
    /// Returns the number of finalizers that ran. If a finalizer panics the
    /// memory is still deallocated while unwinding.
    pub fn release(self, poison: bool) -> u64 {
        let Block { data, finalizers } = self;
        let ran = finalizers.run(data.ptr());
        if let BlockData::Owned(raw) | BlockData::Typed(raw) = data {
            raw.release(poison);
        }
        ran
    }
}

/// A slot in a frame: either a live block or a tombstone.
#[derive(Debug)]
pub(crate) enum Slot {
    Vacant,
    Occupied(Block),
}

/// One level of the stack.
#[derive(Debug)]
pub(crate) struct Frame {
    slots: Vec<Slot>,
    generation: u64,
}

impl Frame {
    /// Create an empty frame with room for `capacity` slots.
    ///
    /// Returns `None` if the slot storage cannot be allocated.
    pub fn with_capacity(capacity: usize, generation: u64) -> Option<Self> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).ok()?;
        Some(Self { slots, generation })
    }

    /// Make sure one more slot fits, doubling the capacity if full.
    ///
    /// Existing slots are untouched if growth fails.
    pub fn reserve_one(&mut self) -> bool {
        if self.slots.len() < self.slots.capacity() {
            return true;
        }
        let additional = self.slots.capacity().max(1);
        self.slots.try_reserve_exact(additional).is_ok()
    }

    /// Append a block and return its slot index.
    pub fn push(&mut self, block: Block) -> usize {
        self.slots.push(Slot::Occupied(block));
        self.slots.len() - 1
    }

    pub fn get(&self, slot: usize) -> Option<&Block> {
        match self.slots.get(slot)? {
            Slot::Occupied(block) => Some(block),
            Slot::Vacant => None,
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Block> {
        match self.slots.get_mut(slot)? {
            Slot::Occupied(block) => Some(block),
            Slot::Vacant => None,
        }
    }

    /// Take a block out, leaving a tombstone behind.
    pub fn take(&mut self, slot: usize) -> Option<Block> {
        let entry = self.slots.get_mut(slot)?;
        match std::mem::replace(entry, Slot::Vacant) {
            Slot::Occupied(block) => Some(block),
            Slot::Vacant => None,
        }
    }

    /// Remove every live block, last inserted first.
    pub fn drain_lifo(&mut self) -> impl Iterator<Item = Block> {
        std::mem::take(&mut self.slots)
            .into_iter()
            .rev()
            .filter_map(|slot| match slot {
                Slot::Occupied(block) => Some(block),
                Slot::Vacant => None,
            })
    }

    /// Live blocks in slot order, with their indices.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Occupied(block) => Some((i, block)),
            Slot::Vacant => None,
        })
    }

    /// Number of occupied slots, tombstones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn live_count(&self) -> usize {
        self.blocks().count()
    }

    pub fn tombstones(&self) -> usize {
        self.len() - self.live_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(log: &Rc<RefCell<Vec<usize>>>, id: usize) -> Block {
        let log = Rc::clone(log);
        Block::detached(Finalizers::with_void(Box::new(move || log.borrow_mut().push(id))))
    }

    #[test]
    fn test_growth_doubles() {
        let mut frame = Frame::with_capacity(2, 0).unwrap();
        for _ in 0..2 {
            assert!(frame.reserve_one());
            frame.push(Block::detached(Finalizers::none()));
        }
        assert_eq!(frame.capacity(), 2);

        assert!(frame.reserve_one());
        assert!(frame.capacity() >= 4);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_take_leaves_tombstone() {
        let mut frame = Frame::with_capacity(4, 7).unwrap();
        let a = frame.push(Block::detached(Finalizers::none()));
        let b = frame.push(Block::detached(Finalizers::none()));

        assert!(frame.take(a).is_some());
        assert!(frame.take(a).is_none());
        assert!(frame.get(a).is_none());
        assert!(frame.get(b).is_some());

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.live_count(), 1);
        assert_eq!(frame.tombstones(), 1);
        assert_eq!(frame.generation(), 7);
    }

    #[test]
    fn test_drain_is_lifo_and_skips_tombstones() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame = Frame::with_capacity(4, 0).unwrap();
        for id in 0..4 {
            frame.push(recording(&log, id));
        }
        frame.take(2);

        for block in frame.drain_lifo() {
            block.release(false);
        }

        assert_eq!(*log.borrow(), vec![3, 1, 0]);
        assert_eq!(frame.len(), 0);
    }

    #[test]
    fn test_borrowed_data_pointer() {
        let mut value = 5u32;
        let ptr = NonNull::from(&mut value).cast::<u8>();
        let block = Block::borrowed(ptr, Finalizers::none());

        assert_eq!(block.data.ptr(), Some(ptr));
        assert_eq!(block.owned_size(), 0);
        assert_eq!(block.release(false), 0);
    }
}
