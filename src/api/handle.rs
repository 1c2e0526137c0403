//! Block handles.

use std::fmt;

/// Location of a block: frame index, slot index and the frame's generation.
///
/// Handles are plain values. Operations that move a block (such as
/// [`FrameStack::lower`](crate::FrameStack::lower)) hand back a new `Loc`;
/// the old one then refers to a tombstone and is ignored by every operation.
///
/// The generation ties a handle to one particular pushed frame, so a handle
/// kept past its frame's pop never matches a later frame at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    frame: usize,
    slot: usize,
    generation: u64,
}

impl Loc {
    pub(crate) const fn new(frame: usize, slot: usize, generation: u64) -> Self {
        Self {
            frame,
            slot,
            generation,
        }
    }

    /// A handle that never resolves.
    pub const fn dangling() -> Self {
        Self {
            frame: usize::MAX,
            slot: usize::MAX,
            generation: u64::MAX,
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.frame == usize::MAX
    }

    /// Index of the frame holding the block (0 is the bottom frame).
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Position of the block within its frame.
    pub fn slot_index(&self) -> usize {
        self.slot
    }

    /// Generation of the frame the handle was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self::dangling()
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dangling() {
            return write!(f, "<dangling>");
        }
        write!(f, "frame {} (gen {}) slot {}", self.frame, self.generation, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_handle() {
        let loc = Loc::default();
        assert!(loc.is_dangling());
        assert_eq!(loc.to_string(), "<dangling>");
    }

    #[test]
    fn test_accessors_and_display() {
        let loc = Loc::new(2, 5, 9);
        assert!(!loc.is_dangling());
        assert_eq!(loc.frame_index(), 2);
        assert_eq!(loc.slot_index(), 5);
        assert_eq!(loc.generation(), 9);
        assert_eq!(loc.to_string(), "frame 2 (gen 9) slot 5");
    }

    #[test]
    fn test_generation_distinguishes_handles() {
        assert_ne!(Loc::new(0, 0, 1), Loc::new(0, 0, 2));
    }
}
