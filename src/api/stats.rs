//! Stack statistics.

use crate::util::size::format_bytes;

/// Snapshot of a stack's bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackStats {
    /// Frames currently pushed.
    pub depth: usize,

    /// Highest depth reached.
    pub peak_depth: usize,

    /// Blocks that are still live across all frames.
    pub live_blocks: usize,

    /// Freed or lowered-away slots still held by their frames.
    pub tombstones: usize,

    /// Bytes of stack-owned memory currently allocated.
    pub owned_bytes: usize,

    /// Peak owned bytes (high water mark).
    pub peak_owned_bytes: usize,

    /// Owned allocations performed.
    pub allocations: u64,

    /// Blocks released, by `free` or by popping.
    pub releases: u64,

    /// Finalizers invoked.
    pub finalizers_run: u64,

    /// Successful `lower` calls.
    pub lowered: u64,
}

impl StackStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in use, tombstones included.
    pub fn slots(&self) -> usize {
        self.live_blocks + self.tombstones
    }

    /// Fraction of slots that are tombstones.
    pub fn tombstone_ratio(&self) -> f64 {
        if self.slots() == 0 {
            return 0.0;
        }
        self.tombstones as f64 / self.slots() as f64
    }
}

impl std::fmt::Display for StackStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Frame Stack Statistics:")?;
        writeln!(f, "  Depth:        {} (peak {})", self.depth, self.peak_depth)?;
        writeln!(f, "  Live blocks:  {}", self.live_blocks)?;
        writeln!(f, "  Tombstones:   {}", self.tombstones)?;
        writeln!(f, "  Owned:        {}", format_bytes(self.owned_bytes))?;
        writeln!(f, "  Peak owned:   {}", format_bytes(self.peak_owned_bytes))?;
        writeln!(f, "  Allocations:  {}", self.allocations)?;
        writeln!(f, "  Releases:     {}", self.releases)?;
        writeln!(f, "  Finalizers:   {}", self.finalizers_run)?;
        writeln!(f, "  Lowered:      {}", self.lowered)?;
        Ok(())
    }
}

/// Running counters kept by the stack; combined with a frame scan in `stats()`.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub peak_depth: usize,
    pub owned_bytes: usize,
    pub peak_owned_bytes: usize,
    pub allocations: u64,
    pub releases: u64,
    pub finalizers_run: u64,
    pub lowered: u64,
}

impl Counters {
    pub fn record_depth(&mut self, depth: usize) {
        self.peak_depth = self.peak_depth.max(depth);
    }

    pub fn record_alloc(&mut self, bytes: usize) {
        self.allocations += 1;
        self.add_owned(bytes);
    }

    pub fn record_resize(&mut self, old: usize, new: usize) {
        self.owned_bytes = self.owned_bytes.saturating_sub(old);
        self.add_owned(new);
    }

    pub fn record_release(&mut self, bytes: usize, finalizers: u64) {
        self.releases += 1;
        self.finalizers_run += finalizers;
        self.owned_bytes = self.owned_bytes.saturating_sub(bytes);
    }

    fn add_owned(&mut self, bytes: usize) {
        self.owned_bytes += bytes;
        self.peak_owned_bytes = self.peak_owned_bytes.max(self.owned_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_peak() {
        let mut counters = Counters::default();
        counters.record_alloc(100);
        counters.record_alloc(50);
        counters.record_release(100, 1);
        counters.record_resize(50, 20);

        assert_eq!(counters.owned_bytes, 20);
        assert_eq!(counters.peak_owned_bytes, 150);
        assert_eq!(counters.allocations, 2);
        assert_eq!(counters.releases, 1);
        assert_eq!(counters.finalizers_run, 1);
    }

    #[test]
    fn test_tombstone_ratio() {
        let stats = StackStats {
            live_blocks: 3,
            tombstones: 1,
            ..StackStats::new()
        };
        assert_eq!(stats.slots(), 4);
        assert!((stats.tombstone_ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(StackStats::new().tombstone_ratio(), 0.0);
    }

    #[test]
    fn test_display_mentions_sizes() {
        let stats = StackStats {
            owned_bytes: 2048,
            ..StackStats::new()
        };
        assert!(stats.to_string().contains("2.00 KB"));
    }
}
