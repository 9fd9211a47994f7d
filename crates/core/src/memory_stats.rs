//! Heap object statistics
//!
//! Each `Heap` counts its own allocations and frees. The counters are read by
//! the at-exit report and by tests asserting "freed exactly once, no leak".
//!
//! ```text
//! live = allocated - freed
//! peak_live = max(live) over the heap's lifetime
//! ```
//!
//! Updates are plain integer bumps on the owning heap; there is no shared
//! registry because a heap is never touched by more than one thread.

/// Allocation counters for one heap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects ever allocated
    pub allocated: u64,
    /// Objects freed (refcount reached zero)
    pub freed: u64,
    /// High-water mark of simultaneously live objects
    pub peak_live: u64,
}

impl HeapStats {
    /// Objects currently alive
    #[inline]
    pub fn live(&self) -> u64 {
        self.allocated - self.freed
    }

    #[inline]
    pub(crate) fn record_alloc(&mut self) {
        self.allocated += 1;
        let live = self.live();
        if live > self.peak_live {
            self.peak_live = live;
        }
    }

    #[inline]
    pub(crate) fn record_free(&mut self) {
        debug_assert!(self.freed < self.allocated, "more frees than allocations");
        self.freed += 1;
    }
}
