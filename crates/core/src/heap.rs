//! Heap Arena and Reference Counting
//!
//! Heap objects live in a vector of slots addressed by `ObjRef`. Each live
//! slot carries a manual refcount; an object is freed exactly once, when the
//! count reaches zero, after releasing every cell it owns.
//!
//! ## Slot Layout
//!
//! ```text
//! slots: [ Live{refs, obj} | Free{next} | Live{refs, obj} | ... ]
//!                               │
//!                 free_head ────┘   (singly linked through Free.next)
//! ```
//!
//! Freed slots are recycled through the free list. Their generation is bumped
//! on free, so a stale `ObjRef` is caught on use instead of silently aliasing
//! the slot's next object.
//!
//! ## Ownership Rules
//!
//! - `alloc_*` returns a reference with refcount 1, owned by the caller.
//! - `retain` adds an owner, `release` drops one.
//! - `copy` overwrites a slot: retain the new content, then release the old.
//!
//! Misuse (releasing a dead object, resolving a stale handle) is a bug in the
//! runtime itself, not in the program being run, and panics.

use crate::error::{Result, RuntimeError};
use crate::memory_stats::HeapStats;
use crate::value::{Cell, Kind, ObjRef, Object};

#[derive(Debug)]
enum SlotState {
    Live { refs: u32, object: Object },
    Free { next: Option<u32> },
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    state: SlotState,
}

/// Arena of reference-counted heap objects
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    stats: HeapStats,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate an object with refcount 1
    pub fn alloc(&mut self, object: Object) -> Result<ObjRef> {
        let kind = object.kind();
        let r = match self.free_head {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let SlotState::Free { next } = slot.state else {
                    panic!("heap: free list points at live slot {}", index);
                };
                self.free_head = next;
                slot.state = SlotState::Live { refs: 1, object };
                ObjRef {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| RuntimeError::AllocationFailure("a heap object".to_string()))?;
                self.slots.try_reserve(1)?;
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Live { refs: 1, object },
                });
                ObjRef {
                    index,
                    generation: 0,
                }
            }
        };
        self.stats.record_alloc();
        tracing::trace!(index = r.index, kind = kind.name(), "heap alloc");
        Ok(r)
    }

    /// Allocate a string holding a copy of `bytes`
    pub fn alloc_string(&mut self, bytes: &[u8]) -> Result<ObjRef> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes.len())
            .map_err(|_| RuntimeError::AllocationFailure("a string".to_string()))?;
        buf.extend_from_slice(bytes);
        self.alloc(Object::String(buf))
    }

    /// Allocate a pair; `head` and `tail` are moved in (not retained)
    pub fn alloc_pair(&mut self, head: Cell, tail: Cell) -> Result<ObjRef> {
        self.alloc(Object::Pair { head, tail })
    }

    /// Allocate an array of `len` Null cells
    pub fn alloc_array(&mut self, len: usize) -> Result<ObjRef> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| RuntimeError::AllocationFailure(format!("an array of {} cells", len)))?;
        cells.resize(len, Cell::Null);
        self.alloc(Object::Array(cells))
    }

    // =========================================================================
    // Refcounting
    // =========================================================================

    /// Add an owner to the cell's object (no-op for immediates)
    #[inline]
    pub fn retain(&mut self, cell: Cell) {
        if let Cell::Object(r) = cell {
            *self.refs_mut(r) += 1;
        }
    }

    /// Drop an owner from the cell's object, freeing it at zero
    ///
    /// Freeing releases the children, which may free them in turn. The walk
    /// uses an explicit worklist so a million-link list does not recurse.
    pub fn release(&mut self, cell: Cell) {
        let Cell::Object(r) = cell else {
            return;
        };
        if !self.decrement(r) {
            return;
        }

        let mut pending = Vec::new();
        self.free_slot(r, &mut pending);
        while let Some(child) = pending.pop() {
            if let Cell::Object(c) = child
                && self.decrement(c)
            {
                self.free_slot(c, &mut pending);
            }
        }
    }

    /// Overwrite `target` with `source`, sharing ownership of the new content
    /// and giving up ownership of the old.
    pub fn copy(&mut self, target: &mut Cell, source: Cell) {
        self.retain(source);
        let old = std::mem::replace(target, source);
        self.release(old);
    }

    /// Current refcount of a live object
    pub fn refcount(&self, r: ObjRef) -> u32 {
        match &self.slot(r).state {
            SlotState::Live { refs, .. } => *refs,
            SlotState::Free { .. } => unreachable!("slot() only returns live slots"),
        }
    }

    /// Whether `r` still names a live object
    pub fn is_live(&self, r: ObjRef) -> bool {
        self.slots.get(r.index as usize).is_some_and(|slot| {
            slot.generation == r.generation && matches!(slot.state, SlotState::Live { .. })
        })
    }

    fn decrement(&mut self, r: ObjRef) -> bool {
        let refs = self.refs_mut(r);
        assert!(*refs > 0, "heap: object {} released at refcount 0", r.index);
        *refs -= 1;
        *refs == 0
    }

    fn free_slot(&mut self, r: ObjRef, pending: &mut Vec<Cell>) {
        let slot = &mut self.slots[r.index as usize];
        let state = std::mem::replace(
            &mut slot.state,
            SlotState::Free {
                next: self.free_head,
            },
        );
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(r.index);
        self.stats.record_free();

        if let SlotState::Live { object, .. } = state {
            tracing::trace!(index = r.index, kind = object.kind().name(), "heap free");
            object.drain_children_into(pending);
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Abstract type of a cell
    pub fn kind(&self, cell: Cell) -> Kind {
        match cell {
            Cell::Null => Kind::Null,
            Cell::Float(_) => Kind::Float,
            Cell::Char(_) => Kind::Char,
            Cell::Object(r) => self.get(r).kind(),
        }
    }

    /// Borrow a live object
    pub fn get(&self, r: ObjRef) -> &Object {
        match &self.slot(r).state {
            SlotState::Live { object, .. } => object,
            SlotState::Free { .. } => unreachable!("slot() only returns live slots"),
        }
    }

    /// Mutably borrow a live object
    ///
    /// Replacing an owned cell through this borrow must go through
    /// `std::mem::replace` followed by `release` of the old cell.
    pub fn get_mut(&mut self, r: ObjRef) -> &mut Object {
        match &mut self.slot_mut(r).state {
            SlotState::Live { object, .. } => object,
            SlotState::Free { .. } => unreachable!("slot_mut() only returns live slots"),
        }
    }

    /// String bytes behind a cell, if it references a string
    pub fn string_bytes(&self, cell: Cell) -> Option<&[u8]> {
        match cell {
            Cell::Object(r) => match self.get(r) {
                Object::String(bytes) => Some(bytes),
                _ => None,
            },
            _ => None,
        }
    }

    /// Array elements behind a cell, if it references an array
    pub fn array_cells(&self, cell: Cell) -> Option<&[Cell]> {
        match cell {
            Cell::Object(r) => match self.get(r) {
                Object::Array(cells) => Some(cells),
                _ => None,
            },
            _ => None,
        }
    }

    /// Head and tail behind a cell, if it references a pair
    pub fn pair_fields(&self, cell: Cell) -> Option<(Cell, Cell)> {
        match cell {
            Cell::Object(r) => match self.get(r) {
                Object::Pair { head, tail } => Some((*head, *tail)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Allocation counters
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Number of live objects
    pub fn live_objects(&self) -> u64 {
        self.stats.live()
    }

    fn slot(&self, r: ObjRef) -> &Slot {
        match self.slots.get(r.index as usize) {
            Some(slot)
                if slot.generation == r.generation
                    && matches!(slot.state, SlotState::Live { .. }) =>
            {
                slot
            }
            _ => panic!("heap: stale object reference {:?}", r),
        }
    }

    fn slot_mut(&mut self, r: ObjRef) -> &mut Slot {
        match self.slots.get_mut(r.index as usize) {
            Some(slot)
                if slot.generation == r.generation
                    && matches!(slot.state, SlotState::Live { .. }) =>
            {
                slot
            }
            _ => panic!("heap: stale object reference {:?}", r),
        }
    }

    fn refs_mut(&mut self, r: ObjRef) -> &mut u32 {
        match &mut self.slot_mut(r).state {
            SlotState::Live { refs, .. } => refs,
            SlotState::Free { .. } => unreachable!("slot_mut() only returns live slots"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_starts_at_one() {
        let mut heap = Heap::new();
        let s = heap.alloc_string(b"hello").unwrap();
        assert_eq!(heap.refcount(s), 1);
        assert_eq!(heap.kind(Cell::Object(s)), Kind::String);
        assert_eq!(heap.live_objects(), 1);
    }

    #[test]
    fn test_retain_release_balanced() {
        let mut heap = Heap::new();
        let s = heap.alloc_string(b"x").unwrap();
        let cell = Cell::Object(s);

        heap.retain(cell);
        assert_eq!(heap.refcount(s), 2);
        heap.release(cell);
        assert_eq!(heap.refcount(s), 1);
        assert_eq!(heap.stats().freed, 0);

        heap.release(cell);
        assert!(!heap.is_live(s));
        assert_eq!(heap.stats().freed, 1);
    }

    #[test]
    fn test_immediates_are_ignored() {
        let mut heap = Heap::new();
        heap.retain(Cell::Float(1.0));
        heap.release(Cell::Char(b'a'));
        heap.release(Cell::Null);
        assert_eq!(heap.stats(), HeapStats::default());
    }

    #[test]
    fn test_release_frees_children() {
        let mut heap = Heap::new();
        let s = heap.alloc_string(b"inner").unwrap();
        let pair = heap.alloc_pair(Cell::Object(s), Cell::Null).unwrap();
        let arr = heap.alloc_array(2).unwrap();
        if let Object::Array(cells) = heap.get_mut(arr) {
            cells[0] = Cell::Object(pair);
        }

        heap.release(Cell::Object(arr));
        assert!(!heap.is_live(arr));
        assert!(!heap.is_live(pair));
        assert!(!heap.is_live(s));
        assert_eq!(heap.live_objects(), 0);
        assert_eq!(heap.stats().freed, 3);
    }

    #[test]
    fn test_shared_child_survives_parent() {
        let mut heap = Heap::new();
        let s = heap.alloc_string(b"shared").unwrap();
        let cell = Cell::Object(s);
        heap.retain(cell);
        let pair = heap.alloc_pair(cell, Cell::Null).unwrap();

        heap.release(Cell::Object(pair));
        assert!(heap.is_live(s));
        assert_eq!(heap.refcount(s), 1);

        heap.release(cell);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_long_list_release_does_not_recurse() {
        let mut heap = Heap::new();
        let mut list = Cell::Null;
        for i in 0..200_000 {
            list = Cell::Object(heap.alloc_pair(Cell::Float(i as f64), list).unwrap());
        }
        assert_eq!(heap.live_objects(), 200_000);
        heap.release(list);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_copy_releases_old_and_retains_new() {
        let mut heap = Heap::new();
        let a = heap.alloc_string(b"a").unwrap();
        let b = heap.alloc_string(b"b").unwrap();

        let mut slot = Cell::Object(a);
        heap.copy(&mut slot, Cell::Object(b));
        assert_eq!(slot, Cell::Object(b));
        assert!(!heap.is_live(a));
        assert_eq!(heap.refcount(b), 2);

        heap.release(slot);
        heap.release(Cell::Object(b));
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_copy_onto_itself_keeps_object() {
        let mut heap = Heap::new();
        let a = heap.alloc_string(b"self").unwrap();
        let mut slot = Cell::Object(a);
        heap.copy(&mut slot, Cell::Object(a));
        assert!(heap.is_live(a));
        assert_eq!(heap.refcount(a), 1);

        heap.release(slot);
        assert!(!heap.is_live(a));
        assert_eq!(heap.stats().freed, 1);
    }

    #[test]
    fn test_slots_are_recycled_with_new_generation() {
        let mut heap = Heap::new();
        let first = heap.alloc_string(b"1").unwrap();
        heap.release(Cell::Object(first));
        let second = heap.alloc_string(b"2").unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(!heap.is_live(first));
        assert!(heap.is_live(second));
    }

    #[test]
    #[should_panic(expected = "stale object reference")]
    fn test_stale_handle_panics() {
        let mut heap = Heap::new();
        let s = heap.alloc_string(b"gone").unwrap();
        heap.release(Cell::Object(s));
        heap.retain(Cell::Object(s));
    }

    #[test]
    fn test_huge_array_is_allocation_failure() {
        let mut heap = Heap::new();
        let err = heap.alloc_array(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, RuntimeError::AllocationFailure(_)));
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_accessors() {
        let mut heap = Heap::new();
        let s = Cell::Object(heap.alloc_string(b"abc").unwrap());
        let p = Cell::Object(heap.alloc_pair(Cell::Float(1.0), Cell::Null).unwrap());
        let a = Cell::Object(heap.alloc_array(3).unwrap());

        assert_eq!(heap.string_bytes(s), Some(&b"abc"[..]));
        assert_eq!(heap.string_bytes(p), None);
        assert_eq!(heap.pair_fields(p), Some((Cell::Float(1.0), Cell::Null)));
        assert_eq!(heap.array_cells(a).map(|c| c.len()), Some(3));
        assert_eq!(heap.array_cells(Cell::Null), None);
    }
}
