use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// Fixed-capacity atomic free-slot stack backing one arena.
///
/// `append` and `consume` are the only legal concurrent mutations of an
/// arena's cardinality. Both are lock-free; a phase either appends or
/// consumes, never both, so a consumer can never observe a half-written
/// entry. Appending beyond capacity clamps silently: callers are required
/// by construction never to append more entries than slots exist, and the
/// capacity is validated at setup.
#[derive(Debug)]
pub struct SlotPool {
    slots: Vec<AtomicU32>,
    // i64 so a racing consume can dip below zero and restore itself.
    count: AtomicI64,
}

impl SlotPool {
    pub fn new(capacity: u32) -> Self {
        let slots = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        SlotPool { slots, count: AtomicI64::new(0) }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Atomically appends a free slot index. Concurrent callers never claim
    /// the same stack position.
    pub fn append(&self, index: u32) {
        let pos = self.count.fetch_add(1, Ordering::AcqRel);
        if pos < 0 || pos >= self.slots.len() as i64 {
            // Over-append is a setup precondition violation; clamp and move on.
            self.count.fetch_sub(1, Ordering::AcqRel);
            return;
        }
        self.slots[pos as usize].store(index, Ordering::Release);
    }

    /// Atomically pops one free slot index, or `None` when the pool is
    /// empty. An empty pool is not an error: the requesting unit skips its
    /// allocation for this frame.
    pub fn consume(&self) -> Option<u32> {
        let pos = self.count.fetch_sub(1, Ordering::AcqRel);
        if pos <= 0 {
            self.count.fetch_add(1, Ordering::AcqRel);
            return None;
        }
        Some(self.slots[(pos - 1) as usize].load(Ordering::Acquire))
    }

    /// Host-side readback of the free-slot count.
    ///
    /// This is the once-per-frame barrier of the pipeline: it must only be
    /// called after every parallel dispatch of the step has joined, which
    /// rayon guarantees when the enclosing `par_iter` calls have returned.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst).max(0) as u32
    }

    /// Empties the pool. Used by Init/Reset before re-seeding.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Fills the pool with every index, highest first, so `consume` hands
    /// out ascending indices. Keeps Reset deterministic for a fixed
    /// capacity.
    pub fn fill_reverse(&self) {
        self.reset();
        for index in (0..self.capacity()).rev() {
            self.append(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn consume_on_empty_is_a_noop() {
        let pool = SlotPool::new(4);
        assert_eq!(pool.consume(), None);
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn append_beyond_capacity_clamps() {
        let pool = SlotPool::new(2);
        pool.append(0);
        pool.append(1);
        pool.append(2);
        assert_eq!(pool.count(), 2);
    }

    #[test]
    fn fill_reverse_consumes_ascending() {
        let pool = SlotPool::new(4);
        pool.fill_reverse();
        assert_eq!(pool.count(), 4);
        assert_eq!(pool.consume(), Some(0));
        assert_eq!(pool.consume(), Some(1));
    }

    #[test]
    fn concurrent_consume_never_duplicates() {
        let pool = SlotPool::new(1024);
        pool.fill_reverse();

        // More requests than entries: the excess must observe empty, and
        // every yielded slot must be unique.
        let taken: Vec<Option<u32>> = (0..2048).into_par_iter().map(|_| pool.consume()).collect();

        let got: Vec<u32> = taken.into_iter().flatten().collect();
        assert_eq!(got.len(), 1024);
        let unique: HashSet<u32> = got.iter().copied().collect();
        assert_eq!(unique.len(), 1024);
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn concurrent_append_keeps_every_entry() {
        let pool = SlotPool::new(1024);
        (0..1024u32).into_par_iter().for_each(|i| pool.append(i));
        assert_eq!(pool.count(), 1024);

        let mut got = HashSet::new();
        while let Some(slot) = pool.consume() {
            assert!(got.insert(slot), "slot {} handed out twice", slot);
        }
        assert_eq!(got.len(), 1024);
    }
}
