use crate::pool::SlotPool;

/// Generation-swapped storage for one entity kind plus its free-slot pool.
///
/// The two buffers are resolved by the parity of a generation counter
/// rather than by swapping pointers. A phase that only writes an element's
/// own scalar state mutates the current generation in place
/// (`read_mut`). A phase whose output depends on neighbors' current state
/// writes the next generation through `split` and advances with `swap`;
/// within one phase every parallel unit then observes the same input
/// generation.
#[derive(Debug)]
pub struct Arena<T> {
    buffers: [Vec<T>; 2],
    generation: u64,
    pub pool: SlotPool,
}

impl<T: Copy + Default> Arena<T> {
    pub fn new(capacity: u32) -> Self {
        Arena {
            buffers: [
                vec![T::default(); capacity as usize],
                vec![T::default(); capacity as usize],
            ],
            generation: 0,
            pool: SlotPool::new(capacity),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn front(&self) -> usize {
        (self.generation % 2) as usize
    }

    /// The current generation, read-consistent for the whole phase.
    pub fn read(&self) -> &[T] {
        &self.buffers[self.front()]
    }

    /// In-place access for phases that only write their own slot's state.
    pub fn read_mut(&mut self) -> &mut [T] {
        let front = self.front();
        &mut self.buffers[front]
    }

    /// In-place access paired with the pool, for removal kernels where each
    /// unit flips its own slot's alive flag and appends it for reuse.
    pub fn read_mut_and_pool(&mut self) -> (&mut [T], &SlotPool) {
        let front = (self.generation % 2) as usize;
        let (buffers, pool) = (&mut self.buffers, &self.pool);
        (&mut buffers[front], pool)
    }

    /// Splits into (current generation, next generation) for staged phases.
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        let (a, b) = self.buffers.split_at_mut(1);
        if self.generation % 2 == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Advances the generation; what was written becomes current.
    pub fn swap(&mut self) {
        self.generation += 1;
    }

    /// Clears both generations to default and refills the pool with every
    /// slot. The post-state is exactly the freshly-initialized one.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(T::default());
        }
        self.generation = 0;
        self.pool.fill_reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pairs_current_with_next() {
        let mut arena: Arena<u32> = Arena::new(4);
        arena.read_mut()[0] = 7;
        {
            let (cur, next) = arena.split();
            assert_eq!(cur[0], 7);
            next[0] = 9;
        }
        arena.swap();
        assert_eq!(arena.read()[0], 9);
        assert_eq!(arena.generation(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut arena: Arena<u32> = Arena::new(3);
        arena.read_mut()[0] = 1;
        arena.pool.fill_reverse();
        arena.pool.consume();
        arena.swap();

        arena.reset();
        assert_eq!(arena.generation(), 0);
        assert_eq!(arena.read(), &[0, 0, 0]);
        assert_eq!(arena.pool.count(), 3);
        assert_eq!(arena.pool.consume(), Some(0));
    }
}
