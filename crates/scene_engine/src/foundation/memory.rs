//! Object pooling for per-frame transient values
//!
//! Picking allocates result lists every query; recycling them through a
//! small LIFO free list keeps steady-state queries allocation-free.

/// Fixed-capacity LIFO object pool
///
/// `allocate` hands back the most recently deallocated instance when one is
/// available, otherwise constructs a fresh one. `deallocate` returns an
/// instance to the free list; once the list is at capacity, excess instances
/// are simply dropped rather than rejected.
///
/// The pool never resets recycled instances. Callers that would observe
/// stale state (e.g. recycled `Vec` buffers) must clear it after allocation.
///
/// Not internally synchronized; callers sharing a pool across threads must
/// guard allocate/deallocate pairs externally.
pub struct ObjectPool<T> {
    free: Vec<T>,
    capacity: usize,
    create: fn() -> T,
}

impl<T> ObjectPool<T> {
    /// Create a pool holding at most `capacity` recycled instances
    pub fn new(capacity: usize, create: fn() -> T) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            create,
        }
    }

    /// Take an instance from the free list, or construct a new one
    pub fn allocate(&mut self) -> T {
        self.free.pop().unwrap_or_else(|| (self.create)())
    }

    /// Return an instance to the free list
    ///
    /// Instances beyond the pool capacity are dropped.
    pub fn deallocate(&mut self, value: T) {
        if self.free.len() < self.capacity {
            self.free.push(value);
        }
    }

    /// Number of instances currently waiting for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Maximum number of instances the free list retains
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Default> ObjectPool<T> {
    /// Create a pool whose fresh instances come from `T::default`
    pub fn with_default(capacity: usize) -> Self {
        Self::new(capacity, T::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_reuses_instances_lifo() {
        let mut pool: ObjectPool<Box<u32>> = ObjectPool::with_default(8);

        let first: Vec<Box<u32>> = (0..4).map(|_| pool.allocate()).collect();
        let ptrs: Vec<*const u32> = first.iter().map(|b| &**b as *const u32).collect();

        for value in first {
            pool.deallocate(value);
        }
        assert_eq!(pool.available(), 4);

        // LIFO: the last instance returned comes back first.
        for expected in ptrs.iter().rev() {
            let value = pool.allocate();
            assert_eq!(&*value as *const u32, *expected);
        }
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_excess_deallocations_are_dropped() {
        let mut pool: ObjectPool<Vec<u8>> = ObjectPool::with_default(2);
        for _ in 0..10 {
            pool.deallocate(Vec::new());
        }
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_allocate_from_empty_pool_constructs() {
        let mut pool: ObjectPool<Vec<u8>> = ObjectPool::with_default(0);
        let buffer = pool.allocate();
        assert!(buffer.is_empty());
        pool.deallocate(buffer);
        // Capacity zero: nothing is ever retained.
        assert_eq!(pool.available(), 0);
    }
}
