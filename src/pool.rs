//! Reusable scratch-buffer pools.
//!
//! Queries and build workers borrow vectors instead of allocating: `loan`
//! hands out a cleared buffer with preserved capacity, `release` returns it.
//! A pool is sized so one buffer exists per worker thread up front; if more
//! are requested the pool allocates rather than blocks, which keeps borrowing
//! deadlock-free under any contention.

use parking_lot::Mutex;

/// A pool of reusable `Vec<T>` scratch buffers.
pub struct VectorPool<T> {
    free: Mutex<Vec<Vec<T>>>,
    reserve_capacity: usize,
}

impl<T> VectorPool<T> {
    /// Create a pool holding `qty` buffers, each with `reserve_capacity`
    /// elements of preallocated capacity.
    pub fn new(qty: usize, reserve_capacity: usize) -> Self {
        let free = (0..qty)
            .map(|_| Vec::with_capacity(reserve_capacity))
            .collect();
        Self {
            free: Mutex::new(free),
            reserve_capacity,
        }
    }

    /// Borrow a buffer. The buffer is empty; capacity from earlier loans is
    /// preserved. Never blocks beyond the internal lock: an exhausted pool
    /// allocates a fresh buffer.
    pub fn loan(&self) -> Vec<T> {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.reserve_capacity))
    }

    /// Return a borrowed buffer to the pool. Contents are discarded,
    /// capacity is kept for the next loan.
    pub fn release(&self, mut buf: Vec<T>) {
        buf.clear();
        self.free.lock().push(buf);
    }

    /// Number of buffers currently available without allocating.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_release_cycle() {
        let pool: VectorPool<u32> = VectorPool::new(2, 16);
        assert_eq!(pool.available(), 2);

        let mut a = pool.loan();
        let b = pool.loan();
        assert_eq!(pool.available(), 0);
        assert!(a.capacity() >= 16);

        a.extend_from_slice(&[1, 2, 3]);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available(), 2);

        let again = pool.loan();
        assert!(again.is_empty(), "released buffers come back cleared");
        assert!(again.capacity() >= 3);
    }

    #[test]
    fn test_exhausted_pool_allocates() {
        let pool: VectorPool<u8> = VectorPool::new(1, 4);
        let a = pool.loan();
        let b = pool.loan();
        assert_eq!(pool.available(), 0);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_capacity_preserved_across_loans() {
        let pool: VectorPool<u32> = VectorPool::new(1, 8);
        let mut buf = pool.loan();
        buf.extend(0..1000);
        pool.release(buf);
        let buf = pool.loan();
        assert!(buf.capacity() >= 1000);
    }
}
