//! First-in-first-out policy over a bounded ring buffer.

use httpool_core::Job;

use super::SchedPolicy;

/// Ring buffer of jobs. Pop order equals successful push order; no
/// comparisons, O(1) per operation.
pub struct FifoQueue {
    slots: Vec<Option<Job>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl FifoQueue {
    /// Allocate a queue holding up to `capacity` jobs. All storage is
    /// allocated here; push and pop never allocate.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "queue capacity must be at least 1");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }
}

impl SchedPolicy for FifoQueue {
    fn push(&mut self, job: Job) -> Result<(), Job> {
        if self.count == self.slots.len() {
            return Err(job);
        }
        self.slots[self.tail] = Some(job);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<Job> {
        if self.count == 0 {
            return None;
        }
        let job = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        job
    }

    fn len(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn name(&self) -> &'static str {
        "fifo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpool_core::Conn;
    use std::os::unix::io::FromRawFd;

    fn job(est: u64) -> Job {
        let fd = unsafe { libc::open(b"/dev/null\0".as_ptr() as *const _, libc::O_RDONLY) };
        assert!(fd >= 0);
        let conn = unsafe { Conn::from_raw_fd(fd) };
        Job::new(conn, est, 0)
    }

    #[test]
    fn test_push_pop_order() {
        let mut q = FifoQueue::new(4);
        for est in [100, 10, 1000, 1] {
            assert!(q.push(job(est)).is_ok());
        }
        let popped: Vec<u64> = std::iter::from_fn(|| q.pop()).map(|j| j.est_cost).collect();
        assert_eq!(popped, vec![100, 10, 1000, 1]);
    }

    #[test]
    fn test_full_hands_job_back() {
        let mut q = FifoQueue::new(2);
        assert!(q.push(job(1)).is_ok());
        assert!(q.push(job(2)).is_ok());
        assert_eq!(q.len(), 2);

        let rejected = q.push(job(3)).unwrap_err();
        assert_eq!(rejected.est_cost, 3);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_empty_pop() {
        let mut q = FifoQueue::new(2);
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_wraparound() {
        let mut q = FifoQueue::new(3);
        for est in 0..3 {
            assert!(q.push(job(est)).is_ok());
        }
        assert_eq!(q.pop().unwrap().est_cost, 0);
        assert_eq!(q.pop().unwrap().est_cost, 1);

        // head/tail have advanced; pushes wrap around the storage
        assert!(q.push(job(10)).is_ok());
        assert!(q.push(job(11)).is_ok());
        assert_eq!(q.len(), 3);

        let popped: Vec<u64> = std::iter::from_fn(|| q.pop()).map(|j| j.est_cost).collect();
        assert_eq!(popped, vec![2, 10, 11]);
    }

    #[test]
    fn test_interleaved_matches_push_prefix() {
        // Any interleaving of pushes and pops yields the push sequence.
        let mut q = FifoQueue::new(8);
        let mut pushed = Vec::new();
        let mut popped = Vec::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = 0u64;

        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if seed % 3 != 0 {
                if q.push(job(next)).is_ok() {
                    pushed.push(next);
                }
                next += 1;
            } else if let Some(j) = q.pop() {
                popped.push(j.est_cost);
            }
        }
        while let Some(j) = q.pop() {
            popped.push(j.est_cost);
        }
        assert_eq!(popped, pushed);
    }
}
