//! Shortest-job-first policy over a bounded binary min-heap.

use httpool_core::Job;

use super::SchedPolicy;

/// Min-heap keyed by `(est_cost, arrival_ms)`. Pop yields the cheapest
/// resident job; equal costs are served in arrival order, which both
/// prevents starvation among equal-cost jobs and makes the order
/// deterministic. With every estimate at 0 the queue degenerates to
/// FIFO.
pub struct SjfQueue {
    heap: Vec<Job>,
    capacity: usize,
}

/// Heap ordering relation.
fn job_less(a: &Job, b: &Job) -> bool {
    a.est_cost < b.est_cost || (a.est_cost == b.est_cost && a.arrival_ms < b.arrival_ms)
}

impl SjfQueue {
    /// Allocate a queue holding up to `capacity` jobs.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "queue capacity must be at least 1");
        Self {
            heap: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if job_less(&self.heap[idx], &self.heap[parent]) {
                self.heap.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let n = self.heap.len();
        loop {
            let left = idx * 2 + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < n && job_less(&self.heap[left], &self.heap[smallest]) {
                smallest = left;
            }
            if right < n && job_less(&self.heap[right], &self.heap[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.heap.swap(idx, smallest);
            idx = smallest;
        }
    }
}

impl SchedPolicy for SjfQueue {
    fn push(&mut self, job: Job) -> Result<(), Job> {
        if self.heap.len() == self.capacity {
            return Err(job);
        }
        self.heap.push(job);
        let last = self.heap.len() - 1;
        self.sift_up(last);
        Ok(())
    }

    fn pop(&mut self) -> Option<Job> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let job = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        job
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &'static str {
        "sjf"
    }
}
