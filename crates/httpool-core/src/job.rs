//! Job descriptor: one connection plus scheduling metadata.

use crate::conn::Conn;

/// A unit of work for the pool. Plain value carrier; at most one owner
/// at any instant (acceptor, then scheduler storage, then worker).
#[derive(Debug)]
pub struct Job {
    /// Client endpoint. Dropping the job closes it.
    pub conn: Conn,

    /// Estimated cost in bytes of response body where known, 0 when
    /// unknown. Advisory only; a wrong estimate degrades scheduling
    /// quality, never correctness.
    pub est_cost: u64,

    /// Reserved for future policies; FIFO and SJF ignore it.
    pub priority: i32,

    /// Monotonic arrival timestamp in milliseconds. Assigned before
    /// push and never mutated afterwards.
    pub arrival_ms: u64,
}

impl Job {
    /// Build a job stamped with the current monotonic time.
    pub fn new(conn: Conn, est_cost: u64, priority: i32) -> Self {
        Self {
            conn,
            est_cost,
            priority,
            arrival_ms: now_ms(),
        }
    }
}

/// Monotonic clock in milliseconds.
pub fn now_ms() -> u64 {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64) * 1000 + (ts.tv_nsec as u64) / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::FromRawFd;

    fn null_conn() -> Conn {
        let fd = unsafe { libc::open(b"/dev/null\0".as_ptr() as *const _, libc::O_RDONLY) };
        assert!(fd >= 0);
        unsafe { Conn::from_raw_fd(fd) }
    }

    #[test]
    fn test_now_ms_monotonic() {
        let t1 = now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = now_ms();
        assert!(t2 >= t1 + 4);
    }

    #[test]
    fn test_new_stamps_arrival() {
        let before = now_ms();
        let job = Job::new(null_conn(), 123, 0);
        let after = now_ms();
        assert_eq!(job.est_cost, 123);
        assert_eq!(job.priority, 0);
        assert!(job.arrival_ms >= before && job.arrival_ms <= after);
    }
}
