//! Owned TCP endpoint.
//!
//! `Conn` wraps a connected socket fd with exclusive ownership: the fd
//! is closed exactly once, in `Drop`. Jobs move a `Conn` from the
//! acceptor into scheduler storage and out to a worker; no sharing, no
//! manual close.

use std::fs::File;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::time::Duration;

/// A connected TCP socket, exclusively owned.
pub struct Conn {
    fd: RawFd,
}

impl Conn {
    /// Raw fd, for passing to syscalls. The fd stays owned by `self`.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Read into `buf`. Retries on EINTR. `Ok(0)` means EOF; a
    /// `WouldBlock` error means the read timeout expired.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            return Ok(n as usize);
        }
    }

    /// Peek without consuming: the same bytes remain readable. Used by
    /// the acceptor to estimate cost before the handler parses the
    /// request for real.
    pub fn peek(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::recv(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    libc::MSG_PEEK,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            return Ok(n as usize);
        }
    }

    /// Write the whole buffer, handling short writes and EINTR.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut left = buf;
        while !left.is_empty() {
            let n = unsafe {
                libc::write(self.fd, left.as_ptr() as *const libc::c_void, left.len())
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            left = &left[n as usize..];
        }
        Ok(())
    }

    /// Set (or clear, with `None`) the receive timeout. Reads after an
    /// expired timeout fail with `WouldBlock`.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let tv = match timeout {
            Some(d) => libc::timeval {
                tv_sec: d.as_secs() as libc::time_t,
                tv_usec: d.subsec_micros() as libc::suseconds_t,
            },
            None => libc::timeval { tv_sec: 0, tv_usec: 0 },
        };
        let ret = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        impl Conn {
            /// Copy `len` bytes of `file` to the socket with
            /// sendfile(2). Returns bytes actually sent.
            pub fn send_file(&mut self, file: &File, len: u64) -> io::Result<u64> {
                let mut offset: libc::off_t = 0;
                while (offset as u64) < len {
                    let remaining = len - offset as u64;
                    let sent = unsafe {
                        libc::sendfile(
                            self.fd,
                            file.as_raw_fd(),
                            &mut offset,
                            remaining as usize,
                        )
                    };
                    if sent < 0 {
                        let err = io::Error::last_os_error();
                        if err.kind() == io::ErrorKind::Interrupted {
                            continue;
                        }
                        return Err(err);
                    }
                    if sent == 0 {
                        break; // file shorter than expected
                    }
                }
                Ok(offset as u64)
            }
        }
    } else {
        impl Conn {
            /// Portable fallback: read the file into a buffer and write
            /// it out. Returns bytes actually sent.
            pub fn send_file(&mut self, file: &File, len: u64) -> io::Result<u64> {
                use std::io::Read;

                let mut remaining = len;
                let mut sent: u64 = 0;
                let mut buf = [0u8; 8192];
                let mut file = file;
                while remaining > 0 {
                    let want = buf.len().min(remaining as usize);
                    let n = file.read(&mut buf[..want])?;
                    if n == 0 {
                        break;
                    }
                    self.write_all(&buf[..n])?;
                    sent += n as u64;
                    remaining -= n as u64;
                }
                Ok(sent)
            }
        }
    }
}

impl FromRawFd for Conn {
    /// # Safety
    ///
    /// `fd` must be an open socket fd not owned elsewhere; `Conn`
    /// takes over closing it.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl AsRawFd for Conn {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn").field("fd", &self.fd).finish()
    }
}
