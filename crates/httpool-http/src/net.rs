//! Listening-socket factory.

use std::io;
use std::os::unix::io::{FromRawFd, RawFd};

use httpool_core::Conn;

/// IPv4 TCP listener bound to all interfaces, `SO_REUSEADDR` enabled
/// so restarts can bind quickly. Port 0 requests an OS-assigned
/// ephemeral port (see `local_port`).
pub struct Listener {
    fd: RawFd,
}

impl Listener {
    /// Create, bind and listen.
    pub fn bind(port: u16, backlog: i32) -> io::Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let opt: libc::c_int = 1;
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &opt as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let mut addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
        addr.sin_family = libc::AF_INET as libc::sa_family_t;
        addr.sin_addr.s_addr = libc::INADDR_ANY;
        addr.sin_port = port.to_be();

        let ret = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let ret = unsafe { libc::listen(fd, backlog) };
        if ret != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        Ok(Self { fd })
    }

    /// The port actually bound; useful after binding port 0.
    pub fn local_port(&self) -> io::Result<u16> {
        let mut addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
        let mut len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        let ret = unsafe {
            libc::getsockname(self.fd, &mut addr as *mut _ as *mut libc::sockaddr, &mut len)
        };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(u16::from_be(addr.sin_port))
    }

    /// Accept one connection. EINTR surfaces as
    /// `io::ErrorKind::Interrupted` so the caller can re-check its
    /// running flag.
    pub fn accept(&self) -> io::Result<Conn> {
        let fd = unsafe { libc::accept(self.fd, std::ptr::null_mut(), std::ptr::null_mut()) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(unsafe { Conn::from_raw_fd(fd) })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("fd", &self.fd).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::net::TcpStream;

    #[test]
    fn test_bind_ephemeral_and_accept() {
        let listener = Listener::bind(0, 16).unwrap();
        let port = listener.local_port().unwrap();
        assert!(port > 0);

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let mut conn = listener.accept().unwrap();

        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 8];
        let n = conn.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[test]
    fn test_reuseaddr_rebind() {
        let port;
        {
            let listener = Listener::bind(0, 16).unwrap();
            port = listener.local_port().unwrap();
        }
        // The port can be rebound immediately after close.
        let again = Listener::bind(port, 16).unwrap();
        assert_eq!(again.local_port().unwrap(), port);
    }
}
