use crate::sys;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};

/// Raw `AF_INET`/`IPPROTO_ICMP` socket. Received datagrams include the IPv4
/// header.
#[derive(Debug)]
pub struct Socket {
    inner: OwnedFd,
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl Socket {
    pub fn new_v4() -> io::Result<Self> {
        sys::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_ICMP)
            .map(|inner| Self { inner })
            .and_then(set_common_flags)
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        sys::set_nonblocking(self.as_raw_fd(), nonblocking)
    }

    pub fn sendto(&self, buf: &[u8], addr: Ipv4Addr) -> io::Result<usize> {
        sys::sendto(&self.inner, buf, &SocketAddrV4::new(addr, 0), 0)
    }

    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        sys::recv(&self.inner, buf, 0)
    }
}

fn set_common_flags(socket: Socket) -> io::Result<Socket> {
    // On platforms that don't have `SOCK_CLOEXEC` use `FD_CLOEXEC`.
    #[cfg(not(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd",
    )))]
    sys::set_cloexec(socket.as_raw_fd())?;

    Ok(socket)
}
