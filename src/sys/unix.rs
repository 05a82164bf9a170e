use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use libc::c_int;

pub(crate) type Socket = RawFd;

macro_rules! syscall {
    ($fn:ident ($($args:expr),* $(,)*)) => {
        {
            let res = unsafe { libc::$fn($($args),*) };
            if res == -1 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(res)
            }
        }
    };
}

pub(crate) fn socket(family: c_int, ty: c_int, protocol: c_int) -> io::Result<OwnedFd> {
    #[cfg(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd",
    ))]
    let ty = ty | libc::SOCK_CLOEXEC;

    // The fd is fresh and owned by nobody else.
    syscall!(socket(family, ty, protocol)).map(|fd| unsafe { OwnedFd::from_raw_fd(fd) })
}

pub(crate) fn set_nonblocking(fd: Socket, nonblocking: bool) -> io::Result<()> {
    if nonblocking {
        fcntl_add(fd, libc::F_GETFL, libc::F_SETFL, libc::O_NONBLOCK)
    } else {
        fcntl_remove(fd, libc::F_GETFL, libc::F_SETFL, libc::O_NONBLOCK)
    }
}

#[allow(dead_code)]
pub(crate) fn set_cloexec(fd: Socket) -> io::Result<()> {
    fcntl_add(fd, libc::F_GETFD, libc::F_SETFD, libc::FD_CLOEXEC)
}

fn fcntl_add(fd: Socket, get_cmd: c_int, set_cmd: c_int, flag: c_int) -> io::Result<()> {
    let pre = syscall!(fcntl(fd, get_cmd))?;
    let new = pre | flag;
    if new != pre {
        syscall!(fcntl(fd, set_cmd, new)).map(|_| ())
    } else {
        Ok(())
    }
}

fn fcntl_remove(fd: Socket, get_cmd: c_int, set_cmd: c_int, flag: c_int) -> io::Result<()> {
    let pre = syscall!(fcntl(fd, get_cmd))?;
    let new = pre & !flag;
    if new != pre {
        syscall!(fcntl(fd, set_cmd, new)).map(|_| ())
    } else {
        Ok(())
    }
}

pub(crate) fn recv(fd: &OwnedFd, buf: &mut [u8], flags: c_int) -> io::Result<usize> {
    syscall!(recv(
        fd.as_raw_fd(),
        buf.as_mut_ptr().cast(),
        buf.len(),
        flags
    ))
    .map(|n| n as usize)
}

pub(crate) fn sendto(
    fd: &OwnedFd,
    buf: &[u8],
    addr: &SocketAddrV4,
    flags: c_int,
) -> io::Result<usize> {
    let mut sockaddr: libc::sockaddr_in = unsafe { mem::zeroed() };
    sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
    sockaddr.sin_addr = to_in_addr(addr.ip());
    sockaddr.sin_port = addr.port().to_be();
    syscall!(sendto(
        fd.as_raw_fd(),
        buf.as_ptr().cast(),
        buf.len(),
        flags,
        (&sockaddr as *const libc::sockaddr_in).cast(),
        mem::size_of::<libc::sockaddr_in>() as libc::socklen_t
    ))
    .map(|n| n as usize)
}

pub(crate) fn to_in_addr(addr: &Ipv4Addr) -> libc::in_addr {
    libc::in_addr {
        s_addr: u32::from_ne_bytes(addr.octets()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_addr_keeps_network_order() {
        let addr = to_in_addr(&Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(addr.s_addr.to_ne_bytes(), [192, 0, 2, 1]);
    }
}
