//! Linux implementations of [`WlanManager`][crate::wlan::WlanManager].
//!
//! [`LinuxWlanManager`] speaks `nl80211` and is what most callers want.
//! [`WirelessExtensions`] drives the legacy `ioctl` interface for drivers
//! that predate `cfg80211`.

mod manager;
pub mod netif;
pub mod wext;

pub use self::{
    manager::{LinuxWlanManager, ScanConfig, ScanConfigBuilder, ScanConfigBuilderError, ScanStream},
    netif::NetworkInterface,
    wext::WirelessExtensions,
};

use std::{io, os::unix::io::RawFd};

use libc::{c_int, c_short};

use crate::{
    consts::wext::{SIOCGIFFLAGS, SIOCSIFFLAGS},
    ffi::{ioctl_result, IfreqFlags},
};

/// Set or clear `IFF_UP` on `interface`. Leaves the flags untouched if
/// they already match.
pub(crate) fn set_interface_up(fd: RawFd, interface: &str, up: bool) -> io::Result<()> {
    let mut req = IfreqFlags::new(interface)?;
    unsafe { ioctl_result(fd, SIOCGIFFLAGS, &mut req) }?;
    let flags = if up {
        req.ifr_flags | libc::IFF_UP as c_short
    } else {
        req.ifr_flags & !(libc::IFF_UP as c_short)
    };
    if flags == req.ifr_flags {
        return Ok(());
    }
    req.ifr_flags = flags;
    unsafe { ioctl_result(fd, SIOCSIFFLAGS, &mut req) }?;
    Ok(())
}

/// `AF_INET` datagram socket used as the handle for interface `ioctl`s.
pub(crate) struct IoctlSocket(c_int);

impl IoctlSocket {
    pub(crate) fn new() -> io::Result<Self> {
        match unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) } {
            i if i >= 0 => Ok(IoctlSocket(i)),
            _ => Err(io::Error::last_os_error()),
        }
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.0
    }
}

impl Drop for IoctlSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::test::setup;

    #[test]
    fn test_set_interface_up_unknown_interface() {
        setup();

        let sock = IoctlSocket::new().unwrap();
        let err = set_interface_up(sock.fd(), "nosuchif0", true).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENODEV));
    }

    #[test]
    fn test_set_interface_up_bad_name() {
        setup();

        let sock = IoctlSocket::new().unwrap();
        let err = set_interface_up(sock.fd(), "", true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
