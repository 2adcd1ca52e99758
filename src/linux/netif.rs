//! Kernel network interface enumeration.

use std::{
    ffi::{CStr, CString},
    io,
    ptr,
};

use getset::Getters;
use log::trace;

/// A network interface known to the kernel.
#[derive(Getters, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkInterface {
    /// Interface name.
    #[getset(get = "pub")]
    name: String,
}

impl NetworkInterface {
    /// All interfaces with a link layer address, in the order the kernel
    /// reports them, without duplicates.
    pub fn interfaces() -> io::Result<Vec<NetworkInterface>> {
        let mut addrs: *mut libc::ifaddrs = ptr::null_mut();
        match unsafe { libc::getifaddrs(&mut addrs) } {
            0 => (),
            _ => return Err(io::Error::last_os_error()),
        }

        let mut interfaces: Vec<NetworkInterface> = Vec::new();
        let mut cur = addrs;
        while !cur.is_null() {
            let ifa = unsafe { &*cur };
            cur = ifa.ifa_next;

            if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
                continue;
            }
            if i32::from(unsafe { (*ifa.ifa_addr).sa_family }) != libc::AF_PACKET {
                continue;
            }
            let name = unsafe { CStr::from_ptr(ifa.ifa_name) }
                .to_string_lossy()
                .into_owned();
            if !interfaces.iter().any(|i| i.name == name) {
                interfaces.push(NetworkInterface { name });
            }
        }
        unsafe { libc::freeifaddrs(addrs) };

        trace!("Network interfaces: {:?}", interfaces);
        Ok(interfaces)
    }

    /// Kernel index of the interface called `name`.
    pub fn index(name: &str) -> io::Result<u32> {
        let cname = CString::new(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        match unsafe { libc::if_nametoindex(cname.as_ptr()) } {
            0 => Err(io::Error::last_os_error()),
            i => Ok(i),
        }
    }

    /// Kernel index of this interface.
    pub fn to_index(&self) -> io::Result<u32> {
        NetworkInterface::index(&self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::test::setup;

    #[test]
    fn test_loopback() {
        setup();

        let interfaces = NetworkInterface::interfaces().unwrap();
        let lo = interfaces.iter().find(|i| i.name() == "lo").unwrap();
        assert_eq!(lo.to_index().unwrap(), NetworkInterface::index("lo").unwrap());

        let mut names = interfaces.iter().map(|i| i.name().clone()).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), interfaces.len());
    }

    #[test]
    fn test_unknown_index() {
        setup();

        let err = NetworkInterface::index("nosuchif0").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENODEV));
        assert_eq!(
            NetworkInterface::index("bad\0name").unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }
}
