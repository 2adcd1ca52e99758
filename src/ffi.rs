//! Kernel ABI definitions that are not covered by `libc`.
//!
//! This mirrors the parts of `linux/types.h`, `linux/socket.h` and
//! `linux/wireless.h` that the rest of the crate needs, plus a raw
//! `ioctl` passthrough. Every struct here has the exact size and
//! alignment of its kernel counterpart.

#![allow(non_camel_case_types)]

use std::{ffi::c_void, io, os::unix::io::RawFd};

use libc::{c_char, c_int, c_short, c_ulong};

use crate::consts::wext::IFNAMSIZ;

/// `__u8`
pub type __u8 = u8;
/// `__u16`
pub type __u16 = u16;
/// `__u32`
pub type __u32 = u32;
/// `__u64`
pub type __u64 = u64;
/// `__s8`
pub type __s8 = i8;
/// `__s16`
pub type __s16 = i16;
/// `__s32`
pub type __s32 = i32;
/// `__s64`
pub type __s64 = i64;
/// Little endian `__u16`
pub type __le16 = u16;
/// Big endian `__u16`
pub type __be16 = u16;
/// Little endian `__u32`
pub type __le32 = u32;
/// Big endian `__u32`
pub type __be32 = u32;
/// Little endian `__u64`
pub type __le64 = u64;
/// Big endian `__u64`
pub type __be64 = u64;
/// Checksummed 16 bit value
pub type __sum16 = u16;
/// Checksummed 32 bit value
pub type __wsum = u32;
/// `__kernel_sa_family_t`
pub type __kernel_sa_family_t = u16;

/// Size of `struct __kernel_sockaddr_storage`.
pub const _K_SS_MAXSIZE: usize = 128;

/// Transfer file descriptors.
pub const SCM_RIGHTS: c_int = 0x01;
/// Transfer process credentials.
pub const SCM_CREDENTIALS: c_int = 0x02;
/// Transfer the security context.
pub const SCM_SECURITY: c_int = 0x03;

/// Netlink address family.
pub const AF_NETLINK: c_int = 16;

/// `struct __kernel_sockaddr_storage`, large enough for any socket
/// address and aligned like a pointer.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct KernelSockaddrStorage {
    /// Address family.
    pub ss_family: __kernel_sa_family_t,
    /// Address data.
    pub data: [c_char; _K_SS_MAXSIZE - 2],
    _align: [*const c_void; 0],
}

impl Default for KernelSockaddrStorage {
    fn default() -> Self {
        KernelSockaddrStorage {
            ss_family: 0,
            data: [0; _K_SS_MAXSIZE - 2],
            _align: [],
        }
    }
}

/// Forward `request` and `pointer` to the `ioctl` system call on `fd`.
///
/// The raw return value is passed back untouched: `-1` with `errno`
/// set on failure.
///
/// # Safety
///
/// `pointer` must be valid for whatever the kernel reads or writes for
/// `request`.
pub unsafe fn ioctl(fd: RawFd, request: c_ulong, pointer: *mut c_void) -> c_int {
    libc::ioctl(fd, request as _, pointer)
}

/// Like [`ioctl`] but turns `-1` into the last OS error.
///
/// # Safety
///
/// `arg` must be the structure the kernel expects for `request`,
/// including any buffers it points to.
pub unsafe fn ioctl_result<T>(fd: RawFd, request: c_ulong, arg: &mut T) -> io::Result<c_int> {
    match ioctl(fd, request, arg as *mut T as *mut c_void) {
        -1 => Err(io::Error::last_os_error()),
        i => Ok(i),
    }
}

/// Copy an interface name into a fixed size, NUL terminated buffer.
pub fn ifname(name: &str) -> io::Result<[c_char; IFNAMSIZ]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() >= IFNAMSIZ || bytes.contains(&0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid interface name {:?}", name),
        ));
    }
    let mut buf = [0 as c_char; IFNAMSIZ];
    for (dst, src) in buf.iter_mut().zip(bytes) {
        *dst = *src as c_char;
    }
    Ok(buf)
}

/// `struct iw_point`: a pointer to a buffer plus its length.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct IwPoint {
    /// Pointer to the data.
    pub pointer: *mut c_void,
    /// Number of fields or size in bytes.
    pub length: u16,
    /// Optional parameters.
    pub flags: u16,
}

/// `struct iw_freq`: frequency or channel as `m * 10^e`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IwFreq {
    /// Mantissa.
    pub m: i32,
    /// Exponent.
    pub e: i16,
    /// List index, for the range struct.
    pub i: u8,
    /// Fixed or auto.
    pub flags: u8,
}

impl IwFreq {
    /// Frequency in MHz, or `None` if the value is a channel number.
    pub fn mhz(&self) -> Option<u32> {
        if self.e == 0 && self.m < 1000 {
            return None;
        }
        let hz = (self.m as f64) * 10f64.powi(self.e as i32);
        Some((hz / 1e6).round() as u32)
    }
}

/// `struct iw_quality`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IwQuality {
    /// Link quality.
    pub qual: u8,
    /// Signal level.
    pub level: u8,
    /// Noise level.
    pub noise: u8,
    /// Flags marking which fields are valid.
    pub updated: u8,
}

/// `union iwreq_data`, restricted to the members used here.
#[repr(C)]
#[derive(Clone, Copy)]
pub union IwreqData {
    /// Wireless protocol name.
    pub name: [c_char; IFNAMSIZ],
    /// Buffer for ESSID, range and scan requests.
    pub data: IwPoint,
    /// Frequency.
    pub freq: IwFreq,
    /// Access point address.
    pub ap_addr: libc::sockaddr,
}

/// `struct iwreq`: the argument of every wireless extension `ioctl`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Iwreq {
    /// Interface name.
    pub ifr_name: [c_char; IFNAMSIZ],
    /// Request data.
    pub u: IwreqData,
}

/// `struct iw_event`: one record of a scan result stream.
///
/// The stream is packed: a record is only as long as its `len` says, and
/// `u` starts after the header padding the union's alignment adds.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct IwEvent {
    /// Length of this record.
    pub len: u16,
    /// Wireless ioctl or event code.
    pub cmd: u16,
    /// Payload.
    pub u: IwreqData,
}

impl Iwreq {
    /// Request for `interface` with a zeroed payload.
    pub fn new(interface: &str) -> io::Result<Self> {
        Ok(Iwreq {
            ifr_name: ifname(interface)?,
            u: IwreqData {
                name: [0; IFNAMSIZ],
            },
        })
    }

    /// Request for `interface` pointing at `buffer`.
    pub fn with_buffer(interface: &str, buffer: &mut [u8]) -> io::Result<Self> {
        let mut req = Iwreq::new(interface)?;
        req.u.data = IwPoint {
            pointer: buffer.as_mut_ptr() as *mut c_void,
            length: u16::try_from(buffer.len()).unwrap_or(u16::MAX),
            flags: 0,
        };
        Ok(req)
    }
}

/// Leading part of `struct iw_range` up to the version fields.
///
/// The kernel writes the whole structure, so callers must hand it a
/// buffer of at least `IW_SCAN_MAX_DATA` bytes and read this prefix
/// out of it.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct IwRange {
    #[allow(missing_docs)]
    pub throughput: u32,
    #[allow(missing_docs)]
    pub min_nwid: u32,
    #[allow(missing_docs)]
    pub max_nwid: u32,
    #[allow(missing_docs)]
    pub old_num_channels: u16,
    #[allow(missing_docs)]
    pub old_num_frequency: u8,
    #[allow(missing_docs)]
    pub scan_capa: u8,
    #[allow(missing_docs)]
    pub event_capa: [u32; 6],
    #[allow(missing_docs)]
    pub sensitivity: i32,
    #[allow(missing_docs)]
    pub max_qual: IwQuality,
    #[allow(missing_docs)]
    pub avg_qual: IwQuality,
    #[allow(missing_docs)]
    pub num_bitrates: u8,
    #[allow(missing_docs)]
    pub bitrate: [i32; 32],
    #[allow(missing_docs)]
    pub min_rts: i32,
    #[allow(missing_docs)]
    pub max_rts: i32,
    #[allow(missing_docs)]
    pub min_frag: i32,
    #[allow(missing_docs)]
    pub max_frag: i32,
    #[allow(missing_docs)]
    pub min_pmp: i32,
    #[allow(missing_docs)]
    pub max_pmp: i32,
    #[allow(missing_docs)]
    pub min_pmt: i32,
    #[allow(missing_docs)]
    pub max_pmt: i32,
    #[allow(missing_docs)]
    pub pmp_flags: u16,
    #[allow(missing_docs)]
    pub pmt_flags: u16,
    #[allow(missing_docs)]
    pub pm_capa: u16,
    #[allow(missing_docs)]
    pub encoding_size: [u16; 8],
    #[allow(missing_docs)]
    pub num_encoding_sizes: u8,
    #[allow(missing_docs)]
    pub max_encoding_tokens: u8,
    #[allow(missing_docs)]
    pub encoding_login_index: u8,
    #[allow(missing_docs)]
    pub txpower_capa: u16,
    #[allow(missing_docs)]
    pub num_txpower: u8,
    #[allow(missing_docs)]
    pub txpower: [i32; 8],
    /// Wireless extension version the driver was compiled against.
    pub we_version_compiled: u8,
    /// Wireless extension version of the driver source.
    pub we_version_source: u8,
}

/// `struct ifreq` restricted to `ifr_flags`, padded to the full size of
/// the kernel union.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct IfreqFlags {
    /// Interface name.
    pub ifr_name: [c_char; IFNAMSIZ],
    /// Interface flags (`IFF_UP`, ...).
    pub ifr_flags: c_short,
    _pad: [u8; 22],
}

impl IfreqFlags {
    /// Request for `interface` with no flags set.
    pub fn new(interface: &str) -> io::Result<Self> {
        Ok(IfreqFlags {
            ifr_name: ifname(interface)?,
            ifr_flags: 0,
            _pad: [0; 22],
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_kernel_sockaddr_storage_layout() {
        assert_eq!(size_of::<KernelSockaddrStorage>(), _K_SS_MAXSIZE);
        assert_eq!(align_of::<KernelSockaddrStorage>(), align_of::<*const c_void>());
        assert_eq!(offset_of!(KernelSockaddrStorage, data), 2);
    }

    #[test]
    fn test_kernel_aliases() {
        assert_eq!(size_of::<__kernel_sa_family_t>(), 2);
        assert_eq!(size_of::<__be64>(), 8);
        assert_eq!(size_of::<__s16>(), 2);
        assert_eq!(AF_NETLINK, libc::AF_NETLINK);
        assert_eq!(SCM_RIGHTS, libc::SCM_RIGHTS);
    }

    #[test]
    fn test_wext_layouts() {
        assert_eq!(size_of::<Iwreq>(), 32);
        assert_eq!(size_of::<IwFreq>(), 8);
        assert_eq!(size_of::<IwQuality>(), 4);
        assert_eq!(offset_of!(IwRange, we_version_compiled), 280);
        assert_eq!(size_of::<IfreqFlags>(), 40);
        assert_eq!(offset_of!(IfreqFlags, ifr_flags), IFNAMSIZ);
    }

    #[test]
    fn test_iw_event_layout() {
        use crate::consts::wext::{IW_EV_ADDR_LEN, IW_EV_LCP_LEN, IW_EV_POINT_LEN};

        assert_eq!(offset_of!(IwEvent, u), IW_EV_LCP_LEN);
        assert_eq!(offset_of!(IwPoint, length), size_of::<*mut c_void>());
        if cfg!(target_pointer_width = "64") {
            assert_eq!(IW_EV_LCP_LEN, 8);
            assert_eq!(IW_EV_POINT_LEN, 16);
            assert_eq!(IW_EV_ADDR_LEN, 24);
        } else {
            assert_eq!(IW_EV_LCP_LEN, 4);
            assert_eq!(IW_EV_POINT_LEN, 8);
            assert_eq!(IW_EV_ADDR_LEN, 20);
        }
    }

    #[test]
    fn test_ifname() {
        let name = ifname("wlan0").unwrap();
        assert_eq!(name[..6], [b'w' as c_char, b'l' as c_char, b'a' as c_char, b'n' as c_char, b'0' as c_char, 0]);
        assert!(ifname("").is_err());
        assert!(ifname("sixteen-chars-xx").is_err());
        assert!(ifname("bad\0name").is_err());
    }

    #[test]
    fn test_iw_freq_mhz() {
        let freq = IwFreq { m: 2412, e: 6, i: 0, flags: 0 };
        assert_eq!(freq.mhz(), Some(2412));
        let freq = IwFreq { m: 241200000, e: 1, i: 0, flags: 0 };
        assert_eq!(freq.mhz(), Some(2412));
        let chan = IwFreq { m: 6, e: 0, i: 0, flags: 0 };
        assert_eq!(chan.mhz(), None);
    }

    #[test]
    fn test_ioctl_bad_fd() {
        let mut req = Iwreq::new("wlan0").unwrap();
        let ret = unsafe {
            ioctl(
                -1,
                crate::consts::wext::SIOCGIWNAME,
                &mut req as *mut Iwreq as *mut c_void,
            )
        };
        assert_eq!(ret, -1);
        assert_eq!(io::Error::last_os_error().raw_os_error(), Some(libc::EBADF));
    }
}
