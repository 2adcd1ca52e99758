//! Constants from `/usr/include/linux/wireless.h` and `net/if.h`.

use std::mem::{offset_of, size_of};

use crate::ffi::{IwEvent, IwPoint, IwreqData};

/// Get name, a.k.a. wireless protocol (`"IEEE 802.11"`).
pub const SIOCGIWNAME: libc::c_ulong = 0x8B01;
/// Get channel or frequency in Hz.
pub const SIOCGIWFREQ: libc::c_ulong = 0x8B05;
/// Get range of parameters.
pub const SIOCGIWRANGE: libc::c_ulong = 0x8B0B;
/// Get access point MAC address.
pub const SIOCGIWAP: libc::c_ulong = 0x8B15;
/// Trigger scanning.
pub const SIOCSIWSCAN: libc::c_ulong = 0x8B18;
/// Get scanning results.
pub const SIOCGIWSCAN: libc::c_ulong = 0x8B19;
/// Get ESSID.
pub const SIOCGIWESSID: libc::c_ulong = 0x8B1B;
/// Quality part of statistics event.
pub const IWEVQUAL: libc::c_ulong = 0x8C01;

/// Get interface flags.
pub const SIOCGIFFLAGS: libc::c_ulong = 0x8913;
/// Set interface flags.
pub const SIOCSIFFLAGS: libc::c_ulong = 0x8914;

/// Maximum size of a scan result buffer the kernel fills in one go.
pub const IW_SCAN_MAX_DATA: usize = 4096;
/// Maximum ESSID length.
pub const IW_ESSID_MAX_SIZE: usize = 32;
/// Length of an interface name including the terminating NUL.
pub const IFNAMSIZ: usize = 16;

/// Length of the `len`/`cmd` header of an event in a scan stream,
/// padding included.
pub const IW_EV_LCP_LEN: usize = size_of::<IwEvent>() - size_of::<IwreqData>();
/// Offset of the data of an `iw_point` event. The pointer is dropped from
/// the stream, `length` and `flags` follow the header.
pub const IW_EV_POINT_LEN: usize =
    IW_EV_LCP_LEN + size_of::<IwPoint>() - offset_of!(IwPoint, length);
/// Length of an access point address event.
pub const IW_EV_ADDR_LEN: usize = IW_EV_LCP_LEN + size_of::<libc::sockaddr>();
