//! Legacy wireless extensions backend.
//!
//! Every request is an `ioctl` on an `AF_INET` datagram socket carrying an
//! [`Iwreq`]. Scanning is a three step affair: `SIOCSIWSCAN` starts a scan,
//! `SIOCGIWSCAN` is polled until the driver has results and the results
//! come back as a packed stream of `iw_event` records.
//!
//! Only the stream layout introduced with wireless extensions 19 is
//! understood, as a native process sees it: event headers padded to the
//! alignment of `iwreq_data` and `iw_point` payloads without their pointer.

use std::{
    ffi::CStr,
    io,
    mem::{offset_of, size_of},
    ptr,
    thread,
    time::{Duration, Instant},
};

use byteorder::{ByteOrder, NativeEndian};
use getset::Getters;
use libc::c_int;
use log::{debug, trace, warn};

use crate::{
    consts::wext::*,
    err::WlanError,
    ffi::{ioctl_result, IwFreq, IwQuality, IwRange, Iwreq},
    linux::{netif::NetworkInterface, set_interface_up, IoctlSocket},
    wlan::{Bssid, Ssid, WlanInterface, WlanManager, WlanNetwork},
};

/// Default time [`WirelessExtensions::scan`] waits for results.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between two polls for scan results.
pub const SCAN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Oldest wireless extensions version whose scan stream can be parsed.
pub const MIN_STREAM_VERSION: u8 = 19;

/// One access point from a wireless extensions scan.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct ScanEntry {
    /// Address of the access point.
    bssid: Bssid,
    /// Raw ESSID, empty for hidden networks.
    essid: Vec<u8>,
    /// Channel or frequency.
    frequency: Option<IwFreq>,
    /// Link quality.
    quality: Option<IwQuality>,
}

impl ScanEntry {
    fn new(bssid: Bssid) -> Self {
        ScanEntry {
            bssid,
            essid: Vec::new(),
            frequency: None,
            quality: None,
        }
    }

    /// The network this entry describes.
    pub fn network(&self) -> WlanNetwork {
        WlanNetwork::new(Ssid::truncating_bytes(&self.essid), self.bssid)
    }
}

/// Parse a `SIOCGIWSCAN` result stream.
///
/// Each `SIOCGIWAP` event starts a new entry and the events following it
/// describe that access point. Events before the first address, unknown
/// events and a truncated trailing event are skipped.
pub fn parse_events(stream: &[u8]) -> Vec<ScanEntry> {
    let mut entries = Vec::new();
    let mut current: Option<ScanEntry> = None;
    let mut pos = 0;

    while stream.len() - pos >= IW_EV_LCP_LEN {
        let len = NativeEndian::read_u16(&stream[pos..]) as usize;
        let cmd = libc::c_ulong::from(NativeEndian::read_u16(&stream[pos + 2..]));
        if len < IW_EV_LCP_LEN || pos + len > stream.len() {
            warn!("Malformed event of length {} at offset {}", len, pos);
            break;
        }
        let body = &stream[pos + IW_EV_LCP_LEN..pos + len];
        pos += len;

        match cmd {
            SIOCGIWAP => {
                // struct sockaddr: sa_family followed by the address
                if len < IW_EV_ADDR_LEN {
                    continue;
                }
                let Some(bssid) = body.get(2..2 + Bssid::LEN).and_then(Bssid::from_slice) else {
                    continue;
                };
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                current = Some(ScanEntry::new(bssid));
            }
            SIOCGIWESSID => {
                let Some(entry) = current.as_mut() else { continue };
                if len < IW_EV_POINT_LEN {
                    continue;
                }
                let length = NativeEndian::read_u16(body) as usize;
                let flags = NativeEndian::read_u16(&body[2..]);
                let data = &body[IW_EV_POINT_LEN - IW_EV_LCP_LEN..];
                // flags of 0 means "any", i.e. a hidden network
                entry.essid = if flags == 0 {
                    Vec::new()
                } else {
                    data[..length.min(data.len()).min(IW_ESSID_MAX_SIZE)].to_vec()
                };
            }
            SIOCGIWFREQ => {
                let Some(entry) = current.as_mut() else { continue };
                if body.len() < size_of::<IwFreq>() {
                    continue;
                }
                entry.frequency = Some(IwFreq {
                    m: NativeEndian::read_i32(body),
                    e: NativeEndian::read_i16(&body[4..]),
                    i: body[6],
                    flags: body[7],
                });
            }
            IWEVQUAL => {
                let Some(entry) = current.as_mut() else { continue };
                if body.len() < size_of::<IwQuality>() {
                    continue;
                }
                entry.quality = Some(IwQuality {
                    qual: body[0],
                    level: body[1],
                    noise: body[2],
                    updated: body[3],
                });
            }
            _ => trace!("Skipping event {:#x}", cmd),
        }
    }
    if let Some(entry) = current {
        entries.push(entry);
    }
    entries
}

/// Interpret the result of a zero length `SIOCGIWSCAN` probe.
fn scan_ready(result: io::Result<c_int>) -> io::Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) => match e.raw_os_error() {
            Some(libc::E2BIG) => Ok(true),
            Some(libc::EAGAIN) | Some(libc::EBUSY) => Ok(false),
            _ => Err(e),
        },
    }
}

/// Wireless extensions `ioctl` interface.
pub struct WirelessExtensions {
    socket: IoctlSocket,
}

impl WirelessExtensions {
    /// Open the socket used for all requests.
    pub fn new() -> io::Result<Self> {
        Ok(WirelessExtensions {
            socket: IoctlSocket::new()?,
        })
    }

    /// Wireless protocol name, for example `IEEE 802.11`.
    pub fn name(&self, interface: &WlanInterface) -> io::Result<String> {
        let mut req = Iwreq::new(interface.name())?;
        unsafe { ioctl_result(self.socket.fd(), SIOCGIWNAME, &mut req) }?;
        let name = unsafe { req.u.name };
        let bytes = name.iter().map(|c| *c as u8).collect::<Vec<_>>();
        Ok(CStr::from_bytes_until_nul(&bytes)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Wireless extensions version the driver was compiled against.
    pub fn version(&self, interface: &WlanInterface) -> io::Result<u8> {
        let mut buffer = vec![0u8; IW_SCAN_MAX_DATA];
        let mut req = Iwreq::with_buffer(interface.name(), &mut buffer)?;
        unsafe { ioctl_result(self.socket.fd(), SIOCGIWRANGE, &mut req) }?;
        let written = unsafe { req.u.data.length } as usize;
        if written <= offset_of!(IwRange, we_version_compiled) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("range reply of {} bytes has no version", written),
            ));
        }
        let range = unsafe { ptr::read_unaligned(buffer.as_ptr() as *const IwRange) };
        Ok(range.we_version_compiled)
    }

    /// Interfaces that answer wireless extension requests.
    pub fn interfaces(&self) -> io::Result<Vec<WlanInterface>> {
        Ok(NetworkInterface::interfaces()?
            .into_iter()
            .map(|i| WlanInterface::new(i.name().as_str()))
            .filter(|i| self.name(i).is_ok())
            .collect())
    }

    /// Ask the driver to start a scan.
    pub fn start_scan(&self, interface: &WlanInterface) -> io::Result<()> {
        let mut req = Iwreq::new(interface.name())?;
        unsafe { ioctl_result(self.socket.fd(), SIOCSIWSCAN, &mut req) }?;
        debug!("Started scan on {}", interface);
        Ok(())
    }

    /// Returns `true` once results of the last scan can be read.
    pub fn is_scan_finished(&self, interface: &WlanInterface) -> io::Result<bool> {
        let mut req = Iwreq::with_buffer(interface.name(), &mut [])?;
        scan_ready(unsafe { ioctl_result(self.socket.fd(), SIOCGIWSCAN, &mut req) })
    }

    /// Read the results of the last scan, growing the buffer until they
    /// fit.
    pub fn scan_results(&self, interface: &WlanInterface) -> io::Result<Vec<ScanEntry>> {
        let mut len = IW_SCAN_MAX_DATA;
        loop {
            let mut buffer = vec![0u8; len];
            let mut req = Iwreq::with_buffer(interface.name(), &mut buffer)?;
            match unsafe { ioctl_result(self.socket.fd(), SIOCGIWSCAN, &mut req) } {
                Ok(_) => {
                    let written = unsafe { req.u.data.length } as usize;
                    buffer.truncate(written);
                    trace!("Scan stream: {:?}", buffer);
                    return Ok(parse_events(&buffer));
                }
                Err(e) if e.raw_os_error() == Some(libc::E2BIG) => {
                    if len >= usize::from(u16::MAX) {
                        return Err(e);
                    }
                    // Newer kernels report the size they need.
                    let wanted = unsafe { req.u.data.length } as usize;
                    len = (len + IW_SCAN_MAX_DATA)
                        .max(wanted)
                        .min(usize::from(u16::MAX));
                    debug!("Scan results need more room, retrying with {} bytes", len);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Start a scan and wait for its results, polling once per
    /// [`SCAN_POLL_INTERVAL`]. Fails with `ETIMEDOUT` if no results
    /// arrive within `timeout` ([`DEFAULT_SCAN_TIMEOUT`] if [`None`]).
    pub fn scan(
        &self,
        interface: &WlanInterface,
        timeout: Option<Duration>,
    ) -> io::Result<Vec<ScanEntry>> {
        let version = self.version(interface)?;
        if version < MIN_STREAM_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("wireless extensions version {} is too old", version),
            ));
        }

        self.start_scan(interface)?;
        let deadline = Instant::now() + timeout.unwrap_or(DEFAULT_SCAN_TIMEOUT);
        loop {
            if self.is_scan_finished(interface)? {
                return self.scan_results(interface);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::from_raw_os_error(libc::ETIMEDOUT));
            }
            thread::sleep(SCAN_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl WlanManager for WirelessExtensions {
    fn interfaces(&self) -> Result<Vec<WlanInterface>, WlanError> {
        Ok(WirelessExtensions::interfaces(self)?)
    }

    /// Wireless extensions have no portable directed scan, so a requested
    /// `ssid` filters the results of a broadcast scan.
    fn scan(
        &self,
        ssid: Option<&Ssid>,
        interface: &WlanInterface,
    ) -> Result<Vec<WlanNetwork>, WlanError> {
        let entries = match WirelessExtensions::scan(self, interface, None) {
            Ok(entries) => entries,
            Err(e) if e.raw_os_error() == Some(libc::ETIMEDOUT) => return Err(WlanError::Timeout),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                return Err(WlanError::NotSupported("wireless extensions scan stream"))
            }
            Err(e) => return Err(WlanError::Io(e)),
        };
        Ok(entries
            .iter()
            .map(ScanEntry::network)
            .filter(|n| ssid.map_or(true, |s| n.ssid() == s))
            .collect())
    }

    fn set_power(&self, power: bool, interface: &WlanInterface) -> Result<(), WlanError> {
        Ok(set_interface_up(self.socket.fd(), interface.name(), power)?)
    }

    fn disassociate(&self, _: &WlanInterface) -> Result<(), WlanError> {
        Err(WlanError::NotSupported("disassociate over wireless extensions"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use byteorder::WriteBytesExt;

    use crate::test::setup;

    fn event(stream: &mut Vec<u8>, cmd: libc::c_ulong, body: &[u8]) {
        stream
            .write_u16::<NativeEndian>((IW_EV_LCP_LEN + body.len()) as u16)
            .unwrap();
        stream.write_u16::<NativeEndian>(cmd as u16).unwrap();
        stream.resize(stream.len() + IW_EV_LCP_LEN - 4, 0);
        stream.extend_from_slice(body);
    }

    fn ap(stream: &mut Vec<u8>, mac: [u8; 6]) {
        let mut body = vec![];
        body.write_u16::<NativeEndian>(libc::ARPHRD_ETHER).unwrap();
        body.extend_from_slice(&mac);
        body.extend_from_slice(&[0; 8]);
        event(stream, SIOCGIWAP, &body);
    }

    fn essid(stream: &mut Vec<u8>, ssid: &[u8], flags: u16) {
        let mut body = vec![];
        body.write_u16::<NativeEndian>(ssid.len() as u16).unwrap();
        body.write_u16::<NativeEndian>(flags).unwrap();
        body.resize(IW_EV_POINT_LEN - IW_EV_LCP_LEN, 0);
        body.extend_from_slice(ssid);
        event(stream, SIOCGIWESSID, &body);
    }

    #[test]
    #[cfg(all(target_pointer_width = "64", target_endian = "little"))]
    fn test_parse_events_native_64bit() {
        setup();

        #[rustfmt::skip]
        let stream: Vec<u8> = [
            // SIOCGIWAP, sockaddr at 8
            &[24, 0, 0x15, 0x8B, 0, 0, 0, 0][..],
            &[1, 0, 0x18, 0xA6, 0xF7, 0x99, 0x81, 0x90, 0, 0, 0, 0, 0, 0, 0, 0],
            // SIOCGIWESSID, length/flags at 8, data at 16
            &[20, 0, 0x1B, 0x8B, 0, 0, 0, 0],
            &[4, 0, 1, 0, 0, 0, 0, 0],
            b"Home",
        ]
        .concat();

        let entries = parse_events(&stream);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bssid().to_string(), "18:A6:F7:99:81:90");
        assert_eq!(entries[0].essid(), b"Home");
    }

    #[test]
    fn test_parse_events() {
        setup();

        let mut stream = vec![];
        ap(&mut stream, [0x18, 0xa6, 0xf7, 0x99, 0x81, 0x90]);
        essid(&mut stream, b"Home", 1);
        let mut freq = vec![];
        freq.write_i32::<NativeEndian>(2412).unwrap();
        freq.write_i16::<NativeEndian>(6).unwrap();
        freq.extend_from_slice(&[0, 0]);
        event(&mut stream, SIOCGIWFREQ, &freq);
        event(&mut stream, IWEVQUAL, &[60, 200, 0, 0x0f]);
        event(&mut stream, 0x8B1D, &[0; 4]);
        ap(&mut stream, [0x02, 0, 0, 0, 0, 0x01]);
        essid(&mut stream, b"", 0);

        let entries = parse_events(&stream);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].bssid().to_string(), "18:A6:F7:99:81:90");
        assert_eq!(entries[0].essid(), b"Home");
        assert_eq!(entries[0].frequency().and_then(|f| f.mhz()), Some(2412));
        assert_eq!(entries[0].quality().map(|q| q.qual), Some(60));
        assert_eq!(entries[0].network().ssid().as_bytes(), b"Home");

        assert!(entries[1].essid().is_empty());
        assert_eq!(entries[1].frequency(), &None);
        assert_eq!(entries[1].network().ssid().as_bytes(), b" ");
    }

    #[test]
    fn test_parse_events_malformed() {
        setup();

        assert!(parse_events(&[]).is_empty());

        // ESSID before any address is ignored
        let mut stream = vec![];
        essid(&mut stream, b"Orphan", 1);
        ap(&mut stream, [1, 2, 3, 4, 5, 6]);
        let entries = parse_events(&stream);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].essid().is_empty());

        // Truncated trailing event keeps what was parsed
        let mut stream = vec![];
        ap(&mut stream, [1, 2, 3, 4, 5, 6]);
        essid(&mut stream, b"Cut", 1);
        stream.truncate(stream.len() - 2);
        let entries = parse_events(&stream);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].essid().is_empty());

        // Zero length event stops the parser
        let mut stream = vec![0; IW_EV_LCP_LEN];
        ap(&mut stream, [1, 2, 3, 4, 5, 6]);
        assert!(parse_events(&stream).is_empty());
    }

    #[test]
    fn test_parse_events_long_essid() {
        setup();

        let mut stream = vec![];
        ap(&mut stream, [1, 2, 3, 4, 5, 6]);
        essid(&mut stream, &[b'x'; 40], 1);
        let entries = parse_events(&stream);
        assert_eq!(entries[0].essid().len(), IW_ESSID_MAX_SIZE);
    }

    #[test]
    fn test_scan_ready() {
        setup();

        assert!(scan_ready(Ok(0)).unwrap());
        assert!(scan_ready(Err(io::Error::from_raw_os_error(libc::E2BIG))).unwrap());
        assert!(!scan_ready(Err(io::Error::from_raw_os_error(libc::EAGAIN))).unwrap());
        assert!(!scan_ready(Err(io::Error::from_raw_os_error(libc::EBUSY))).unwrap());
        let err = scan_ready(Err(io::Error::from_raw_os_error(libc::ENODEV))).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENODEV));
    }

    #[test]
    fn test_loopback_is_not_wireless() {
        setup();

        let wext = WirelessExtensions::new().unwrap();
        let lo = WlanInterface::new("lo");
        assert!(wext.name(&lo).is_err());
        assert!(!WirelessExtensions::interfaces(&wext).unwrap().contains(&lo));
        assert!(matches!(
            wext.disassociate(&lo),
            Err(WlanError::NotSupported(_))
        ));
    }

    #[test]
    #[ignore]
    fn real_test_scan() {
        setup();

        let wext = WirelessExtensions::new().unwrap();
        let interface = WlanManager::interface(&wext).unwrap().unwrap();
        assert!(wext.name(&interface).unwrap().contains("802.11"));
        assert!(wext.version(&interface).unwrap() >= MIN_STREAM_VERSION);
        let entries = WirelessExtensions::scan(&wext, &interface, None).unwrap();
        assert!(!entries.is_empty());
    }
}
