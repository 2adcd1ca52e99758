//! Typed `nl80211` requests and replies.
//!
//! Requests implement [`Nl80211Request`] and turn into a
//! [`Genlmsghdr`] ready for
//! [`NlRouter::send`][crate::router::NlRouter::send]. Replies are parsed
//! from the same message type with [`TryFrom`].
//!
//! ```
//! use wlan::{
//!     consts::nl80211::{Nl80211Attr, Nl80211Cmd},
//!     nl80211::{Nl80211Request, TriggerScan},
//! };
//!
//! let msg = TriggerScan {
//!     interface: 3,
//!     ssids: Vec::new(),
//! }
//! .to_message()
//! .unwrap();
//! assert_eq!(*msg.cmd(), Nl80211Cmd::TriggerScan);
//! assert!(msg.get_attr_handle().get_attribute(Nl80211Attr::Ifindex).is_some());
//! ```

use getset::Getters;

use crate::{
    attr::Attribute,
    consts::{
        genl::NlAttrType,
        nl::NlmF,
        nl80211::{
            Nl80211Attr, Nl80211Bss, Nl80211BssStatus, Nl80211Cmd, Nl80211IfType, WLAN_EID_SSID,
        },
    },
    err::{DeError, SerError},
    genl::{GenlAttrHandle, Genlmsghdr, GenlmsghdrBuilder, Nlattr},
    types::{Buffer, GenlBuffer},
    wlan::{Bssid, Ssid, WlanInterface, WlanNetwork},
    FromBytes,
};

/// Generic netlink message carrying an `nl80211` command.
pub type Nl80211Message = Genlmsghdr<Nl80211Cmd, Nl80211Attr>;

/// Protocol version sent with every request.
pub const NL80211_VERSION: u8 = 0;

/// An `nl80211` command that can be sent to the kernel.
pub trait Nl80211Request {
    /// Command number.
    const CMD: Nl80211Cmd;

    /// Netlink flags in addition to `NLM_F_REQUEST`.
    fn flags(&self) -> NlmF;

    /// Request attributes.
    fn attrs(&self) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError>;

    /// Build the generic netlink message for this request.
    fn to_message(&self) -> Result<Nl80211Message, SerError> {
        Ok(GenlmsghdrBuilder::default()
            .cmd(Self::CMD)
            .version(NL80211_VERSION)
            .attrs(self.attrs()?)
            .build()?)
    }
}

fn ifindex_attrs(interface: u32) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError> {
    Ok(std::iter::once(Nlattr::new(false, false, Nl80211Attr::Ifindex, interface)?).collect())
}

/// `NL80211_CMD_TRIGGER_SCAN`: start a scan on an interface.
///
/// An empty `ssids` list asks for a broadcast scan. Each SSID listed
/// is probed for explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerScan {
    /// Interface index.
    pub interface: u32,
    /// Networks to probe for.
    pub ssids: Vec<Ssid>,
}

impl Nl80211Request for TriggerScan {
    const CMD: Nl80211Cmd = Nl80211Cmd::TriggerScan;

    fn flags(&self) -> NlmF {
        NlmF::ACK
    }

    fn attrs(&self) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError> {
        let mut attrs = ifindex_attrs(self.interface)?;
        if !self.ssids.is_empty() {
            let mut ssids = Nlattr::new(true, false, Nl80211Attr::ScanSsids, Buffer::new())?;
            for (i, ssid) in self.ssids.iter().enumerate() {
                ssids.add_nested_attribute(&Nlattr::new(
                    false,
                    false,
                    i as u16 + 1,
                    ssid.as_bytes(),
                )?)?;
            }
            attrs.push(ssids);
        }
        Ok(attrs)
    }
}

/// `NL80211_CMD_GET_SCAN`: dump the scan results cached for an
/// interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetScan {
    /// Interface index.
    pub interface: u32,
}

impl Nl80211Request for GetScan {
    const CMD: Nl80211Cmd = Nl80211Cmd::GetScan;

    fn flags(&self) -> NlmF {
        NlmF::DUMP
    }

    fn attrs(&self) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError> {
        ifindex_attrs(self.interface)
    }
}

/// `NL80211_CMD_GET_INTERFACE`: describe one interface, or dump all
/// wireless interfaces when `interface` is [`None`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetInterface {
    /// Interface index.
    pub interface: Option<u32>,
}

impl Nl80211Request for GetInterface {
    const CMD: Nl80211Cmd = Nl80211Cmd::GetInterface;

    fn flags(&self) -> NlmF {
        match self.interface {
            Some(_) => NlmF::ACK,
            None => NlmF::DUMP,
        }
    }

    fn attrs(&self) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError> {
        match self.interface {
            Some(i) => ifindex_attrs(i),
            None => Ok(GenlBuffer::new()),
        }
    }
}

/// `NL80211_CMD_DISCONNECT`: leave the current network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disconnect {
    /// Interface index.
    pub interface: u32,
}

impl Nl80211Request for Disconnect {
    const CMD: Nl80211Cmd = Nl80211Cmd::Disconnect;

    fn flags(&self) -> NlmF {
        NlmF::ACK
    }

    fn attrs(&self) -> Result<GenlBuffer<Nl80211Attr, Buffer>, SerError> {
        ifindex_attrs(self.interface)
    }
}

fn required<T, R>(handle: &GenlAttrHandle<'_, T>, t: T, name: &'static str) -> Result<R, DeError>
where
    T: NlAttrType,
    R: FromBytes,
{
    match handle.get_attribute(t) {
        Some(attr) => attr.get_payload_as::<R>(),
        None => Err(DeError::MissingAttribute(name)),
    }
}

fn optional<T, R>(handle: &GenlAttrHandle<'_, T>, t: T) -> Result<Option<R>, DeError>
where
    T: NlAttrType,
    R: FromBytes,
{
    handle
        .get_attribute(t)
        .map(|attr| attr.get_payload_as::<R>())
        .transpose()
}

fn bytes<T>(handle: &GenlAttrHandle<'_, T>, t: T) -> Result<Option<Vec<u8>>, DeError>
where
    T: NlAttrType,
{
    handle
        .get_attribute(t)
        .map(|attr| attr.get_payload_as_with_len::<Vec<u8>>())
        .transpose()
}

/// Iterator over the `(id, data)` elements of an 802.11 information
/// element list.
///
/// A final element that claims more data than is left yields what is
/// left.
#[derive(Clone, Debug)]
pub struct InformationElements<'a> {
    data: &'a [u8],
}

impl<'a> InformationElements<'a> {
    /// Iterate over the elements in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        InformationElements { data }
    }
}

impl<'a> Iterator for InformationElements<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 2 {
            return None;
        }
        let id = self.data[0];
        let end = (2 + self.data[1] as usize).min(self.data.len());
        let body = &self.data[2..end];
        self.data = &self.data[end..];
        Some((id, body))
    }
}

/// A basic service set as reported in `NL80211_ATTR_BSS`.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct Bss {
    /// Access point address.
    bssid: Bssid,
    /// Channel frequency in MHz.
    frequency: u32,
    /// Timing synchronization function value.
    tsf: Option<u64>,
    /// Beacon interval in time units.
    beacon_interval: Option<u16>,
    /// Capability field of the beacon or probe response.
    capability: Option<u16>,
    /// Signal strength in mBm (dBm * 100).
    signal_mbm: Option<i32>,
    /// Signal strength from 0 to 100 on drivers without dBm support.
    signal_unspec: Option<u8>,
    /// Age of the entry in milliseconds.
    seen_ms_ago: Option<u32>,
    /// Association state of this interface with the BSS.
    status: Option<Nl80211BssStatus>,
    /// Raw information elements, from the probe response when there
    /// was one, else from the beacon.
    information_elements: Vec<u8>,
}

impl Bss {
    fn parse(handle: &GenlAttrHandle<'_, Nl80211Bss>) -> Result<Self, DeError> {
        let bssid = Bssid::new(required::<_, [u8; 6]>(
            handle,
            Nl80211Bss::Bssid,
            "NL80211_BSS_BSSID",
        )?);
        let information_elements = match bytes(handle, Nl80211Bss::InformationElements)? {
            Some(ies) => ies,
            None => bytes(handle, Nl80211Bss::BeaconIes)?.unwrap_or_default(),
        };
        Ok(Bss {
            bssid,
            frequency: required(handle, Nl80211Bss::Frequency, "NL80211_BSS_FREQUENCY")?,
            tsf: optional(handle, Nl80211Bss::Tsf)?,
            beacon_interval: optional(handle, Nl80211Bss::BeaconInterval)?,
            capability: optional(handle, Nl80211Bss::Capability)?,
            signal_mbm: optional(handle, Nl80211Bss::SignalMbm)?,
            signal_unspec: optional(handle, Nl80211Bss::SignalUnspec)?,
            seen_ms_ago: optional(handle, Nl80211Bss::SeenMsAgo)?,
            status: optional::<_, u32>(handle, Nl80211Bss::Status)?.map(Nl80211BssStatus::from),
            information_elements,
        })
    }

    /// Iterate over the information elements.
    pub fn elements(&self) -> InformationElements<'_> {
        InformationElements::new(&self.information_elements)
    }

    /// Network name from the SSID element. Hidden networks and BSSs
    /// without an SSID element get an SSID of a single space.
    pub fn ssid(&self) -> Ssid {
        match self.elements().find(|(id, _)| *id == WLAN_EID_SSID) {
            Some((_, data)) => Ssid::truncating_bytes(data),
            None => Ssid::truncating_bytes(&[]),
        }
    }

    /// The network this BSS belongs to.
    pub fn network(&self) -> WlanNetwork {
        WlanNetwork::new(self.ssid(), self.bssid)
    }
}

/// One entry of a `NL80211_CMD_GET_SCAN` dump.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct ScanResult {
    /// Interface index.
    interface: u32,
    /// Wireless device identifier.
    wireless_device: Option<u64>,
    /// Scan generation, changes when the result set changes.
    generation: u32,
    /// The BSS that was seen.
    bss: Bss,
}

impl TryFrom<&Nl80211Message> for ScanResult {
    type Error = DeError;

    fn try_from(msg: &Nl80211Message) -> Result<Self, Self::Error> {
        let handle = msg.get_attr_handle();
        if handle.get_attribute(Nl80211Attr::Bss).is_none() {
            return Err(DeError::MissingAttribute("NL80211_ATTR_BSS"));
        }
        let bss = Bss::parse(&handle.get_nested_attributes::<Nl80211Bss>(Nl80211Attr::Bss)?)?;
        Ok(ScanResult {
            interface: required(&handle, Nl80211Attr::Ifindex, "NL80211_ATTR_IFINDEX")?,
            wireless_device: optional(&handle, Nl80211Attr::Wdev)?,
            generation: optional(&handle, Nl80211Attr::Generation)?.unwrap_or(0),
            bss,
        })
    }
}

/// Scan notification sent to the `scan` multicast group for
/// `NL80211_CMD_TRIGGER_SCAN`, `NL80211_CMD_NEW_SCAN_RESULTS` and
/// `NL80211_CMD_SCAN_ABORTED`.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct TriggerScanStatus {
    /// Physical device index.
    wiphy: u32,
    /// Interface index.
    interface: u32,
    /// Wireless device identifier.
    wireless_device: Option<u64>,
    /// SSIDs probed for.
    scan_ssids: Vec<Vec<u8>>,
    /// Frequencies scanned in MHz.
    scan_frequencies: Vec<u32>,
}

impl TryFrom<&Nl80211Message> for TriggerScanStatus {
    type Error = DeError;

    fn try_from(msg: &Nl80211Message) -> Result<Self, Self::Error> {
        let handle = msg.get_attr_handle();

        let mut scan_ssids = Vec::new();
        if handle.get_attribute(Nl80211Attr::ScanSsids).is_some() {
            for ssid in handle
                .get_nested_attributes::<u16>(Nl80211Attr::ScanSsids)?
                .iter()
            {
                scan_ssids.push(ssid.get_payload_as_with_len::<Vec<u8>>()?);
            }
        }

        let mut scan_frequencies = Vec::new();
        if handle.get_attribute(Nl80211Attr::ScanFrequencies).is_some() {
            for freq in handle
                .get_nested_attributes::<u16>(Nl80211Attr::ScanFrequencies)?
                .iter()
            {
                scan_frequencies.push(freq.get_payload_as::<u32>()?);
            }
        }

        Ok(TriggerScanStatus {
            wiphy: required(&handle, Nl80211Attr::Wiphy, "NL80211_ATTR_WIPHY")?,
            interface: required(&handle, Nl80211Attr::Ifindex, "NL80211_ATTR_IFINDEX")?,
            wireless_device: optional(&handle, Nl80211Attr::Wdev)?,
            scan_ssids,
            scan_frequencies,
        })
    }
}

/// A wireless interface as reported by `NL80211_CMD_GET_INTERFACE`.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct Nl80211Interface {
    /// Interface index.
    interface: u32,
    /// Interface name.
    name: String,
    /// Physical device index.
    wiphy: u32,
    /// Interface mode.
    iftype: Nl80211IfType,
    /// Wireless device identifier.
    wireless_device: Option<u64>,
    /// Hardware address.
    mac: Option<[u8; 6]>,
    /// SSID of the network the interface is connected to.
    ssid: Option<Ssid>,
}

impl Nl80211Interface {
    /// Platform neutral handle for this interface.
    pub fn to_wlan_interface(&self) -> WlanInterface {
        WlanInterface::new(self.name.clone())
    }
}

impl TryFrom<&Nl80211Message> for Nl80211Interface {
    type Error = DeError;

    fn try_from(msg: &Nl80211Message) -> Result<Self, Self::Error> {
        let handle = msg.get_attr_handle();
        let name = match handle.get_attribute(Nl80211Attr::Ifname) {
            Some(attr) => attr.get_payload_as_with_len::<String>()?,
            None => return Err(DeError::MissingAttribute("NL80211_ATTR_IFNAME")),
        };
        Ok(Nl80211Interface {
            interface: required(&handle, Nl80211Attr::Ifindex, "NL80211_ATTR_IFINDEX")?,
            name,
            wiphy: required(&handle, Nl80211Attr::Wiphy, "NL80211_ATTR_WIPHY")?,
            iftype: Nl80211IfType::from(required::<_, u32>(
                &handle,
                Nl80211Attr::Iftype,
                "NL80211_ATTR_IFTYPE",
            )?),
            wireless_device: optional(&handle, Nl80211Attr::Wdev)?,
            mac: optional(&handle, Nl80211Attr::Mac)?,
            ssid: bytes(&handle, Nl80211Attr::Ssid)?.and_then(|s| Ssid::new(&s).ok()),
        })
    }
}
