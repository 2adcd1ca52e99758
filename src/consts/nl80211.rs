//! Constants from `/usr/include/linux/nl80211.h`.
//!
//! Only the part of the command and attribute space used for interface
//! discovery, scanning and disconnecting is named here. Everything else
//! parses as `UnrecognizedVariant`.

/// Name of the generic netlink family.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// Multicast group for configuration changes.
pub const NL80211_MULTICAST_GROUP_CONFIG: &str = "config";
/// Multicast group for scan notifications.
pub const NL80211_MULTICAST_GROUP_SCAN: &str = "scan";
/// Multicast group for regulatory notifications.
pub const NL80211_MULTICAST_GROUP_REG: &str = "regulatory";
/// Multicast group for MLME events.
pub const NL80211_MULTICAST_GROUP_MLME: &str = "mlme";
/// Multicast group for vendor events.
pub const NL80211_MULTICAST_GROUP_VENDOR: &str = "vendor";
/// Multicast group for NAN events.
pub const NL80211_MULTICAST_GROUP_NAN: &str = "nan";
/// Multicast group for testmode events.
pub const NL80211_MULTICAST_GROUP_TESTMODE: &str = "testmode";

/// Maximum length of an SSID in octets.
pub const NL80211_MAX_SSID_LEN: usize = 32;

/// Information element ID carrying the SSID.
pub const WLAN_EID_SSID: u8 = 0;

impl_var!(
    /// Supported `nl80211` commands
    pub Nl80211Cmd, u8,
    /// Unspecified command to catch errors
    Unspecified => 0,
    /// Request information about a wiphy or dump all wiphys
    GetWiphy => 1,
    SetWiphy => 2,
    NewWiphy => 3,
    DelWiphy => 4,
    /// Request an interface's configuration, either as a dump or for a
    /// single [`Nl80211Attr::Ifindex`]
    GetInterface => 5,
    SetInterface => 6,
    /// Response to [`Nl80211Cmd::GetInterface`]
    NewInterface => 7,
    DelInterface => 8,
    GetKey => 9,
    SetKey => 10,
    NewKey => 11,
    DelKey => 12,
    GetBeacon => 13,
    SetBeacon => 14,
    StartAp => 15,
    StopAp => 16,
    GetStation => 17,
    SetStation => 18,
    NewStation => 19,
    DelStation => 20,
    GetMpath => 21,
    SetMpath => 22,
    NewMpath => 23,
    DelMpath => 24,
    SetBss => 25,
    SetReg => 26,
    ReqSetReg => 27,
    GetMeshConfig => 28,
    SetMeshConfig => 29,
    SetMgmtExtraIe => 30,
    GetReg => 31,
    /// Dump the scan results of an interface
    GetScan => 32,
    /// Start a scan on [`Nl80211Attr::Ifindex`]
    TriggerScan => 33,
    /// Scan results are available, sent on the `scan` multicast group
    NewScanResults => 34,
    /// The scan was aborted, sent on the `scan` multicast group
    ScanAborted => 35,
    RegChange => 36,
    Authenticate => 37,
    Associate => 38,
    Deauthenticate => 39,
    Disassociate => 40,
    MichaelMicFailure => 41,
    RegBeaconHint => 42,
    JoinIbss => 43,
    LeaveIbss => 44,
    Testmode => 45,
    Connect => 46,
    Roam => 47,
    /// Drop the current connection of [`Nl80211Attr::Ifindex`]
    Disconnect => 48
);

impl_var!(
    /// `nl80211` netlink attributes
    pub Nl80211Attr, u16,
    /// Attribute number 0 is reserved
    Unspecified => 0,
    /// Index of the wiphy to operate on
    Wiphy => 1,
    /// Wiphy name
    WiphyName => 2,
    /// Network interface index of the device to operate on
    Ifindex => 3,
    /// Network interface name
    Ifname => 4,
    /// Type of virtual interface, see [`Nl80211IfType`]
    Iftype => 5,
    /// MAC address
    Mac => 6,
    BeaconInterval => 12,
    /// Nested station information
    StaInfo => 21,
    /// Nested array of operating bands
    WiphyBands => 22,
    SupportedIftypes => 32,
    /// Frequency of the selected channel in MHz
    WiphyFreq => 38,
    WiphyChannelType => 39,
    /// Information element(s) data
    Ie => 42,
    MaxNumScanSsids => 43,
    /// Nested list of frequencies scanned
    ScanFrequencies => 44,
    /// Nested list of SSIDs to probe for, an empty SSID is a wildcard
    ScanSsids => 45,
    /// Consistent snapshot generation for dumps
    Generation => 46,
    /// Nested BSS information, see [`Nl80211Bss`]
    Bss => 47,
    SupportedCommands => 50,
    /// SSID, 0..32 octets
    Ssid => 52,
    /// IEEE 802.11 reason code
    ReasonCode => 54,
    Privacy => 70,
    /// Flag set when the AP ended the connection
    DisconnectedByAp => 71,
    WiphyTxPowerLevel => 98,
    /// Wireless device identifier
    Wdev => 153,
    ScanFlags => 158,
    ChannelWidth => 159,
    CenterFreq1 => 160,
    CenterFreq2 => 161
);

impl_var!(
    /// Attributes nested in [`Nl80211Attr::Bss`]
    pub Nl80211Bss, u16,
    Invalid => 0,
    /// BSSID of the BSS, 6 octets
    Bssid => 1,
    /// Frequency in MHz
    Frequency => 2,
    /// TSF of the received probe response or beacon
    Tsf => 3,
    BeaconInterval => 4,
    /// Capability field in CPU order
    Capability => 5,
    /// Binary attribute containing the raw information elements
    InformationElements => 6,
    /// Signal strength in mBm, signed 32 bit
    SignalMbm => 7,
    /// Signal strength in unspecified units, 0..100
    SignalUnspec => 8,
    /// Status in case this BSS is used, see [`Nl80211BssStatus`]
    Status => 9,
    /// Age of this BSS entry in milliseconds
    SeenMsAgo => 10,
    BeaconIes => 11,
    ChanWidth => 12,
    BeaconTsf => 13,
    PrespData => 14,
    LastSeenBoottime => 15
);

impl_var!(
    /// Values of [`Nl80211Bss::Status`]
    pub Nl80211BssStatus, u32,
    Authenticated => 0,
    Associated => 1,
    IbssJoined => 2
);

impl_var!(
    /// Virtual interface types
    pub Nl80211IfType, u32,
    Unspecified => 0,
    Adhoc => 1,
    Station => 2,
    Ap => 3,
    ApVlan => 4,
    Wds => 5,
    Monitor => 6,
    MeshPoint => 7,
    P2pClient => 8,
    P2pGo => 9,
    P2pDevice => 10,
    Ocb => 11,
    Nan => 12
);
