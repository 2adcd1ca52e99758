use std::fmt::{self, Display};

use getset::Getters;

use crate::wlan::{Bssid, Ssid};

/// A wireless network seen by a scan, identified by name and access
/// point.
#[derive(Getters, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WlanNetwork {
    /// Network name.
    #[getset(get = "pub")]
    ssid: Ssid,
    /// Access point address.
    #[getset(get = "pub")]
    bssid: Bssid,
}

impl WlanNetwork {
    /// Create a network description.
    pub fn new(ssid: Ssid, bssid: Bssid) -> Self {
        WlanNetwork { ssid, bssid }
    }
}

impl Display for WlanNetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.ssid, self.bssid)
    }
}
