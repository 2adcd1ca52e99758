//! Platform neutral Wi-Fi types.
//!
//! These types carry no Linux specifics so that callers can be written
//! against [`WlanManager`] and stay unaware of whether `nl80211` or
//! wireless extensions are doing the work underneath.

mod bssid;
mod interface;
mod manager;
mod network;
mod ssid;

pub use self::{
    bssid::Bssid, interface::WlanInterface, manager::WlanManager, network::WlanNetwork,
    ssid::Ssid,
};
