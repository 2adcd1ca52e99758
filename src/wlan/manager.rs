use crate::{
    err::WlanError,
    wlan::{Ssid, WlanInterface, WlanNetwork},
};

/// Access to the Wi-Fi subsystem of the host.
pub trait WlanManager {
    /// The default Wi-Fi interface, if the host has one.
    fn interface(&self) -> Result<Option<WlanInterface>, WlanError> {
        Ok(self.interfaces()?.into_iter().next())
    }

    /// All Wi-Fi interfaces.
    fn interfaces(&self) -> Result<Vec<WlanInterface>, WlanError>;

    /// Scan for networks and block until the scan is complete.
    ///
    /// With `ssid` set the scan is directed at that network, otherwise
    /// it is a broadcast scan.
    fn scan(
        &self,
        ssid: Option<&Ssid>,
        interface: &WlanInterface,
    ) -> Result<Vec<WlanNetwork>, WlanError>;

    /// Bring the interface up (`true`) or down (`false`).
    fn set_power(&self, power: bool, interface: &WlanInterface) -> Result<(), WlanError>;

    /// Leave the current network. Succeeds if the interface is not
    /// associated.
    fn disassociate(&self, interface: &WlanInterface) -> Result<(), WlanError>;
}
