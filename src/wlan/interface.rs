use std::fmt::{self, Display};

use getset::Getters;

/// A Wi-Fi capable network interface.
#[derive(Getters, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WlanInterface {
    /// Kernel interface name, for example `wlan0`.
    #[getset(get = "pub")]
    name: String,
}

impl WlanInterface {
    /// Refer to an interface by name.
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        WlanInterface { name: name.into() }
    }
}

impl From<&str> for WlanInterface {
    fn from(name: &str) -> Self {
        WlanInterface::new(name)
    }
}

impl Display for WlanInterface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}
