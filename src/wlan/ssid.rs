use std::{
    fmt::{self, Display, Write},
    str::FromStr,
};

use crate::err::ParseError;

/// Service set identifier, the 1 to 32 octet name of a wireless
/// network.
///
/// SSIDs are octet strings. They are usually UTF-8 but nothing
/// enforces it, so the raw bytes are kept.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ssid(Vec<u8>);

impl Ssid {
    /// Shortest valid SSID in octets.
    pub const MIN_LEN: usize = 1;

    /// Longest valid SSID in octets.
    pub const MAX_LEN: usize = 32;

    /// Create an SSID from raw octets, rejecting anything outside of
    /// 1 to 32 octets.
    pub fn new(data: &[u8]) -> Result<Self, ParseError> {
        if (Self::MIN_LEN..=Self::MAX_LEN).contains(&data.len()) {
            Ok(Ssid(data.to_vec()))
        } else {
            Err(ParseError::SsidLength(data.len()))
        }
    }

    /// Create an SSID that always succeeds: input longer than 32 octets
    /// is cut and empty input becomes a single space.
    pub fn truncating(s: &str) -> Self {
        Self::truncating_bytes(s.as_bytes())
    }

    /// Byte oriented version of [`Ssid::truncating`].
    pub fn truncating_bytes(data: &[u8]) -> Self {
        if data.is_empty() {
            Ssid(vec![b' '])
        } else {
            Ssid(data[..data.len().min(Self::MAX_LEN)].to_vec())
        }
    }

    /// Raw octets.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of octets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, an SSID has at least one octet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Ssid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ssid::new(s.as_bytes())
    }
}

impl AsRef<[u8]> for Ssid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Ssid {
    /// The SSID as text if it is valid UTF-8, otherwise its octets in
    /// hex.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => {
                f.write_str("<")?;
                for b in self.0.iter() {
                    write!(f, "{:02x}", b)?;
                }
                f.write_char('>')
            }
        }
    }
}
