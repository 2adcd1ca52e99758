use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::err::ParseError;

/// Basic service set identifier, the 48 bit MAC address of an access
/// point.
///
/// Bytes are kept in the order they are transmitted, so the first
/// byte is the leftmost pair when printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bssid([u8; 6]);

impl Bssid {
    /// Number of octets in a BSSID.
    pub const LEN: usize = 6;

    /// `00:00:00:00:00:00`
    pub const ZERO: Bssid = Bssid([0; 6]);

    /// `FF:FF:FF:FF:FF:FF`
    pub const BROADCAST: Bssid = Bssid([0xff; 6]);

    /// Create a BSSID from bytes in transmission order.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Bssid(bytes)
    }

    /// Create a BSSID from a slice that must be exactly six bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 6]>::try_from(bytes).ok().map(Bssid)
    }

    /// Bytes in transmission order.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for Bssid {
    fn from(bytes: [u8; 6]) -> Self {
        Bssid(bytes)
    }
}

impl From<Bssid> for [u8; 6] {
    fn from(bssid: Bssid) -> Self {
        bssid.0
    }
}

impl FromStr for Bssid {
    type Err = ParseError;

    /// Parse `XX:XX:XX:XX:XX:XX`. Hex digits may be either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Bssid(s.to_string());

        if s.len() != 17 {
            return Err(err());
        }
        let mut bytes = [0u8; 6];
        let mut components = s.split(':');
        for byte in bytes.iter_mut() {
            let component = components.next().ok_or_else(err)?;
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err());
            }
            *byte = u8::from_str_radix(component, 16).map_err(|_| err())?;
        }
        if components.next().is_some() {
            return Err(err());
        }
        Ok(Bssid(bytes))
    }
}

impl Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bssid_parse() {
        let bssid = "18:A6:F7:99:81:90".parse::<Bssid>().unwrap();
        assert_eq!(bssid.as_bytes(), &[0x18, 0xa6, 0xf7, 0x99, 0x81, 0x90]);
        assert_eq!(bssid.to_string(), "18:A6:F7:99:81:90");

        let lower = "18:a6:f7:99:81:90".parse::<Bssid>().unwrap();
        assert_eq!(lower, bssid);
        assert_eq!(lower.to_string(), "18:A6:F7:99:81:90");
    }

    #[test]
    fn test_bssid_parse_invalid() {
        for s in [
            "",
            "18:A6:F7:99:81",
            "18:A6:F7:99:81:90:",
            "18-A6-F7-99-81-90",
            "18:A6:F7:99:81:9G",
            "18:A6:F7:99:81::90",
            "+8:A6:F7:99:81:90",
            "18:A6:F7:99:8190:",
        ] {
            assert_eq!(
                s.parse::<Bssid>(),
                Err(ParseError::Bssid(s.to_string())),
                "{}",
                s
            );
        }
    }

    #[test]
    fn test_bssid_constants() {
        assert_eq!(Bssid::ZERO.to_string(), "00:00:00:00:00:00");
        assert_eq!(Bssid::BROADCAST.to_string(), "FF:FF:FF:FF:FF:FF");
        assert_eq!(Bssid::from_slice(&[1, 2, 3]), None);
        assert_eq!(
            Bssid::from_slice(&[1, 2, 3, 4, 5, 6]),
            Some(Bssid::new([1, 2, 3, 4, 5, 6]))
        );
    }
}
