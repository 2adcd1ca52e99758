//! # Wi-Fi control for Linux without the C glue
//!
//! ## Rationale
//!
//! This crate talks to Linux wireless drivers the two ways the kernel allows:
//! `nl80211` over generic netlink, and the legacy wireless extensions
//! `ioctl` interface. Both are reached through a small kernel ABI layer
//! ([`ffi`] and [`consts`]) and wrapped by platform-neutral types in
//! [`wlan`].
//!
//! ## Layout
//!
//! * [`consts`], [`ffi`]: kernel constants, struct layouts and the `ioctl`
//!   passthrough.
//! * [`nl`], [`genl`], [`types`]: the netlink wire codec.
//! * [`socket`], [`router`]: netlink sockets and request/response handling,
//!   including generic netlink family resolution.
//! * [`nl80211`]: typed `nl80211` requests and replies.
//! * [`wlan`]: [`Bssid`][wlan::Bssid], [`Ssid`][wlan::Ssid],
//!   networks, interfaces and the [`WlanManager`][wlan::WlanManager] trait.
//! * [`linux`]: the Linux implementations of [`WlanManager`][wlan::WlanManager].
//!
//! ## Serialization
//!
//! Every type that goes over a netlink socket implements [`Size`],
//! [`ToBytes`] and either [`FromBytes`] or [`FromBytesWithInput`]. Buffers
//! are [`std::io::Cursor`]s so that readers can report how much of a
//! datagram has been consumed.

#![deny(missing_docs)]

#[macro_use]
pub mod consts;
pub mod attr;
pub mod err;
pub mod ffi;
pub mod genl;
pub mod linux;
pub mod nl;
pub mod nl80211;
pub mod router;
pub mod socket;
pub mod types;
pub mod utils;
pub mod wlan;

use std::{
    io::{Cursor, Read, Write},
    mem::size_of,
};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    consts::alignto,
    err::{DeError, SerError},
};

/// Max supported message length for netlink messages supported by
/// the kernel.
pub const MAX_NL_LENGTH: usize = 32768;

/// Size of a netlink message header without padding.
pub const NLMSG_HDRLEN: usize = 16;

/// Size of a generic netlink header.
pub const GENL_HDRLEN: usize = 4;

/// Size of a netlink attribute header.
pub const NLA_HDRLEN: usize = 4;

/// A trait defining methods that apply to all netlink data
/// structures related to sizing of data types.
pub trait Size {
    /// Size of the unpadded data structure. This will usually
    /// only be unaligned for variable length types like
    /// strings or byte buffers.
    fn unpadded_size(&self) -> usize;

    /// Get the size of the payload and align it to
    /// the required netlink byte alignment.
    fn padded_size(&self) -> usize {
        alignto(self.unpadded_size())
    }
}

/// A trait defining a method that returns the size of a type
/// that does not depend on the value.
pub trait TypeSize {
    /// The number of bytes any value of this type occupies on the wire.
    fn type_size() -> usize;
}

/// Takes an arbitrary structure and serializes it into a buffer.
pub trait ToBytes {
    /// Serialize the value into the buffer at the current position.
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError>;

    /// Pad the data structure to the netlink alignment.
    fn pad(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError>
    where
        Self: Size,
    {
        let num_pad_bytes = self.padded_size() - self.unpadded_size();
        buffer.write_all(&[0u8; libc::NLA_ALIGNTO as usize][..num_pad_bytes])?;
        Ok(())
    }
}

/// Takes a byte buffer and returns the deserialized data structure.
pub trait FromBytes: Sized {
    /// Deserialize from the current buffer position.
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError>;

    /// Strip the netlink alignment padding that follows a value of
    /// `unpadded` bytes.
    fn strip(buffer: &mut Cursor<impl AsRef<[u8]>>, unpadded: usize) -> Result<(), DeError> {
        let num_strip = alignto(unpadded) - unpadded;
        let remaining = remaining(buffer);
        // The last attribute of a datagram is allowed to omit its padding.
        let num_strip = num_strip.min(remaining);
        buffer.set_position(buffer.position() + num_strip as u64);
        Ok(())
    }
}

/// Takes a byte buffer and an additional input and returns
/// the deserialized data structure.
pub trait FromBytesWithInput: Sized {
    /// Type of the additional input, usually the payload length.
    type Input;

    /// Deserialize from the current buffer position using `input`.
    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: Self::Input,
    ) -> Result<Self, DeError>;
}

/// Number of unread bytes left in a cursor.
pub(crate) fn remaining(buffer: &Cursor<impl AsRef<[u8]>>) -> usize {
    buffer
        .get_ref()
        .as_ref()
        .len()
        .saturating_sub(buffer.position() as usize)
}

macro_rules! impl_nl_int {
    ($ty:ty, $read:ident, $write:ident $(, $endian:ty)?) => {
        impl Size for $ty {
            fn unpadded_size(&self) -> usize {
                size_of::<$ty>()
            }
        }

        impl TypeSize for $ty {
            fn type_size() -> usize {
                size_of::<$ty>()
            }
        }

        impl ToBytes for $ty {
            fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
                buffer.$write$(::<$endian>)?(*self)?;
                Ok(())
            }
        }

        impl FromBytes for $ty {
            fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
                Ok(buffer.$read$(::<$endian>)?()?)
            }
        }
    };
}

impl_nl_int!(u8, read_u8, write_u8);
impl_nl_int!(i8, read_i8, write_i8);
impl_nl_int!(u16, read_u16, write_u16, NativeEndian);
impl_nl_int!(i16, read_i16, write_i16, NativeEndian);
impl_nl_int!(u32, read_u32, write_u32, NativeEndian);
impl_nl_int!(i32, read_i32, write_i32, NativeEndian);
impl_nl_int!(u64, read_u64, write_u64, NativeEndian);
impl_nl_int!(i64, read_i64, write_i64, NativeEndian);

impl<T> Size for &T
where
    T: Size + ?Sized,
{
    fn unpadded_size(&self) -> usize {
        (**self).unpadded_size()
    }
}

impl<T> ToBytes for &T
where
    T: ToBytes + ?Sized,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        (**self).to_bytes(buffer)
    }
}

impl Size for () {
    fn unpadded_size(&self) -> usize {
        0
    }
}

impl ToBytes for () {
    fn to_bytes(&self, _: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        Ok(())
    }
}

impl FromBytesWithInput for () {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: usize,
    ) -> Result<Self, DeError> {
        if input > remaining(buffer) {
            return Err(DeError::InvalidInput(input));
        }
        buffer.set_position(buffer.position() + input as u64);
        Ok(())
    }
}

impl Size for [u8] {
    fn unpadded_size(&self) -> usize {
        self.len()
    }
}

impl ToBytes for [u8] {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        buffer.write_all(self)?;
        Ok(())
    }
}

impl<const N: usize> Size for [u8; N] {
    fn unpadded_size(&self) -> usize {
        N
    }
}

impl<const N: usize> ToBytes for [u8; N] {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        buffer.write_all(self)?;
        Ok(())
    }
}

impl<const N: usize> FromBytes for [u8; N] {
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
        let mut array = [0u8; N];
        buffer.read_exact(&mut array)?;
        Ok(array)
    }
}

impl Size for Vec<u8> {
    fn unpadded_size(&self) -> usize {
        self.len()
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.as_slice().to_bytes(buffer)
    }
}

impl FromBytesWithInput for Vec<u8> {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: usize,
    ) -> Result<Self, DeError> {
        if input > remaining(buffer) {
            return Err(DeError::InvalidInput(input));
        }
        let mut vec = vec![0; input];
        buffer.read_exact(&mut vec)?;
        Ok(vec)
    }
}

impl Size for str {
    fn unpadded_size(&self) -> usize {
        self.len() + 1
    }
}

impl ToBytes for str {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        if self.as_bytes().contains(&0) {
            return Err(SerError::new(
                "Unable to serialize string containing null byte",
            ));
        }
        buffer.write_all(self.as_bytes())?;
        buffer.write_u8(0)?;
        Ok(())
    }
}

impl Size for String {
    fn unpadded_size(&self) -> usize {
        self.as_str().unpadded_size()
    }
}

impl ToBytes for String {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.as_str().to_bytes(buffer)
    }
}

impl FromBytesWithInput for String {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: usize,
    ) -> Result<Self, DeError> {
        let mut bytes = Vec::<u8>::from_bytes_with_input(buffer, input)?;
        match bytes.iter().position(|b| *b == 0) {
            Some(idx) if idx + 1 == bytes.len() => bytes.truncate(idx),
            Some(idx) if bytes[idx..].iter().all(|b| *b == 0) => bytes.truncate(idx),
            Some(_) => return Err(DeError::NullError),
            None => return Err(DeError::NoNullError),
        }
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use lazy_static::lazy_static;

    lazy_static! {
        static ref LOGGER: () = env_logger::builder().is_test(true).init();
    }

    /// Initialize logging once for the whole test binary.
    pub fn setup() {
        lazy_static::initialize(&LOGGER);
    }

    fn serialize<T>(value: &T) -> Vec<u8>
    where
        T: ToBytes + Size + ?Sized,
    {
        let mut buffer = Cursor::new(Vec::new());
        value.to_bytes(&mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_nl_u16() {
        setup();

        let mut expected = Cursor::new(Vec::new());
        expected.write_u16::<NativeEndian>(6000).unwrap();
        assert_eq!(serialize(&6000u16), expected.get_ref().as_slice());

        let v = u16::from_bytes(&mut Cursor::new(expected.into_inner())).unwrap();
        assert_eq!(v, 6000);
    }

    #[test]
    fn test_nl_u64() {
        let test_int: u64 = 12345678901234;
        let mut expected = Cursor::new(Vec::new());
        expected.write_u64::<NativeEndian>(test_int).unwrap();
        assert_eq!(serialize(&test_int), expected.get_ref().as_slice());
        assert_eq!(
            u64::from_bytes(&mut Cursor::new(expected.into_inner())).unwrap(),
            test_int
        );
    }

    #[test]
    fn test_nl_short_buffer() {
        let err = u32::from_bytes(&mut Cursor::new(&[1u8, 2][..])).unwrap_err();
        assert!(matches!(err, DeError::UnexpectedEOB));
    }

    #[test]
    fn test_nl_string() {
        let s = "AAAAA".to_string();
        assert_eq!(serialize(&s), [65, 65, 65, 65, 65, 0]);
        assert_eq!(s.unpadded_size(), 6);
        assert_eq!(s.padded_size(), 8);

        let bytes = [65u8, 65, 65, 65, 65, 65, 65, 0];
        let string = String::from_bytes_with_input(&mut Cursor::new(&bytes[..]), 8).unwrap();
        assert_eq!(string, "AAAAAAA");

        let bytes = [65u8, 65, 65, 65, 65, 65, 0, 0];
        let string = String::from_bytes_with_input(&mut Cursor::new(&bytes[..]), 8).unwrap();
        assert_eq!(string, "AAAAAA");
    }

    #[test]
    fn test_nl_string_errors() {
        let bytes = [65u8, 0, 65, 0];
        assert!(matches!(
            String::from_bytes_with_input(&mut Cursor::new(&bytes[..]), 4),
            Err(DeError::NullError)
        ));

        let bytes = [65u8, 65];
        assert!(matches!(
            String::from_bytes_with_input(&mut Cursor::new(&bytes[..]), 2),
            Err(DeError::NoNullError)
        ));

        assert!(serialize_err("A\0B"));
    }

    fn serialize_err(s: &str) -> bool {
        s.to_bytes(&mut Cursor::new(Vec::new())).is_err()
    }

    #[test]
    fn test_nl_vec_input_too_long() {
        let bytes = [1u8, 2, 3];
        assert!(matches!(
            Vec::<u8>::from_bytes_with_input(&mut Cursor::new(&bytes[..]), 4),
            Err(DeError::InvalidInput(4))
        ));
    }
}
