//! This module contains the top level netlink header code. Every
//! netlink message will be encapsulated in a top level [`Nlmsghdr`].
//!
//! [`Nlmsghdr`] is the structure representing a header that all
//! netlink protocols require to be passed to the correct destination.
//!
//! # Design decisions
//!
//! Payloads for [`Nlmsghdr`] can be any type that implements
//! [`Size`], [`ToBytes`] and [`FromBytesWithInput`]. Error and
//! acknowledgement packets are recognized while parsing and surface
//! as [`NlPayload::Err`] and [`NlPayload::Ack`].

use std::io::Cursor;

use derive_builder::{Builder, UninitializedFieldError};
use getset::Getters;
use log::trace;

use crate::{
    consts::nl::{NlType, NlmF, Nlmsg},
    err::{DeError, Nlmsgerr, SerError},
    remaining, FromBytes, FromBytesWithInput, Size, ToBytes, NLMSG_HDRLEN,
};

/// An enum representing either the desired payload as requested
/// by the payload type parameter, an ACK received at the end
/// of a message or stream of messages, or an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NlPayload<P> {
    /// Represents an ACK returned by netlink.
    Ack(Nlmsgerr),
    /// Represents an application level error returned by netlink.
    Err(Nlmsgerr),
    /// Represents the requested payload.
    Payload(P),
    /// Indicates an empty payload, as in `NLMSG_DONE`.
    Empty,
}

impl<P> NlPayload<P> {
    /// Get the payload of the netlink packet and return [`None`]
    /// if the contained data in the payload is actually an ACK
    /// or an error.
    pub fn get_payload(&self) -> Option<&P> {
        match self {
            NlPayload::Payload(ref p) => Some(p),
            _ => None,
        }
    }
}

impl<P> Size for NlPayload<P>
where
    P: Size,
{
    fn unpadded_size(&self) -> usize {
        match self {
            NlPayload::Ack(e) | NlPayload::Err(e) => e.unpadded_size(),
            NlPayload::Payload(p) => p.unpadded_size(),
            NlPayload::Empty => 0,
        }
    }
}

impl<P> ToBytes for NlPayload<P>
where
    P: Size + ToBytes,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        match self {
            NlPayload::Ack(e) | NlPayload::Err(e) => {
                e.to_bytes(buffer)?;
                e.pad(buffer)?;
            }
            NlPayload::Payload(p) => {
                p.to_bytes(buffer)?;
                p.pad(buffer)?;
            }
            NlPayload::Empty => (),
        }
        Ok(())
    }
}

/// Top level netlink header and payload
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "owned")]
#[builder(build_fn(skip))]
pub struct Nlmsghdr<T, P> {
    /// Length of the netlink message
    #[builder(setter(skip))]
    #[getset(get = "pub")]
    nl_len: u32,
    /// Type of the netlink message
    #[getset(get = "pub")]
    nl_type: T,
    /// Flags indicating properties of the request or response
    #[getset(get = "pub")]
    nl_flags: NlmF,
    /// Sequence number for netlink protocol
    #[getset(get = "pub")]
    nl_seq: u32,
    /// ID of the netlink destination for requests and source for
    /// responses.
    #[getset(get = "pub")]
    nl_pid: u32,
    /// Payload of netlink message
    #[getset(get = "pub")]
    nl_payload: NlPayload<P>,
}

impl<T, P> NlmsghdrBuilder<T, P>
where
    T: NlType,
    P: Size,
{
    /// Build [`Nlmsghdr`], computing the length from the payload.
    pub fn build(self) -> Result<Nlmsghdr<T, P>, NlmsghdrBuilderError> {
        let nl_type = self
            .nl_type
            .ok_or_else(|| NlmsghdrBuilderError::from(UninitializedFieldError::new("nl_type")))?;
        let nl_flags = self.nl_flags.unwrap_or_else(NlmF::empty);
        let nl_seq = self.nl_seq.unwrap_or(0);
        let nl_pid = self.nl_pid.unwrap_or(0);
        let nl_payload = self.nl_payload.ok_or_else(|| {
            NlmsghdrBuilderError::from(UninitializedFieldError::new("nl_payload"))
        })?;

        let mut nl = Nlmsghdr {
            nl_len: 0,
            nl_type,
            nl_flags,
            nl_seq,
            nl_pid,
            nl_payload,
        };
        nl.nl_len = nl.padded_size() as u32;
        Ok(nl)
    }
}

impl<T, P> Nlmsghdr<T, P> {
    /// Get the payload if there is one or return [`None`] for an
    /// ACK, an error or an empty message.
    pub fn get_payload(&self) -> Option<&P> {
        self.nl_payload.get_payload()
    }

    /// Get the error packet if this message carries one.
    pub fn get_err(&self) -> Option<&Nlmsgerr> {
        match self.nl_payload {
            NlPayload::Err(ref e) => Some(e),
            _ => None,
        }
    }

    /// Consume the message and return its payload.
    pub fn into_payload(self) -> NlPayload<P> {
        self.nl_payload
    }
}

impl<T, P> Size for Nlmsghdr<T, P>
where
    T: Size,
    P: Size,
{
    fn unpadded_size(&self) -> usize {
        NLMSG_HDRLEN + self.nl_payload.padded_size()
    }
}

impl<T, P> ToBytes for Nlmsghdr<T, P>
where
    T: NlType,
    P: Size + ToBytes,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.nl_len.to_bytes(buffer)?;
        self.nl_type.to_bytes(buffer)?;
        self.nl_flags.to_bytes(buffer)?;
        self.nl_seq.to_bytes(buffer)?;
        self.nl_pid.to_bytes(buffer)?;
        self.nl_payload.to_bytes(buffer)?;
        Ok(())
    }
}

impl<T, P> FromBytes for Nlmsghdr<T, P>
where
    T: NlType,
    P: Size + FromBytesWithInput<Input = usize>,
{
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
        let start = buffer.position();
        let nl_len = u32::from_bytes(buffer)?;
        let nl_type = T::from_bytes(buffer)?;
        let nl_flags = NlmF::from_bytes(buffer)?;
        let nl_seq = u32::from_bytes(buffer)?;
        let nl_pid = u32::from_bytes(buffer)?;

        let payload_len = (nl_len as usize)
            .checked_sub(NLMSG_HDRLEN)
            .ok_or_else(|| DeError::new(format!("Invalid netlink message length {}", nl_len)))?;
        if payload_len > remaining(buffer) {
            return Err(DeError::InvalidInput(payload_len));
        }
        trace!(
            "Deserializing netlink message of type {:?} with {} payload bytes",
            nl_type,
            payload_len
        );

        let raw_type: u16 = nl_type.into();
        let nl_payload = if raw_type == u16::from(Nlmsg::Error) {
            let err = Nlmsgerr::from_bytes_with_input(buffer, payload_len)?;
            if err.error == 0 {
                NlPayload::Ack(err)
            } else {
                NlPayload::Err(err)
            }
        } else if raw_type == u16::from(Nlmsg::Done)
            || raw_type == u16::from(Nlmsg::Noop)
            || raw_type == u16::from(Nlmsg::Overrun)
            || payload_len == 0
        {
            NlPayload::Empty
        } else {
            NlPayload::Payload(P::from_bytes_with_input(buffer, payload_len)?)
        };

        buffer.set_position(start + nl_len as u64);
        Self::strip(buffer, nl_len as usize)?;

        Ok(Nlmsghdr {
            nl_len,
            nl_type,
            nl_flags,
            nl_seq,
            nl_pid,
            nl_payload,
        })
    }
}
