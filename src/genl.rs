//! This module contains generic netlink parsing data structures.
//! This is all handled by the [`Genlmsghdr`] header struct which
//! contains all of the information needed for the generic netlink
//! layer.
//!
//! # Design decisions
//!
//! The generic netlink `attrs` field has been changed to a
//! [`GenlBuffer`] of [`Nlattr`]s instead of a raw [`Vec<u8>`]
//! to allow simpler parsing at the top level when one [`Nlattr`]
//! structure is not nested within another. Nested payloads stay
//! serialized in a [`Buffer`] until they are requested with
//! [`Nlattr::get_attr_handle`].

use std::io::Cursor;

use derive_builder::{Builder, UninitializedFieldError};
use getset::Getters;

use crate::{
    attr::{AttrHandle, Attribute},
    consts::genl::{Cmd, NlAttrType},
    err::{DeError, SerError},
    remaining,
    types::{Buffer, GenlBuffer},
    FromBytes, FromBytesWithInput, Size, ToBytes, TypeSize, NLA_HDRLEN,
};

/// Struct representing generic netlink header and payload
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "owned")]
pub struct Genlmsghdr<C, T> {
    /// Generic netlink message command
    #[getset(get = "pub")]
    cmd: C,
    /// Version of generic netlink family protocol
    #[getset(get = "pub")]
    version: u8,
    #[builder(setter(skip))]
    reserved: u16,
    /// Attributes included in generic netlink message
    #[builder(default)]
    #[getset(get = "pub")]
    attrs: GenlBuffer<T, Buffer>,
}

impl<C, T> Genlmsghdr<C, T>
where
    C: Cmd,
    T: NlAttrType,
{
    /// Get handle for attribute parsing and traversal
    pub fn get_attr_handle(&self) -> GenlAttrHandle<'_, T> {
        self.attrs.get_attr_handle()
    }
}

impl<C, T> Size for Genlmsghdr<C, T>
where
    C: Size,
    T: Size,
{
    fn unpadded_size(&self) -> usize {
        self.cmd.unpadded_size()
            + self.version.unpadded_size()
            + self.reserved.unpadded_size()
            + self.attrs.unpadded_size()
    }
}

impl<C, T> ToBytes for Genlmsghdr<C, T>
where
    C: Cmd,
    T: NlAttrType,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.cmd.to_bytes(buffer)?;
        self.version.to_bytes(buffer)?;
        self.reserved.to_bytes(buffer)?;
        self.attrs.to_bytes(buffer)?;
        Ok(())
    }
}

impl<C, T> FromBytesWithInput for Genlmsghdr<C, T>
where
    C: Cmd,
    T: NlAttrType,
{
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: usize,
    ) -> Result<Self, DeError> {
        let attrs_len = input
            .checked_sub(C::type_size() + u8::type_size() + u16::type_size())
            .ok_or(DeError::UnexpectedEOB)?;
        Ok(Genlmsghdr {
            cmd: C::from_bytes(buffer)?,
            version: u8::from_bytes(buffer)?,
            reserved: u16::from_bytes(buffer)?,
            attrs: GenlBuffer::from_bytes_with_input(buffer, attrs_len)?,
        })
    }
}

/// The infomation packed into `nla_type` field of `nlattr`
/// for the C data structure.
#[derive(Builder, Getters, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[builder(pattern = "owned")]
pub struct AttrType<T> {
    /// If true, the payload contains nested attributes.
    #[getset(get = "pub")]
    #[builder(default = "false")]
    nla_nested: bool,
    /// If true, the payload is in net work byte order.
    #[getset(get = "pub")]
    #[builder(default = "false")]
    nla_network_order: bool,
    /// Enum representing the type of the attribute payload
    #[getset(get = "pub")]
    nla_type: T,
}

const NLA_F_NESTED: u16 = 1 << 15;
const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl<T> Size for AttrType<T>
where
    T: Size,
{
    fn unpadded_size(&self) -> usize {
        self.nla_type.unpadded_size()
    }
}

impl<T> TypeSize for AttrType<T>
where
    T: TypeSize,
{
    fn type_size() -> usize {
        T::type_size()
    }
}

impl<T> ToBytes for AttrType<T>
where
    T: NlAttrType,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        let int: u16 = u16::from(*self);
        int.to_bytes(buffer)
    }
}

impl<T> FromBytes for AttrType<T>
where
    T: NlAttrType,
{
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
        let int = u16::from_bytes(buffer)?;
        Ok(AttrType::from(int))
    }
}

impl<T> From<AttrType<T>> for u16
where
    T: NlAttrType,
{
    fn from(v: AttrType<T>) -> Self {
        let mut int: u16 = v.nla_type.into();
        if v.nla_nested {
            int |= NLA_F_NESTED;
        }
        if v.nla_network_order {
            int |= NLA_F_NET_BYTEORDER;
        }
        int
    }
}

impl<T> From<u16> for AttrType<T>
where
    T: NlAttrType,
{
    fn from(int: u16) -> Self {
        AttrType {
            nla_nested: (int & NLA_F_NESTED) == NLA_F_NESTED,
            nla_network_order: (int & NLA_F_NET_BYTEORDER) == NLA_F_NET_BYTEORDER,
            nla_type: T::from(int & NLA_TYPE_MASK),
        }
    }
}

/// Struct representing netlink attributes and payloads
#[derive(Builder, Getters, Debug, PartialEq, Eq, Clone)]
#[builder(pattern = "owned")]
#[builder(build_fn(skip))]
pub struct Nlattr<T, P> {
    /// Length of the attribute header and payload together
    #[getset(get = "pub")]
    #[builder(setter(skip))]
    nla_len: u16,
    /// Type information for the netlink attribute
    #[getset(get = "pub")]
    nla_type: AttrType<T>,
    /// Payload of the attribute - either parsed or a binary buffer
    #[getset(get = "pub")]
    nla_payload: P,
}

impl<T, P> NlattrBuilder<T, P>
where
    T: Size,
    P: Size + ToBytes,
{
    /// Build an [`Nlattr`], serializing the payload into a
    /// [`Buffer`].
    pub fn build(self) -> Result<Nlattr<T, Buffer>, NlattrBuilderError> {
        let nla_type = self
            .nla_type
            .ok_or_else(|| NlattrBuilderError::from(UninitializedFieldError::new("nla_type")))?;
        let nla_payload = self
            .nla_payload
            .ok_or_else(|| NlattrBuilderError::from(UninitializedFieldError::new("nla_payload")))?;

        let mut buffer = Cursor::new(Vec::with_capacity(nla_payload.unpadded_size()));
        nla_payload
            .to_bytes(&mut buffer)
            .map_err(|e| NlattrBuilderError::ValidationError(e.to_string()))?;
        let nla_len = u16::try_from(NLA_HDRLEN + nla_payload.unpadded_size()).map_err(|_| {
            NlattrBuilderError::ValidationError(format!(
                "Attribute payload of {} bytes is too large",
                nla_payload.unpadded_size()
            ))
        })?;

        Ok(Nlattr {
            nla_len,
            nla_type,
            nla_payload: Buffer::from(buffer.into_inner()),
        })
    }
}

impl<T> Nlattr<T, Buffer>
where
    T: NlAttrType,
{
    /// Create a new attribute, serializing `payload` into its byte
    /// buffer.
    pub fn new<P>(
        nla_nested: bool,
        nla_network_order: bool,
        nla_type: T,
        payload: P,
    ) -> Result<Self, SerError>
    where
        P: Size + ToBytes,
    {
        Ok(NlattrBuilder::default()
            .nla_type(
                AttrTypeBuilder::default()
                    .nla_nested(nla_nested)
                    .nla_network_order(nla_network_order)
                    .nla_type(nla_type)
                    .build()
                    .map_err(SerError::new)?,
            )
            .nla_payload(payload)
            .build()?)
    }

    /// Add a nested attribute to the end of the payload.
    pub fn add_nested_attribute<TT, P>(&mut self, attr: &Nlattr<TT, P>) -> Result<(), SerError>
    where
        TT: NlAttrType,
        P: Size + ToBytes,
    {
        let mut buffer = Cursor::new(Vec::new());
        attr.to_bytes(&mut buffer)?;
        attr.pad(&mut buffer)?;

        self.nla_payload.extend_from_slice(buffer.get_ref());
        let len = NLA_HDRLEN + self.nla_payload.len();
        self.nla_len = u16::try_from(len).map_err(|_| SerError::TooLarge(len))?;
        Ok(())
    }

    /// Return a typed handle over the attributes nested in the
    /// payload.
    pub fn get_attr_handle<R>(&self) -> Result<GenlAttrHandle<'static, R>, DeError>
    where
        R: NlAttrType,
    {
        Ok(AttrHandle::new(GenlBuffer::from_bytes_with_input(
            &mut Cursor::new(self.nla_payload.as_ref()),
            self.nla_payload.len(),
        )?))
    }
}

impl<T> Attribute<T> for Nlattr<T, Buffer>
where
    T: NlAttrType,
{
    fn payload(&self) -> &Buffer {
        &self.nla_payload
    }

    fn set_payload<P>(&mut self, payload: &P) -> Result<(), SerError>
    where
        P: Size + ToBytes,
    {
        let mut buffer = Cursor::new(Vec::new());
        payload.to_bytes(&mut buffer)?;
        let len = NLA_HDRLEN + payload.unpadded_size();
        self.nla_len = u16::try_from(len).map_err(|_| SerError::TooLarge(len))?;
        self.nla_payload = Buffer::from(buffer.into_inner());
        Ok(())
    }
}

impl<T, P> Size for Nlattr<T, P>
where
    T: Size,
    P: Size,
{
    fn unpadded_size(&self) -> usize {
        self.nla_len.unpadded_size() + self.nla_type.unpadded_size() + self.nla_payload.unpadded_size()
    }
}

impl<T, P> ToBytes for Nlattr<T, P>
where
    T: NlAttrType,
    P: Size + ToBytes,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.nla_len.to_bytes(buffer)?;
        self.nla_type.to_bytes(buffer)?;
        self.nla_payload.to_bytes(buffer)?;
        Ok(())
    }
}

impl<T, P> FromBytes for Nlattr<T, P>
where
    T: NlAttrType,
    P: Size + FromBytesWithInput<Input = usize>,
{
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
        let nla_len = u16::from_bytes(buffer)?;
        let nla_type = AttrType::<T>::from_bytes(buffer)?;
        let payload_len = (nla_len as usize)
            .checked_sub(NLA_HDRLEN)
            .ok_or_else(|| DeError::new(format!("Invalid attribute length {}", nla_len)))?;
        if payload_len > remaining(buffer) {
            return Err(DeError::InvalidInput(payload_len));
        }
        let nla_payload = P::from_bytes_with_input(buffer, payload_len)?;
        Self::strip(buffer, nla_len as usize)?;
        Ok(Nlattr {
            nla_len,
            nla_type,
            nla_payload,
        })
    }
}

/// Type representing a generic netlink attribute handle.
pub type GenlAttrHandle<'a, T> = AttrHandle<'a, GenlBuffer<T, Buffer>, Nlattr<T, Buffer>>;

impl<'a, T> GenlAttrHandle<'a, T>
where
    T: NlAttrType,
{
    /// Get the first attribute of type `t`.
    pub fn get_attribute(&self, t: T) -> Option<&Nlattr<T, Buffer>> {
        self.get_attrs()
            .iter()
            .find(|item| item.nla_type.nla_type == t)
    }

    /// Get the payload of attribute `t` as type `R`.
    pub fn get_attr_payload_as<R>(&self, t: T) -> Result<R, DeError>
    where
        R: FromBytes,
    {
        match self.get_attribute(t) {
            Some(attr) => attr.get_payload_as::<R>(),
            None => Err(DeError::new(format!("Failed to find attribute {:?}", t))),
        }
    }

    /// Get the payload of attribute `t` as type `R`, passing the
    /// payload length as input.
    pub fn get_attr_payload_as_with_len<R>(&self, t: T) -> Result<R, DeError>
    where
        R: FromBytesWithInput<Input = usize>,
    {
        match self.get_attribute(t) {
            Some(attr) => attr.get_payload_as_with_len::<R>(),
            None => Err(DeError::new(format!("Failed to find attribute {:?}", t))),
        }
    }

    /// Parse the attributes nested in attribute `t`.
    pub fn get_nested_attributes<R>(&self, t: T) -> Result<GenlAttrHandle<'static, R>, DeError>
    where
        R: NlAttrType,
    {
        match self.get_attribute(t) {
            Some(attr) => attr.get_attr_handle::<R>(),
            None => Err(DeError::new(format!("Failed to find attribute {:?}", t))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Write;

    use byteorder::{NativeEndian, WriteBytesExt};

    use crate::consts::{
        genl::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd},
        nl80211::Nl80211Attr,
    };

    #[test]
    fn test_serialize() {
        let mut attr = GenlBuffer::new();
        attr.push(
            Nlattr::new(false, false, CtrlAttr::FamilyId, vec![0u8, 1, 2, 3, 4, 5, 0, 0]).unwrap(),
        );
        let genl = GenlmsghdrBuilder::default()
            .cmd(CtrlCmd::Getops)
            .version(2)
            .attrs(attr)
            .build()
            .unwrap();
        let mut mem = Cursor::new(Vec::new());
        genl.to_bytes(&mut mem).unwrap();

        let v_final = {
            let mut c = Cursor::new(Vec::new());
            c.write_u8(CtrlCmd::Getops.into()).unwrap();
            c.write_u8(2).unwrap();
            c.write_u16::<NativeEndian>(0).unwrap();
            c.write_u16::<NativeEndian>(12).unwrap();
            c.write_u16::<NativeEndian>(CtrlAttr::FamilyId.into())
                .unwrap();
            c.write_all(&[0, 1, 2, 3, 4, 5, 0, 0]).unwrap();
            c.into_inner()
        };
        assert_eq!(mem.into_inner(), v_final)
    }

    #[test]
    fn test_deserialize() {
        let mut attr = GenlBuffer::new();
        attr.push(Nlattr::new(false, false, CtrlAttr::FamilyId, "AAAAAAA".to_string()).unwrap());
        let genl_mock = GenlmsghdrBuilder::default()
            .cmd(CtrlCmd::Getops)
            .version(2)
            .attrs(attr)
            .build()
            .unwrap();
        let v_final = {
            let mut c = Cursor::new(Vec::new());
            c.write_u8(CtrlCmd::Getops.into()).unwrap();
            c.write_u8(2).unwrap();
            c.write_u16::<NativeEndian>(0).unwrap();
            c.write_u16::<NativeEndian>(12).unwrap();
            c.write_u16::<NativeEndian>(CtrlAttr::FamilyId.into())
                .unwrap();
            c.write_all(&[65, 65, 65, 65, 65, 65, 65, 0]).unwrap();
            c.into_inner()
        };
        let genl = Genlmsghdr::<CtrlCmd, CtrlAttr>::from_bytes_with_input(
            &mut Cursor::new(&v_final),
            v_final.len(),
        )
        .unwrap();
        assert_eq!(genl, genl_mock)
    }

    #[test]
    fn test_attr_type_bits() {
        let ty = AttrType::<u16>::from(0x8000 | 45);
        assert!(*ty.nla_nested());
        assert!(!*ty.nla_network_order());
        assert_eq!(*ty.nla_type(), 45);
        assert_eq!(u16::from(ty), 0x802d);

        let ty = AttrType::<Nl80211Attr>::from(0x4000 | 47);
        assert!(*ty.nla_network_order());
        assert_eq!(*ty.nla_type(), Nl80211Attr::Bss);
    }

    #[test]
    fn test_nested_attributes() {
        let mut groups = Nlattr::new(true, false, CtrlAttr::McastGroups, Buffer::new()).unwrap();
        let mut group = Nlattr::new(true, false, 1u16, Buffer::new()).unwrap();
        group
            .add_nested_attribute(&Nlattr::new(false, false, CtrlAttrMcastGrp::Name, "scan").unwrap())
            .unwrap();
        group
            .add_nested_attribute(&Nlattr::new(false, false, CtrlAttrMcastGrp::Id, 4u32).unwrap())
            .unwrap();
        // 4 header + 12 padded name + 8 id
        assert_eq!(*group.nla_len(), 24);
        groups.add_nested_attribute(&group).unwrap();
        assert_eq!(*groups.nla_len(), 28);

        let mut attrs = GenlBuffer::new();
        attrs.push(groups);
        let handle = attrs.get_attr_handle();
        let list = handle
            .get_nested_attributes::<u16>(CtrlAttr::McastGroups)
            .unwrap();
        let entry = list.get_attribute(1).unwrap();
        assert!(*entry.nla_type().nla_nested());
        let entry = entry.get_attr_handle::<CtrlAttrMcastGrp>().unwrap();
        assert_eq!(
            entry
                .get_attr_payload_as_with_len::<String>(CtrlAttrMcastGrp::Name)
                .unwrap(),
            "scan"
        );
        assert_eq!(
            entry
                .get_attr_payload_as::<u32>(CtrlAttrMcastGrp::Id)
                .unwrap(),
            4
        );
    }

    #[test]
    fn test_set_payload() {
        let mut attr = Nlattr::new(false, false, Nl80211Attr::Ifindex, 3u32).unwrap();
        assert_eq!(attr.get_payload_as::<u32>().unwrap(), 3);
        attr.set_payload(&"wlan0").unwrap();
        assert_eq!(*attr.nla_len(), 10);
        assert_eq!(attr.get_payload_as_with_len::<String>().unwrap(), "wlan0");
        assert!(attr.get_payload_as::<u64>().is_err());
    }
}
