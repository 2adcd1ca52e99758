/// For naming a new enum, passing in what type it serializes to and
/// deserializes from, and providing a mapping from variants to
/// expressions (such as libc consts) that will ultimately be used in
/// the serialization/deserialization step when sending the netlink
/// message over the wire.
///
/// # Usage
/// Create an enum named `MyNetlinkProtoAttrs` that can be serialized
/// into `u16`s to use with netlink. Doc comments on the enum are
/// passed through.
///
/// ```
/// wlan::impl_var!(
///     /// These are the attributes returned
///     /// by a fake netlink protocol.
///     pub MyNetlinkProtoAttrs, u16,
///     Id => 16u16,
///     Name => 17u16,
///     Size => 18u16
/// );
///
/// assert_eq!(MyNetlinkProtoAttrs::from(17u16), MyNetlinkProtoAttrs::Name);
/// assert!(MyNetlinkProtoAttrs::from(99u16).is_unrecognized());
/// ```
#[macro_export]
macro_rules! impl_var {
    (
        $( #[$outer:meta] )*
        $vis:vis $name:ident, $ty:ty,
        $(
            $( #[doc = $doc:expr] )*
            $var:ident => $val:expr
        ),* $(,)?
    ) => (
        $(#[$outer])*
        #[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        $vis enum $name {
            $(
                $( #[doc = $doc] )*
                #[allow(missing_docs)]
                $var,
            )*
            /// Variant that signifies an invalid value while
            /// deserializing
            UnrecognizedVariant($ty),
        }

        impl $name {
            /// Returns true if no variant corresponds to the value
            /// it was parsed from
            pub fn is_unrecognized(&self) -> bool {
                matches!(*self, $name::UnrecognizedVariant(_))
            }
        }

        impl From<$ty> for $name {
            fn from(v: $ty) -> Self {
                match v {
                    $(
                        i if i == $val => $name::$var,
                    )*
                    i => $name::UnrecognizedVariant(i)
                }
            }
        }

        impl From<$name> for $ty {
            fn from(v: $name) -> Self {
                match v {
                    $(
                        $name::$var => $val,
                    )*
                    $name::UnrecognizedVariant(i) => i,
                }
            }
        }

        impl<'a> From<&'a $name> for $ty {
            fn from(v: &'a $name) -> Self {
                <$ty>::from(*v)
            }
        }

        impl $crate::Size for $name {
            fn unpadded_size(&self) -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl $crate::TypeSize for $name {
            fn type_size() -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl $crate::ToBytes for $name {
            fn to_bytes(
                &self,
                buffer: &mut std::io::Cursor<Vec<u8>>,
            ) -> Result<(), $crate::err::SerError> {
                let v: $ty = (*self).into();
                $crate::ToBytes::to_bytes(&v, buffer)
            }
        }

        impl $crate::FromBytes for $name {
            fn from_bytes(
                buffer: &mut std::io::Cursor<impl AsRef<[u8]>>,
            ) -> Result<Self, $crate::err::DeError> {
                let v = <$ty as $crate::FromBytes>::from_bytes(buffer)?;
                Ok(v.into())
            }
        }
    );
}

/// For generating a marker trait that flags a new enum as usable in a
/// field that accepts a generic type. This way, the type parameter
/// can be constrained by a trait bound to only accept enums that
/// implement the marker trait. The raw integer type always implements
/// the trait so that unknown constants can still be sent.
///
/// # Usage
///
/// ```
/// wlan::impl_var!(
///     pub MyFamilyEnum, u16,
///     One => 1,
///     Two => 2
/// );
///
/// wlan::impl_trait!(
///     /// Constants usable in my family's attribute field.
///     pub MyMarkerTrait, u16,
///     MyFamilyEnum
/// );
///
/// fn takes_marker<T: MyMarkerTrait>(t: T) -> u16 {
///     t.into()
/// }
///
/// assert_eq!(takes_marker(MyFamilyEnum::Two), 2);
/// assert_eq!(takes_marker(5u16), 5);
/// ```
#[macro_export]
macro_rules! impl_trait {
    (
        $(#[$outer:meta])*
        $vis_trait:vis $trait_name:ident,
        $to_from_ty:ty,
        $( $const_enum:ident ),+ $(,)?
    ) => {
        $(#[$outer])*
        $vis_trait trait $trait_name: $crate::Size
            + $crate::TypeSize
            + $crate::ToBytes
            + $crate::FromBytes
            + std::fmt::Debug
            + PartialEq
            + Copy
            + From<$to_from_ty>
            + Into<$to_from_ty>
        {}

        impl $trait_name for $to_from_ty {}

        $(
            impl $trait_name for $const_enum {}
        )+
    };
}

/// Implement the netlink codec traits for a `bitflags` type by
/// delegating to its underlying integer.
macro_rules! impl_flags_codec {
    ($name:ident, $bin_type:ty) => {
        impl $crate::Size for $name {
            fn unpadded_size(&self) -> usize {
                std::mem::size_of::<$bin_type>()
            }
        }

        impl $crate::TypeSize for $name {
            fn type_size() -> usize {
                std::mem::size_of::<$bin_type>()
            }
        }

        impl $crate::ToBytes for $name {
            fn to_bytes(
                &self,
                buffer: &mut std::io::Cursor<Vec<u8>>,
            ) -> Result<(), $crate::err::SerError> {
                $crate::ToBytes::to_bytes(&self.bits(), buffer)
            }
        }

        impl $crate::FromBytes for $name {
            fn from_bytes(
                buffer: &mut std::io::Cursor<impl AsRef<[u8]>>,
            ) -> Result<Self, $crate::err::DeError> {
                Ok($name::from_bits_retain(
                    <$bin_type as $crate::FromBytes>::from_bytes(buffer)?,
                ))
            }
        }
    };
}
