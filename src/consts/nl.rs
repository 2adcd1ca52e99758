use bitflags::bitflags;

impl_trait!(
    /// Trait marking constants valid for use in
    /// [`Nlmsghdr`][crate::nl::Nlmsghdr] field, `nl_type`.
    pub NlType,
    u16,
    Nlmsg,
    GenlId
);

impl_var!(
    /// Values for `nl_type` in [`Nlmsghdr`][crate::nl::Nlmsghdr]
    pub Nlmsg, u16,
    Noop => libc::NLMSG_NOOP as u16,
    Error => libc::NLMSG_ERROR as u16,
    Done => libc::NLMSG_DONE as u16,
    Overrun => libc::NLMSG_OVERRUN as u16
);

impl_var!(
    /// Fixed generic netlink family IDs for `nl_type` in
    /// [`Nlmsghdr`][crate::nl::Nlmsghdr]. Every other family ID is
    /// allocated at runtime and must be resolved by name.
    pub GenlId, u16,
    Ctrl => libc::GENL_ID_CTRL as u16
);

/// Acknowledgement flag: the request payload was not echoed.
pub const NLM_F_CAPPED: u16 = 0x100;
/// Acknowledgement flag: extended ack TLVs follow the header.
pub const NLM_F_ACK_TLVS: u16 = 0x200;

bitflags! {
    /// Values for `nl_flags` in [`Nlmsghdr`][crate::nl::Nlmsghdr]
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct NlmF: u16 {
        /// This flag is required for all kernel requests
        const REQUEST = libc::NLM_F_REQUEST as u16;
        /// Multipart message, terminated by `NLMSG_DONE`
        const MULTI = libc::NLM_F_MULTI as u16;
        /// Request an acknowledgement on success
        const ACK = libc::NLM_F_ACK as u16;
        /// Echo this request
        const ECHO = libc::NLM_F_ECHO as u16;
        /// Dump was inconsistent due to sequence change
        const DUMP_INTR = libc::NLM_F_DUMP_INTR as u16;
        /// Dump was filtered as requested
        const DUMP_FILTERED = libc::NLM_F_DUMP_FILTERED as u16;
        /// Return the complete table
        const ROOT = libc::NLM_F_ROOT as u16;
        /// Return all entries matching the criteria
        const MATCH = libc::NLM_F_MATCH as u16;
        /// Return an atomic snapshot
        const ATOMIC = libc::NLM_F_ATOMIC as u16;
        /// Shorthand for `ROOT | MATCH`
        const DUMP = libc::NLM_F_DUMP as u16;
        /// Replace an existing object
        const REPLACE = libc::NLM_F_REPLACE as u16;
        /// Do not touch an object if it exists
        const EXCL = libc::NLM_F_EXCL as u16;
        /// Create an object if it does not exist
        const CREATE = libc::NLM_F_CREATE as u16;
        /// Add to the end of the object list
        const APPEND = libc::NLM_F_APPEND as u16;
        /// Set on an ack when the request was not echoed back
        const CAPPED = NLM_F_CAPPED;
        /// Set on an ack carrying extended ack attributes
        const ACK_TLVS = NLM_F_ACK_TLVS;
    }
}

impl_flags_codec!(NlmF, u16);

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::{FromBytes, ToBytes};

    #[test]
    fn test_nlmf_codec() {
        let flags = NlmF::REQUEST | NlmF::DUMP;
        let mut buffer = Cursor::new(Vec::new());
        flags.to_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref().as_slice(), &0x301u16.to_ne_bytes());

        let parsed = NlmF::from_bytes(&mut Cursor::new(buffer.into_inner())).unwrap();
        assert!(parsed.contains(NlmF::ROOT));
        assert!(parsed.contains(NlmF::MATCH));
        assert_eq!(parsed, flags);
    }

    #[test]
    fn test_genl_id() {
        assert_eq!(GenlId::from(0x10u16), GenlId::Ctrl);
        assert_eq!(u16::from(Nlmsg::Error), 2);
        assert_eq!(u16::from(Nlmsg::Done), 3);
    }
}
