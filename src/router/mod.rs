//! High level API that performs sequence and PID checking as well as ACK validation.
//!
//! ## Workflow
//! * [`NlRouter::send`][crate::router::synchronous::NlRouter::send] assigns
//!   the next sequence number, sets `NLM_F_REQUEST` and sends the message.
//! * Replies are read on the calling thread until the request is complete:
//!   `NLMSG_DONE` ends a dump, an ACK ends a request that asked for one and
//!   a reply without `NLM_F_MULTI` ends any other request.
//! * An error packet from the kernel ends the exchange with
//!   [`RouterError::Nlmsgerr`][crate::err::RouterError::Nlmsgerr].
//!
//! ## Design decisions
//! Requests are serialized on the socket with a lock so that two threads
//! sharing a router never read each other's replies. Multicast
//! notifications are meant to be read from a second router that only
//! joins groups; see
//! [`NlRouter::recv_multicast`][crate::router::synchronous::NlRouter::recv_multicast].

/// Synchronous packet routing functionality.
pub mod synchronous;

use getset::Getters;

use crate::{
    consts::genl::{CtrlAttr, CtrlAttrMcastGrp, CtrlAttrOp, CtrlCmd},
    err::DeError,
    genl::Genlmsghdr,
};

pub use crate::router::synchronous::NlRouter;

/// One operation supported by a generic netlink family.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
pub struct GenlOp {
    /// Command number.
    #[getset(get = "pub")]
    id: u32,
    /// `GENL_*` flags for the command.
    #[getset(get = "pub")]
    flags: u32,
}

/// A multicast group of a generic netlink family.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
pub struct GenlMcastGroup {
    /// Group name, for example `scan` for `nl80211`.
    #[getset(get = "pub")]
    name: String,
    /// Group number to pass to
    /// [`NlRouter::add_mcast_membership`][crate::router::synchronous::NlRouter::add_mcast_membership].
    #[getset(get = "pub")]
    id: u32,
}

/// A generic netlink family as described by the `nlctrl` controller.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
pub struct GenlFamily {
    /// Numeric family ID used as `nlmsg_type`.
    #[getset(get = "pub")]
    id: u16,
    /// Family name.
    #[getset(get = "pub")]
    name: String,
    /// Protocol version.
    #[getset(get = "pub")]
    version: u32,
    /// Size of the family specific header following the generic
    /// netlink header.
    #[getset(get = "pub")]
    hdrsize: u32,
    /// Highest attribute number the family understands.
    #[getset(get = "pub")]
    maxattr: u32,
    /// Supported commands.
    #[getset(get = "pub")]
    ops: Vec<GenlOp>,
    /// Multicast groups.
    #[getset(get = "pub")]
    mcast_groups: Vec<GenlMcastGroup>,
}

impl GenlFamily {
    /// Look up a multicast group ID by name.
    pub fn mcast_group(&self, name: &str) -> Option<u32> {
        self.mcast_groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.id)
    }

    /// Returns `true` if the family supports command `cmd`.
    pub fn supports(&self, cmd: u8) -> bool {
        self.ops.iter().any(|op| op.id == u32::from(cmd))
    }
}

impl TryFrom<&Genlmsghdr<CtrlCmd, CtrlAttr>> for GenlFamily {
    type Error = DeError;

    fn try_from(msg: &Genlmsghdr<CtrlCmd, CtrlAttr>) -> Result<Self, Self::Error> {
        let handle = msg.get_attr_handle();

        let id = handle
            .get_attr_payload_as::<u16>(CtrlAttr::FamilyId)
            .map_err(|_| DeError::MissingAttribute("CTRL_ATTR_FAMILY_ID"))?;
        let name = handle
            .get_attr_payload_as_with_len::<String>(CtrlAttr::FamilyName)
            .map_err(|_| DeError::MissingAttribute("CTRL_ATTR_FAMILY_NAME"))?;
        let version = handle
            .get_attr_payload_as::<u32>(CtrlAttr::Version)
            .unwrap_or(0);
        let hdrsize = handle
            .get_attr_payload_as::<u32>(CtrlAttr::Hdrsize)
            .unwrap_or(0);
        let maxattr = handle
            .get_attr_payload_as::<u32>(CtrlAttr::Maxattr)
            .unwrap_or(0);

        // Ops and groups are nested lists keyed by 1-based index.
        let mut ops = Vec::new();
        if handle.get_attribute(CtrlAttr::Ops).is_some() {
            for item in handle.get_nested_attributes::<u16>(CtrlAttr::Ops)?.iter() {
                let op = item.get_attr_handle::<CtrlAttrOp>()?;
                ops.push(GenlOp {
                    id: op.get_attr_payload_as::<u32>(CtrlAttrOp::Id)?,
                    flags: op.get_attr_payload_as::<u32>(CtrlAttrOp::Flags).unwrap_or(0),
                });
            }
        }

        let mut mcast_groups = Vec::new();
        if handle.get_attribute(CtrlAttr::McastGroups).is_some() {
            for item in handle
                .get_nested_attributes::<u16>(CtrlAttr::McastGroups)?
                .iter()
            {
                let group = item.get_attr_handle::<CtrlAttrMcastGrp>()?;
                mcast_groups.push(GenlMcastGroup {
                    name: group.get_attr_payload_as_with_len::<String>(CtrlAttrMcastGrp::Name)?,
                    id: group.get_attr_payload_as::<u32>(CtrlAttrMcastGrp::Id)?,
                });
            }
        }

        Ok(GenlFamily {
            id,
            name,
            version,
            hdrsize,
            maxattr,
            ops,
            mcast_groups,
        })
    }
}
