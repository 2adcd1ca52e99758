use crate::consts::nl80211::{Nl80211Attr, Nl80211Bss, Nl80211Cmd};

impl_trait!(
    /// Trait marking constants valid for use in
    /// [`Genlmsghdr`][crate::genl::Genlmsghdr] field, `cmd`.
    pub Cmd,
    u8,
    CtrlCmd,
    Nl80211Cmd
);

impl_var!(
    /// Values for `cmd` in [`Genlmsghdr`][crate::genl::Genlmsghdr].
    pub CtrlCmd, u8,
    Unspec => libc::CTRL_CMD_UNSPEC as u8,
    Newfamily => libc::CTRL_CMD_NEWFAMILY as u8,
    Delfamily => libc::CTRL_CMD_DELFAMILY as u8,
    Getfamily => libc::CTRL_CMD_GETFAMILY as u8,
    Newops => libc::CTRL_CMD_NEWOPS as u8,
    Delops => libc::CTRL_CMD_DELOPS as u8,
    Getops => libc::CTRL_CMD_GETOPS as u8,
    NewmcastGrp => libc::CTRL_CMD_NEWMCAST_GRP as u8,
    DelmcastGrp => libc::CTRL_CMD_DELMCAST_GRP as u8,
    GetmcastGrp => libc::CTRL_CMD_GETMCAST_GRP as u8
);

impl_trait!(
    /// Marker trait for types usable in the
    /// [`Nlattr`][crate::genl::Nlattr] field, `nla_type`
    pub NlAttrType,
    u16,
    CtrlAttr,
    CtrlAttrMcastGrp,
    CtrlAttrOp,
    Nl80211Attr,
    Nl80211Bss
);

impl_var!(
    /// Values for `nla_type` in [`Nlattr`][crate::genl::Nlattr]
    pub CtrlAttr, u16,
    Unspec => libc::CTRL_ATTR_UNSPEC as u16,
    FamilyId => libc::CTRL_ATTR_FAMILY_ID as u16,
    FamilyName => libc::CTRL_ATTR_FAMILY_NAME as u16,
    Version => libc::CTRL_ATTR_VERSION as u16,
    Hdrsize => libc::CTRL_ATTR_HDRSIZE as u16,
    Maxattr => libc::CTRL_ATTR_MAXATTR as u16,
    Ops => libc::CTRL_ATTR_OPS as u16,
    McastGroups => libc::CTRL_ATTR_MCAST_GROUPS as u16
);

impl_var!(
    /// Values for `nla_type` in [`Nlattr`][crate::genl::Nlattr]
    /// nested in [`CtrlAttr::McastGroups`]
    pub CtrlAttrMcastGrp, u16,
    Unspec => libc::CTRL_ATTR_MCAST_GRP_UNSPEC as u16,
    Name => libc::CTRL_ATTR_MCAST_GRP_NAME as u16,
    Id => libc::CTRL_ATTR_MCAST_GRP_ID as u16
);

impl_var!(
    /// Values for `nla_type` in [`Nlattr`][crate::genl::Nlattr]
    /// nested in [`CtrlAttr::Ops`]
    pub CtrlAttrOp, u16,
    Unspec => 0,
    Id => 1,
    Flags => 2
);
