impl_var!(
    /// General address families for sockets
    pub AddrFamily, libc::c_int,
    UnixOrLocal => libc::AF_UNIX,
    Inet => libc::AF_INET,
    Inet6 => libc::AF_INET6,
    Netlink => libc::AF_NETLINK,
    Packet => libc::AF_PACKET
);

impl_var!(
    /// Values for `nl_family` in [`NlSocket`][crate::socket::NlSocket]
    pub NlFamily, libc::c_int,
    Route => libc::NETLINK_ROUTE,
    Usersock => libc::NETLINK_USERSOCK,
    SockOrInetDiag => libc::NETLINK_SOCK_DIAG,
    Audit => libc::NETLINK_AUDIT,
    Netfilter => libc::NETLINK_NETFILTER,
    KobjectUevent => libc::NETLINK_KOBJECT_UEVENT,
    Generic => libc::NETLINK_GENERIC
);
