use std::{fmt::Debug, iter::once, time::Duration};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::{
    consts::{
        genl::{CtrlAttr, CtrlCmd},
        nl::{GenlId, NlType, NlmF, Nlmsg},
        socket::NlFamily,
    },
    err::RouterError,
    genl::{Genlmsghdr, GenlmsghdrBuilder, Nlattr},
    nl::{NlPayload, NlmsghdrBuilder},
    router::GenlFamily,
    socket::synchronous::NlSocketHandle,
    types::{GenlBuffer, NlBuffer},
    utils::Groups,
    FromBytesWithInput, Size, ToBytes,
};

/// A high-level handle for sending requests and collecting the
/// validated replies.
pub struct NlRouter {
    socket: Mutex<NlSocketHandle>,
    seq: Mutex<u32>,
    timeout: Mutex<Option<Duration>>,
    pid: u32,
}

impl NlRouter {
    /// Equivalent of `socket` and `bind` calls.
    pub fn connect(proto: NlFamily, pid: Option<u32>, groups: Groups) -> Result<Self, RouterError> {
        Ok(NlRouter::new(NlSocketHandle::connect(proto, pid, groups)?))
    }

    /// Route requests over an already connected socket handle.
    pub fn new(socket: NlSocketHandle) -> Self {
        let pid = socket.pid();
        NlRouter {
            socket: Mutex::new(socket),
            seq: Mutex::new(0),
            timeout: Mutex::new(None),
            pid,
        }
    }

    /// Get the PID of the underlying socket.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Bound how long [`NlRouter::send`] waits for each reply
    /// datagram. An expired wait returns [`RouterError::Timeout`].
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), RouterError> {
        let socket = self.socket.lock();
        socket.set_recv_timeout(timeout)?;
        *self.timeout.lock() = timeout;
        Ok(())
    }

    /// Join multicast groups for the socket.
    pub fn add_mcast_membership(&self, groups: Groups) -> Result<(), RouterError> {
        self.socket.lock().add_mcast_membership(groups)?;
        Ok(())
    }

    /// Leave multicast groups for the socket.
    pub fn drop_mcast_membership(&self, groups: Groups) -> Result<(), RouterError> {
        self.socket.lock().drop_mcast_membership(groups)?;
        Ok(())
    }

    /// Sequence number 0 is left to multicast notifications.
    fn next_seq(&self) -> u32 {
        let mut lock = self.seq.lock();
        *lock = match lock.wrapping_add(1) {
            0 => 1,
            seq => seq,
        };
        *lock
    }

    /// Send a request and collect every reply that belongs to it.
    ///
    /// `NLM_F_REQUEST` is always set. The exchange is complete at
    /// `NLMSG_DONE`, at an ACK, or after a reply without
    /// `NLM_F_MULTI` when no ACK was requested. `NLMSG_DONE` and the
    /// ACK itself are not part of the returned buffer.
    pub fn send<ST, SP, RT, RP>(
        &self,
        nl_type: ST,
        nl_flags: NlmF,
        nl_payload: NlPayload<SP>,
    ) -> Result<NlBuffer<RT, RP>, RouterError>
    where
        ST: NlType + Debug,
        SP: Size + ToBytes + Debug,
        RT: NlType + Debug,
        RP: Size + FromBytesWithInput<Input = usize> + Debug,
    {
        let seq = self.next_seq();
        let msg = NlmsghdrBuilder::default()
            .nl_type(nl_type)
            .nl_flags(NlmF::REQUEST | nl_flags)
            .nl_pid(self.pid)
            .nl_seq(seq)
            .nl_payload(nl_payload)
            .build()?;
        // The kernel never acknowledges a dump, it ends with NLMSG_DONE.
        let needs_ack = nl_flags.contains(NlmF::ACK) && !nl_flags.contains(NlmF::DUMP);

        let socket = self.socket.lock();
        socket.send(&msg)?;

        let mut replies = NlBuffer::new();
        let mut next_is_ack = false;
        loop {
            let (msgs, _) = socket.recv_all::<RT, RP>()?;
            for msg in msgs {
                trace!("Router received message: {:?}", msg);
                if *msg.nl_seq() != seq || (self.pid != 0 && *msg.nl_pid() != self.pid) {
                    return Err(RouterError::BadSeqOrPid {
                        seq: *msg.nl_seq(),
                        pid: *msg.nl_pid(),
                    });
                }

                match msg.nl_payload() {
                    NlPayload::Ack(_) => return Ok(replies),
                    NlPayload::Err(e) => return Err(RouterError::Nlmsgerr(e.clone())),
                    _ if next_is_ack => return Err(RouterError::NoAck),
                    _ => (),
                }

                let raw_type: u16 = (*msg.nl_type()).into();
                let is_done = raw_type == u16::from(Nlmsg::Done);
                let is_last = is_done || !msg.nl_flags().contains(NlmF::MULTI);
                if !is_done {
                    replies.push(msg);
                }
                if is_last {
                    if needs_ack {
                        next_is_ack = true;
                    } else {
                        return Ok(replies);
                    }
                }
            }
        }
    }

    /// Wait for the next multicast datagram and return the
    /// notifications it carries. Messages that answer a request are
    /// dropped. `timeout` only applies to this call.
    pub fn recv_multicast<T, P>(
        &self,
        timeout: Option<Duration>,
    ) -> Result<NlBuffer<T, P>, RouterError>
    where
        T: NlType + Debug,
        P: Size + FromBytesWithInput<Input = usize> + Debug,
    {
        let socket = self.socket.lock();
        socket.set_recv_timeout(timeout)?;
        let received = socket.recv_all::<T, P>();
        socket.set_recv_timeout(*self.timeout.lock())?;

        let (msgs, groups) = received?;
        debug!(
            "Received {} messages for multicast groups {:?}",
            msgs.len(),
            groups.as_groups()
        );
        Ok(msgs
            .into_iter()
            .filter(|msg| {
                if *msg.nl_seq() != 0 {
                    debug!("Dropping reply with sequence number {}", msg.nl_seq());
                    false
                } else {
                    true
                }
            })
            .collect())
    }

    /// Ask the generic netlink controller to describe a family.
    pub fn get_family(&self, family_name: &str) -> Result<GenlFamily, RouterError> {
        let attrs = once(Nlattr::new(false, false, CtrlAttr::FamilyName, family_name)?)
            .collect::<GenlBuffer<_, _>>();
        let replies = self.send::<_, _, GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>>(
            GenlId::Ctrl,
            NlmF::ACK,
            NlPayload::Payload(
                GenlmsghdrBuilder::default()
                    .cmd(CtrlCmd::Getfamily)
                    .version(2)
                    .attrs(attrs)
                    .build()?,
            ),
        )?;

        match replies.iter().find_map(|msg| msg.get_payload()) {
            Some(p) => Ok(GenlFamily::try_from(p)?),
            None => Err(RouterError::new(format!(
                "Generic netlink family {} was not found",
                family_name
            ))),
        }
    }

    /// Convenience function for resolving a [`str`] containing the
    /// generic netlink family name to a numeric generic netlink ID.
    pub fn resolve_genl_family(&self, family_name: &str) -> Result<u16, RouterError> {
        self.get_family(family_name).map(|family| *family.id())
    }

    /// Convenience function for resolving a [`str`] containing the
    /// multicast group name to a numeric multicast group ID.
    pub fn resolve_nl_mcast_group(
        &self,
        family_name: &str,
        mcast_name: &str,
    ) -> Result<u32, RouterError> {
        self.get_family(family_name)?
            .mcast_group(mcast_name)
            .ok_or_else(|| {
                RouterError::new(format!(
                    "Failed to resolve multicast group ID for family name {}, multicast group name {}",
                    family_name, mcast_name
                ))
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::{
        consts::genl::{CtrlAttrMcastGrp, CtrlAttrOp},
        err::{Nlmsgerr, NlmsghdrErr, SocketError},
        nl::Nlmsghdr,
        socket::NlSocket,
        test::setup,
        types::Buffer,
    };

    fn push<T, P>(peer: &NlSocket, msg: &Nlmsghdr<T, P>)
    where
        T: NlType,
        P: Size + ToBytes,
    {
        let mut c = Cursor::new(Vec::new());
        msg.to_bytes(&mut c).unwrap();
        peer.send(c.get_ref()).unwrap();
    }

    fn ctrl_msg(
        seq: u32,
        flags: NlmF,
        attrs: GenlBuffer<CtrlAttr, Buffer>,
    ) -> Nlmsghdr<GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>> {
        NlmsghdrBuilder::default()
            .nl_type(GenlId::Ctrl)
            .nl_flags(flags)
            .nl_seq(seq)
            .nl_payload(NlPayload::Payload(
                GenlmsghdrBuilder::default()
                    .cmd(CtrlCmd::Newfamily)
                    .version(2)
                    .attrs(attrs)
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap()
    }

    fn nl80211_family_attrs() -> GenlBuffer<CtrlAttr, Buffer> {
        let mut ops = Nlattr::new(true, false, CtrlAttr::Ops, Buffer::new()).unwrap();
        let mut op = Nlattr::new(true, false, 1u16, Buffer::new()).unwrap();
        op.add_nested_attribute(&Nlattr::new(false, false, CtrlAttrOp::Id, 33u32).unwrap())
            .unwrap();
        op.add_nested_attribute(&Nlattr::new(false, false, CtrlAttrOp::Flags, 0xau32).unwrap())
            .unwrap();
        ops.add_nested_attribute(&op).unwrap();

        let mut groups = Nlattr::new(true, false, CtrlAttr::McastGroups, Buffer::new()).unwrap();
        for (i, (name, id)) in [("config", 4u32), ("scan", 5u32)].iter().enumerate() {
            let mut group = Nlattr::new(true, false, i as u16 + 1, Buffer::new()).unwrap();
            group
                .add_nested_attribute(&Nlattr::new(false, false, CtrlAttrMcastGrp::Id, *id).unwrap())
                .unwrap();
            group
                .add_nested_attribute(
                    &Nlattr::new(false, false, CtrlAttrMcastGrp::Name, *name).unwrap(),
                )
                .unwrap();
            groups.add_nested_attribute(&group).unwrap();
        }

        vec![
            Nlattr::new(false, false, CtrlAttr::FamilyId, 0x1cu16).unwrap(),
            Nlattr::new(false, false, CtrlAttr::FamilyName, "nl80211").unwrap(),
            Nlattr::new(false, false, CtrlAttr::Version, 1u32).unwrap(),
            Nlattr::new(false, false, CtrlAttr::Hdrsize, 0u32).unwrap(),
            Nlattr::new(false, false, CtrlAttr::Maxattr, 300u32).unwrap(),
            ops,
            groups,
        ]
        .into_iter()
        .collect()
    }

    fn error_msg(seq: u32, error: libc::c_int) -> Nlmsghdr<Nlmsg, ()> {
        let err = Nlmsgerr {
            error,
            nlmsg: NlmsghdrErr {
                nl_len: 36,
                nl_type: 0x10,
                nl_flags: NlmF::REQUEST | NlmF::ACK,
                nl_seq: seq,
                nl_pid: 0,
            },
            ext: Buffer::new(),
        };
        NlmsghdrBuilder::default()
            .nl_type(Nlmsg::Error)
            .nl_seq(seq)
            .nl_payload(if error == 0 {
                NlPayload::Ack(err)
            } else {
                NlPayload::Err(err)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_family() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &ctrl_msg(1, NlmF::empty(), nl80211_family_attrs()));
        push(&peer, &error_msg(1, 0));

        let family = router.get_family("nl80211").unwrap();
        assert_eq!(*family.id(), 0x1c);
        assert_eq!(family.name(), "nl80211");
        assert_eq!(*family.version(), 1);
        assert_eq!(*family.maxattr(), 300);
        assert_eq!(family.mcast_group("scan"), Some(5));
        assert_eq!(family.mcast_group("mlme"), None);
        assert!(family.supports(33));
        assert_eq!(*family.ops()[0].flags(), 0xa);
    }

    #[test]
    fn test_resolve_helpers() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &ctrl_msg(1, NlmF::empty(), nl80211_family_attrs()));
        push(&peer, &error_msg(1, 0));
        push(&peer, &ctrl_msg(2, NlmF::empty(), nl80211_family_attrs()));
        push(&peer, &error_msg(2, 0));

        assert_eq!(router.resolve_genl_family("nl80211").unwrap(), 0x1c);
        assert_eq!(router.resolve_nl_mcast_group("nl80211", "config").unwrap(), 4);
    }

    #[test]
    fn test_error_reply() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &error_msg(1, -libc::ENOENT));

        match router.resolve_genl_family("nope") {
            Err(RouterError::Nlmsgerr(e)) => assert_eq!(e.errno(), libc::ENOENT),
            res => panic!("Unexpected result {:?}", res),
        }
    }

    #[test]
    fn test_bad_seq() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &ctrl_msg(9, NlmF::empty(), GenlBuffer::new()));

        assert!(matches!(
            router.get_family("nl80211"),
            Err(RouterError::BadSeqOrPid { seq: 9, pid: 0 })
        ));
    }

    #[test]
    fn test_empty_datagram() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        peer.send(Vec::<u8>::new()).unwrap();

        match router.get_family("nl80211") {
            Err(RouterError::Socket(SocketError::Io(e))) => {
                assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof)
            }
            res => panic!("Unexpected result {:?}", res),
        }
    }

    #[test]
    fn test_dump_until_done() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &ctrl_msg(1, NlmF::MULTI, nl80211_family_attrs()));
        push(&peer, &ctrl_msg(1, NlmF::MULTI, nl80211_family_attrs()));
        push(
            &peer,
            &NlmsghdrBuilder::default()
                .nl_type(Nlmsg::Done)
                .nl_flags(NlmF::MULTI)
                .nl_seq(1)
                .nl_payload(NlPayload::Payload(0u32))
                .build()
                .unwrap(),
        );

        let replies = router
            .send::<_, _, GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>>(
                GenlId::Ctrl,
                NlmF::DUMP | NlmF::ACK,
                NlPayload::Payload(
                    GenlmsghdrBuilder::<CtrlCmd, CtrlAttr>::default()
                        .cmd(CtrlCmd::Getfamily)
                        .version(2)
                        .build()
                        .unwrap(),
                ),
            )
            .unwrap();
        assert_eq!(replies.len(), 2);
    }

    #[test]
    fn test_recv_multicast() {
        setup();

        let (handle, peer) = NlSocketHandle::pair();
        let router = NlRouter::new(handle);
        push(&peer, &ctrl_msg(0, NlmF::empty(), GenlBuffer::new()));

        let msgs = router
            .recv_multicast::<GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>>(Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(msgs.len(), 1);

        assert!(matches!(
            router.recv_multicast::<GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>>(Some(
                Duration::from_millis(10)
            )),
            Err(RouterError::Timeout)
        ));
    }

    #[test]
    #[ignore]
    fn real_test_nl80211_family() {
        setup();

        let router = NlRouter::connect(NlFamily::Generic, None, Groups::empty()).unwrap();
        let family = router.get_family("nl80211").unwrap();
        assert!(family.mcast_group("scan").is_some());
    }
}
