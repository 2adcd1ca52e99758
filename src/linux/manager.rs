use std::{
    collections::{HashMap, HashSet},
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use derive_builder::Builder;
use getset::Getters;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use crate::{
    consts::{
        nl80211::{Nl80211Cmd, NL80211_GENL_NAME, NL80211_MULTICAST_GROUP_SCAN},
        socket::NlFamily,
    },
    err::{RouterError, SocketError, WlanError},
    linux::{netif::NetworkInterface, set_interface_up, IoctlSocket},
    nl::NlPayload,
    nl80211::{
        Disconnect, GetInterface, GetScan, Nl80211Interface, Nl80211Message, Nl80211Request,
        ScanResult, TriggerScan, TriggerScanStatus,
    },
    router::{GenlFamily, NlRouter},
    utils::Groups,
    wlan::{Ssid, WlanInterface, WlanManager, WlanNetwork},
};

/// Tuning for scans run by [`LinuxWlanManager`].
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "owned")]
pub struct ScanConfig {
    /// How long to wait for the driver to report results.
    #[builder(default = "Duration::from_secs(10)")]
    #[getset(get = "pub")]
    timeout: Duration,
    /// Pause between two scans of a [`ScanStream`].
    #[builder(default = "Duration::from_secs(1)")]
    #[getset(get = "pub")]
    interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(1),
        }
    }
}

fn is_overrun(e: &RouterError) -> bool {
    matches!(e, RouterError::Socket(SocketError::Io(err)) if err.raw_os_error() == Some(libc::ENOBUFS))
}

/// [`WlanManager`] backed by `nl80211`.
///
/// Requests go over one generic netlink socket. A second socket stays
/// subscribed to the `nl80211` `scan` multicast group and is only read
/// while a scan is in flight.
pub struct LinuxWlanManager {
    router: NlRouter,
    events: NlRouter,
    family: GenlFamily,
    indices: Mutex<HashMap<String, u32>>,
    ioctl: IoctlSocket,
    config: ScanConfig,
}

impl LinuxWlanManager {
    /// Open the netlink sockets and resolve the `nl80211` family.
    pub fn new() -> Result<Self, WlanError> {
        let router = NlRouter::connect(NlFamily::Generic, None, Groups::empty())?;
        let family = router.get_family(NL80211_GENL_NAME)?;
        let group = family
            .mcast_group(NL80211_MULTICAST_GROUP_SCAN)
            .ok_or(WlanError::NotSupported("nl80211 scan notifications"))?;
        let events = NlRouter::connect(NlFamily::Generic, None, Groups::new_groups(&[group]))?;
        LinuxWlanManager::with_family(router, events, family)
    }

    /// Build a manager from connected routers. `events` must already be
    /// subscribed to the `scan` group.
    pub fn with_routers(router: NlRouter, events: NlRouter) -> Result<Self, WlanError> {
        let family = router.get_family(NL80211_GENL_NAME)?;
        LinuxWlanManager::with_family(router, events, family)
    }

    fn with_family(
        router: NlRouter,
        events: NlRouter,
        family: GenlFamily,
    ) -> Result<Self, WlanError> {
        debug!(
            "Resolved {} to family {} version {}",
            family.name(),
            family.id(),
            family.version()
        );
        Ok(LinuxWlanManager {
            router,
            events,
            family,
            indices: Mutex::new(HashMap::new()),
            ioctl: IoctlSocket::new()?,
            config: ScanConfig::default(),
        })
    }

    /// Replace the scan settings.
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// The resolved `nl80211` family.
    pub fn family(&self) -> &GenlFamily {
        &self.family
    }

    /// Scan settings in use.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn request<R>(&self, request: &R) -> Result<Vec<Nl80211Message>, RouterError>
    where
        R: Nl80211Request,
    {
        let replies = self.router.send::<_, _, u16, Nl80211Message>(
            *self.family.id(),
            request.flags(),
            NlPayload::Payload(request.to_message()?),
        )?;
        Ok(replies
            .into_iter()
            .filter_map(|msg| match msg.into_payload() {
                NlPayload::Payload(p) => Some(p),
                _ => None,
            })
            .collect())
    }

    /// Interface index, from the cache or the kernel.
    fn index(&self, interface: &WlanInterface) -> Result<u32, WlanError> {
        if let Some(index) = self.indices.lock().get(interface.name()) {
            return Ok(*index);
        }
        match NetworkInterface::index(interface.name()) {
            Ok(index) => {
                self.indices.lock().insert(interface.name().clone(), index);
                Ok(index)
            }
            Err(e)
                if e.raw_os_error() == Some(libc::ENODEV)
                    || e.kind() == io::ErrorKind::InvalidInput =>
            {
                Err(WlanError::InvalidInterface(interface.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Describe every `nl80211` interface.
    pub fn nl80211_interfaces(&self) -> Result<Vec<Nl80211Interface>, WlanError> {
        let mut interfaces = Vec::new();
        for msg in self.request(&GetInterface { interface: None })? {
            match Nl80211Interface::try_from(&msg) {
                Ok(i) => interfaces.push(i),
                Err(e) => warn!("Skipping interface that failed to parse: {}", e),
            }
        }
        let mut indices = self.indices.lock();
        for i in interfaces.iter() {
            indices.insert(i.name().clone(), *i.interface());
        }
        Ok(interfaces)
    }

    /// Throw away notifications queued while nobody was scanning.
    fn drain_events(&self) {
        loop {
            match self
                .events
                .recv_multicast::<u16, Nl80211Message>(Some(Duration::ZERO))
            {
                Ok(msgs) => trace!("Discarding {} stale notifications", msgs.len()),
                Err(RouterError::Timeout) => break,
                Err(e) if is_overrun(&e) => debug!("Notification queue overran"),
                Err(e) => {
                    warn!("Failed to drain scan notifications: {}", e);
                    break;
                }
            }
        }
    }

    /// Block until the kernel reports the end of a scan on `ifindex`.
    fn wait_for_results(&self, ifindex: u32) -> Result<(), WlanError> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(WlanError::Timeout);
            }
            let msgs = match self
                .events
                .recv_multicast::<u16, Nl80211Message>(Some(remaining))
            {
                Ok(msgs) => msgs,
                Err(e) if is_overrun(&e) => {
                    warn!("Scan notifications were dropped by the kernel");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for msg in msgs.iter() {
                let Some(payload) = msg.get_payload() else { continue };
                let cmd = *payload.cmd();
                if cmd != Nl80211Cmd::NewScanResults && cmd != Nl80211Cmd::ScanAborted {
                    trace!("Ignoring notification {:?}", cmd);
                    continue;
                }
                match TriggerScanStatus::try_from(payload) {
                    Ok(status) if *status.interface() == ifindex => (),
                    Ok(status) => {
                        trace!("Scan finished on other interface {}", status.interface());
                        continue;
                    }
                    Err(e) => {
                        warn!("Malformed scan notification: {}", e);
                        continue;
                    }
                }
                return match cmd {
                    Nl80211Cmd::NewScanResults => Ok(()),
                    _ => Err(WlanError::ScanAborted),
                };
            }
        }
    }

    /// Results currently cached by the kernel for `interface`.
    pub fn scan_results(&self, interface: &WlanInterface) -> Result<Vec<ScanResult>, WlanError> {
        let ifindex = self.index(interface)?;
        let mut results = Vec::new();
        for msg in self.request(&GetScan { interface: ifindex })? {
            match ScanResult::try_from(&msg) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Skipping scan result that failed to parse: {}", e),
            }
        }
        Ok(results)
    }

    fn run_scan(
        &self,
        ssid: Option<&Ssid>,
        interface: &WlanInterface,
    ) -> Result<Vec<WlanNetwork>, WlanError> {
        let ifindex = self.index(interface)?;
        self.drain_events();

        let trigger = TriggerScan {
            interface: ifindex,
            ssids: ssid.into_iter().cloned().collect(),
        };
        match self.request(&trigger) {
            Ok(_) => debug!("Triggered scan on {}", interface),
            // Someone else's scan is running, its results will do.
            Err(RouterError::Nlmsgerr(e)) if e.errno() == libc::EBUSY => {
                debug!("Scan already running on {}", interface)
            }
            Err(e) => return Err(e.into()),
        }

        self.wait_for_results(ifindex)?;
        Ok(self
            .scan_results(interface)?
            .iter()
            .map(|result| result.bss().network())
            .filter(|network| ssid.map_or(true, |s| network.ssid() == s))
            .collect())
    }

    /// Scan repeatedly in the background and yield each network the
    /// first time it is seen.
    ///
    /// Scans that time out or are aborted are retried. Any other error is
    /// yielded once and ends the stream.
    pub fn scan_stream(
        self: &Arc<Self>,
        ssid: Option<Ssid>,
        interface: &WlanInterface,
    ) -> ScanStream {
        let (sender, receiver) = channel();
        let stop = Arc::new(AtomicBool::new(false));

        let manager = Arc::clone(self);
        let interface = interface.clone();
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut seen = HashSet::new();
            while !thread_stop.load(Ordering::Acquire) {
                match manager.run_scan(ssid.as_ref(), &interface) {
                    Ok(networks) => {
                        for network in networks {
                            if seen.insert(network.clone()) && sender.send(Ok(network)).is_err() {
                                return;
                            }
                        }
                    }
                    Err(WlanError::Timeout) => warn!("Scan on {} timed out", interface),
                    Err(WlanError::ScanAborted) => warn!("Scan on {} was aborted", interface),
                    Err(e) => {
                        let _ = sender.send(Err(e));
                        return;
                    }
                }
                if !thread_stop.load(Ordering::Acquire) {
                    thread::park_timeout(manager.config.interval);
                }
            }
            info!("Scan stream on {} stopped after {} networks", interface, seen.len());
        });

        ScanStream {
            receiver,
            stop,
            handle,
        }
    }
}

impl WlanManager for LinuxWlanManager {
    fn interfaces(&self) -> Result<Vec<WlanInterface>, WlanError> {
        Ok(self
            .nl80211_interfaces()?
            .iter()
            .map(Nl80211Interface::to_wlan_interface)
            .collect())
    }

    fn scan(
        &self,
        ssid: Option<&Ssid>,
        interface: &WlanInterface,
    ) -> Result<Vec<WlanNetwork>, WlanError> {
        self.run_scan(ssid, interface)
    }

    fn set_power(&self, power: bool, interface: &WlanInterface) -> Result<(), WlanError> {
        match set_interface_up(self.ioctl.fd(), interface.name(), power) {
            Err(e) if e.raw_os_error() == Some(libc::ENODEV) => {
                Err(WlanError::InvalidInterface(interface.clone()))
            }
            res => Ok(res?),
        }
    }

    fn disassociate(&self, interface: &WlanInterface) -> Result<(), WlanError> {
        let ifindex = self.index(interface)?;
        match self.request(&Disconnect { interface: ifindex }) {
            Ok(_) => Ok(()),
            Err(RouterError::Nlmsgerr(e)) if e.errno() == libc::ENOTCONN => {
                debug!("{} was not associated", interface);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Networks found by [`LinuxWlanManager::scan_stream`].
///
/// Iterating blocks until the next new network is found. Dropping the
/// stream stops the background scans once the current one finishes.
pub struct ScanStream {
    receiver: Receiver<Result<WlanNetwork, WlanError>>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ScanStream {
    /// Wait at most `timeout` for the next network. Returns [`None`] if
    /// nothing new was found in time or the stream has ended.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<WlanNetwork, WlanError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(res) => Some(res),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns `true` once the background thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the background thread to stop after the current scan.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.handle.thread().unpark();
    }
}

impl Iterator for ScanStream {
    type Item = Result<WlanNetwork, WlanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::{
        consts::{
            genl::{CtrlAttr, CtrlCmd},
            nl::{GenlId, NlType, NlmF, Nlmsg},
            nl80211::{Nl80211Attr, Nl80211Bss, Nl80211IfType, WLAN_EID_SSID},
        },
        err::{Nlmsgerr, NlmsghdrErr},
        genl::{Genlmsghdr, GenlmsghdrBuilder, Nlattr},
        nl::{Nlmsghdr, NlmsghdrBuilder},
        socket::{NlSocket, NlSocketHandle},
        test::setup,
        types::{Buffer, GenlBuffer},
        FromBytes, Size, ToBytes,
    };

    const FAMILY: u16 = 0x1c;

    fn push<T, P>(peer: &NlSocket, msg: &Nlmsghdr<T, P>)
    where
        T: NlType,
        P: Size + ToBytes,
    {
        let mut c = Cursor::new(Vec::new());
        msg.to_bytes(&mut c).unwrap();
        peer.send(c.get_ref()).unwrap();
    }

    /// Read one request the manager sent.
    fn pull(peer: &NlSocket) -> Nlmsghdr<u16, Nl80211Message> {
        let mut buf = vec![0; 4096];
        let (len, _) = peer.recv(&mut buf).unwrap();
        buf.truncate(len);
        Nlmsghdr::from_bytes(&mut Cursor::new(buf)).unwrap()
    }

    fn msg<P>(nl_type: u16, flags: NlmF, seq: u32, payload: NlPayload<P>) -> Nlmsghdr<u16, P>
    where
        P: Size,
    {
        NlmsghdrBuilder::default()
            .nl_type(nl_type)
            .nl_flags(flags)
            .nl_seq(seq)
            .nl_payload(payload)
            .build()
            .unwrap()
    }

    fn nl80211(cmd: Nl80211Cmd, attrs: Vec<Nlattr<Nl80211Attr, Buffer>>) -> Nl80211Message {
        GenlmsghdrBuilder::default()
            .cmd(cmd)
            .version(1)
            .attrs(attrs.into_iter().collect())
            .build()
            .unwrap()
    }

    fn attr<P>(t: Nl80211Attr, p: P) -> Nlattr<Nl80211Attr, Buffer>
    where
        P: Size + ToBytes,
    {
        Nlattr::new(false, false, t, p).unwrap()
    }

    fn ack(seq: u32, error: libc::c_int) -> Nlmsghdr<u16, ()> {
        let err = Nlmsgerr {
            error,
            nlmsg: NlmsghdrErr {
                nl_len: 36,
                nl_type: FAMILY,
                nl_flags: NlmF::REQUEST | NlmF::ACK,
                nl_seq: seq,
                nl_pid: 0,
            },
            ext: Buffer::new(),
        };
        msg(
            u16::from(Nlmsg::Error),
            NlmF::empty(),
            seq,
            if error == 0 {
                NlPayload::Ack(err)
            } else {
                NlPayload::Err(err)
            },
        )
    }

    fn done(seq: u32) -> Nlmsghdr<u16, u32> {
        msg(u16::from(Nlmsg::Done), NlmF::MULTI, seq, NlPayload::Payload(0u32))
    }

    fn interface(seq: u32, index: u32, name: &str) -> Nlmsghdr<u16, Nl80211Message> {
        msg(
            FAMILY,
            NlmF::MULTI,
            seq,
            NlPayload::Payload(nl80211(
                Nl80211Cmd::NewInterface,
                vec![
                    attr(Nl80211Attr::Ifindex, index),
                    attr(Nl80211Attr::Ifname, name),
                    attr(Nl80211Attr::Wiphy, 0u32),
                    attr(Nl80211Attr::Iftype, u32::from(Nl80211IfType::Station)),
                ],
            )),
        )
    }

    fn bss(seq: u32, mac: [u8; 6], ssid: &[u8]) -> Nlmsghdr<u16, Nl80211Message> {
        let mut ies = vec![WLAN_EID_SSID, ssid.len() as u8];
        ies.extend_from_slice(ssid);
        let mut bss = Nlattr::new(true, false, Nl80211Attr::Bss, Buffer::new()).unwrap();
        bss.add_nested_attribute(&Nlattr::new(false, false, Nl80211Bss::Bssid, mac).unwrap())
            .unwrap();
        bss.add_nested_attribute(&Nlattr::new(false, false, Nl80211Bss::Frequency, 2412u32).unwrap())
            .unwrap();
        bss.add_nested_attribute(
            &Nlattr::new(false, false, Nl80211Bss::InformationElements, ies).unwrap(),
        )
        .unwrap();
        msg(
            FAMILY,
            NlmF::MULTI,
            seq,
            NlPayload::Payload(nl80211(
                Nl80211Cmd::NewScanResults,
                vec![attr(Nl80211Attr::Ifindex, 3u32), bss],
            )),
        )
    }

    fn notification(cmd: Nl80211Cmd, ifindex: u32) -> Nlmsghdr<u16, Nl80211Message> {
        msg(
            FAMILY,
            NlmF::empty(),
            0,
            NlPayload::Payload(nl80211(
                cmd,
                vec![
                    attr(Nl80211Attr::Wiphy, 0u32),
                    attr(Nl80211Attr::Ifindex, ifindex),
                ],
            )),
        )
    }

    /// A manager that has resolved the family (seq 1) and listed
    /// `wlan0` with index 3 (seq 2).
    fn manager() -> (LinuxWlanManager, NlSocket, NlSocket) {
        let (handle, kernel) = NlSocketHandle::pair();
        let (events, kernel_events) = NlSocketHandle::pair();

        let attrs = vec![
            Nlattr::new(false, false, CtrlAttr::FamilyId, FAMILY).unwrap(),
            Nlattr::new(false, false, CtrlAttr::FamilyName, "nl80211").unwrap(),
        ]
        .into_iter()
        .collect::<GenlBuffer<_, _>>();
        let family: Nlmsghdr<GenlId, Genlmsghdr<CtrlCmd, CtrlAttr>> = NlmsghdrBuilder::default()
            .nl_type(GenlId::Ctrl)
            .nl_seq(1)
            .nl_payload(NlPayload::Payload(
                GenlmsghdrBuilder::default()
                    .cmd(CtrlCmd::Newfamily)
                    .version(2)
                    .attrs(attrs)
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap();
        push(&kernel, &family);
        push(&kernel, &ack(1, 0));

        let manager = LinuxWlanManager::with_routers(NlRouter::new(handle), NlRouter::new(events))
            .unwrap()
            .with_config(
                ScanConfigBuilder::default()
                    .timeout(Duration::from_secs(5))
                    .interval(Duration::ZERO)
                    .build()
                    .unwrap(),
            );
        assert_eq!(*manager.family().id(), FAMILY);

        push(&kernel, &interface(2, 3, "wlan0"));
        push(&kernel, &interface(2, 4, "wlan1"));
        push(&kernel, &done(2));
        let interfaces = manager.interfaces().unwrap();
        assert_eq!(
            interfaces,
            vec![WlanInterface::new("wlan0"), WlanInterface::new("wlan1")]
        );

        (manager, kernel, kernel_events)
    }

    /// Answer one scan: ack the trigger, announce results, serve the dump.
    fn serve_scan(kernel: &NlSocket, events: &NlSocket, results: &[([u8; 6], &[u8])]) {
        let trigger = pull(kernel);
        let seq = *trigger.nl_seq();
        let payload = trigger.get_payload().unwrap();
        assert_eq!(*payload.cmd(), Nl80211Cmd::TriggerScan);
        push(kernel, &ack(seq, 0));

        // Another interface finishing first must not end the wait.
        push(events, &notification(Nl80211Cmd::NewScanResults, 4));
        push(events, &notification(Nl80211Cmd::TriggerScan, 3));
        push(events, &notification(Nl80211Cmd::NewScanResults, 3));

        let dump = pull(kernel);
        let seq = *dump.nl_seq();
        assert!(dump.nl_flags().contains(NlmF::DUMP));
        assert_eq!(*dump.get_payload().unwrap().cmd(), Nl80211Cmd::GetScan);
        for (mac, ssid) in results {
            push(kernel, &bss(seq, *mac, ssid));
        }
        push(kernel, &done(seq));
    }

    #[test]
    fn test_config_defaults() {
        let config = ScanConfigBuilder::default().build().unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(*config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_interfaces_and_default() {
        setup();

        let (manager, kernel, _events) = manager();
        push(&kernel, &interface(3, 3, "wlan0"));
        push(&kernel, &done(3));
        assert_eq!(manager.interface().unwrap(), Some(WlanInterface::new("wlan0")));
        assert_eq!(manager.index(&WlanInterface::new("wlan1")).unwrap(), 4);
        assert!(matches!(
            manager.index(&WlanInterface::new("nosuchif0")),
            Err(WlanError::InvalidInterface(_))
        ));
    }

    #[test]
    fn test_scan() {
        setup();

        let (manager, kernel, events) = manager();
        let server = thread::spawn(move || {
            serve_scan(
                &kernel,
                &events,
                &[([1, 2, 3, 4, 5, 6], b"Home"), ([1, 2, 3, 4, 5, 7], b"")],
            );
            (kernel, events)
        });

        let networks = manager.scan(None, &WlanInterface::new("wlan0")).unwrap();
        let _sockets = server.join().unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].ssid().as_bytes(), b"Home");
        assert_eq!(networks[0].bssid().to_string(), "01:02:03:04:05:06");
        assert_eq!(networks[1].ssid().as_bytes(), b" ");
    }

    #[test]
    fn test_directed_scan() {
        setup();

        let (manager, kernel, events) = manager();
        let server = thread::spawn(move || {
            let trigger = pull(&kernel);
            let status = TriggerScanStatus::try_from(&nl80211(
                Nl80211Cmd::TriggerScan,
                trigger
                    .get_payload()
                    .unwrap()
                    .attrs()
                    .as_ref()
                    .iter()
                    .cloned()
                    .chain(std::iter::once(attr(Nl80211Attr::Wiphy, 0u32)))
                    .collect(),
            ))
            .unwrap();
            assert_eq!(status.scan_ssids(), &vec![b"Home".to_vec()]);
            push(&kernel, &ack(*trigger.nl_seq(), 0));
            push(&events, &notification(Nl80211Cmd::NewScanResults, 3));

            let dump = pull(&kernel);
            push(&kernel, &bss(*dump.nl_seq(), [1, 2, 3, 4, 5, 6], b"Home"));
            push(&kernel, &bss(*dump.nl_seq(), [1, 2, 3, 4, 5, 8], b"Other"));
            push(&kernel, &done(*dump.nl_seq()));
            (kernel, events)
        });

        let ssid = Ssid::new(b"Home").unwrap();
        let networks = manager
            .scan(Some(&ssid), &WlanInterface::new("wlan0"))
            .unwrap();
        let _sockets = server.join().unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid(), &ssid);
    }

    #[test]
    fn test_scan_aborted() {
        setup();

        let (manager, kernel, events) = manager();
        let server = thread::spawn(move || {
            let trigger = pull(&kernel);
            push(&kernel, &ack(*trigger.nl_seq(), -libc::EBUSY));
            push(&events, &notification(Nl80211Cmd::ScanAborted, 3));
            (kernel, events)
        });

        let res = manager.scan(None, &WlanInterface::new("wlan0"));
        let _sockets = server.join().unwrap();
        assert!(matches!(res, Err(WlanError::ScanAborted)));
    }

    #[test]
    fn test_scan_timeout() {
        setup();

        let (manager, kernel, events) = manager();
        let manager = manager.with_config(
            ScanConfigBuilder::default()
                .timeout(Duration::from_millis(50))
                .build()
                .unwrap(),
        );
        // A stale notification from before the trigger is discarded.
        push(&events, &notification(Nl80211Cmd::NewScanResults, 3));
        let server = thread::spawn(move || {
            let trigger = pull(&kernel);
            push(&kernel, &ack(*trigger.nl_seq(), 0));
            (kernel, events)
        });

        let res = manager.scan(None, &WlanInterface::new("wlan0"));
        let _sockets = server.join().unwrap();
        assert!(matches!(res, Err(WlanError::Timeout)));
    }

    #[test]
    fn test_scan_stream() {
        setup();

        let (manager, kernel, events) = manager();
        let server = thread::spawn(move || {
            serve_scan(&kernel, &events, &[([1, 2, 3, 4, 5, 6], b"A"), ([1, 2, 3, 4, 5, 7], b"B")]);
            serve_scan(&kernel, &events, &[([1, 2, 3, 4, 5, 7], b"B"), ([1, 2, 3, 4, 5, 8], b"C")]);
            (kernel, events)
        });

        let mut stream = Arc::new(manager).scan_stream(None, &WlanInterface::new("wlan0"));
        let names = stream
            .by_ref()
            .take(3)
            .map(|n| n.unwrap().ssid().to_string())
            .collect::<Vec<_>>();
        stream.stop();
        let _sockets = server.join().unwrap();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_disassociate() {
        setup();

        let (manager, kernel, _events) = manager();
        let wlan0 = WlanInterface::new("wlan0");
        push(&kernel, &ack(3, 0));
        manager.disassociate(&wlan0).unwrap();
        push(&kernel, &ack(4, -libc::ENOTCONN));
        manager.disassociate(&wlan0).unwrap();
        push(&kernel, &ack(5, -libc::EOPNOTSUPP));
        match manager.disassociate(&wlan0) {
            Err(WlanError::Io(e)) => assert_eq!(e.raw_os_error(), Some(libc::EOPNOTSUPP)),
            res => panic!("Unexpected result {:?}", res),
        }
    }

    #[test]
    fn test_set_power_unknown_interface() {
        setup();

        let (manager, _kernel, _events) = manager();
        assert!(matches!(
            manager.set_power(true, &WlanInterface::new("nosuchif0")),
            Err(WlanError::InvalidInterface(_))
        ));
    }

    #[test]
    #[ignore]
    fn real_test_scan() {
        setup();

        let manager = LinuxWlanManager::new().unwrap();
        let interface = manager.interface().unwrap().unwrap();
        let networks = manager.scan(None, &interface).unwrap();
        assert!(!networks.is_empty());
    }
}
