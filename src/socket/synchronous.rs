use std::{
    fmt::Debug,
    io::{self, Cursor},
    os::unix::io::{AsRawFd, IntoRawFd, RawFd},
    time::Duration,
};

use log::trace;

use crate::{
    consts::{nl::*, socket::*},
    err::SocketError,
    nl::Nlmsghdr,
    socket::shared::NlSocket,
    types::NlBuffer,
    utils::Groups,
    FromBytesWithInput, Size, ToBytes,
};

/// Higher level handle for socket operations.
pub struct NlSocketHandle {
    pub(super) socket: NlSocket,
    pid: u32,
}

impl NlSocketHandle {
    /// Equivalent of `socket` and `bind` calls.
    pub fn connect(proto: NlFamily, pid: Option<u32>, groups: Groups) -> Result<Self, SocketError> {
        let socket = NlSocket::connect(proto, pid, groups)?;
        socket.block()?;
        let pid = socket.pid()?;
        Ok(NlSocketHandle { socket, pid })
    }

    /// Join multicast groups for a socket.
    pub fn add_mcast_membership(&self, groups: Groups) -> Result<(), SocketError> {
        self.socket
            .add_mcast_membership(groups)
            .map_err(SocketError::from)
    }

    /// Leave multicast groups for a socket.
    pub fn drop_mcast_membership(&self, groups: Groups) -> Result<(), SocketError> {
        self.socket
            .drop_mcast_membership(groups)
            .map_err(SocketError::from)
    }

    /// Get the PID for the current socket.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Bound how long [`NlSocketHandle::recv_all`] blocks.
    pub fn set_recv_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        self.socket
            .set_recv_timeout(timeout)
            .map_err(SocketError::from)
    }

    /// Convenience function to send an [`Nlmsghdr`] struct
    pub fn send<T, P>(&self, msg: &Nlmsghdr<T, P>) -> Result<(), SocketError>
    where
        T: NlType + Debug,
        P: Size + ToBytes + Debug,
    {
        trace!("Message sent:\n{:?}", msg);

        let mut buffer = Cursor::new(Vec::with_capacity(msg.padded_size()));
        msg.to_bytes(&mut buffer)?;
        trace!("Buffer sent: {:?}", buffer.get_ref());
        self.socket.send(buffer.get_ref())?;

        Ok(())
    }

    /// Parse all [`Nlmsghdr`] structs sent in
    /// one network packet and return them all in a list along with
    /// the multicast groups the packet was addressed to.
    ///
    /// Failure to parse any packet will cause the entire operation
    /// to fail. An empty datagram is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    pub fn recv_all<T, P>(&self) -> Result<(NlBuffer<T, P>, Groups), SocketError>
    where
        T: NlType + Debug,
        P: Size + FromBytesWithInput<Input = usize> + Debug,
    {
        let len = self.socket.peek_len()?;
        let mut buffer = vec![0; len];
        let (mem_read, groups) = self.socket.recv(&mut buffer)?;
        if mem_read == 0 {
            return Err(SocketError::from(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Peer closed the socket",
            )));
        }
        buffer.truncate(mem_read);
        trace!("Buffer received: {:?}", buffer);

        let vec = NlBuffer::from_bytes_with_input(&mut Cursor::new(buffer), mem_read)?;

        trace!("Messages received: {:?}", vec);

        Ok((vec, groups))
    }

    /// A handle connected to a plain datagram socket for tests that
    /// play the kernel's side of the conversation.
    #[cfg(test)]
    pub(crate) fn pair() -> (Self, NlSocket) {
        use std::os::unix::io::FromRawFd;

        let mut fds = [0; 2];
        let ret =
            unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_DGRAM, 0, fds.as_mut_ptr()) };
        assert_eq!(ret, 0);
        let handle = NlSocketHandle {
            socket: unsafe { NlSocket::from_raw_fd(fds[0]) },
            pid: 0,
        };
        (handle, unsafe { NlSocket::from_raw_fd(fds[1]) })
    }
}

impl AsRawFd for NlSocketHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl IntoRawFd for NlSocketHandle {
    fn into_raw_fd(self) -> RawFd {
        self.socket.into_raw_fd()
    }
}
