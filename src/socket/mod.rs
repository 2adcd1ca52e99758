//! This module provides the netlink sockets used by the rest of the
//! crate to send and receive messages.
//!
//! ## Important methods
//! * [`NlSocket::send`][crate::socket::NlSocket::send] and
//!   [`NlSocket::recv`][crate::socket::NlSocket::recv] methods are meant to
//!   be the most low level calls. They essentially do what the C
//!   system calls `send` and `recv` do with very little abstraction.
//! * [`NlSocketHandle::send`][crate::socket::NlSocketHandle::send] and
//!   [`NlSocketHandle::recv_all`][crate::socket::NlSocketHandle::recv_all]
//!   serialize and parse [`Nlmsghdr`][crate::nl::Nlmsghdr]s.
//!
//! ## Design decisions
//!
//! Receive buffers are sized per datagram by peeking at the pending
//! message with `MSG_TRUNC`, so a large dump reply is never cut short
//! and a small ack does not allocate [`MAX_NL_LENGTH`][crate::MAX_NL_LENGTH]
//! bytes.

mod shared;
/// Synchronous socket operations
pub mod synchronous;

pub use crate::socket::{shared::NlSocket, synchronous::NlSocketHandle};
