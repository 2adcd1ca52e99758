//! This is the module that contains the error types used in `wlan`
//!
//! There are several layers of errors:
//! * [`Nlmsgerr`] - an application error returned from netlink as
//!   a packet.
//! * [`SerError`] and [`DeError`] - errors while serializing or
//!   deserializing netlink data structures.
//! * [`SocketError`] - errors from sending or receiving on a netlink
//!   socket.
//! * [`RouterError`] - errors from a request/response exchange.
//! * [`ParseError`] - malformed SSIDs and BSSIDs.
//! * [`WlanError`] - the top level error returned by
//!   [`WlanManager`][crate::wlan::WlanManager] implementations.
//!
//! # Design decisions
//! All errors implement `std::error::Error` in an attempt to allow
//! them to be used in conjunction with `Result` for easier error
//! management even at the protocol error level.

use std::{
    error::Error,
    fmt::{self, Display},
    io::{self, Cursor},
    str, string,
};

use crate::{
    consts::nl::NlmF,
    genl::{GenlmsghdrBuilderError, NlattrBuilderError},
    nl::NlmsghdrBuilderError,
    types::Buffer,
    wlan::{WlanInterface, WlanNetwork},
    FromBytes, FromBytesWithInput, Size, ToBytes, NLMSG_HDRLEN,
};

macro_rules! err_from {
    ($err:ident, $($from_err:path { $from_impl:expr }),+ $(,)?) => {
        $(
            impl From<$from_err> for $err {
                fn from(e: $from_err) -> Self {
                    $from_impl(e)
                }
            }
        )*
    };
}

/// A netlink header echoed back as part of an error packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NlmsghdrErr {
    /// Length of the netlink message
    pub nl_len: u32,
    /// Type of the netlink message
    pub nl_type: u16,
    /// Flags indicating properties of the request or response
    pub nl_flags: NlmF,
    /// Sequence number for netlink protocol
    pub nl_seq: u32,
    /// ID of the netlink destination for requests and source for responses
    pub nl_pid: u32,
}

impl Size for NlmsghdrErr {
    fn unpadded_size(&self) -> usize {
        NLMSG_HDRLEN
    }
}

impl ToBytes for NlmsghdrErr {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.nl_len.to_bytes(buffer)?;
        self.nl_type.to_bytes(buffer)?;
        self.nl_flags.to_bytes(buffer)?;
        self.nl_seq.to_bytes(buffer)?;
        self.nl_pid.to_bytes(buffer)?;
        Ok(())
    }
}

impl FromBytes for NlmsghdrErr {
    fn from_bytes(buffer: &mut Cursor<impl AsRef<[u8]>>) -> Result<Self, DeError> {
        Ok(NlmsghdrErr {
            nl_len: u32::from_bytes(buffer)?,
            nl_type: u16::from_bytes(buffer)?,
            nl_flags: NlmF::from_bytes(buffer)?,
            nl_seq: u32::from_bytes(buffer)?,
            nl_pid: u32::from_bytes(buffer)?,
        })
    }
}

/// Struct representing netlink packets containing errors or
/// acknowledgements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nlmsgerr {
    /// Error code, the negated errno or 0 for an ack
    pub error: libc::c_int,
    /// Packet header for request that failed
    pub nlmsg: NlmsghdrErr,
    /// Echoed request payload or extended ack attributes
    pub ext: Buffer,
}

impl Nlmsgerr {
    /// Convert the kernel error code into an [`io::Error`].
    pub fn to_io_error(&self) -> io::Error {
        io::Error::from_raw_os_error(-self.error)
    }

    /// Positive errno carried by this packet.
    pub fn errno(&self) -> libc::c_int {
        -self.error
    }
}

impl Display for Nlmsgerr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_io_error())
    }
}

impl Error for Nlmsgerr {}

impl Size for Nlmsgerr {
    fn unpadded_size(&self) -> usize {
        self.error.unpadded_size() + self.nlmsg.unpadded_size() + self.ext.unpadded_size()
    }
}

impl ToBytes for Nlmsgerr {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.error.to_bytes(buffer)?;
        self.nlmsg.to_bytes(buffer)?;
        self.ext.to_bytes(buffer)?;
        Ok(())
    }
}

impl FromBytesWithInput for Nlmsgerr {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<impl AsRef<[u8]>>,
        input: usize,
    ) -> Result<Self, DeError> {
        let error = libc::c_int::from_bytes(buffer)?;
        let nlmsg = NlmsghdrErr::from_bytes(buffer)?;
        let ext_len = input
            .checked_sub(error.unpadded_size() + nlmsg.unpadded_size())
            .ok_or(DeError::InvalidInput(input))?;
        let ext = Buffer::from_bytes_with_input(buffer, ext_len)?;
        Ok(Nlmsgerr { error, nlmsg, ext })
    }
}

/// Errors from `derive_builder` generated builders.
#[derive(Debug)]
pub enum BuilderError {
    /// Error from [`NlmsghdrBuilder`][crate::nl::NlmsghdrBuilder].
    Nlmsghdr(NlmsghdrBuilderError),
    /// Error from [`GenlmsghdrBuilder`][crate::genl::GenlmsghdrBuilder].
    Genlmsghdr(GenlmsghdrBuilderError),
    /// Error from [`NlattrBuilder`][crate::genl::NlattrBuilder].
    Nlattr(NlattrBuilderError),
}

err_from!(
    BuilderError,
    NlmsghdrBuilderError { BuilderError::Nlmsghdr },
    GenlmsghdrBuilderError { BuilderError::Genlmsghdr },
    NlattrBuilderError { BuilderError::Nlattr },
);

impl Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuilderError::Nlmsghdr(e) => write!(f, "{}", e),
            BuilderError::Genlmsghdr(e) => write!(f, "{}", e),
            BuilderError::Nlattr(e) => write!(f, "{}", e),
        }
    }
}

impl Error for BuilderError {}

/// Serialization error
#[derive(Debug)]
pub enum SerError {
    /// Abitrary error message.
    Msg(String),
    /// A wrapped error from lower in the call stack.
    Wrapped(WrappedError),
    /// A builder failed to produce a value.
    Builder(BuilderError),
    /// The message is larger than a netlink length field can express.
    TooLarge(usize),
}

impl SerError {
    /// Create a new error with the given message as description.
    pub fn new<D>(msg: D) -> Self
    where
        D: Display,
    {
        SerError::Msg(msg.to_string())
    }
}

err_from!(
    SerError,
    WrappedError { SerError::Wrapped },
    BuilderError { SerError::Builder },
    io::Error { |e| SerError::Wrapped(WrappedError::from(e)) },
    GenlmsghdrBuilderError { |e| SerError::Builder(BuilderError::from(e)) },
    NlattrBuilderError { |e| SerError::Builder(BuilderError::from(e)) },
);

impl Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SerError::Msg(ref s) => write!(f, "{}", s),
            SerError::Wrapped(ref e) => write!(f, "Error while serializing: {}", e),
            SerError::Builder(ref e) => write!(f, "Builder error: {}", e),
            SerError::TooLarge(len) => write!(
                f,
                "{} bytes does not fit in a netlink length field",
                len
            ),
        }
    }
}

impl Error for SerError {}

/// Deserialization error
#[derive(Debug)]
pub enum DeError {
    /// Abitrary error message.
    Msg(String),
    /// A wrapped error from lower in the call stack.
    Wrapped(WrappedError),
    /// The end of the buffer was reached before deserialization
    /// finished.
    UnexpectedEOB,
    /// The length hint points past the end of the buffer.
    InvalidInput(usize),
    /// A null byte was found before the end of the serialized
    /// [`String`].
    NullError,
    /// A null byte was not found at the end of the serialized
    /// [`String`].
    NoNullError,
    /// A required attribute was not present.
    MissingAttribute(&'static str),
}

impl DeError {
    /// Create new error from a type implementing
    /// [`Display`][std::fmt::Display]
    pub fn new<D>(s: D) -> Self
    where
        D: Display,
    {
        DeError::Msg(s.to_string())
    }
}

impl From<io::Error> for DeError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DeError::UnexpectedEOB
        } else {
            DeError::Wrapped(WrappedError::from(e))
        }
    }
}

err_from!(
    DeError,
    WrappedError { DeError::Wrapped },
    str::Utf8Error { |e| DeError::Wrapped(WrappedError::from(e)) },
    string::FromUtf8Error { |e| DeError::Wrapped(WrappedError::from(e)) },
);

impl Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeError::Msg(ref s) => write!(f, "{}", s),
            DeError::UnexpectedEOB => write!(
                f,
                "The buffer was not large enough to complete the deserialize \
                 operation",
            ),
            DeError::InvalidInput(input) => {
                write!(f, "Length {} points past the end of the buffer", input)
            }
            DeError::NullError => write!(f, "A null was found before the end of the buffer"),
            DeError::NoNullError => write!(f, "No terminating null byte was found in the buffer"),
            DeError::MissingAttribute(name) => write!(f, "Attribute {} was not found", name),
            DeError::Wrapped(ref e) => write!(f, "Error while deserializing: {}", e),
        }
    }
}

impl Error for DeError {}

/// An error to wrap all system level errors in a single, higher level
/// error.
#[derive(Debug)]
pub enum WrappedError {
    /// Wrapper for [`std::io::Error`]
    IOError(io::Error),
    /// Wrapper for [`std::str::Utf8Error`]
    StrUtf8Error(str::Utf8Error),
    /// Wrapper for [`std::string::FromUtf8Error`]
    StringUtf8Error(string::FromUtf8Error),
}

impl Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WrappedError::IOError(ref e) => write!(f, "Wrapped IO error: {}", e),
            WrappedError::StrUtf8Error(ref e) => write!(f, "Wrapped &str error: {}", e),
            WrappedError::StringUtf8Error(ref e) => write!(f, "Wrapped String error: {}", e),
        }
    }
}

impl Error for WrappedError {}

macro_rules! wrapped_err_from {
    ($($var:ident => $from_err_name:path),*) => {
        $(
            impl From<$from_err_name> for WrappedError {
                fn from(v: $from_err_name) -> Self {
                    WrappedError::$var(v)
                }
            }
        )*
    }
}

wrapped_err_from!(
    IOError => io::Error,
    StrUtf8Error => str::Utf8Error,
    StringUtf8Error => string::FromUtf8Error
);

/// Errors from a netlink socket.
#[derive(Debug)]
pub enum SocketError {
    /// Serialization of an outgoing message failed.
    Ser(SerError),
    /// Deserialization of an incoming datagram failed.
    De(DeError),
    /// The underlying system call failed.
    Io(io::Error),
}

err_from!(
    SocketError,
    SerError { SocketError::Ser },
    DeError { SocketError::De },
    io::Error { SocketError::Io },
);

impl SocketError {
    /// Returns `true` if the socket timed out or would have blocked.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SocketError::Io(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
        )
    }
}

impl Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SocketError::Ser(e) => write!(f, "Serialization error: {}", e),
            SocketError::De(e) => write!(f, "Deserialization error: {}", e),
            SocketError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl Error for SocketError {}

/// Errors from a request/response exchange with the kernel.
#[derive(Debug)]
pub enum RouterError {
    /// Arbitrary message.
    Msg(String),
    /// An error packet sent back by netlink.
    Nlmsgerr(Nlmsgerr),
    /// A socket level failure.
    Socket(SocketError),
    /// A builder failed to produce a request.
    Builder(BuilderError),
    /// A reply payload could not be parsed.
    De(DeError),
    /// A response had a sequence number or PID that does not belong
    /// to the request.
    BadSeqOrPid {
        /// Sequence number received.
        seq: u32,
        /// PID received.
        pid: u32,
    },
    /// No ack was received when one was requested.
    NoAck,
    /// No reply arrived before the receive timeout expired.
    Timeout,
}

impl RouterError {
    /// Create new error from a data type implementing
    /// [`Display`][std::fmt::Display]
    pub fn new<D>(s: D) -> Self
    where
        D: Display,
    {
        RouterError::Msg(s.to_string())
    }
}

impl From<SocketError> for RouterError {
    fn from(e: SocketError) -> Self {
        if e.is_timeout() {
            RouterError::Timeout
        } else {
            RouterError::Socket(e)
        }
    }
}

err_from!(
    RouterError,
    Nlmsgerr { RouterError::Nlmsgerr },
    BuilderError { RouterError::Builder },
    DeError { RouterError::De },
    SerError { |e| RouterError::Socket(SocketError::Ser(e)) },
    NlmsghdrBuilderError { |e| RouterError::Builder(BuilderError::from(e)) },
    GenlmsghdrBuilderError { |e| RouterError::Builder(BuilderError::from(e)) },
    NlattrBuilderError { |e| RouterError::Builder(BuilderError::from(e)) },
);

impl Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouterError::Msg(msg) => write!(f, "{}", msg),
            RouterError::Nlmsgerr(err) => {
                write!(f, "Error response received from netlink: {}", err)
            }
            RouterError::Socket(err) => write!(f, "Socket error: {}", err),
            RouterError::Builder(err) => write!(f, "Builder error: {}", err),
            RouterError::De(err) => write!(f, "Deserialization error: {}", err),
            RouterError::BadSeqOrPid { seq, pid } => write!(
                f,
                "Sequence number {} or PID {} does not match the request",
                seq, pid
            ),
            RouterError::NoAck => write!(f, "No ack received"),
            RouterError::Timeout => write!(f, "Timed out waiting for a reply"),
        }
    }
}

impl Error for RouterError {}

/// Errors parsing Wi-Fi identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// An SSID must be 1 to 32 octets long.
    SsidLength(usize),
    /// A BSSID must be six colon separated pairs of hex digits.
    Bssid(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::SsidLength(len) => {
                write!(f, "SSID of {} octets is not between 1 and 32 octets", len)
            }
            ParseError::Bssid(s) => write!(f, "Invalid BSSID string {:?}", s),
        }
    }
}

impl Error for ParseError {}

/// Top level error for Wi-Fi operations.
#[derive(Debug)]
pub enum WlanError {
    /// Invalid interface specified.
    InvalidInterface(WlanInterface),
    /// Invalid network specified.
    InvalidNetwork(WlanNetwork),
    /// The kernel or driver does not support the operation.
    NotSupported(&'static str),
    /// The driver aborted the scan.
    ScanAborted,
    /// The operation did not finish in time.
    Timeout,
    /// Netlink exchange failed.
    Router(RouterError),
    /// System call failed.
    Io(io::Error),
}

impl From<RouterError> for WlanError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Timeout => WlanError::Timeout,
            RouterError::Nlmsgerr(err) => WlanError::Io(err.to_io_error()),
            e => WlanError::Router(e),
        }
    }
}

impl From<SocketError> for WlanError {
    fn from(e: SocketError) -> Self {
        WlanError::from(RouterError::from(e))
    }
}

err_from!(
    WlanError,
    io::Error { WlanError::Io },
    DeError { |e| WlanError::Router(RouterError::De(e)) },
);

impl Display for WlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WlanError::InvalidInterface(i) => write!(f, "Invalid interface {}", i),
            WlanError::InvalidNetwork(n) => write!(f, "Invalid network {} ({})", n.ssid(), n.bssid()),
            WlanError::NotSupported(what) => write!(f, "Operation not supported: {}", what),
            WlanError::ScanAborted => write!(f, "Scan was aborted by the driver"),
            WlanError::Timeout => write!(f, "Operation timed out"),
            WlanError::Router(e) => write!(f, "{}", e),
            WlanError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl Error for WlanError {}

#[cfg(test)]
mod test {
    use super::*;

    use byteorder::{NativeEndian, WriteBytesExt};

    #[test]
    fn test_nlmsgerr_deserialize() {
        let mut c = Cursor::new(Vec::new());
        c.write_i32::<NativeEndian>(-libc::EBUSY).unwrap();
        c.write_u32::<NativeEndian>(20).unwrap();
        c.write_u16::<NativeEndian>(0x1c).unwrap();
        c.write_u16::<NativeEndian>(NlmF::REQUEST.bits()).unwrap();
        c.write_u32::<NativeEndian>(7).unwrap();
        c.write_u32::<NativeEndian>(1234).unwrap();
        c.write_u32::<NativeEndian>(3).unwrap();
        let bytes = c.into_inner();

        let err = Nlmsgerr::from_bytes_with_input(&mut Cursor::new(&bytes), bytes.len()).unwrap();
        assert_eq!(err.errno(), libc::EBUSY);
        assert_eq!(err.nlmsg.nl_seq, 7);
        assert_eq!(err.nlmsg.nl_pid, 1234);
        assert_eq!(err.nlmsg.nl_flags, NlmF::REQUEST);
        assert_eq!(err.ext.as_ref(), &3u32.to_ne_bytes());
        assert_eq!(err.to_io_error().raw_os_error(), Some(libc::EBUSY));
    }

    #[test]
    fn test_timeout_mapping() {
        let err = RouterError::from(SocketError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(matches!(err, RouterError::Timeout));
        assert!(matches!(WlanError::from(err), WlanError::Timeout));
    }
}
