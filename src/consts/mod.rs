//! # High level notes
//!
//! The items in this module are created by macros, which give them the traits necessary to be
//! serialized into netlink compatible types. The `impl_var` and `impl_trait` macros are exported
//! so that constants for other generic netlink families can be declared the same way.
//!
//! Most of these constants come from the Linux kernel headers, which can be found in
//! `/usr/include/linux` on many distros: `netlink.h`, `genetlink.h`, `nl80211.h` and
//! `wireless.h`. See also `man 7 netlink`.
//!
//! # Design decisions
//!
//! * Enums are used so that values can be checked against a finite set of inputs instead of
//!   the whole range of the integer type the kernel uses for the field, and so that only the
//!   constants valid for a field can be passed to it.
//! * `UnrecognizedVariant` is included in each enum because completeness cannot be guaranteed
//!   for every constant across kernel versions. The raw integer is kept so that it can still be
//!   inspected or logged.

#[macro_use]
mod macros;

/// Constants related to generic netlink
pub mod genl;
pub use crate::consts::genl::*;
/// Constants related to netlink top level headers
pub mod nl;
pub use crate::consts::nl::*;
/// Constants for the `nl80211` generic netlink family
pub mod nl80211;
/// Constants related to netlink socket operations
pub mod socket;
pub use crate::consts::socket::*;
/// Wireless extension `ioctl` request codes and limits
pub mod wext;

/// Reimplementation of alignto macro in C
pub fn alignto(len: usize) -> usize {
    (len + libc::NLA_ALIGNTO as usize - 1) & !(libc::NLA_ALIGNTO as usize - 1)
}
