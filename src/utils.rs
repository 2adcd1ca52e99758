//! Helpers for netlink multicast group numbers.
//!
//! The kernel accepts groups two ways: a `u32` bitmask passed to
//! `bind()`, which can only express groups 1 to 32, and group numbers
//! passed one at a time to `NETLINK_ADD_MEMBERSHIP`, which works for
//! any group. Generic netlink families such as `nl80211` are assigned
//! group IDs at runtime that regularly exceed 32, so [`Groups`] keeps
//! the group numbers and converts to a bitmask only when asked.

use std::mem::size_of;

use log::warn;

/// Set of netlink multicast groups identified by group number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Groups(Vec<u32>);

impl Groups {
    /// No groups.
    pub fn empty() -> Self {
        Groups(Vec::new())
    }

    /// Groups from a list of group numbers. Zero is not a valid group
    /// and is ignored.
    pub fn new_groups(groups: &[u32]) -> Self {
        let mut g = Groups::empty();
        for group in groups {
            g.add_group(*group);
        }
        g
    }

    /// Groups from a `bind()` style bitmask.
    pub fn new_bitmask(bitmask: u32) -> Self {
        Groups(
            (0..u32::BITS)
                .filter(|bit| bitmask & (1 << bit) != 0)
                .map(|bit| bit + 1)
                .collect(),
        )
    }

    /// Add a group by number.
    pub fn add_group(&mut self, group: u32) {
        if group != 0 && !self.0.contains(&group) {
            self.0.push(group);
        }
    }

    /// Remove a group by number.
    pub fn remove_group(&mut self, group: u32) {
        self.0.retain(|g| *g != group);
    }

    /// Returns `true` if `group` is in the set.
    pub fn contains(&self, group: u32) -> bool {
        self.0.contains(&group)
    }

    /// Bitmask for `bind()`. Groups above 32 cannot be represented
    /// and are left out.
    pub fn as_bitmask(&self) -> u32 {
        self.0.iter().fold(0, |mask, group| {
            if *group as usize > size_of::<u32>() * 8 {
                warn!(
                    "Group {} cannot be represented in a bitmask and requires membership",
                    group
                );
                mask
            } else {
                mask | (1 << (group - 1))
            }
        })
    }

    /// Group numbers in insertion order.
    pub fn as_groups(&self) -> &[u32] {
        self.0.as_slice()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_groups_bitmask() {
        assert_eq!(Groups::new_groups(&[1, 3]).as_bitmask(), 0b101);
        assert_eq!(Groups::new_bitmask(0b101).as_groups(), &[1, 3]);
        assert_eq!(Groups::new_groups(&[32]).as_bitmask(), 1 << 31);
    }

    #[test]
    fn test_groups_large_ids() {
        let mut groups = Groups::new_groups(&[0, 5, 40, 5]);
        assert_eq!(groups.as_groups(), &[5, 40]);
        assert_eq!(groups.as_bitmask(), 1 << 4);
        assert!(groups.contains(40));
        groups.remove_group(40);
        assert!(!groups.contains(40));
        assert!(Groups::empty().is_empty());
    }
}
