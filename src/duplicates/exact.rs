//! Exact (byte-identical) duplicate grouping.
//!
//! [`ExactMatcher`] is pure: it takes digests that were already computed and
//! buckets them. Hashing itself happens in the finder's worker pool.

use std::collections::BTreeMap;

use super::groups::{sort_groups, DuplicateGroup, GroupMember};
use crate::scanner::{DigestEntry, Hash};

/// Groups files that share both size and content digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl ExactMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Group digest entries into exact duplicate groups.
    ///
    /// The result does not depend on input order: members are sorted by path
    /// and groups by their first member. A path listed twice counts once.
    /// Empty files never form a group.
    #[must_use]
    pub fn group(&self, entries: impl IntoIterator<Item = DigestEntry>) -> Vec<DuplicateGroup> {
        let mut buckets: BTreeMap<(u64, Hash), Vec<GroupMember>> = BTreeMap::new();
        for entry in entries {
            if entry.size == 0 {
                continue;
            }
            buckets
                .entry((entry.size, entry.digest))
                .or_default()
                .push(GroupMember::new(entry.path, entry.size));
        }

        let mut groups: Vec<DuplicateGroup> = buckets
            .into_iter()
            .map(|((_, digest), members)| DuplicateGroup::exact(digest, members))
            .filter(|group| group.len() >= 2)
            .collect();
        sort_groups(&mut groups);

        log::debug!("Exact matcher: {} group(s)", groups.len());
        groups
    }
}
