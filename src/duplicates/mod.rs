//! Duplicate detection.
//!
//! - [`groups`]: the [`DuplicateGroup`] type and size bucketing
//! - [`exact`]: byte-identical grouping over precomputed digests
//! - [`fuzzy`]: same-recording grouping over normalized metadata
//! - [`union_find`]: the disjoint-set structure behind transitive merging
//! - [`finder`]: the pipeline that walks, hashes, extracts and matches

pub mod exact;
pub mod finder;
pub mod fuzzy;
pub mod groups;
pub mod union_find;

pub use exact::ExactMatcher;
pub use finder::{
    DetectMode, DuplicateFinder, FileIssue, FinderConfig, FinderError, IssueKind, ScanOutcome,
    ScanSummary,
};
pub use fuzzy::{
    FuzzyConfig, FuzzyMatcher, FuzzyOutcome, FuzzyStats, Unmatched, UnmatchedReason,
    DEFAULT_DURATION_TOLERANCE_MS,
};
pub use groups::{
    cmp_paths, group_by_size, sort_groups, Confidence, DuplicateGroup, GroupMember,
    GroupingStats, MatchStrategy,
};
pub use union_find::UnionFind;
