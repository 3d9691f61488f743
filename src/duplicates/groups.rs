//! Duplicate groups and size-based bucketing.
//!
//! # Overview
//!
//! [`DuplicateGroup`] is the unit both matchers emit and the planner
//! consumes: two or more paths, ordered by path, tagged with the strategy
//! that found them and a confidence level.
//!
//! [`group_by_size`] is the first exact-matching phase. Files with different
//! sizes cannot be byte-identical, so only size collisions are hashed.
//!
//! # Example
//!
//! ```
//! use tunedupe::scanner::FileEntry;
//! use tunedupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/a.flac"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/b.flac"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/c.mp3"), 2048, SystemTime::now()),
//! ];
//!
//! let (groups, stats) = group_by_size(files, 0.01);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use growable_bloom_filter::GrowableBloom;
use serde::Serialize;

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Order paths by their raw string form.
///
/// Used for every ordering decision that must be reproducible: group member
/// order, group order and the final keeper tie-break.
#[must_use]
pub fn cmp_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}

/// Which matcher produced a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Identical size and content digest
    Exact,
    /// Same recording according to normalized metadata
    Fuzzy,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

/// How much a group can be trusted for automatic deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    /// Needs manual review; never resolved automatically
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// One path in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub path: PathBuf,
    pub size: u64,
}

impl GroupMember {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Two or more files believed to hold the same content or recording.
///
/// Members are always sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub strategy: MatchStrategy,
    pub confidence: Confidence,
    /// Content digest shared by all members (exact groups only)
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Option<Hash>,
    pub members: Vec<GroupMember>,
}

fn serialize_digest<S: serde::Serializer>(
    digest: &Option<Hash>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match digest {
        Some(hash) => serializer.serialize_some(&hash_to_hex(hash)),
        None => serializer.serialize_none(),
    }
}

impl DuplicateGroup {
    /// Create an exact group from files sharing a digest.
    #[must_use]
    pub fn exact(digest: Hash, members: Vec<GroupMember>) -> Self {
        Self::build(MatchStrategy::Exact, Confidence::High, Some(digest), members)
    }

    /// Create a fuzzy group.
    #[must_use]
    pub fn fuzzy(confidence: Confidence, members: Vec<GroupMember>) -> Self {
        Self::build(MatchStrategy::Fuzzy, confidence, None, members)
    }

    fn build(
        strategy: MatchStrategy,
        confidence: Confidence,
        digest: Option<Hash>,
        mut members: Vec<GroupMember>,
    ) -> Self {
        members.sort_by(|a, b| cmp_paths(&a.path, &b.path));
        members.dedup_by(|a, b| a.path == b.path);
        Self {
            strategy,
            confidence,
            digest,
            members,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the group can be acted on without review.
    #[must_use]
    pub fn is_high_confidence(&self) -> bool {
        self.confidence == Confidence::High
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.members.iter().map(|m| m.size).sum()
    }

    /// Paths of the members, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }

    /// Digest as hexadecimal string, if any.
    #[must_use]
    pub fn digest_hex(&self) -> Option<String> {
        self.digest.as_ref().map(hash_to_hex)
    }
}

/// Sort groups by their first member so output order is reproducible.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| match (a.members.first(), b.members.first()) {
        (Some(x), Some(y)) => cmp_paths(&x.path, &y.path),
        _ => a.len().cmp(&b.len()),
    });
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique
    pub eliminated_unique: usize,
    /// Number of empty files encountered (never matched)
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size.
///
/// Sizes seen once are dropped. A Bloom filter tracks seen and repeated sizes
/// so unique files never enter a bucket; the exact map is only built for
/// sizes the filter reports as repeated. Empty files are skipped, since every
/// empty file would otherwise match every other.
///
/// Returns only buckets with two or more files, keyed and ordered by size.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
    bloom_fp_rate: f64,
) -> (BTreeMap<u64, Vec<FileEntry>>, GroupingStats) {
    let files: Vec<FileEntry> = files.into_iter().collect();
    let mut stats = GroupingStats::default();

    let mut seen = GrowableBloom::new(bloom_fp_rate, files.len().max(1));
    let mut repeated = GrowableBloom::new(bloom_fp_rate, files.len().max(1));
    let mut first_of_size: HashMap<u64, FileEntry> = HashMap::new();
    let mut buckets: BTreeMap<u64, Vec<FileEntry>> = BTreeMap::new();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.size == 0 {
            stats.empty_files += 1;
            log::debug!("Empty file encountered: {}", file.path.display());
            continue;
        }

        if repeated.contains(file.size) {
            // Possible false positive: the first file may still be pending
            if let Some(first) = first_of_size.remove(&file.size) {
                buckets.entry(file.size).or_default().push(first);
            }
            buckets.entry(file.size).or_default().push(file);
        } else if seen.contains(file.size) {
            repeated.insert(file.size);
            if let Some(first) = first_of_size.remove(&file.size) {
                buckets.entry(file.size).or_default().push(first);
            }
            buckets.entry(file.size).or_default().push(file);
        } else {
            seen.insert(file.size);
            first_of_size.insert(file.size, file);
        }
    }

    if stats.empty_files > 0 {
        log::warn!(
            "Skipped {} empty file(s) for exact matching",
            stats.empty_files
        );
    }

    // Sizes the filter wrongly reported as seen can leave singleton buckets
    stats.eliminated_unique = first_of_size.len();
    let mut filtered = BTreeMap::new();
    for (size, mut bucket) in buckets {
        if bucket.len() < 2 {
            stats.eliminated_unique += bucket.len();
            continue;
        }
        bucket.sort_by(|a, b| cmp_paths(&a.path, &b.path));
        stats.potential_duplicates += bucket.len();
        stats.duplicate_groups += 1;
        log::debug!("Size group {} bytes: {} candidates", size, bucket.len());
        filtered.insert(size, bucket);
    }
    stats.unique_sizes = stats.eliminated_unique + stats.duplicate_groups;

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered, stats)
}
