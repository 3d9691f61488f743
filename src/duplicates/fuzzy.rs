//! Metadata-based duplicate detection.
//!
//! # Overview
//!
//! [`FuzzyMatcher`] finds files that encode the same recording in different
//! containers or encodings, where byte comparison cannot help.
//!
//! 1. Records are bucketed by normalized `(artist, title)`, so only records
//!    that could possibly match are compared.
//! 2. Within a bucket every pair is tested: durations must agree within
//!    [`FuzzyConfig::duration_tolerance_ms`].
//! 3. Matching pairs are merged transitively with a [`UnionFind`].
//!
//! A group is [`Confidence::Low`] when any of its links was made without a
//! duration, came from the album/track fallback, or when the durations across
//! the whole group drift further apart than the tolerance. Low groups are
//! listed for review and never deleted automatically.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::groups::{sort_groups, Confidence, DuplicateGroup, GroupMember, MatchStrategy};
use super::union_find::UnionFind;
use crate::metadata::MetadataRecord;

/// Default allowed duration difference, in milliseconds.
pub const DEFAULT_DURATION_TOLERANCE_MS: u64 = 2_000;

/// Configuration for [`FuzzyMatcher`].
///
/// Also the `[fuzzy]` table of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Maximum duration difference for a match (inclusive)
    pub duration_tolerance_ms: u64,
    /// Treat every exact group as already matched, so a fuzzy match to one
    /// member links the whole exact group
    pub merge_exact_groups: bool,
    /// Allow matches when a duration is missing (always low confidence)
    pub match_missing_duration: bool,
    /// Bucket title-less records by artist, album and track number
    pub album_track_fallback: bool,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            duration_tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
            merge_exact_groups: false,
            match_missing_duration: true,
            album_track_fallback: false,
        }
    }
}

impl FuzzyConfig {
    #[must_use]
    pub fn with_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.duration_tolerance_ms = tolerance_ms;
        self
    }

    #[must_use]
    pub fn with_merge_exact_groups(mut self, merge: bool) -> Self {
        self.merge_exact_groups = merge;
        self
    }

    #[must_use]
    pub fn with_match_missing_duration(mut self, allow: bool) -> Self {
        self.match_missing_duration = allow;
        self
    }

    #[must_use]
    pub fn with_album_track_fallback(mut self, enabled: bool) -> Self {
        self.album_track_fallback = enabled;
        self
    }
}

/// Candidate key used to bound pairwise comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum BucketKey {
    Identity {
        artist: String,
        title: String,
    },
    AlbumTrack {
        artist: String,
        album: String,
        track: u32,
    },
}

/// Statistics from a fuzzy detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyStats {
    /// Distinct records considered
    pub records: usize,
    /// Candidate buckets with 2+ records
    pub buckets: usize,
    /// Pairwise comparisons performed
    pub comparisons: usize,
    /// Pairs that matched
    pub matched_pairs: usize,
    pub groups: usize,
    pub low_confidence_groups: usize,
    pub unmatchable: usize,
}

/// Why a record ended up in no group although it could not be compared fully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// No artist or title, and no usable album/track fallback
    MissingIdentity,
    /// Had candidates but no duration, with missing-duration matching disabled
    MissingDuration,
    /// Title-less record whose album/track candidates did not match
    NoAlbumTrackMatch,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MissingIdentity => "missing artist or title tag",
            Self::MissingDuration => "duration unknown, missing-duration matching disabled",
            Self::NoAlbumTrackMatch => "missing title tag, no album/track match",
        })
    }
}

/// A record left out of every group for lack of a matching signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched {
    pub path: PathBuf,
    pub reason: UnmatchedReason,
}

/// Result of [`FuzzyMatcher::detect`].
#[derive(Debug, Clone, Default)]
pub struct FuzzyOutcome {
    pub groups: Vec<DuplicateGroup>,
    /// Records that could not take part, in path order
    pub unmatchable: Vec<Unmatched>,
    pub stats: FuzzyStats,
}

impl FuzzyOutcome {
    #[must_use]
    pub fn unmatchable_paths(&self) -> Vec<PathBuf> {
        self.unmatchable.iter().map(|u| u.path.clone()).collect()
    }
}

/// Groups records that appear to be the same recording.
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(config: FuzzyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    fn bucket_key(&self, record: &MetadataRecord) -> Option<BucketKey> {
        match (&record.artist, &record.title) {
            (Some(artist), Some(title)) => Some(BucketKey::Identity {
                artist: artist.clone(),
                title: title.clone(),
            }),
            (Some(artist), None) if self.config.album_track_fallback => {
                match (&record.album, record.track) {
                    (Some(album), Some(track)) => Some(BucketKey::AlbumTrack {
                        artist: artist.clone(),
                        album: album.clone(),
                        track,
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Compare two durations against the tolerance.
    ///
    /// `Some(true)` within tolerance, `Some(false)` outside, `None` when
    /// either side is unknown.
    fn durations_agree(&self, a: Option<u64>, b: Option<u64>) -> Option<bool> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.abs_diff(y) <= self.config.duration_tolerance_ms),
            _ => None,
        }
    }

    /// Pairwise predicate.
    ///
    /// Artist and title must be identical after normalization. With both
    /// durations known they must agree within the tolerance. With a duration
    /// missing, the pair matches only if missing-duration matching is enabled
    /// and the track numbers do not contradict each other; such a match is
    /// low confidence.
    #[must_use]
    pub fn pair_match(&self, a: &MetadataRecord, b: &MetadataRecord) -> Option<Confidence> {
        if !a.has_identity() || a.artist != b.artist || a.title != b.title {
            return None;
        }
        match self.durations_agree(a.duration_ms, b.duration_ms) {
            Some(true) => Some(Confidence::High),
            Some(false) => None,
            None => {
                let tracks_conflict = matches!((a.track, b.track), (Some(x), Some(y)) if x != y);
                (self.config.match_missing_duration && !tracks_conflict).then_some(Confidence::Low)
            }
        }
    }

    fn album_track_match(&self, a: &MetadataRecord, b: &MetadataRecord) -> Option<Confidence> {
        match self.durations_agree(a.duration_ms, b.duration_ms) {
            Some(false) => None,
            None if !self.config.match_missing_duration => None,
            _ => Some(Confidence::Low),
        }
    }

    fn duration_span(&self, set: &[usize], arena: &[&MetadataRecord]) -> u64 {
        let durations = set.iter().filter_map(|&i| arena[i].duration_ms);
        let (min, max) = durations.fold((u64::MAX, 0), |(lo, hi), d| (lo.min(d), hi.max(d)));
        max.saturating_sub(min)
    }

    /// Detect fuzzy duplicate groups.
    ///
    /// `exact_groups` is only consulted when
    /// [`FuzzyConfig::merge_exact_groups`] is set. Records are deduplicated by
    /// path (the first wins) and processed in path order, so the outcome does
    /// not depend on input order.
    #[must_use]
    pub fn detect(
        &self,
        records: &[MetadataRecord],
        exact_groups: &[DuplicateGroup],
    ) -> FuzzyOutcome {
        let mut by_path: BTreeMap<&Path, &MetadataRecord> = BTreeMap::new();
        for record in records {
            if by_path.contains_key(record.path.as_path()) {
                log::warn!("Duplicate metadata record for {}, ignoring", record.path.display());
                continue;
            }
            by_path.insert(record.path.as_path(), record);
        }
        let arena: Vec<&MetadataRecord> = by_path.into_values().collect();

        let mut stats = FuzzyStats {
            records: arena.len(),
            ..FuzzyStats::default()
        };

        let mut buckets: BTreeMap<BucketKey, Vec<usize>> = BTreeMap::new();
        let mut keyless = Vec::new();
        for (idx, record) in arena.iter().enumerate() {
            match self.bucket_key(record) {
                Some(key) => buckets.entry(key).or_default().push(idx),
                None => keyless.push(idx),
            }
        }

        let mut uf = UnionFind::new(arena.len());
        let mut low = vec![false; arena.len()];

        for (key, members) in &buckets {
            if members.len() < 2 {
                continue;
            }
            stats.buckets += 1;
            for (pos, &i) in members.iter().enumerate() {
                for &j in &members[pos + 1..] {
                    stats.comparisons += 1;
                    let confidence = match key {
                        BucketKey::Identity { .. } => self.pair_match(arena[i], arena[j]),
                        BucketKey::AlbumTrack { .. } => self.album_track_match(arena[i], arena[j]),
                    };
                    if let Some(confidence) = confidence {
                        stats.matched_pairs += 1;
                        uf.union(i, j);
                        if confidence == Confidence::Low {
                            low[i] = true;
                            low[j] = true;
                        }
                        log::trace!(
                            "Fuzzy match ({}): {} ~ {}",
                            confidence,
                            arena[i].path.display(),
                            arena[j].path.display()
                        );
                    }
                }
            }
        }

        if self.config.merge_exact_groups {
            let index: HashMap<&Path, usize> = arena
                .iter()
                .enumerate()
                .map(|(i, r)| (r.path.as_path(), i))
                .collect();
            for group in exact_groups
                .iter()
                .filter(|g| g.strategy == MatchStrategy::Exact)
            {
                let members: Vec<usize> = group
                    .members
                    .iter()
                    .filter_map(|m| index.get(m.path.as_path()).copied())
                    .collect();
                for pair in members.windows(2) {
                    uf.union(pair[0], pair[1]);
                }
            }
        }

        let mut in_group = vec![false; arena.len()];
        let mut groups = Vec::new();
        for set in uf.sets(2) {
            let drifted = self.duration_span(&set, &arena) > self.config.duration_tolerance_ms;
            let confidence = if drifted || set.iter().any(|&i| low[i]) {
                Confidence::Low
            } else {
                Confidence::High
            };
            let members = set
                .iter()
                .map(|&i| {
                    in_group[i] = true;
                    GroupMember::new(arena[i].path.clone(), arena[i].size)
                })
                .collect();
            groups.push(DuplicateGroup::fuzzy(confidence, members));
        }
        sort_groups(&mut groups);

        let mut unmatched: BTreeMap<usize, UnmatchedReason> = keyless
            .into_iter()
            .map(|i| (i, UnmatchedReason::MissingIdentity))
            .collect();
        for (key, members) in &buckets {
            for &i in members.iter().filter(|&&i| !in_group[i]) {
                match key {
                    BucketKey::AlbumTrack { .. } => {
                        unmatched.insert(i, UnmatchedReason::NoAlbumTrackMatch);
                    }
                    BucketKey::Identity { .. }
                        if members.len() > 1
                            && arena[i].duration_ms.is_none()
                            && !self.config.match_missing_duration =>
                    {
                        unmatched.insert(i, UnmatchedReason::MissingDuration);
                    }
                    BucketKey::Identity { .. } => {}
                }
            }
        }
        let unmatchable: Vec<Unmatched> = unmatched
            .into_iter()
            .filter(|&(i, _)| !in_group[i])
            .map(|(i, reason)| Unmatched {
                path: arena[i].path.clone(),
                reason,
            })
            .collect();

        stats.groups = groups.len();
        stats.low_confidence_groups = groups.iter().filter(|g| !g.is_high_confidence()).count();
        stats.unmatchable = unmatchable.len();

        log::info!(
            "Fuzzy matching complete: {} records → {} group(s) ({} low confidence), {} unmatchable",
            stats.records,
            stats.groups,
            stats.low_confidence_groups,
            stats.unmatchable
        );

        FuzzyOutcome {
            groups,
            unmatchable,
            stats,
        }
    }
}
