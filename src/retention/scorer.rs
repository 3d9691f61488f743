//! Keeper ranking.
//!
//! [`QualityScorer`] imposes a total order on the members of a group.
//! Criteria apply lexicographically, each breaking ties of the previous:
//!
//! 1. format tier (lossless > lossy > unknown)
//! 2. bit rate, higher wins, unknown below any known value
//! 3. sample rate, same rule
//! 4. file size, larger wins
//! 5. path, ascending
//!
//! The path criterion makes the order total: two distinct paths never
//! compare equal, so the keeper is reproducible.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{cmp_paths, DuplicateGroup, GroupMember};
use crate::metadata::{FormatTier, MetadataRecord};

/// The criterion that separated the keeper from the runner-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidingCriterion {
    FormatTier,
    BitRate,
    SampleRate,
    FileSize,
    /// Everything else was equal
    PathOrder,
}

impl std::fmt::Display for DecidingCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FormatTier => "format tier",
            Self::BitRate => "bit rate",
            Self::SampleRate => "sample rate",
            Self::FileSize => "file size",
            Self::PathOrder => "path order",
        };
        f.write_str(s)
    }
}

/// The facts a member is ranked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityScore {
    pub path: PathBuf,
    pub format: FormatTier,
    pub bit_rate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u8>,
    pub size: u64,
}

impl QualityScore {
    /// Score a member from its record.
    ///
    /// Without a record the member ranks as an unknown format with only its
    /// size known.
    #[must_use]
    pub fn new(member: &GroupMember, record: Option<&MetadataRecord>) -> Self {
        match record {
            Some(r) => Self {
                path: member.path.clone(),
                format: r.format,
                bit_rate: r.bit_rate,
                sample_rate: r.sample_rate,
                bit_depth: r.bit_depth,
                size: member.size,
            },
            None => Self {
                path: member.path.clone(),
                format: FormatTier::Unknown,
                bit_rate: None,
                sample_rate: None,
                bit_depth: None,
                size: member.size,
            },
        }
    }

    /// Compare for quality: `Greater` means `self` is the better copy.
    #[must_use]
    pub fn quality_cmp(&self, other: &Self) -> Ordering {
        self.compare_with_criterion(other).0
    }

    /// Compare and report which criterion decided.
    fn compare_with_criterion(&self, other: &Self) -> (Ordering, DecidingCriterion) {
        // `Option` orders `None` below `Some`, which is the rule for
        // missing rates.
        let steps = [
            (self.format.cmp(&other.format), DecidingCriterion::FormatTier),
            (self.bit_rate.cmp(&other.bit_rate), DecidingCriterion::BitRate),
            (
                self.sample_rate.cmp(&other.sample_rate),
                DecidingCriterion::SampleRate,
            ),
            (self.size.cmp(&other.size), DecidingCriterion::FileSize),
            // Smaller path is better, so reversed.
            (
                cmp_paths(&other.path, &self.path),
                DecidingCriterion::PathOrder,
            ),
        ];
        steps
            .into_iter()
            .find(|(ord, _)| ord.is_ne())
            .unwrap_or((Ordering::Equal, DecidingCriterion::PathOrder))
    }
}

/// A group's members, best first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub scores: Vec<QualityScore>,
    pub criterion: DecidingCriterion,
}

impl Ranking {
    /// The best-ranked member.
    #[must_use]
    pub fn keeper(&self) -> Option<&QualityScore> {
        self.scores.first()
    }

    /// Everything after the keeper.
    #[must_use]
    pub fn rest(&self) -> &[QualityScore] {
        self.scores.get(1..).unwrap_or_default()
    }
}

/// Ranks group members by quality.
#[derive(Debug, Default)]
pub struct QualityScorer<'a> {
    records: HashMap<&'a Path, &'a MetadataRecord>,
}

impl<'a> QualityScorer<'a> {
    /// Build a scorer over the records of a scan.
    #[must_use]
    pub fn new(records: &'a [MetadataRecord]) -> Self {
        Self {
            records: records.iter().map(|r| (r.path.as_path(), r)).collect(),
        }
    }

    #[must_use]
    pub fn score(&self, member: &GroupMember) -> QualityScore {
        QualityScore::new(member, self.records.get(member.path.as_path()).copied())
    }

    /// Rank members, best first.
    #[must_use]
    pub fn rank_members<'m>(&self, members: impl IntoIterator<Item = &'m GroupMember>) -> Ranking {
        let mut scores: Vec<QualityScore> = members.into_iter().map(|m| self.score(m)).collect();
        scores.sort_by(|a, b| b.quality_cmp(a));

        let criterion = match (scores.first(), scores.get(1)) {
            (Some(best), Some(next)) => best.compare_with_criterion(next).1,
            _ => DecidingCriterion::PathOrder,
        };
        Ranking { scores, criterion }
    }

    /// Rank a whole group.
    #[must_use]
    pub fn rank(&self, group: &DuplicateGroup) -> Ranking {
        self.rank_members(&group.members)
    }
}
