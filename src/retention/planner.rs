//! Keep/delete planning.
//!
//! [`RetentionPlanner`] turns duplicate groups into [`RetentionDecision`]s.
//! It never touches the filesystem; execution lives in
//! [`crate::actions`].
//!
//! Groups are processed in the order given (exact groups first, then fuzzy)
//! and each is treated independently, with two pieces of state carried
//! across groups:
//!
//! - a path already scheduled for deletion is removed from later groups
//! - a path already chosen as a keeper is never scheduled for deletion

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use serde::Serialize;

use super::scorer::{DecidingCriterion, QualityScore, QualityScorer};
use crate::duplicates::{Confidence, DuplicateGroup, GroupMember, MatchStrategy};
use crate::metadata::MetadataRecord;

/// Errors raised while building a plan.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The plan would delete a keeper, delete a path twice, or leave a
    /// group with no survivor. Nothing may be executed.
    #[error("Retention plan invariant violated: {0}")]
    InvariantViolation(String),
}

/// Keep/delete decision for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
    pub strategy: MatchStrategy,
    pub confidence: Confidence,
    /// The retained copy
    pub keeper: QualityScore,
    /// Why the keeper outranked the runner-up
    pub criterion: DecidingCriterion,
    /// Deletion candidates, best first
    pub deletions: Vec<QualityScore>,
    /// Members kept because an earlier group already chose them
    pub also_kept: Vec<PathBuf>,
}

impl RetentionDecision {
    /// Bytes freed by this decision.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.deletions.iter().map(|d| d.size).sum()
    }

    /// Paths scheduled for deletion.
    pub fn deletion_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.deletions.iter().map(|d| &d.path)
    }
}

/// The full plan for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionPlan {
    pub decisions: Vec<RetentionDecision>,
    /// Low-confidence groups listed for manual review
    pub review: Vec<DuplicateGroup>,
}

impl RetentionPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.review.is_empty()
    }

    /// Number of files scheduled for deletion.
    #[must_use]
    pub fn deletion_count(&self) -> usize {
        self.decisions.iter().map(|d| d.deletions.len()).sum()
    }

    /// Total bytes freed if every deletion succeeds.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.decisions.iter().map(RetentionDecision::reclaimable).sum()
    }

    /// Check the plan's safety invariants.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvariantViolation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut kept: HashSet<&PathBuf> = HashSet::new();
        for decision in &self.decisions {
            kept.insert(&decision.keeper.path);
            kept.extend(decision.also_kept.iter());
        }

        let mut deleted: HashSet<&PathBuf> = HashSet::new();
        for decision in &self.decisions {
            for path in decision.deletion_paths() {
                if kept.contains(path) {
                    return Err(PlanError::InvariantViolation(format!(
                        "{} is both kept and scheduled for deletion",
                        path.display()
                    )));
                }
                if !deleted.insert(path) {
                    return Err(PlanError::InvariantViolation(format!(
                        "{} is scheduled for deletion twice",
                        path.display()
                    )));
                }
            }
        }

        if let Some(group) = self.review.iter().find(|g| g.len() < 2) {
            return Err(PlanError::InvariantViolation(format!(
                "review group with {} member(s)",
                group.len()
            )));
        }
        Ok(())
    }
}

/// Builds retention plans from duplicate groups.
#[derive(Debug)]
pub struct RetentionPlanner<'a> {
    scorer: QualityScorer<'a>,
}

impl<'a> RetentionPlanner<'a> {
    /// Create a planner scoring members against `records`.
    #[must_use]
    pub fn new(records: &'a [MetadataRecord]) -> Self {
        Self {
            scorer: QualityScorer::new(records),
        }
    }

    /// Plan keep/delete decisions for `groups`, in order.
    ///
    /// Low-confidence groups go to the review list untouched. Planning is
    /// pure: the same groups and records always give the same plan.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvariantViolation`] if the resulting plan is unsafe.
    pub fn plan(&self, groups: &[DuplicateGroup]) -> Result<RetentionPlan, PlanError> {
        let mut plan = RetentionPlan::default();
        let mut deleted: HashSet<PathBuf> = HashSet::new();
        let mut kept: HashSet<PathBuf> = HashSet::new();

        for group in groups {
            if !group.is_high_confidence() {
                log::debug!("Group of {} left for review", group.len());
                plan.review.push(group.clone());
                continue;
            }

            let remaining: Vec<&GroupMember> = group
                .members
                .iter()
                .filter(|m| !deleted.contains(&m.path))
                .collect();
            if remaining.len() < 2 {
                continue;
            }

            let ranking = self.scorer.rank_members(remaining);
            let Some(keeper) = ranking.keeper().cloned() else {
                continue;
            };

            let mut also_kept = BTreeSet::new();
            let mut deletions = Vec::new();
            for score in ranking.rest() {
                if kept.contains(&score.path) {
                    also_kept.insert(score.path.clone());
                } else {
                    deletions.push(score.clone());
                }
            }
            if deletions.is_empty() {
                continue;
            }

            kept.insert(keeper.path.clone());
            deleted.extend(deletions.iter().map(|d| d.path.clone()));
            plan.decisions.push(RetentionDecision {
                strategy: group.strategy,
                confidence: group.confidence,
                keeper,
                criterion: ranking.criterion,
                deletions,
                also_kept: also_kept.into_iter().collect(),
            });
        }

        plan.validate()?;
        log::info!(
            "Plan: {} decision(s), {} deletion(s), {} group(s) for review",
            plan.decisions.len(),
            plan.deletion_count(),
            plan.review.len()
        );
        Ok(plan)
    }
}
