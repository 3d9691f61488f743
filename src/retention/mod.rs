//! Keeper selection and retention planning.
//!
//! - [`scorer`]: total quality order over group members
//! - [`planner`]: keep/delete decisions across all groups of a scan

pub mod planner;
pub mod scorer;

pub use planner::{PlanError, RetentionDecision, RetentionPlan, RetentionPlanner};
pub use scorer::{DecidingCriterion, QualityScore, QualityScorer, Ranking};
