//! JSON report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "decisions": [
//!     {
//!       "strategy": "exact",
//!       "confidence": "high",
//!       "keeper": { "path": "/m/a.flac", "format": "lossless", "bit_rate": null,
//!                   "sample_rate": 96000, "bit_depth": 24, "size": 1000000 },
//!       "criterion": "path_order",
//!       "deletions": [ { "path": "/m/c.flac", ... } ],
//!       "also_kept": []
//!     }
//!   ],
//!   "review": [ { "strategy": "fuzzy", "confidence": "low", "digest": null, "members": [...] } ],
//!   "issues": [ { "path": "/m/x.mp3", "kind": "unmatchable", "reason": "..." } ],
//!   "execution": { "mode": "simulate", "deleted": [], "simulated": ["/m/c.flac"], ... },
//!   "summary": { "total_files": 3, "reclaimable_space": 1000000, "exit_code": 0, ... }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Report;
use crate::actions::ExecutionReport;
use crate::duplicates::{DuplicateGroup, FileIssue};
use crate::retention::RetentionDecision;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub empty_files: usize,
    pub eliminated_by_size: usize,
    pub eliminated_by_quickhash: usize,
    pub fully_hashed: usize,
    pub records_extracted: usize,
    pub exact_groups: usize,
    pub fuzzy_groups: usize,
    pub low_confidence_groups: usize,
    pub planned_deletions: usize,
    /// Bytes freed if every planned deletion succeeds
    pub reclaimable_space: u64,
    pub scan_duration_ms: u64,
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TD000")
    pub exit_code_name: String,
    pub generated_at: DateTime<Utc>,
}

impl JsonSummary {
    fn from_report(report: &Report<'_>) -> Self {
        let summary = &report.outcome.summary;
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            empty_files: summary.empty_files,
            eliminated_by_size: summary.eliminated_by_size,
            eliminated_by_quickhash: summary.eliminated_by_quickhash,
            fully_hashed: summary.fully_hashed,
            records_extracted: summary.records_extracted,
            exact_groups: summary.exact_groups,
            fuzzy_groups: summary.fuzzy_groups,
            low_confidence_groups: summary.low_confidence_groups,
            planned_deletions: report.plan.deletion_count(),
            reclaimable_space: report.plan.reclaimable(),
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: report.exit_code.as_i32(),
            exit_code_name: report.exit_code.code_prefix().to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub decisions: &'a [RetentionDecision],
    /// Low-confidence groups, never deleted automatically
    pub review: &'a [DuplicateGroup],
    pub issues: &'a [FileIssue],
    pub execution: &'a ExecutionReport,
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(report: &Report<'a>) -> Self {
        Self {
            decisions: &report.plan.decisions,
            review: &report.plan.review,
            issues: &report.outcome.summary.issues,
            execution: report.execution,
            summary: JsonSummary::from_report(report),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Fails for paths that are not valid UTF-8.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Fails for paths that are not valid UTF-8.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
