//! CSV report, one row per file.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number (decisions first, then review groups)
//! - `strategy`, `confidence`: how the group was found
//! - `action`: `keep`, `delete`, `also_keep` or `review`
//! - `path`: absolute path
//! - `format`, `bit_rate`, `sample_rate`, `size`: what the ranking saw
//! - `criterion`: deciding criterion, on the keeper row
//! - `modified`: last modified time (RFC 3339)

use std::collections::HashMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::Report;
use crate::duplicates::GroupMember;
use crate::metadata::MetadataRecord;
use crate::retention::QualityScore;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow {
    group_id: usize,
    strategy: String,
    confidence: String,
    action: &'static str,
    path: String,
    format: String,
    bit_rate: Option<u32>,
    sample_rate: Option<u32>,
    size: u64,
    criterion: Option<String>,
    modified: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    report: Report<'a>,
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(report: Report<'a>) -> Self {
        Self { report }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let records: HashMap<&Path, &MetadataRecord> = self
            .report
            .outcome
            .records
            .iter()
            .map(|r| (r.path.as_path(), r))
            .collect();
        let score_for = |path: &Path, size: u64| {
            let record = records.get(path).copied();
            let member = GroupMember::new(path, record.map_or(size, |r| r.size));
            QualityScore::new(&member, record)
        };

        let mut group_id = 0;
        for decision in &self.report.plan.decisions {
            group_id += 1;
            let group = GroupColumns {
                id: group_id,
                strategy: decision.strategy.to_string(),
                confidence: decision.confidence.to_string(),
            };

            csv_writer.serialize(group.row(
                "keep",
                &decision.keeper,
                Some(decision.criterion.to_string()),
            ))?;
            for path in &decision.also_kept {
                csv_writer.serialize(group.row("also_keep", &score_for(path, 0), None))?;
            }
            for score in &decision.deletions {
                csv_writer.serialize(group.row("delete", score, None))?;
            }
        }

        for review in &self.report.plan.review {
            group_id += 1;
            let group = GroupColumns {
                id: group_id,
                strategy: review.strategy.to_string(),
                confidence: review.confidence.to_string(),
            };
            for member in &review.members {
                let score = score_for(&member.path, member.size);
                csv_writer.serialize(group.row("review", &score, None))?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

/// Columns shared by every row of a group.
struct GroupColumns {
    id: usize,
    strategy: String,
    confidence: String,
}

impl GroupColumns {
    fn row(&self, action: &'static str, score: &QualityScore, criterion: Option<String>) -> CsvRow {
        CsvRow {
            group_id: self.id,
            strategy: self.strategy.clone(),
            confidence: self.confidence.clone(),
            action,
            path: score.path.to_string_lossy().to_string(),
            format: score.format.to_string(),
            bit_rate: score.bit_rate,
            sample_rate: score.sample_rate,
            size: score.size,
            criterion,
            modified: get_modified_time(&score.path),
        }
    }
}

/// Formatted modified time, or "unknown" once the file is gone.
fn get_modified_time(path: &Path) -> String {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|m| {
            let datetime: DateTime<Utc> = m.into();
            datetime.to_rfc3339()
        })
        .unwrap_or_else(|_| "unknown".to_string())
}
