//! Human-readable report.
//!
//! Groups are printed keeper first with the criterion that decided it, then
//! the deletion candidates. Low-confidence groups follow under a review
//! heading, and every skipped or flagged file is listed last. Colors come
//! from `yansi` and are disabled globally with `--no-color`.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use bytesize::ByteSize;
use yansi::Paint;

use super::{display_path, format_bit_rate, format_sample_rate, Report};
use crate::actions::ExecutionMode;
use crate::duplicates::DuplicateGroup;
use crate::metadata::MetadataRecord;
use crate::retention::{QualityScore, RetentionDecision};

/// Text renderer.
pub struct TextOutput<'a> {
    report: Report<'a>,
    records: HashMap<&'a Path, &'a MetadataRecord>,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: Report<'a>) -> Self {
        let records = report
            .outcome
            .records
            .iter()
            .map(|r| (r.path.as_path(), r))
            .collect();
        Self { report, records }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let plan = self.report.plan;

        if plan.decisions.is_empty() && plan.review.is_empty() {
            writeln!(w, "{}", "No duplicates found.".green())?;
        }

        for (idx, decision) in plan.decisions.iter().enumerate() {
            self.write_decision(w, idx + 1, decision)?;
        }

        if !plan.review.is_empty() {
            writeln!(
                w,
                "\n{}",
                format!("Needs review ({} group(s), nothing deleted)", plan.review.len())
                    .yellow()
                    .bold()
            )?;
            for (idx, group) in plan.review.iter().enumerate() {
                self.write_review_group(w, idx + 1, group)?;
            }
        }

        self.write_issues(w)?;
        self.write_execution(w)?;
        self.write_summary(w)
    }

    fn write_decision<W: Write>(
        &self,
        w: &mut W,
        index: usize,
        decision: &RetentionDecision,
    ) -> io::Result<()> {
        writeln!(
            w,
            "\n{} [{}]",
            format!("Group {index}").cyan().bold(),
            decision.strategy
        )?;
        writeln!(
            w,
            "  {} {}  {}  (by {})",
            "keep  ".green().bold(),
            self.path(&decision.keeper.path),
            describe(&decision.keeper).dim(),
            decision.criterion
        )?;
        for path in &decision.also_kept {
            writeln!(
                w,
                "  {} {}  (kept by an earlier group)",
                "keep  ".green(),
                self.path(path)
            )?;
        }
        for score in &decision.deletions {
            writeln!(
                w,
                "  {} {}  {}",
                "delete".red().bold(),
                self.path(&score.path),
                describe(score).dim()
            )?;
        }
        Ok(())
    }

    fn write_review_group<W: Write>(
        &self,
        w: &mut W,
        index: usize,
        group: &DuplicateGroup,
    ) -> io::Result<()> {
        writeln!(
            w,
            "\n{} [{}, {} confidence]",
            format!("Review {index}").yellow().bold(),
            group.strategy,
            group.confidence
        )?;
        for member in &group.members {
            let score = QualityScore::new(member, self.records.get(member.path.as_path()).copied());
            writeln!(
                w,
                "  {}      {}  {}",
                "?".yellow(),
                self.path(&member.path),
                describe(&score).dim()
            )?;
        }
        Ok(())
    }

    fn write_issues<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let issues = &self.report.outcome.summary.issues;
        if issues.is_empty() {
            return Ok(());
        }
        writeln!(w, "\n{}", format!("Issues ({})", issues.len()).yellow().bold())?;
        for issue in issues {
            writeln!(
                w,
                "  {}: {} ({})",
                self.path(&issue.path),
                issue.kind.yellow(),
                issue.reason
            )?;
        }
        Ok(())
    }

    fn write_execution<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let execution = self.report.execution;
        if execution.failures.is_empty() {
            return Ok(());
        }
        writeln!(
            w,
            "\n{}",
            format!("Failed deletions ({})", execution.failures.len())
                .red()
                .bold()
        )?;
        for failure in &execution.failures {
            writeln!(w, "  {}: {}", self.path(&failure.path), failure.reason)?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let summary = &self.report.outcome.summary;
        let plan = self.report.plan;
        let execution = self.report.execution;

        writeln!(w, "\n{}", "Summary".bold())?;
        writeln!(
            w,
            "  Files scanned:      {} ({})",
            summary.total_files,
            ByteSize::b(summary.total_size)
        )?;
        writeln!(w, "  Exact groups:       {}", summary.exact_groups)?;
        writeln!(
            w,
            "  Fuzzy groups:       {} ({} low confidence)",
            summary.fuzzy_groups, summary.low_confidence_groups
        )?;
        writeln!(w, "  Planned deletions:  {}", plan.deletion_count())?;
        writeln!(
            w,
            "  Reclaimable space:  {}",
            ByteSize::b(plan.reclaimable()).bold()
        )?;
        writeln!(w, "  Duration:           {:.2?}", summary.scan_duration)?;

        match execution.mode {
            ExecutionMode::Simulate => {
                writeln!(
                    w,
                    "\n{}",
                    "Dry run: no files deleted. Run with --apply to delete.".cyan()
                )?;
            }
            ExecutionMode::Execute => {
                writeln!(w, "\n{}", execution.summary().bold())?;
            }
        }
        Ok(())
    }

    fn path(&self, path: &Path) -> String {
        display_path(self.report.root, path)
    }
}

/// One-line quality description: "lossless, 96 kHz, 24-bit, 1.0 MB".
fn describe(score: &QualityScore) -> String {
    let mut parts = vec![score.format.to_string()];
    if let Some(bit_rate) = score.bit_rate {
        parts.push(format_bit_rate(bit_rate));
    }
    if let Some(sample_rate) = score.sample_rate {
        parts.push(format_sample_rate(sample_rate));
    }
    if let Some(depth) = score.bit_depth {
        parts.push(format!("{depth}-bit"));
    }
    parts.push(ByteSize::b(score.size).to_string());
    parts.join(", ")
}
