//! Report renderers.
//!
//! All formats render the same [`Report`]: the scan outcome, the retention
//! plan and what execution did with it.
//! - [`text`]: colored human-readable report
//! - [`json`]: one JSON document for automation
//! - [`csv`]: one row per file for spreadsheets

pub mod csv;
pub mod json;
pub mod text;

use std::path::Path;

use crate::actions::ExecutionReport;
use crate::duplicates::ScanOutcome;
use crate::error::ExitCode;
use crate::retention::RetentionPlan;

pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::{JsonOutput, JsonOutputError};
pub use self::text::TextOutput;

/// Everything a run produced.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// Scanned root, used to shorten paths in the text report
    pub root: &'a Path,
    pub outcome: &'a ScanOutcome,
    pub plan: &'a RetentionPlan,
    pub execution: &'a ExecutionReport,
    pub exit_code: ExitCode,
}

/// Path relative to `root` when it lies beneath it.
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => path.display().to_string(),
    }
}

/// Sample rate as "44.1 kHz".
pub(crate) fn format_sample_rate(hz: u32) -> String {
    let khz = f64::from(hz) / 1000.0;
    if hz % 1000 == 0 {
        format!("{khz:.0} kHz")
    } else {
        format!("{khz:.1} kHz")
    }
}

/// Bit rate as "320 kbps".
pub(crate) fn format_bit_rate(bps: u32) -> String {
    format!("{} kbps", bps / 1000)
}
