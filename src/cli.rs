//! Command-line interface definitions.
//!
//! ```bash
//! # Dry run: report exact duplicates and what would be deleted
//! tunedupe find ~/Music
//!
//! # Both strategies, JSON report
//! tunedupe find ~/Music --mode both --output json
//!
//! # Delete planned duplicates (to the trash)
//! tunedupe find ~/Music --apply
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{FuzzyOverrides, Overrides};
use crate::duplicates::DetectMode;

/// Find duplicate audio files and decide which copy to keep.
///
/// Exact duplicates are found by content hash, fuzzy duplicates (the same
/// song in another format) by normalized tags and duration. The best copy
/// of each group is kept: lossless over lossy, then higher bit rate, sample
/// rate and size.
#[derive(Debug, Parser)]
#[command(name = "tunedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicates under a directory and plan which copies to delete
    Find(FindArgs),
    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the find subcommand.
#[derive(Debug, Args)]
pub struct FindArgs {
    /// Directory (or single file) to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Detection strategy
    #[arg(long, value_enum, conflicts_with = "fuzzy")]
    pub mode: Option<DetectMode>,

    /// Shorthand for --mode fuzzy
    #[arg(long)]
    pub fuzzy: bool,

    /// Descend into subdirectories (default)
    #[arg(short = 'r', long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Scan only the top-level directory
    #[arg(short = 'R', long)]
    pub no_recursive: bool,

    /// Delete the planned duplicates instead of only reporting them
    #[arg(long)]
    pub apply: bool,

    /// Use permanent deletion instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "apply")]
    pub permanent: bool,

    /// Number of worker threads for hashing and tag reading
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Maximum duration difference for a fuzzy match, in milliseconds
    #[arg(long, value_name = "MS")]
    pub tolerance_ms: Option<u64>,

    /// Let a fuzzy match to one member of an exact group link the whole group
    #[arg(long)]
    pub merge_exact: bool,

    /// Minimum file size to consider (e.g., 100KB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl FindArgs {
    /// The explicitly requested strategy, if any.
    #[must_use]
    pub fn requested_mode(&self) -> Option<DetectMode> {
        if self.fuzzy {
            Some(DetectMode::Fuzzy)
        } else {
            self.mode
        }
    }

    /// Flag values to layer over the configuration file and environment.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let recursive = if self.no_recursive {
            Some(false)
        } else if self.recursive {
            Some(true)
        } else {
            None
        };
        Overrides {
            io_threads: self.io_threads,
            recursive,
            dry_run: self.apply.then_some(false),
            permanent: self.permanent.then_some(true),
            default_mode: self.requested_mode(),
            fuzzy: FuzzyOverrides {
                duration_tolerance_ms: self.tolerance_ms,
                merge_exact_groups: self.merge_exact.then_some(true),
            },
        }
    }
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Write a commented example configuration file
    Init,
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// JSON for scripting
    Json,
    /// CSV, one row per file
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use tunedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
