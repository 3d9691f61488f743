//! Detection pipeline orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives a full detection pass:
//! 1. **Walk** - collect audio candidates under the root
//! 2. **Phase 1 - Size grouping**: only size collisions can be exact duplicates
//! 3. **Phase 2 - Quick hash**: size plus head and tail windows
//! 4. **Phase 3 - Full hash**: streaming BLAKE3 of the survivors, grouped by
//!    [`ExactMatcher`]
//! 5. **Metadata**: extract a [`MetadataRecord`] per file and group with
//!    [`FuzzyMatcher`]
//!
//! Hashing and extraction run on one bounded rayon pool of `io_threads`
//! workers. Results are collected back in input order before grouping, so
//! parallelism never affects the outcome. Per-file failures are recorded as
//! [`FileIssue`]s and never abort the pass; a shutdown request does.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tunedupe::duplicates::{DetectMode, DuplicateFinder, FinderConfig};
//! use tunedupe::metadata::LoftyExtractor;
//!
//! let config = FinderConfig::default().with_mode(DetectMode::Both);
//! let finder = DuplicateFinder::new(config, Arc::new(LoftyExtractor::new())).unwrap();
//! let outcome = finder.run(Path::new("/music")).unwrap();
//!
//! println!("{} exact groups", outcome.exact_groups.len());
//! println!("{} fuzzy groups", outcome.fuzzy_groups.len());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::exact::ExactMatcher;
use super::fuzzy::{FuzzyConfig, FuzzyMatcher};
use super::groups::{group_by_size, DuplicateGroup};
use crate::metadata::{ExtractError, MetadataExtractor, MetadataRecord};
use crate::progress::{phase, ProgressCallback};
use crate::scanner::{
    DigestEntry, FileEntry, Hash, HashError, Hasher, ScanError, Walker, WalkerConfig,
};

/// Which strategies a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectMode {
    /// Content hashing only
    #[default]
    Exact,
    /// Metadata matching only
    Fuzzy,
    /// Both strategies
    Both,
}

impl DetectMode {
    #[must_use]
    pub fn runs_exact(self) -> bool {
        matches!(self, Self::Exact | Self::Both)
    }

    #[must_use]
    pub fn runs_fuzzy(self) -> bool {
        matches!(self, Self::Fuzzy | Self::Both)
    }
}

impl std::fmt::Display for DetectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Fuzzy => f.write_str("fuzzy"),
            Self::Both => f.write_str("both"),
        }
    }
}

/// Why a file was skipped or flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// File unreadable or vanished
    Io,
    /// External probe exceeded its bound; metadata is partial
    ExtractionTimeout,
    /// Container could not be parsed
    Unreadable,
    /// Left out of fuzzy matching for lack of tags or duration
    Unmatchable,
    /// Member of a low-confidence group, left for manual review
    NeedsReview,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Io => "io error",
            Self::ExtractionTimeout => "extraction timeout",
            Self::Unreadable => "unreadable",
            Self::Unmatchable => "unmatchable",
            Self::NeedsReview => "needs review",
        };
        f.write_str(s)
    }
}

/// A skipped or flagged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub reason: String,
}

impl FileIssue {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: IssueKind, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    fn from_hash_error(error: &HashError) -> Self {
        Self::new(error.path(), IssueKind::Io, error.to_string())
    }

    fn from_scan_error(error: &ScanError) -> Self {
        Self::new(error.path(), IssueKind::Io, error.to_string())
    }

    fn from_extract_error(error: &ExtractError) -> Self {
        let kind = match error {
            ExtractError::Io { .. } => IssueKind::Io,
            ExtractError::Timeout { .. } => IssueKind::ExtractionTimeout,
            ExtractError::Unsupported { .. } | ExtractError::Probe { .. } => IssueKind::Unreadable,
        };
        Self::new(error.path(), kind, error.to_string())
    }
}

/// Summary statistics from a detection pass.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Audio files found
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Empty files (never exact-matched)
    pub empty_files: usize,
    /// Files eliminated by size grouping
    pub eliminated_by_size: usize,
    /// Files eliminated by the quick hash
    pub eliminated_by_quickhash: usize,
    /// Files that received a full digest
    pub fully_hashed: usize,
    /// Metadata records produced
    pub records_extracted: usize,
    pub exact_groups: usize,
    pub fuzzy_groups: usize,
    pub low_confidence_groups: usize,
    /// Every skipped or flagged file
    pub issues: Vec<FileIssue>,
    /// Duration of the whole pass
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Number of issues of one kind.
    #[must_use]
    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Whether any file was skipped because it could not be read.
    #[must_use]
    pub fn has_skipped_files(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i.kind, IssueKind::Io | IssueKind::Unreadable))
    }

    fn sort_issues(&mut self) {
        self.issues
            .sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.cmp(&b.kind)));
        self.issues.dedup();
    }
}

/// Everything a detection pass produces.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub exact_groups: Vec<DuplicateGroup>,
    pub fuzzy_groups: Vec<DuplicateGroup>,
    /// Records for every file that could be extracted, by path
    pub records: Vec<MetadataRecord>,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Exact groups followed by fuzzy groups, the order the planner expects.
    #[must_use]
    pub fn all_groups(&self) -> Vec<DuplicateGroup> {
        self.exact_groups
            .iter()
            .chain(self.fuzzy_groups.iter())
            .cloned()
            .collect()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Worker threads for hashing and extraction.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Strategies to run
    pub mode: DetectMode,
    /// Candidate discovery options
    pub walker_config: WalkerConfig,
    /// Fuzzy matching options
    pub fuzzy: FuzzyConfig,
    /// False positive rate for the size Bloom filter
    pub bloom_fp_rate: f64,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("mode", &self.mode)
            .field("walker_config", &self.walker_config)
            .field("fuzzy", &self.fuzzy)
            .field("bloom_fp_rate", &self.bloom_fp_rate)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            mode: DetectMode::default(),
            walker_config: WalkerConfig::default(),
            fuzzy: FuzzyConfig::default(),
            bloom_fp_rate: 0.01,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of worker threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DetectMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    #[must_use]
    pub fn with_fuzzy_config(mut self, config: FuzzyConfig) -> Self {
        self.fuzzy = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Orchestrates candidate discovery, hashing, extraction and matching.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
    extractor: Arc<dyn MetadataExtractor>,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field("hasher", &self.hasher)
            .field("extractor", &"<extractor>")
            .finish_non_exhaustive()
    }
}

impl DuplicateFinder {
    /// Create a finder.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if no worker pool can be built.
    pub fn new(
        config: FinderConfig,
        extractor: Arc<dyn MetadataExtractor>,
    ) -> Result<Self, FinderError> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads.max(1))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to create pool with {} threads: {}", config.io_threads, e);
                rayon::ThreadPoolBuilder::new().num_threads(1).build()?
            }
        };

        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }

        Ok(Self {
            config,
            hasher,
            extractor,
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping detection");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }

    fn phase_start(&self, name: &str, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(name, total);
        }
    }

    fn phase_end(&self, name: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(name);
        }
    }

    /// Run a full pass over a root directory (or a single file).
    ///
    /// # Errors
    ///
    /// [`FinderError::PathNotFound`] if the root does not exist,
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn run(&self, root: &Path) -> Result<ScanOutcome, FinderError> {
        let started = Instant::now();
        let mut summary = ScanSummary::default();

        let files = self.collect_candidates(root, &mut summary)?;
        let mut outcome = self.run_on_files(files, summary)?;
        outcome.summary.scan_duration = started.elapsed();

        log::info!(
            "Scan complete: {} files, {} exact group(s), {} fuzzy group(s), {} issue(s) in {:.2?}",
            outcome.summary.total_files,
            outcome.summary.exact_groups,
            outcome.summary.fuzzy_groups,
            outcome.summary.issues.len(),
            outcome.summary.scan_duration
        );
        Ok(outcome)
    }

    /// Run detection on an already collected candidate list.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn run_on_files(
        &self,
        mut files: Vec<FileEntry>,
        mut summary: ScanSummary,
    ) -> Result<ScanOutcome, FinderError> {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();

        let exact_groups = if self.config.mode.runs_exact() {
            self.detect_exact(files.clone(), &mut summary)?
        } else {
            Vec::new()
        };
        // Fuzzy-only runs still hash when exact groups are to be linked; the
        // groups feed the matcher but are not reported or planned.
        let link_groups = if !self.config.mode.runs_exact() && self.config.fuzzy.merge_exact_groups
        {
            log::info!("Hashing to link byte-identical copies for fuzzy matching");
            let groups = self.detect_exact(files.clone(), &mut summary)?;
            summary.exact_groups = 0;
            groups
        } else {
            Vec::new()
        };

        let mut records = Vec::new();
        let mut fuzzy_groups = Vec::new();
        if self.config.mode.runs_fuzzy() {
            records = self.extract_metadata(&files, &mut summary)?;
            let linked = if link_groups.is_empty() {
                &exact_groups
            } else {
                &link_groups
            };
            fuzzy_groups = self.detect_fuzzy(&records, linked, &mut summary);
        }

        summary.sort_issues();
        Ok(ScanOutcome {
            exact_groups,
            fuzzy_groups,
            records,
            summary,
        })
    }

    /// Discover audio files under `root`.
    ///
    /// Walk errors are recorded as issues.
    ///
    /// # Errors
    ///
    /// [`FinderError::PathNotFound`] if the root does not exist,
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn collect_candidates(
        &self,
        root: &Path,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileEntry>, FinderError> {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        self.check_shutdown()?;

        log::info!("Starting duplicate scan of {}", root.display());
        self.phase_start(phase::WALKING, 0);

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, &file.path.to_string_lossy());
                    }
                    files.push(file);
                }
                Err(e) => summary.issues.push(FileIssue::from_scan_error(&e)),
            }
        }

        self.phase_end(phase::WALKING);
        self.check_shutdown()?;

        files.sort_by(|a, b| a.path.cmp(&b.path));
        log::info!("Found {} audio file(s)", files.len());
        Ok(files)
    }

    /// Build candidate entries for an explicit list of paths.
    ///
    /// Paths that cannot be stat'ed are recorded as issues.
    #[must_use]
    pub fn entries_from_paths(&self, paths: &[PathBuf], summary: &mut ScanSummary) -> Vec<FileEntry> {
        paths
            .iter()
            .filter_map(|path| match FileEntry::from_path(path) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    summary.issues.push(FileIssue::from_hash_error(&e));
                    None
                }
            })
            .collect()
    }

    /// Detect exact duplicates among explicit paths.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn detect_exact_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let mut summary = ScanSummary::default();
        let files = self.entries_from_paths(paths, &mut summary);
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();
        let groups = self.detect_exact(files, &mut summary)?;
        summary.sort_issues();
        Ok((groups, summary))
    }

    /// Run `op` over `files` on the worker pool.
    ///
    /// Results come back in input order. Once shutdown is requested the
    /// remaining files are skipped without being opened.
    fn hash_parallel<T, F>(
        &self,
        phase_name: &str,
        files: Vec<FileEntry>,
        op: F,
    ) -> Vec<(FileEntry, Result<T, HashError>)>
    where
        T: Send,
        F: Fn(&Hasher, &Path) -> Result<T, HashError> + Sync,
    {
        self.phase_start(phase_name, files.len());
        let results = self.pool.install(|| {
            files
                .into_par_iter()
                .enumerate()
                .map(|(idx, file)| {
                    if self.config.is_shutdown_requested() {
                        let err = HashError::Interrupted(file.path.clone());
                        return (file, Err(err));
                    }
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, &file.path.to_string_lossy());
                    }
                    let result = op(&self.hasher, &file.path);
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_item_completed(file.size);
                    }
                    (file, result)
                })
                .collect()
        });
        self.phase_end(phase_name);
        results
    }

    /// Split hashing results into successes and recorded failures.
    fn keep_hashed<T>(
        &self,
        results: Vec<(FileEntry, Result<T, HashError>)>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<(FileEntry, T)>, FinderError> {
        let mut hashed = Vec::with_capacity(results.len());
        for (file, result) in results {
            match result {
                Ok(value) => hashed.push((file, value)),
                Err(e) if e.is_interrupted() => {}
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", file.path.display(), e);
                    summary.issues.push(FileIssue::from_hash_error(&e));
                }
            }
        }
        self.check_shutdown()?;
        Ok(hashed)
    }

    /// Detect byte-identical files.
    ///
    /// Size buckets, then quick hash within each bucket, then full digest
    /// within each quick-hash collision.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn detect_exact(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        self.check_shutdown()?;

        log::info!("Phase 1: Grouping by size...");
        let (size_groups, size_stats) = group_by_size(files, self.config.bloom_fp_rate);
        summary.empty_files = size_stats.empty_files;
        summary.eliminated_by_size = size_stats.eliminated_unique;
        if size_groups.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            return Ok(Vec::new());
        }

        log::info!("Phase 2: Computing quick hashes...");
        let candidates: Vec<FileEntry> = size_groups.into_values().flatten().collect();
        let input = candidates.len();
        let results = self.hash_parallel(phase::QUICKHASH, candidates, Hasher::quick_hash);
        let quick = self.keep_hashed(results, summary)?;

        let mut quick_groups: BTreeMap<(u64, Hash), Vec<FileEntry>> = BTreeMap::new();
        for (file, hash) in quick {
            quick_groups.entry((file.size, hash)).or_default().push(file);
        }
        let survivors: Vec<FileEntry> = quick_groups
            .into_values()
            .filter(|bucket| bucket.len() > 1)
            .flatten()
            .collect();
        summary.eliminated_by_quickhash = input.saturating_sub(survivors.len());
        log::info!(
            "Phase 2 complete: {} files → {} potential duplicates",
            input,
            survivors.len()
        );
        if survivors.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Phase 3: Computing full hashes for {} files...", survivors.len());
        let results = self.hash_parallel(phase::FULLHASH, survivors, Hasher::full_hash);
        let full = self.keep_hashed(results, summary)?;
        summary.fully_hashed = full.len();

        let digests = full
            .into_iter()
            .map(|(file, digest)| DigestEntry::new(file.path, digest, file.size));
        let groups = ExactMatcher::new().group(digests);
        summary.exact_groups = groups.len();

        log::info!("Phase 3 complete: {} exact duplicate group(s)", groups.len());
        Ok(groups)
    }

    /// Extract a metadata record for every file, on the worker pool.
    ///
    /// Files that cannot be accessed are dropped with an issue; extraction
    /// warnings are recorded as issues next to the record.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] on shutdown.
    pub fn extract_metadata(
        &self,
        files: &[FileEntry],
        summary: &mut ScanSummary,
    ) -> Result<Vec<MetadataRecord>, FinderError> {
        self.check_shutdown()?;
        log::info!("Reading metadata for {} file(s)...", files.len());
        self.phase_start(phase::METADATA, files.len());

        let results: Vec<Option<Result<_, ExtractError>>> = self.pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .map(|(idx, file)| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, &file.path.to_string_lossy());
                    }
                    Some(self.extractor.extract(&file.path))
                })
                .collect()
        });
        self.phase_end(phase::METADATA);
        self.check_shutdown()?;

        let mut records = Vec::with_capacity(results.len());
        for result in results.into_iter().flatten() {
            match result {
                Ok(extraction) => {
                    summary.issues.extend(
                        extraction
                            .warnings
                            .iter()
                            .map(FileIssue::from_extract_error),
                    );
                    records.push(extraction.record);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", e.path().display(), e);
                    summary.issues.push(FileIssue::from_extract_error(&e));
                }
            }
        }
        summary.records_extracted = records.len();
        log::info!("Metadata extracted for {} file(s)", records.len());
        Ok(records)
    }

    /// Group records by metadata and record unmatchable and review issues.
    #[must_use]
    pub fn detect_fuzzy(
        &self,
        records: &[MetadataRecord],
        exact_groups: &[DuplicateGroup],
        summary: &mut ScanSummary,
    ) -> Vec<DuplicateGroup> {
        let outcome = FuzzyMatcher::new(self.config.fuzzy.clone()).detect(records, exact_groups);

        summary.issues.extend(outcome.unmatchable.iter().map(|unmatched| {
            FileIssue::new(
                &unmatched.path,
                IssueKind::Unmatchable,
                unmatched.reason.to_string(),
            )
        }));
        for group in outcome.groups.iter().filter(|g| !g.is_high_confidence()) {
            summary.issues.extend(group.members.iter().map(|m| {
                FileIssue::new(
                    &m.path,
                    IssueKind::NeedsReview,
                    "low-confidence fuzzy match",
                )
            }));
        }

        summary.fuzzy_groups = outcome.groups.len();
        summary.low_confidence_groups = outcome.stats.low_confidence_groups;
        outcome.groups
    }
}
