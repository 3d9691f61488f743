//! Candidate discovery over a directory tree.
//!
//! # Overview
//!
//! [`Walker`] enumerates audio files under a root path and yields a
//! [`FileEntry`] for each one, in path order. Traversal uses [`walkdir`]
//! with per-directory sorting, so the same tree always produces the same
//! sequence regardless of the order the filesystem returns entries in.
//!
//! # Features
//!
//! - Recursive or single-level traversal
//! - Extension filter restricted to [`SUPPORTED_EXTENSIONS`](super::SUPPORTED_EXTENSIONS)
//! - Minimum size filter
//! - A root that is itself an audio file is yielded directly
//! - Graceful shutdown via atomic flag

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{is_supported_audio, FileEntry, ScanError, WalkerConfig};

/// Directory walker for audio file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        self.config.min_size.is_none_or(|min| size >= min)
    }

    /// Walk the tree, yielding audio file entries in path order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration, so one unreadable directory does not hide the rest.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();
        if !self.config.recursive {
            walk_dir = walk_dir.max_depth(1);
        }

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.path();
                    if !is_supported_audio(path) {
                        log::trace!("Skipping non-audio file: {}", path.display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) if metadata.is_file() => {
                            self.make_entry(path.to_path_buf(), &metadata)
                        }
                        Ok(_) => None,
                        Err(e) => {
                            let path = e.path().map_or_else(|| path.to_path_buf(), Path::to_path_buf);
                            Some(Err(self.handle_walk_error(path, e)))
                        }
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(self.handle_walk_error(path, e)))
                }
            })
    }

    /// Collect the walk into a sorted list of entries plus the errors seen.
    #[must_use]
    pub fn collect(&self) -> (Vec<FileEntry>, Vec<ScanError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        for result in self.walk() {
            match result {
                Ok(entry) => files.push(entry),
                Err(e) => errors.push(e),
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!(
            "Walker: {} audio files, {} errors under {}",
            files.len(),
            errors.len(),
            self.root.display()
        );
        (files, errors)
    }

    fn make_entry(
        &self,
        path: PathBuf,
        metadata: &std::fs::Metadata,
    ) -> Option<Result<FileEntry, ScanError>> {
        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        log::trace!("Found audio file: {}", path.display());
        Some(Ok(FileEntry::new(path, size, modified)))
    }

    fn handle_walk_error(&self, path: PathBuf, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("Path not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(error.to_string()),
                }
            }
        }
    }
}
