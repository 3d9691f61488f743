//! Shared fixtures for the integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tunedupe::duplicates::{DetectMode, DuplicateFinder, FinderConfig};
use tunedupe::metadata::{ExtractError, Extraction, MetadataExtractor, MetadataRecord};

/// Reads tags from the file name instead of the file.
///
/// `artist-title-duration_ms.ext` yields a fully tagged record; any other
/// name yields a record with no tags.
pub struct NameExtractor;

impl MetadataExtractor for NameExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let size = fs::metadata(path)
            .map_err(|e| ExtractError::io(path, e))?
            .len();
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        let parts: Vec<&str> = stem.split('-').collect();
        let mut record = MetadataRecord::new(path, size);
        if parts.len() == 3 {
            record = record
                .with_artist(parts[0])
                .with_title(parts[1])
                .with_duration_ms(parts[2].parse().unwrap());
        }
        Ok(Extraction::clean(record))
    }
}

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn finder_with(config: FinderConfig) -> DuplicateFinder {
    DuplicateFinder::new(config.with_io_threads(2), Arc::new(NameExtractor)).unwrap()
}

pub fn finder(mode: DetectMode) -> DuplicateFinder {
    finder_with(FinderConfig::default().with_mode(mode))
}

pub fn file_names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}
