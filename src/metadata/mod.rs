//! Per-file audio metadata.
//!
//! This module defines [`MetadataRecord`], the normalized facts both
//! matching strategies consume, and the extraction layer that produces it:
//!
//! - [`normalize`]: case, whitespace and diacritic folding for tag text
//! - [`extractor`]: the [`MetadataExtractor`] interface and the `lofty` adapter
//! - [`probe`]: the bounded `ffprobe` fallback
//!
//! Container differences stop at the extractor. Everything downstream sees
//! a [`FormatTier`] and optional numeric properties, never a tag schema.

pub mod extractor;
pub mod normalize;
pub mod probe;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

pub use extractor::{Extraction, LoftyExtractor, MetadataExtractor};
pub use normalize::{normalize_opt, normalize_text};
pub use probe::{FfprobeProbe, ProbeConfig, ProbeInfo};

/// Audio container, as identified by the parser or the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp3,
    Flac,
    Ogg,
    Opus,
    M4a,
    Wma,
    Wav,
    Aiff,
    Unknown,
}

impl Container {
    /// Identify the container from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "mp3" => Self::Mp3,
            "flac" => Self::Flac,
            "ogg" | "oga" => Self::Ogg,
            "opus" => Self::Opus,
            "m4a" | "mp4" | "alac" => Self::M4a,
            "wma" => Self::Wma,
            "wav" => Self::Wav,
            "aiff" | "aif" => Self::Aiff,
            _ => Self::Unknown,
        }
    }

    /// Short display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::Flac => "FLAC",
            Self::Ogg => "OGG",
            Self::Opus => "OPUS",
            Self::M4a => "M4A",
            Self::Wma => "WMA",
            Self::Wav => "WAV",
            Self::Aiff => "AIFF",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality family of an encoding.
///
/// Ordered so that `Lossless > Lossy > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTier {
    Unknown,
    Lossy,
    Lossless,
}

impl FormatTier {
    /// Classify a container.
    ///
    /// M4A carries both AAC (lossy) and ALAC (lossless); only ALAC reports a
    /// bit depth, so its presence decides the tier.
    #[must_use]
    pub fn classify(container: Container, bit_depth: Option<u8>) -> Self {
        match container {
            Container::Flac | Container::Wav | Container::Aiff => Self::Lossless,
            Container::Mp3 | Container::Ogg | Container::Opus | Container::Wma => Self::Lossy,
            Container::M4a if bit_depth.is_some() => Self::Lossless,
            Container::M4a => Self::Lossy,
            Container::Unknown => Self::Unknown,
        }
    }
}

impl std::fmt::Display for FormatTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lossless => f.write_str("lossless"),
            Self::Lossy => f.write_str("lossy"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Normalized facts about one scanned file.
///
/// Missing numeric properties are `None`, never zero. Text fields are
/// already normalized (see [`normalize_text`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    /// Absolute path, unique within a scan
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Container identified by the parser or extension
    pub container: Container,
    /// Quality family
    pub format: FormatTier,
    /// Duration in milliseconds
    pub duration_ms: Option<u64>,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Bit rate in bits per second
    pub bit_rate: Option<u32>,
    /// Bits per sample (lossless formats)
    pub bit_depth: Option<u8>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
}

impl MetadataRecord {
    /// Create a record with only path and size known.
    ///
    /// The container and tier are inferred from the extension.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let container = Container::from_path(&path);
        Self {
            format: FormatTier::classify(container, None),
            path,
            size,
            container,
            duration_ms: None,
            sample_rate: None,
            bit_rate: None,
            bit_depth: None,
            title: None,
            artist: None,
            album: None,
            track: None,
        }
    }

    /// Set the container and reclassify the tier.
    #[must_use]
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self.format = FormatTier::classify(container, self.bit_depth);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Set the bit depth and reclassify the tier.
    #[must_use]
    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = Some(bit_depth);
        self.format = FormatTier::classify(self.container, self.bit_depth);
        self
    }

    /// Set the title from raw tag text.
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = normalize_text(title);
        self
    }

    /// Set the artist from raw tag text.
    #[must_use]
    pub fn with_artist(mut self, artist: &str) -> Self {
        self.artist = normalize_text(artist);
        self
    }

    /// Set the album from raw tag text.
    #[must_use]
    pub fn with_album(mut self, album: &str) -> Self {
        self.album = normalize_text(album);
        self
    }

    #[must_use]
    pub fn with_track(mut self, track: u32) -> Self {
        self.track = Some(track);
        self
    }

    /// Whether both artist and title are known.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.artist.is_some() && self.title.is_some()
    }
}

/// Errors that can occur while extracting metadata.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ExtractError {
    /// The file could not be opened or read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },

    /// The external probe did not finish within its time bound.
    #[error("Probe timed out after {}s: {path}", timeout.as_secs())]
    Timeout {
        /// File being probed
        path: PathBuf,
        /// Bound that was exceeded
        timeout: Duration,
    },

    /// The container could not be parsed.
    #[error("Unsupported or unreadable audio format: {path}: {reason}")]
    Unsupported {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The external probe failed or produced unusable output.
    #[error("Probe failed for {path}: {message}")]
    Probe {
        /// File being probed
        path: PathBuf,
        /// Failure description
        message: String,
    },
}

impl ExtractError {
    /// Wrap an I/O error for the given path.
    #[must_use]
    pub fn io(path: &Path, error: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source: Arc::new(error),
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Timeout { path, .. }
            | Self::Unsupported { path, .. }
            | Self::Probe { path, .. } => path,
        }
    }
}
