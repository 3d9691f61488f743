//! Metadata extraction.
//!
//! [`MetadataExtractor`] is the single seam between the matching core and the
//! tag-reading libraries. [`LoftyExtractor`] parses containers in-process with
//! `lofty` and, when that fails or leaves stream properties empty, fills the
//! gaps from a bounded [`FfprobeProbe`].

use std::path::Path;

use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;

use super::probe::{FfprobeProbe, ProbeInfo};
use super::{normalize_opt, Container, ExtractError, FormatTier, MetadataRecord};

/// A record plus the non-fatal problems met while building it.
///
/// Warnings never prevent a record from being produced; they end up in the
/// scan report next to the file they concern.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: MetadataRecord,
    pub warnings: Vec<ExtractError>,
}

impl Extraction {
    /// An extraction without warnings.
    #[must_use]
    pub fn clean(record: MetadataRecord) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }
}

/// Produces a [`MetadataRecord`] for a file.
///
/// Implementations must be shareable across the worker pool.
pub trait MetadataExtractor: Send + Sync {
    /// Extract metadata for one file.
    ///
    /// # Errors
    ///
    /// Only when the file itself cannot be accessed. Parse failures and
    /// probe timeouts are reported as [`Extraction::warnings`].
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError>;
}

/// `lofty` adapter with an optional `ffprobe` fallback.
#[derive(Debug, Clone, Default)]
pub struct LoftyExtractor {
    probe: Option<FfprobeProbe>,
}

impl LoftyExtractor {
    /// Create an extractor without a probe fallback.
    #[must_use]
    pub fn new() -> Self {
        Self { probe: None }
    }

    /// Enable the probe fallback.
    #[must_use]
    pub fn with_probe(mut self, probe: FfprobeProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    fn container_for(file_type: &FileType, path: &Path) -> Container {
        match file_type {
            FileType::Mpeg => Container::Mp3,
            FileType::Flac => Container::Flac,
            FileType::Vorbis => Container::Ogg,
            FileType::Opus => Container::Opus,
            FileType::Mp4 => Container::M4a,
            FileType::Wav => Container::Wav,
            FileType::Aiff => Container::Aiff,
            _ => Container::from_path(path),
        }
    }

    fn fill_from_tagged(record: &mut MetadataRecord, tagged: &TaggedFile) {
        let props = tagged.properties();

        let duration_ms = u64::try_from(props.duration().as_millis()).unwrap_or(u64::MAX);
        record.duration_ms = (duration_ms > 0).then_some(duration_ms);
        record.sample_rate = props.sample_rate().filter(|&r| r > 0);
        record.bit_rate = props
            .audio_bitrate()
            .or_else(|| props.overall_bitrate())
            .filter(|&kbps| kbps > 0)
            .map(|kbps| kbps.saturating_mul(1000));
        record.bit_depth = props.bit_depth().filter(|&d| d > 0);

        let container = Self::container_for(&tagged.file_type(), &record.path);
        record.container = container;
        record.format = FormatTier::classify(container, record.bit_depth);

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            record.title = normalize_opt(tag.title().as_deref());
            record.artist = normalize_opt(tag.artist().as_deref());
            record.album = normalize_opt(tag.album().as_deref());
            record.track = tag.track().filter(|&t| t > 0);
        }
    }

    fn fill_from_probe(record: &mut MetadataRecord, info: &ProbeInfo) {
        record.duration_ms = record.duration_ms.or(info.duration_ms);
        record.sample_rate = record.sample_rate.or(info.sample_rate);
        record.bit_rate = record.bit_rate.or(info.bit_rate);
        record.bit_depth = record.bit_depth.or(info.bit_depth);
        if record.title.is_none() {
            record.title.clone_from(&info.title);
        }
        if record.artist.is_none() {
            record.artist.clone_from(&info.artist);
        }
        if record.album.is_none() {
            record.album.clone_from(&info.album);
        }
        record.track = record.track.or(info.track);

        record.format = if info.is_lossless_codec() {
            FormatTier::Lossless
        } else {
            FormatTier::classify(record.container, record.bit_depth)
        };
    }

    fn needs_probe(record: &MetadataRecord, parsed: bool) -> bool {
        !parsed || record.sample_rate.is_none() || record.duration_ms.is_none()
    }
}

impl MetadataExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let size = std::fs::metadata(path)
            .map_err(|e| ExtractError::io(path, e))?
            .len();
        let mut record = MetadataRecord::new(path, size);
        let mut warnings = Vec::new();

        let parse_error = match Probe::open(path).and_then(|p| p.read()) {
            Ok(tagged) => {
                Self::fill_from_tagged(&mut record, &tagged);
                None
            }
            Err(e) => {
                log::debug!("Tag parser failed for {}: {}", path.display(), e);
                Some(ExtractError::Unsupported {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        let mut probed = false;
        if let Some(probe) = &self.probe {
            if Self::needs_probe(&record, parse_error.is_none()) {
                log::trace!("Probing {}", path.display());
                match probe.probe(path) {
                    Ok(Some(info)) => {
                        Self::fill_from_probe(&mut record, &info);
                        probed = true;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("{}", e);
                        warnings.push(e);
                    }
                }
            }
        }

        // A file the probe could read is not unreadable.
        if let Some(err) = parse_error {
            if !probed {
                warnings.push(err);
            }
        }

        Ok(Extraction { record, warnings })
    }
}
