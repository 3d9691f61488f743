//! Layered application configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. the TOML file (`<config dir>/tunedupe/config.toml`, or `--config`)
//! 3. environment variables, `TUNEDUPE_` prefix, `__` for nesting
//!    (`TUNEDUPE_FUZZY__DURATION_TOLERANCE_MS=1500`)
//! 4. command-line flags, passed in as [`Overrides`]
//!
//! The merged [`Config`] is turned into the explicit configuration structs
//! the pipeline takes ([`FinderConfig`], [`ProbeConfig`]); nothing in the
//! library reads ambient state.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{DetectMode, FinderConfig, FuzzyConfig};
use crate::metadata::probe::DEFAULT_PROBE_TIMEOUT;
use crate::metadata::ProbeConfig;
use crate::scanner::WalkerConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TUNEDUPE_";

const EXAMPLE_CONFIG: &str = r#"# tunedupe configuration
#
# Every key is optional. Environment variables override this file
# (TUNEDUPE_IO_THREADS=8, TUNEDUPE_FUZZY__MERGE_EXACT_GROUPS=true) and
# command-line flags override both.

# Worker threads for hashing and tag reading
io_threads = 4

# Descend into subdirectories
recursive = true

# Report the plan without deleting anything unless --apply is given
dry_run = true

# Remove files permanently instead of moving them to the trash
permanent = false

# Detection strategy when --mode is not given: "exact", "fuzzy" or "both"
default_mode = "exact"

# Bound on one ffprobe invocation, in seconds
probe_timeout_secs = 10

# ffprobe executable, looked up on PATH when not absolute
ffprobe_path = "ffprobe"

[fuzzy]
# Maximum duration difference between two copies of a song
duration_tolerance_ms = 2000

# Link a whole exact-duplicate group when any member matches by metadata
merge_exact_groups = false

# Match songs with an unknown duration (always flagged for review)
match_missing_duration = true

# Match title-less files by artist, album and track number (flagged for review)
album_track_fallback = false
"#;

/// Errors from loading or writing configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    #[error("Configuration file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub io_threads: usize,
    pub recursive: bool,
    pub dry_run: bool,
    pub permanent: bool,
    pub default_mode: DetectMode,
    pub probe_timeout_secs: u64,
    pub ffprobe_path: PathBuf,
    pub fuzzy: FuzzyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            recursive: true,
            dry_run: true,
            permanent: false,
            default_mode: DetectMode::Exact,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            ffprobe_path: PathBuf::from("ffprobe"),
            fuzzy: FuzzyConfig::default(),
        }
    }
}

/// Command-line values layered over every other source.
///
/// `None` leaves the lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<DetectMode>,
    pub fuzzy: FuzzyOverrides,
}

/// Command-line values for the `[fuzzy]` table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FuzzyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_tolerance_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_exact_groups: Option<bool>,
}

impl Config {
    /// Default file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tunedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The layered sources, before extraction.
    ///
    /// `path` replaces the default file location. A missing file is an empty
    /// layer.
    #[must_use]
    pub fn figment(path: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        if let Some(file) = file {
            log::debug!("Configuration file: {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
    }

    /// Load and validate the effective configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Load`] for unparsable sources, [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path, overrides).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid("io_threads must be at least 1".into()));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented example file to `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::AlreadyExists`] if a file is already there,
    /// [`ConfigError::Io`] if it cannot be written.
    pub fn write_example(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, EXAMPLE_CONFIG).map_err(io_err)?;
        log::info!("Wrote example configuration to {}", path.display());
        Ok(())
    }

    /// Pipeline configuration for this run.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_mode(self.default_mode)
            .with_walker_config(WalkerConfig::default().with_recursive(self.recursive))
            .with_fuzzy_config(self.fuzzy.clone())
    }

    /// External probe configuration.
    #[must_use]
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig::default()
            .with_program(&self.ffprobe_path)
            .with_timeout(Duration::from_secs(self.probe_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.io_threads, 4);
        assert!(config.dry_run);
        assert_eq!(config.fuzzy.duration_tolerance_ms, 2_000);
    }

    #[test]
    fn test_example_file_parses_to_defaults() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(EXAMPLE_CONFIG))
            .extract()
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_win_and_keep_nested_keys() {
        let overrides = Overrides {
            io_threads: Some(2),
            default_mode: Some(DetectMode::Both),
            fuzzy: FuzzyOverrides {
                duration_tolerance_ms: Some(500),
                merge_exact_groups: None,
            },
            ..Overrides::default()
        };
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string("[fuzzy]\nmerge_exact_groups = true\nduration_tolerance_ms = 9000"))
            .merge(Serialized::defaults(&overrides))
            .extract()
            .unwrap();

        assert_eq!(config.io_threads, 2);
        assert_eq!(config.default_mode, DetectMode::Both);
        assert_eq!(config.fuzzy.duration_tolerance_ms, 500);
        assert!(config.fuzzy.merge_exact_groups);
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = Config {
            io_threads: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_toml_round_trips_keys() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("io_threads = 4"));
        assert!(text.contains("default_mode = \"exact\""));
        assert!(text.contains("[fuzzy]"));
    }

    #[test]
    fn test_finder_and_probe_config() {
        let config = Config {
            io_threads: 3,
            recursive: false,
            probe_timeout_secs: 2,
            ..Config::default()
        };
        let finder = config.finder_config();
        assert_eq!(finder.io_threads, 3);
        assert!(!finder.walker_config.recursive);
        assert_eq!(config.probe_config().timeout, Duration::from_secs(2));
    }
}
