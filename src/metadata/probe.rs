//! Bounded `ffprobe` fallback.
//!
//! Used when the in-process parser cannot read a container (WMA, damaged
//! headers) or leaves stream properties empty. The child process runs with a
//! wall-clock bound; on expiry it is killed and the caller gets
//! [`ExtractError::Timeout`] for that file only.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::{normalize_opt, ExtractError};

/// Default bound on a single probe invocation.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to keep reading after the probe exits. A background process
/// that inherited the pipe must not hold the scan hostage.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Configuration for [`FfprobeProbe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Program to run, looked up on `PATH` when not absolute
    pub program: PathBuf,
    /// Wall-clock bound for one invocation
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stream and tag facts reported by the probe. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeInfo {
    pub codec: Option<String>,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub bit_rate: Option<u32>,
    pub bit_depth: Option<u8>,
    /// Normalized title tag
    pub title: Option<String>,
    /// Normalized artist tag
    pub artist: Option<String>,
    /// Normalized album tag
    pub album: Option<String>,
    pub track: Option<u32>,
}

impl ProbeInfo {
    /// Whether the codec is a lossless one.
    #[must_use]
    pub fn is_lossless_codec(&self) -> bool {
        self.codec.as_deref().is_some_and(|c| {
            matches!(c, "flac" | "alac" | "wmalossless" | "ape" | "wavpack") || c.starts_with("pcm_")
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    bit_rate: Option<String>,
    bits_per_raw_sample: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: std::collections::HashMap<String, String>,
}

/// Runs `ffprobe` with a time bound.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe {
    config: ProbeConfig,
}

impl FfprobeProbe {
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a file.
    ///
    /// Returns `Ok(None)` when the probe program is not installed, which is
    /// not an error: the record simply keeps the fields it already has.
    ///
    /// # Errors
    ///
    /// [`ExtractError::Timeout`] if the bound expires, [`ExtractError::Probe`]
    /// on a non-zero exit or unparseable output.
    pub fn probe(&self, path: &Path) -> Result<Option<ProbeInfo>, ExtractError> {
        let spawned = Command::new(&self.config.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
                "-select_streams",
                "a:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(
                    "Probe program {} not found, skipping fallback",
                    self.config.program.display()
                );
                return Ok(None);
            }
            Err(e) => return Err(ExtractError::io(path, e)),
        };

        // Drain stdout on a helper thread so a chatty child cannot block on a
        // full pipe while we poll for exit.
        let output_rx = spawn_reader(child.stdout.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.config.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Not waited for: the reader exits after its next read
                    // returns, which a grandchild holding the pipe may delay.
                    drop(output_rx);
                    log::warn!(
                        "Probe exceeded {:?} for {}, killed",
                        self.config.timeout,
                        path.display()
                    );
                    return Err(ExtractError::Timeout {
                        path: path.to_path_buf(),
                        timeout: self.config.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExtractError::io(path, e));
                }
            }
        };

        let output = drain_output(&output_rx, PIPE_GRACE);
        if !status.success() {
            return Err(ExtractError::Probe {
                path: path.to_path_buf(),
                message: format!("exited with {status}"),
            });
        }

        parse_probe_output(&output)
            .map(Some)
            .map_err(|e| ExtractError::Probe {
                path: path.to_path_buf(),
                message: format!("invalid JSON output: {e}"),
            })
    }
}

/// Forward stdout in chunks until EOF, a read error, or the receiver hangs up.
fn spawn_reader(stdout: Option<ChildStdout>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut out) = stdout {
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match out.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
    }
    rx
}

/// Collect forwarded output until the pipe closes or `grace` runs out.
fn drain_output(rx: &Receiver<Vec<u8>>, grace: Duration) -> Vec<u8> {
    let deadline = Instant::now() + grace;
    let mut output = Vec::new();
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => output.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("Probe output pipe still open after exit, using what was read");
                break;
            }
        }
    }
    output
}

/// Parse `ffprobe -print_format json` output into a [`ProbeInfo`].
///
/// # Errors
///
/// Returns the JSON error if the output is not valid probe JSON.
pub fn parse_probe_output(bytes: &[u8]) -> Result<ProbeInfo, serde_json::Error> {
    let output: ProbeOutput = serde_json::from_slice(bytes)?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().is_none_or(|t| t == "audio"));

    let mut info = ProbeInfo::default();
    if let Some(stream) = stream {
        info.codec = stream.codec_name.clone();
        info.sample_rate = parse_positive(stream.sample_rate.as_deref());
        info.bit_rate = parse_positive(stream.bit_rate.as_deref());
        info.bit_depth = parse_positive(stream.bits_per_raw_sample.as_deref());
        info.duration_ms = parse_seconds_ms(stream.duration.as_deref());
    }

    if let Some(format) = &output.format {
        if info.duration_ms.is_none() {
            info.duration_ms = parse_seconds_ms(format.duration.as_deref());
        }
        if info.bit_rate.is_none() {
            info.bit_rate = parse_positive(format.bit_rate.as_deref());
        }

        // Tag keys vary in case between containers
        let tag = |key: &str| {
            format
                .tags
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        };
        info.title = normalize_opt(tag("title"));
        info.artist = normalize_opt(tag("artist"));
        info.album = normalize_opt(tag("album"));
        // "3/12" style track numbers keep only the position
        info.track = tag("track")
            .and_then(|t| t.split('/').next())
            .and_then(|t| t.trim().parse().ok());
    }

    Ok(info)
}

fn parse_positive<T>(value: Option<&str>) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
}

fn parse_seconds_ms(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| (secs * 1000.0).round() as u64)
}
