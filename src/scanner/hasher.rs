//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] produces two kinds of digest:
//!
//! - a **quick hash** over the file size plus the first and last
//!   [`QUICK_HASH_WINDOW`] bytes, used to split size collisions cheaply;
//! - a **full hash** over the entire content, read in [`CHUNK_SIZE`] pieces so
//!   memory stays bounded regardless of file size.
//!
//! Digests depend only on file bytes, never on timestamps or other
//! filesystem metadata, so they are stable across runs and platforms.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Read buffer size for streaming digests.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes taken from each end of a file for the quick hash.
pub const QUICK_HASH_WINDOW: u64 = 8 * 1024;

/// A file paired with its full content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    /// Path of the hashed file
    pub path: PathBuf,
    /// Full BLAKE3 digest of the file content
    pub digest: Hash,
    /// File size in bytes
    pub size: u64,
}

impl DigestEntry {
    /// Create a new digest entry.
    #[must_use]
    pub fn new(path: PathBuf, digest: Hash, size: u64) -> Self {
        Self { path, digest, size }
    }
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Override the read chunk size (minimum 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Abort in-flight reads between chunks once this flag is set.
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

    /// Hash the file size together with its head and tail windows.
    ///
    /// Files no larger than two windows are covered completely.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn quick_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&size.to_le_bytes());

        let mut window = vec![0u8; QUICK_HASH_WINDOW as usize];
        let head = read_up_to(&mut file, &mut window).map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&window[..head]);

        if size > QUICK_HASH_WINDOW * 2 {
            file.seek(SeekFrom::End(-(QUICK_HASH_WINDOW as i64)))
                .map_err(|e| HashError::from_io(path, e))?;
            let tail =
                read_up_to(&mut file, &mut window).map_err(|e| HashError::from_io(path, e))?;
            hasher.update(&window[..tail]);
        } else if size > QUICK_HASH_WINDOW {
            let rest =
                read_up_to(&mut file, &mut window).map_err(|e| HashError::from_io(path, e))?;
            hasher.update(&window[..rest]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Hash the complete file content in bounded chunks.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read, or
    /// [`HashError::Interrupted`] if cancellation was requested mid-file.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Fill as much of `buf` as the reader allows, stopping at EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;
    hash.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
