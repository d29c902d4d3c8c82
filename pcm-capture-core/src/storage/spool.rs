use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;

/// Append-only writer for the raw PCM spool.
///
/// Owned exclusively by the capture worker. The spool holds headerless PCM
/// exactly as read from the device; the container header is only computed
/// once the final length is known.
pub struct SpoolWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    total_bytes_written: u64,
}

impl SpoolWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            file: None,
            total_bytes_written: 0,
        }
    }

    /// Create (or truncate) the spool file.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CaptureError::StorageError(format!("failed to create directory: {}", e))
                })?;
            }
        }

        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create spool: {}", e)))?;

        self.file = Some(BufWriter::new(file));
        self.total_bytes_written = 0;
        Ok(())
    }

    pub fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("spool is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::StorageError(format!("spool write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush and close the spool, returning the number of bytes it holds.
    pub fn close(&mut self) -> Result<u64, CaptureError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("spool is not open".into()))?;
        let file = file
            .into_inner()
            .map_err(|e| CaptureError::StorageError(format!("spool flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| CaptureError::StorageError(format!("spool sync failed: {}", e)))?;
        Ok(self.total_bytes_written)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Compute the SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let file = File::open(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| CaptureError::StorageError(format!("checksum read failed: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
