//! hub-compress: lossless byte-stream compression with static Huffman coding.
//!
//! The pipeline for compression:
//! - count byte frequencies ([`frequency`])
//! - build the prefix-code tree ([`tree`]) and derive per-byte codes ([`codes`])
//! - bit-pack the input ([`bits`]) into a self-describing HUB1 container ([`container`])
//!
//! Decompression parses the container, rebuilds the same tree from the stored
//! frequencies and walks it bit by bit.

pub mod bits;
pub mod codes;
pub mod config;
pub mod container;
pub mod error;
pub mod frequency;
pub mod stats;
pub mod tree;

use crate::config::CompressionConfig;
use crate::container::{Container, ContainerSummary, Decoded, Integrity};
use crate::error::{CompressError, Result};
use crate::stats::CompressionStats;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use crate::error::ErrorKind;

/// Result of a successful file compression.
#[derive(Debug, Clone, Serialize)]
pub struct CompressReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub symbol_count: usize,
    pub total_bits: u64,
    pub stats: CompressionStats,
}

/// Result of a file decompression that produced output.
#[derive(Debug, Clone, Serialize)]
pub struct DecompressReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes_written: u64,
    pub integrity: Integrity,
    pub stats: CompressionStats,
}

/// The main compressor engine
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    /// Create a new compressor with the given configuration
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress `data` into a serialized container.
    pub fn compress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.check_size(data.len() as u64)?;
        Ok(Container::encode(data)?.to_bytes())
    }

    /// Decompress a serialized container.
    ///
    /// With `strict_integrity` any integrity mismatch is an error. Otherwise the
    /// recovered bytes are returned and the mismatch is carried in the result.
    pub fn decompress_bytes(&self, bytes: &[u8]) -> Result<Decoded> {
        self.check_size(bytes.len() as u64)?;
        let decoded = Container::parse(bytes)?.decode()?;
        self.apply_integrity_policy(decoded)
    }

    /// Compress `input` to `output`, or to `input` + the compressed extension.
    pub fn compress_file(&self, input: &Path, output: Option<&Path>) -> Result<CompressReport> {
        let data = self.read_input(input)?;
        let container = Container::encode(&data)?;
        let bytes = container.to_bytes();

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| with_appended_extension(input, &self.config.compressed_extension));
        write_output(&output, &bytes)?;

        let stats = CompressionStats::new(data.len() as u64, bytes.len() as u64)
            .with_coding(container.frequencies().entropy_bits(), container.total_bits());
        info!(
            input = %input.display(),
            output = %output.display(),
            original = stats.original_size,
            compressed = stats.compressed_size,
            "compression complete"
        );

        Ok(CompressReport {
            input: input.to_path_buf(),
            output,
            symbol_count: container.frequencies().symbol_count(),
            total_bits: container.total_bits(),
            stats,
        })
    }

    /// Decompress `input` to `output`, or to `input` + the decompressed extension.
    pub fn decompress_file(&self, input: &Path, output: Option<&Path>) -> Result<DecompressReport> {
        let bytes = self.read_input(input)?;
        let container = Container::parse(&bytes)?;
        let decoded = self.apply_integrity_policy(container.decode()?)?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| with_appended_extension(input, &self.config.decompressed_extension));
        write_output(&output, &decoded.data)?;

        let stats = CompressionStats::new(decoded.data.len() as u64, bytes.len() as u64)
            .with_coding(container.frequencies().entropy_bits(), container.total_bits());
        info!(
            input = %input.display(),
            output = %output.display(),
            bytes = decoded.data.len(),
            "decompression complete"
        );

        Ok(DecompressReport {
            input: input.to_path_buf(),
            output,
            bytes_written: decoded.data.len() as u64,
            integrity: decoded.integrity,
            stats,
        })
    }

    /// Describe a container file without decoding its payload.
    pub fn inspect(&self, input: &Path) -> Result<ContainerSummary> {
        let bytes = self.read_input(input)?;
        Container::parse(&bytes)?.summary()
    }

    fn apply_integrity_policy(&self, decoded: Decoded) -> Result<Decoded> {
        if decoded.integrity.is_ok() {
            return Ok(decoded);
        }
        if self.config.strict_integrity {
            return Err(decoded
                .integrity
                .into_error()
                .unwrap_or_else(|| CompressError::CorruptPayload("integrity check failed".into())));
        }
        warn!(integrity = ?decoded.integrity, "integrity mismatch, keeping recovered bytes");
        Ok(decoded)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.config.max_input_size {
            return Err(CompressError::InputTooLarge {
                size,
                limit: self.config.max_input_size,
            });
        }
        Ok(())
    }

    fn read_input(&self, path: &Path) -> Result<Vec<u8>> {
        let read_err = |source| CompressError::ReadInput {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(read_err)?.len();
        self.check_size(size)?;
        let data = std::fs::read(path).map_err(read_err)?;
        if data.is_empty() {
            return Err(CompressError::EmptyInput);
        }
        Ok(data)
    }
}

/// Compress a file with the default configuration.
pub fn compress_file(input: &Path, output: Option<&Path>) -> Result<CompressReport> {
    Compressor::default().compress_file(input, output)
}

/// Decompress a file with the default configuration.
pub fn decompress_file(input: &Path, output: Option<&Path>) -> Result<DecompressReport> {
    Compressor::default().decompress_file(input, output)
}

/// `archive.bin` + `HUB` -> `archive.bin.HUB`
pub fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| {
        // Don't leave a half-written file behind.
        if let Err(cleanup) = std::fs::remove_file(path) {
            debug!(path = %path.display(), error = %cleanup, "no partial output to remove");
        }
        CompressError::WriteOutput {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_roundtrip() {
        let compressor = Compressor::default();
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = compressor.compress_bytes(data).unwrap();
        let decoded = compressor.decompress_bytes(&compressed).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.integrity, Integrity::Ok);
    }

    #[test]
    fn test_compress_empty() {
        let compressor = Compressor::default();
        assert!(matches!(
            compressor.compress_bytes(b""),
            Err(CompressError::EmptyInput)
        ));
    }

    #[test]
    fn test_size_limit() {
        let compressor = Compressor::new(CompressionConfig {
            max_input_size: 4,
            ..CompressionConfig::default()
        });
        let err = compressor.compress_bytes(b"hello").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_lenient_mode_returns_partial_data() {
        let data = b"lenient decoding keeps what it can".repeat(3);
        let mut bytes = Compressor::default().compress_bytes(&data).unwrap();
        let payload_end = bytes.len() - container::TRAILER_LEN;
        bytes.remove(payload_end - 1);

        assert!(Compressor::default().decompress_bytes(&bytes).unwrap_err().is_integrity());

        let lenient = Compressor::new(CompressionConfig {
            strict_integrity: false,
            ..CompressionConfig::default()
        });
        let decoded = lenient.decompress_bytes(&bytes).unwrap();
        assert!(!decoded.integrity.is_ok());
        assert!(data.starts_with(&decoded.data[..decoded.data.len().saturating_sub(1)]));
    }

    #[test]
    fn test_lenient_single_symbol_corruption() {
        let mut bytes = Compressor::default().compress_bytes(&[b'A'; 16]).unwrap();
        let last_payload = bytes.len() - container::TRAILER_LEN - 1;
        bytes[last_payload] |= 0x01;

        let err = Compressor::default().decompress_bytes(&bytes).unwrap_err();
        assert!(err.is_integrity());

        let lenient = Compressor::new(CompressionConfig {
            strict_integrity: false,
            ..CompressionConfig::default()
        });
        let decoded = lenient.decompress_bytes(&bytes).unwrap();
        assert_eq!(decoded.data, vec![b'A'; 15]);
        assert_eq!(decoded.integrity, Integrity::CorruptPayload { position: 15 });
    }

    #[test]
    fn test_decompress_report_carries_coding_stats() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("abacaba.txt");
        std::fs::write(&input, b"ABACABA").unwrap();
        let packed = Compressor::default().compress_file(&input, None).unwrap();

        let report = Compressor::default().decompress_file(&packed.output, None).unwrap();
        assert_eq!(report.stats.entropy_bits, packed.stats.entropy_bits);
        assert!(report.stats.entropy_bits > 1.0);
        assert!((report.stats.avg_code_length - 10.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_write_output_failure_keeps_existing_path() {
        // Writing over a directory fails, and the cleanup must not remove it.
        let dir = tempfile::tempdir().unwrap();
        let err = write_output(dir.path(), b"data").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_appended_extension() {
        let path = with_appended_extension(Path::new("dir/archive.bin"), "HUB");
        assert_eq!(path, PathBuf::from("dir/archive.bin.HUB"));
    }

    #[test]
    fn test_compression_ratio() {
        let compressor = Compressor::default();
        let data = "aaaaaaaaaa".repeat(100);
        let compressed = compressor.compress_bytes(data.as_bytes()).unwrap();
        assert!(compressed.len() < data.len() / 4);
    }
}
