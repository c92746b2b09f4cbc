//! Size and ratio metrics for compress/decompress reports.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// compressed / original
    pub ratio: f64,
    /// (1 - compressed / original) * 100, negative when the container is larger.
    pub space_saved_percent: f64,
    pub bytes_saved: i64,
    /// Shannon entropy of the input in bits per byte.
    pub entropy_bits: f64,
    /// Mean Huffman code length in bits per input byte.
    pub avg_code_length: f64,
}

impl CompressionStats {
    pub fn new(original_size: u64, compressed_size: u64) -> Self {
        let ratio = if original_size == 0 {
            1.0
        } else {
            compressed_size as f64 / original_size as f64
        };
        Self {
            original_size,
            compressed_size,
            ratio,
            space_saved_percent: (1.0 - ratio) * 100.0,
            bytes_saved: original_size as i64 - compressed_size as i64,
            entropy_bits: 0.0,
            avg_code_length: 0.0,
        }
    }

    pub fn with_coding(mut self, entropy_bits: f64, total_bits: u64) -> Self {
        self.entropy_bits = entropy_bits;
        if self.original_size > 0 {
            self.avg_code_length = total_bits as f64 / self.original_size as f64;
        }
        self
    }
}

impl std::fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "original size:    {} bytes", self.original_size)?;
        writeln!(f, "compressed size:  {} bytes", self.compressed_size)?;
        writeln!(f, "ratio:            {:.4}", self.ratio)?;
        writeln!(
            f,
            "space saved:      {:.2}% ({} bytes)",
            self.space_saved_percent, self.bytes_saved
        )?;
        write!(
            f,
            "entropy:          {:.3} bits/byte (codes average {:.3})",
            self.entropy_bits, self.avg_code_length
        )
    }
}
