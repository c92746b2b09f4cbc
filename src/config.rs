//! Configuration for hub-compress

use crate::error::{CompressError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Extension appended to the input path when compressing without an explicit output.
    pub compressed_extension: String,
    /// Extension appended to the input path when decompressing without an explicit output.
    pub decompressed_extension: String,
    pub max_input_size: u64,
    /// Fail on integrity mismatches instead of writing what could be decoded.
    pub strict_integrity: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            compressed_extension: "HUB".to_string(),
            decompressed_extension: "txt".to_string(),
            max_input_size: 1024 * 1024 * 1024, // 1 GiB
            strict_integrity: true,
        }
    }
}

impl CompressionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CompressError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CompressError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compressed_extension.is_empty() || self.decompressed_extension.is_empty() {
            return Err(CompressError::Config("file extensions must not be empty".into()));
        }
        if self.max_input_size == 0 {
            return Err(CompressError::Config("max_input_size must be positive".into()));
        }
        Ok(())
    }
}
