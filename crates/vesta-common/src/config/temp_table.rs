//! Temporary table configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_MAX_HEAP_TABLE_SIZE, DEFAULT_MAX_UNIQUE_KEY_LENGTH, HASH_COLUMN_WIDTH,
    MIN_HEAP_TABLE_SIZE,
};

/// Sizing of materialized temporary tables.
///
/// Tables start in memory and are moved to disk once they outgrow
/// `max_heap_table_size` (or `max_heap_rows`, whichever is hit first).
///
/// # Example
///
/// ```rust
/// use vesta_common::config::TempTableConfig;
///
/// let config = TempTableConfig::default();
/// assert_eq!(config.max_heap_table_size, 16 * 1024 * 1024);
/// assert!(config.max_heap_rows.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempTableConfig {
    /// Capacity of the in-memory representation in bytes.
    /// Default: 16777216 (16 MB)
    pub max_heap_table_size: usize,

    /// Optional row cap of the in-memory representation.
    /// Default: none
    pub max_heap_rows: Option<u64>,

    /// Optional byte cap of the on-disk representation.
    /// Default: none (bounded by the filesystem)
    pub max_disk_table_size: Option<u64>,

    /// Directory for on-disk table files.
    /// Default: the system temporary directory
    pub tmp_dir: Option<PathBuf>,

    /// Widest row a native unique key may cover, in bytes.
    /// Default: 3072
    pub max_unique_key_length: usize,
}

impl Default for TempTableConfig {
    fn default() -> Self {
        Self {
            max_heap_table_size: DEFAULT_MAX_HEAP_TABLE_SIZE,
            max_heap_rows: None,
            max_disk_table_size: None,
            tmp_dir: None,
            max_unique_key_length: DEFAULT_MAX_UNIQUE_KEY_LENGTH,
        }
    }
}

impl TempTableConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a small configuration for testing.
    ///
    /// In-memory tables hold at most 64 rows so promotion is easy to reach.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_heap_table_size: MIN_HEAP_TABLE_SIZE,
            max_heap_rows: Some(64),
            ..Default::default()
        }
    }

    /// Sets the in-memory capacity in bytes.
    #[must_use]
    pub fn with_max_heap_table_size(mut self, bytes: usize) -> Self {
        self.max_heap_table_size = bytes;
        self
    }

    /// Sets the in-memory row cap.
    #[must_use]
    pub fn with_max_heap_rows(mut self, rows: u64) -> Self {
        self.max_heap_rows = Some(rows);
        self
    }

    /// Sets the on-disk byte cap.
    #[must_use]
    pub fn with_max_disk_table_size(mut self, bytes: u64) -> Self {
        self.max_disk_table_size = Some(bytes);
        self
    }

    /// Sets the directory for on-disk table files.
    #[must_use]
    pub fn with_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(dir.into());
        self
    }

    /// Sets the maximum native unique key width.
    #[must_use]
    pub fn with_max_unique_key_length(mut self, bytes: usize) -> Self {
        self.max_unique_key_length = bytes;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_heap_table_size < MIN_HEAP_TABLE_SIZE {
            return Err(format!(
                "max_heap_table_size must be at least {MIN_HEAP_TABLE_SIZE} bytes"
            ));
        }

        if self.max_heap_rows == Some(0) {
            return Err("max_heap_rows must be greater than 0".to_string());
        }

        if self.max_unique_key_length < HASH_COLUMN_WIDTH {
            return Err(format!(
                "max_unique_key_length must be at least {HASH_COLUMN_WIDTH} bytes"
            ));
        }

        if let Some(dir) = &self.tmp_dir {
            if dir.as_os_str().is_empty() {
                return Err("tmp_dir must not be empty".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TempTableConfig::default().validate().is_ok());
        assert!(TempTableConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_heap() {
        let config = TempTableConfig::default().with_max_heap_table_size(1024);
        let err = config.validate().unwrap_err();
        assert!(err.contains("max_heap_table_size"));
    }

    #[test]
    fn test_validate_rejects_zero_rows() {
        let config = TempTableConfig::default().with_max_heap_rows(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_tmp_dir() {
        let config = TempTableConfig::default().with_tmp_dir("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TempTableConfig =
            serde_json::from_str(r#"{"max_heap_rows": 10, "tmp_dir": "/var/tmp"}"#).unwrap();
        assert_eq!(config.max_heap_rows, Some(10));
        assert_eq!(config.tmp_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(config.max_heap_table_size, DEFAULT_MAX_HEAP_TABLE_SIZE);
        assert_eq!(config.max_unique_key_length, DEFAULT_MAX_UNIQUE_KEY_LENGTH);
    }
}
