//! Configuration for the ASDM storage manager
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::error::{Result, StManError};

/// Main configuration for a storage manager instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Location Configuration
    // -------------------------------------------------------------------------
    /// Table directory holding the index sidecar.
    /// Internal structure:
    ///   {table_dir}/
    ///     ├── table.asdmindex   (row-range index)
    ///     └── *.bdf             (backing data files, unless bdf_dir is set)
    pub table_dir: PathBuf,

    /// File name of the index sidecar inside `table_dir`
    pub index_file_name: String,

    /// Directory used to resolve relative BDF file names (defaults to table_dir)
    pub bdf_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Read Configuration
    // -------------------------------------------------------------------------
    /// Verify the CRC32 of the index body on load
    pub verify_index_checksum: bool,

    /// Upper bound on a single raw block (in bytes)
    pub max_block_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_dir: PathBuf::from("."),
            index_file_name: "table.asdmindex".to_string(),
            bdf_dir: None,
            verify_index_checksum: true,
            max_block_bytes: 256 * 1024 * 1024, // 256 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no table can be opened with
    pub fn validate(&self) -> Result<()> {
        if self.index_file_name.is_empty() {
            return Err(StManError::Config("index_file_name is empty".to_string()));
        }
        if self.max_block_bytes == 0 {
            return Err(StManError::Config("max_block_bytes must be > 0".to_string()));
        }
        Ok(())
    }

    /// Full path of the index sidecar
    pub fn index_path(&self) -> PathBuf {
        self.table_dir.join(&self.index_file_name)
    }

    /// Resolve a BDF file name from the index to a path on disk
    ///
    /// Absolute names are used as-is.
    pub fn resolve_bdf(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.bdf_dir
            .as_deref()
            .unwrap_or(&self.table_dir)
            .join(path)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table directory
    pub fn table_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table_dir = path.into();
        self
    }

    /// Set the index sidecar file name
    pub fn index_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_file_name = name.into();
        self
    }

    /// Set the directory BDF names are resolved against
    pub fn bdf_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bdf_dir = Some(path.into());
        self
    }

    /// Enable or disable index checksum verification
    pub fn verify_index_checksum(mut self, verify: bool) -> Self {
        self.config.verify_index_checksum = verify;
        self
    }

    /// Set the maximum raw block size (in bytes)
    pub fn max_block_bytes(mut self, bytes: u64) -> Self {
        self.config.max_block_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
