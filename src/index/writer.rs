//! Index Writer
//!
//! Writes index sidecars in the format `IndexStore::load` reads. Used by
//! importers that lay out BDF blocks; the storage manager itself never
//! writes.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bincode::Options;

use crate::error::{Result, StManError};

use super::store::validate_entries;
use super::{body_options, EntryRecord, IndexBody, IndexEntry, END_TAG, START_TAG, VERSION};

/// Metadata describing a finished index file
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub path: PathBuf,
    pub entry_count: usize,
    pub file_count: usize,
    pub total_rows: u64,
    pub file_size: u64,
}

/// Builder for index files; entries must be added in row order
pub struct IndexWriter {
    /// Output file path
    path: PathBuf,
    /// Byte order of the BDF samples being described
    big_endian: bool,
    file_names: Vec<String>,
    entries: Vec<IndexEntry>,
}

impl IndexWriter {
    /// Start a new index at `path`; nothing is written until `finish()`
    pub fn create(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            big_endian: false,
            file_names: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Declare the byte order the BDF samples were written with
    pub fn big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    /// Register a backing file name, returning its file index
    pub fn add_file(&mut self, name: impl Into<String>) -> u32 {
        self.file_names.push(name.into());
        (self.file_names.len() - 1) as u32
    }

    /// Add an entry (must start after the previous entry)
    pub fn add_entry(&mut self, entry: IndexEntry) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if entry.row_start <= last.row_start {
                return Err(StManError::corrupt(
                    &self.path,
                    format!(
                        "entry row {} added after row {}",
                        entry.row_start, last.row_start
                    ),
                ));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Validate, then write header, body and footer
    pub fn finish(self) -> Result<IndexSummary> {
        validate_entries(&self.path, &self.entries, self.file_names.len())?;

        let body = IndexBody {
            big_endian: self.big_endian,
            file_names: self.file_names.clone(),
            entries: self.entries.iter().map(EntryRecord::from).collect(),
        };
        let body_bytes = body_options()
            .serialize(&body)
            .map_err(|e| StManError::Serialization(e.to_string()))?;
        let body_crc = crc32fast::hash(&body_bytes);

        // Written beside the target, then renamed over it
        let tmp_path = tmp_path_for(&self.path);
        let file_size = match write_framed(&tmp_path, &body_bytes, body_crc) {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StManError::FileIo {
                path: self.path.clone(),
                source: e,
            });
        }

        tracing::debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "wrote index"
        );

        Ok(IndexSummary {
            total_rows: self.entries.last().map(IndexEntry::row_end).unwrap_or(0),
            entry_count: self.entries.len(),
            file_count: self.file_names.len(),
            path: self.path,
            file_size,
        })
    }
}

/// `<path>.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write header, body and footer to `path`, returning the file size
fn write_framed(path: &Path, body_bytes: &[u8], body_crc: u32) -> Result<u64> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(START_TAG)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(body_bytes.len() as u64).to_le_bytes())?;
    writer.write_all(body_bytes)?;
    writer.write_all(&body_crc.to_le_bytes())?;
    writer.write_all(END_TAG)?;
    writer.flush()?;

    let file: File = writer
        .into_inner()
        .map_err(|e| StManError::Serialization(format!("Failed to flush index: {}", e)))?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}
