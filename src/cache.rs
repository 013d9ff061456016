//! Block Cache
//!
//! Holds at most one raw, undecoded block of the current BDF file.
//!
//! ## Rules
//! - Different file than the open one → close it, open the new one, drop the block
//! - Same file, different offset → drop the block
//! - No block cached → seek and read exactly `BlockRef::len` bytes
//!
//! One block (not an LRU of many) matches sequential per-row iteration and
//! keeps memory bounded regardless of table size.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Result, StManError};
use crate::index::BlockRef;

/// I/O counters of a block cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// BDF files opened
    pub file_opens: u64,
    /// Blocks read from disk
    pub block_reads: u64,
}

/// Currently open BDF file
#[derive(Debug)]
struct OpenFile {
    index: u32,
    path: PathBuf,
    file: File,
}

/// Single-block read cache
#[derive(Debug)]
pub struct BlockCache {
    open: Option<OpenFile>,
    /// Offset of the cached block in the open file
    cached_offset: Option<u64>,
    raw: Option<Bytes>,
    /// Allocation bound for one block
    max_block_bytes: u64,
    stats: CacheStats,
}

impl BlockCache {
    pub fn new(max_block_bytes: u64) -> Self {
        Self {
            open: None,
            cached_offset: None,
            raw: None,
            max_block_bytes,
            stats: CacheStats::default(),
        }
    }

    /// Return the raw bytes of `block`, reading it only if it is not cached
    ///
    /// `paths` maps file indices to BDF paths.
    pub fn fetch(&mut self, block: BlockRef, paths: &[PathBuf]) -> Result<Bytes> {
        let open_index = self.open.as_ref().map(|f| f.index);
        if open_index != Some(block.file_index) {
            let path = paths.get(block.file_index as usize).ok_or_else(|| {
                StManError::InvalidState(format!(
                    "no path for BDF file index {}",
                    block.file_index
                ))
            })?;
            self.switch_file(block.file_index, path)?;
        } else if self.cached_offset != Some(block.file_offset) {
            self.raw = None;
        }

        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }

        let raw = self.read_block(block)?;
        self.cached_offset = Some(block.file_offset);
        self.raw = Some(raw.clone());
        Ok(raw)
    }

    fn switch_file(&mut self, index: u32, path: &Path) -> Result<()> {
        self.invalidate();
        let file = File::open(path).map_err(|source| StManError::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.stats.file_opens += 1;
        tracing::debug!(file_index = index, path = %path.display(), "opened BDF file");
        self.open = Some(OpenFile {
            index,
            path: path.to_path_buf(),
            file,
        });
        Ok(())
    }

    fn read_block(&mut self, block: BlockRef) -> Result<Bytes> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| StManError::InvalidState("no BDF file open".to_string()))?;
        if block.len > self.max_block_bytes {
            return Err(StManError::corrupt(
                &open.path,
                format!(
                    "block of {} bytes at offset {} exceeds max_block_bytes ({})",
                    block.len, block.file_offset, self.max_block_bytes
                ),
            ));
        }

        let mut buf = vec![0u8; block.len as usize];
        let path = open.path.clone();
        let io_err = |source: std::io::Error| StManError::FileIo {
            path: path.clone(),
            source,
        };
        open.file
            .seek(SeekFrom::Start(block.file_offset))
            .map_err(io_err)?;
        open.file.read_exact(&mut buf).map_err(io_err)?;

        self.stats.block_reads += 1;
        tracing::debug!(
            file_index = block.file_index,
            offset = block.file_offset,
            len = block.len,
            "read block"
        );
        Ok(Bytes::from(buf))
    }

    /// Close the open file and drop the cached block
    pub fn invalidate(&mut self) {
        self.open = None;
        self.cached_offset = None;
        self.raw = None;
    }

    /// Index of the open BDF file, if any
    pub fn open_file(&self) -> Option<u32> {
        self.open.as_ref().map(|f| f.index)
    }

    pub fn cached_offset(&self) -> Option<u64> {
        self.raw.as_ref().and(self.cached_offset)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
