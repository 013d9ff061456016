//! Row Resolver
//!
//! Maps a logical row onto the index entry that owns it.
//!
//! Sequential access is the dominant pattern, so the last resolved entry is
//! kept as a `CurrentWindow` and rows inside it skip the binary search.

use crate::error::{Result, StManError};
use crate::index::IndexStore;

/// Row range of the most recently resolved entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentWindow {
    /// Position of the entry in the index
    pub entry: usize,
    pub start_row: u64,
    /// Exclusive
    pub end_row: u64,
}

impl CurrentWindow {
    fn contains(&self, row: u64) -> bool {
        row >= self.start_row && row < self.end_row
    }
}

/// Binary search over entry start rows with a one-entry cache
#[derive(Debug, Clone, Default)]
pub struct RowResolver {
    /// `row_start` of every entry, strictly increasing
    row_starts: Vec<u64>,
    /// `row_start + row_count` of every entry
    row_ends: Vec<u64>,
    window: Option<CurrentWindow>,
    /// Binary searches performed (cache misses)
    searches: u64,
}

impl RowResolver {
    pub fn new(index: &IndexStore) -> Self {
        Self {
            row_starts: index.entries().iter().map(|e| e.row_start).collect(),
            row_ends: index.entries().iter().map(|e| e.row_end()).collect(),
            window: None,
            searches: 0,
        }
    }

    /// Resolve a row to an entry position, using the cached window when possible
    pub fn resolve(&mut self, row: u64) -> Result<usize> {
        if let Some(window) = self.window {
            if window.contains(row) {
                return Ok(window.entry);
            }
        }

        self.searches += 1;
        let entry = self.search(row)?;
        self.window = Some(CurrentWindow {
            entry,
            start_row: self.row_starts[entry],
            end_row: self.row_ends[entry],
        });
        tracing::trace!(row, entry, "resolved row by binary search");
        Ok(entry)
    }

    /// Resolve without consulting or updating the window
    pub fn resolve_uncached(&self, row: u64) -> Result<usize> {
        self.search(row)
    }

    fn search(&self, row: u64) -> Result<usize> {
        if self.row_starts.is_empty() {
            return Err(StManError::EmptyIndex);
        }
        // Number of entries starting at or before `row`; an exact start match
        // counts, so ties land on the entry beginning at that row.
        let pos = self.row_starts.partition_point(|&start| start <= row);
        if pos == 0 {
            return Err(self.out_of_range(row));
        }
        let entry = pos - 1;
        if row >= self.row_ends[entry] {
            // Gap between entries, or past the last one.
            return Err(self.out_of_range(row));
        }
        Ok(entry)
    }

    fn out_of_range(&self, row: u64) -> StManError {
        StManError::OutOfRange {
            row,
            total: self.total_rows(),
        }
    }

    /// Drop the cached window
    pub fn invalidate(&mut self) {
        self.window = None;
    }

    pub fn window(&self) -> Option<CurrentWindow> {
        self.window
    }

    pub fn searches(&self) -> u64 {
        self.searches
    }

    pub fn total_rows(&self) -> u64 {
        self.row_ends.last().copied().unwrap_or(0)
    }
}
