//! Storage Manager
//!
//! The facade a table engine talks to. It ties the index, row resolver,
//! block cache and decoders together.
//!
//! ## State Machine
//! ```text
//!   Closed ──open()/create()──▶ (loading index) ──ok──▶ Open
//!     ▲                               │                   │
//!     └────────── load error ─────────┘                   │
//!     └──────────────────── close() ──────────────────────┘
//! ```
//! Loading is atomic: the manager only becomes `Open` once the whole index
//! is loaded and validated. Data access while `Closed` is `InvalidState`.
//!
//! ## Concurrency
//! None. Every data access takes `&mut self`; the owning engine serializes
//! calls. Independent instances keep independent caches and may run on
//! separate threads.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use num_complex::Complex64;

use crate::cache::BlockCache;
use crate::config::Config;
use crate::decode::{decode_cell, ByteOrderKind};
use crate::error::{Result, StManError};
use crate::index::IndexStore;
use crate::resolver::RowResolver;
use crate::table::{CellShape, CellValue, ColumnKind, DataManager};

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Closed,
    Open,
}

/// I/O and lookup counters of an open manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Binary searches performed by the row resolver
    pub searches: u64,
    /// BDF files opened
    pub file_opens: u64,
    /// Raw blocks read
    pub block_reads: u64,
}

/// Everything that only exists while the table is open
struct OpenTable {
    index: IndexStore,
    /// BDF path per file index
    bdf_paths: Vec<PathBuf>,
    /// Chosen once from the index flag
    order: ByteOrderKind,
    resolver: RowResolver,
    cache: BlockCache,
}

impl OpenTable {
    fn load(config: &Config) -> Result<Self> {
        config.validate()?;
        let index = IndexStore::load(&config.index_path(), config.verify_index_checksum)?;
        if index.max_block_len() > config.max_block_bytes {
            return Err(StManError::corrupt(
                index.path(),
                format!(
                    "largest block needs {} bytes, max_block_bytes is {}",
                    index.max_block_len(),
                    config.max_block_bytes
                ),
            ));
        }
        let bdf_paths = bdf_paths(config, &index);
        let order = index.byte_order();
        let resolver = RowResolver::new(&index);
        Ok(Self {
            index,
            bdf_paths,
            order,
            resolver,
            cache: BlockCache::new(config.max_block_bytes),
        })
    }

    fn shape(&mut self, row: u64) -> Result<CellShape> {
        let pos = self.resolver.resolve(row)?;
        let entry = self.index.entry(pos);
        Ok(CellShape {
            pols: entry.output_pols(),
            chans: entry.n_chan,
        })
    }

    fn read(&mut self, row: u64) -> Result<Vec<Complex64>> {
        let pos = self.resolver.resolve(row)?;
        let raw = self.cache.fetch(self.index.block_ref(pos), &self.bdf_paths)?;
        let entry = self.index.entry(pos);
        let (baseline, spw) = entry.locate(row);
        decode_cell(&raw, entry, self.order, baseline, spw)
    }

    fn stats(&self) -> ManagerStats {
        let cache = self.cache.stats();
        ManagerStats {
            searches: self.resolver.searches(),
            file_opens: cache.file_opens,
            block_reads: cache.block_reads,
        }
    }
}

fn bdf_paths(config: &Config, index: &IndexStore) -> Vec<PathBuf> {
    index
        .file_names()
        .iter()
        .map(|name| config.resolve_bdf(name))
        .collect()
}

/// Read-only storage manager serving ASDM visibilities as table columns
pub struct StorageManager {
    config: Config,
    /// `Some` while open
    table: Option<OpenTable>,
    /// Columns the engine has bound to this manager
    columns: BTreeSet<ColumnKind>,
}

impl StorageManager {
    /// Type name recorded by the table engine
    pub const TYPE_NAME: &'static str = "AsdmStMan";

    /// Create a closed manager
    pub fn new(config: Config) -> Self {
        Self {
            config,
            table: None,
            columns: BTreeSet::new(),
        }
    }

    /// Open the table in `dir` with the default configuration
    pub fn open_path(dir: &Path) -> Result<Self> {
        let config = Config::builder().table_dir(dir).build();
        let mut manager = Self::new(config);
        manager.open()?;
        Ok(manager)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the index; BDF files are opened lazily on first data access
    pub fn open(&mut self) -> Result<()> {
        if self.table.is_some() {
            return Err(StManError::InvalidState(
                "storage manager is already open".to_string(),
            ));
        }

        let table = OpenTable::load(&self.config)?;
        tracing::info!(
            index = %self.config.index_path().display(),
            rows = table.index.total_rows(),
            entries = table.index.len(),
            files = table.index.file_names().len(),
            byte_order = ?table.order,
            swap = table.order.needs_swap(),
            "opened ASDM storage manager"
        );
        self.table = Some(table);
        Ok(())
    }

    /// The index is produced by the importer, so creating is opening
    pub fn create(&mut self) -> Result<()> {
        self.open()
    }

    /// Release the BDF handle, cached block and index (idempotent)
    pub fn close(&mut self) {
        if let Some(table) = self.table.take() {
            let stats = table.stats();
            tracing::info!(
                block_reads = stats.block_reads,
                file_opens = stats.file_opens,
                "closed ASDM storage manager"
            );
        }
    }

    /// Nothing is ever written
    pub fn flush(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Forget the cached window and block
    pub fn resync(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.resolver.invalidate();
            table.cache.invalidate();
        }
    }

    /// The manager stays read-only
    pub fn reopen_rw(&mut self) {
        tracing::debug!("reopen_rw ignored: ASDM storage manager is read-only");
    }

    pub fn state(&self) -> ManagerState {
        if self.table.is_some() {
            ManagerState::Open
        } else {
            ManagerState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.table.is_some()
    }

    // =========================================================================
    // Data Access
    // =========================================================================

    /// Rows covered by the index
    pub fn nrow(&self) -> Result<u64> {
        Ok(self.open_table()?.index.total_rows())
    }

    /// Logical shape of the visibility cell in `row`
    pub fn shape_of(&mut self, row: u64) -> Result<CellShape> {
        self.open_table_mut()?.shape(row)
    }

    /// Decoded visibilities of `row`
    pub fn data_of(&mut self, row: u64) -> Result<Vec<Complex64>> {
        self.open_table_mut()?.read(row)
    }

    /// Array shape of a column's cell
    pub fn column_shape(&mut self, column: ColumnKind, row: u64) -> Result<Vec<u32>> {
        Ok(self.shape_of(row)?.for_column(column))
    }

    /// Value of any supported column
    ///
    /// Only DATA reads BDF files. Flags are all clear and weights and sigmas
    /// are unity.
    pub fn cell(&mut self, column: ColumnKind, row: u64) -> Result<CellValue> {
        match column {
            ColumnKind::Data => Ok(CellValue::Complex(self.data_of(row)?)),
            ColumnKind::Flag => {
                let shape = self.shape_of(row)?;
                Ok(CellValue::Bool(vec![false; shape.len()]))
            }
            ColumnKind::Weight | ColumnKind::Sigma => {
                let shape = self.shape_of(row)?;
                Ok(CellValue::Float(vec![1.0; shape.pols as usize]))
            }
        }
    }

    // =========================================================================
    // Columns and Rows
    // =========================================================================

    /// Bind a column by name; only DATA, FLAG, WEIGHT and SIGMA are known
    pub fn register_column(&mut self, name: &str) -> Result<ColumnKind> {
        let kind: ColumnKind = name.parse()?;
        self.columns.insert(kind);
        Ok(kind)
    }

    pub fn add_column(&mut self, name: &str) -> Result<ColumnKind> {
        self.register_column(name)
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let kind: ColumnKind = name.parse()?;
        self.columns.remove(&kind);
        Ok(())
    }

    /// Rows are defined by the external data; nothing to do
    pub fn add_rows(&mut self, _count: u64) {}

    pub fn remove_row(&mut self, row: u64) -> Result<()> {
        Err(StManError::UnsupportedOperation(format!(
            "cannot remove row {} from read-only ASDM data",
            row
        )))
    }

    /// Registered columns in a stable order
    pub fn columns(&self) -> Vec<ColumnKind> {
        self.columns.iter().copied().collect()
    }

    // =========================================================================
    // BDF Relocation
    // =========================================================================

    /// BDF file names as recorded in the index
    pub fn bdf_names(&self) -> Result<Vec<String>> {
        Ok(self.open_table()?.index.file_names().to_vec())
    }

    /// Point the table at BDF files that were moved
    ///
    /// Reads use the new names at once; `write_index` persists them. The
    /// number of names must match the index.
    pub fn set_bdf_names(&mut self, names: Vec<String>) -> Result<()> {
        let table = self.table.as_mut().ok_or_else(Self::closed)?;
        table.index.set_file_names(names)?;
        table.bdf_paths = bdf_paths(&self.config, &table.index);
        table.cache.invalidate();
        tracing::info!(files = table.bdf_paths.len(), "relocated BDF references");
        Ok(())
    }

    /// Rewrite the index sidecar with the current BDF names
    pub fn write_index(&self) -> Result<()> {
        let summary = self
            .open_table()?
            .index
            .write_to(&self.config.index_path())?;
        tracing::info!(
            path = %summary.path.display(),
            entries = summary.entry_count,
            "rewrote index"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> Result<&IndexStore> {
        Ok(&self.open_table()?.index)
    }

    pub fn stats(&self) -> Result<ManagerStats> {
        Ok(self.open_table()?.stats())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn open_table(&self) -> Result<&OpenTable> {
        self.table.as_ref().ok_or_else(Self::closed)
    }

    fn open_table_mut(&mut self) -> Result<&mut OpenTable> {
        self.table.as_mut().ok_or_else(Self::closed)
    }

    fn closed() -> StManError {
        StManError::InvalidState("storage manager is closed".to_string())
    }
}

impl Drop for StorageManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl DataManager for StorageManager {
    fn data_manager_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn create(&mut self) -> Result<()> {
        StorageManager::create(self)
    }

    fn open(&mut self) -> Result<()> {
        StorageManager::open(self)
    }

    fn close(&mut self) -> Result<()> {
        StorageManager::close(self);
        Ok(())
    }

    fn flush(&mut self) -> Result<bool> {
        StorageManager::flush(self)
    }

    fn resync(&mut self) -> Result<()> {
        StorageManager::resync(self);
        Ok(())
    }

    fn reopen_rw(&mut self) -> Result<()> {
        StorageManager::reopen_rw(self);
        Ok(())
    }

    fn can_add_row(&self) -> bool {
        true
    }

    fn can_remove_row(&self) -> bool {
        false
    }

    fn can_add_column(&self) -> bool {
        true
    }

    fn can_remove_column(&self) -> bool {
        true
    }

    fn add_rows(&mut self, count: u64) -> Result<()> {
        StorageManager::add_rows(self, count);
        Ok(())
    }

    fn remove_row(&mut self, row: u64) -> Result<()> {
        StorageManager::remove_row(self, row)
    }

    fn add_column(&mut self, name: &str) -> Result<ColumnKind> {
        StorageManager::add_column(self, name)
    }

    fn remove_column(&mut self, name: &str) -> Result<()> {
        StorageManager::remove_column(self, name)
    }

    fn register_column(&mut self, name: &str) -> Result<ColumnKind> {
        StorageManager::register_column(self, name)
    }

    fn nrow(&self) -> Result<u64> {
        StorageManager::nrow(self)
    }

    fn shape(&mut self, column: ColumnKind, row: u64) -> Result<Vec<u32>> {
        self.column_shape(column, row)
    }

    fn get_cell(&mut self, column: ColumnKind, row: u64) -> Result<CellValue> {
        self.cell(column, row)
    }
}
