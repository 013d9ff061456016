//! Table Engine Interface
//!
//! The seam between a generic table engine and a column storage manager.
//! The engine registers columns by name, asks for cell shapes and values,
//! and drives the lifecycle hooks.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;

use crate::error::{Result, StManError};

/// Columns a storage manager can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
    /// Complex visibilities, shape `[pols, chans]`
    Data,
    /// Per-sample flags, shape `[pols, chans]`
    Flag,
    /// Per-polarization weights, shape `[pols]`
    Weight,
    /// Per-polarization noise estimates, shape `[pols]`
    Sigma,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 4] = [
        ColumnKind::Data,
        ColumnKind::Flag,
        ColumnKind::Weight,
        ColumnKind::Sigma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Data => "DATA",
            ColumnKind::Flag => "FLAG",
            ColumnKind::Weight => "WEIGHT",
            ColumnKind::Sigma => "SIGMA",
        }
    }
}

impl FromStr for ColumnKind {
    type Err = StManError;

    fn from_str(name: &str) -> Result<Self> {
        ColumnKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| StManError::UnknownColumn(name.to_string()))
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical shape of a visibility cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellShape {
    pub pols: u32,
    pub chans: u32,
}

impl CellShape {
    /// Samples in a cell
    pub fn len(&self) -> usize {
        self.pols as usize * self.chans as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Array shape of a column's cell
    pub fn for_column(&self, column: ColumnKind) -> Vec<u32> {
        match column {
            ColumnKind::Data | ColumnKind::Flag => vec![self.pols, self.chans],
            ColumnKind::Weight | ColumnKind::Sigma => vec![self.pols],
        }
    }
}

/// Decoded value of one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Complex(Vec<Complex64>),
    Bool(Vec<bool>),
    Float(Vec<f32>),
}

impl CellValue {
    pub fn len(&self) -> usize {
        match self {
            CellValue::Complex(v) => v.len(),
            CellValue::Bool(v) => v.len(),
            CellValue::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operations a table engine invokes on a column storage manager
pub trait DataManager {
    /// Name the engine records for this manager type
    fn data_manager_type(&self) -> &'static str;

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    fn create(&mut self) -> Result<()>;
    fn open(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    /// Returns whether anything was written
    fn flush(&mut self) -> Result<bool>;
    fn resync(&mut self) -> Result<()>;
    fn reopen_rw(&mut self) -> Result<()>;

    // -------------------------------------------------------------------------
    // Capabilities
    // -------------------------------------------------------------------------
    fn can_add_row(&self) -> bool;
    fn can_remove_row(&self) -> bool;
    fn can_add_column(&self) -> bool;
    fn can_remove_column(&self) -> bool;

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------
    fn add_rows(&mut self, count: u64) -> Result<()>;
    fn remove_row(&mut self, row: u64) -> Result<()>;
    fn add_column(&mut self, name: &str) -> Result<ColumnKind>;
    fn remove_column(&mut self, name: &str) -> Result<()>;

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------
    fn register_column(&mut self, name: &str) -> Result<ColumnKind>;
    fn nrow(&self) -> Result<u64>;
    fn shape(&mut self, column: ColumnKind, row: u64) -> Result<Vec<u32>>;
    fn get_cell(&mut self, column: ColumnKind, row: u64) -> Result<CellValue>;
}
