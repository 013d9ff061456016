//! Index entry definitions
//!
//! One entry describes a contiguous row range whose cells live in a single
//! physical block of a BDF file.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StManError};

/// On-disk sample encoding of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Complex pairs of 16-bit signed integers, scaled per spectral window
    Int16,
    /// Complex pairs of 32-bit signed integers, scaled per spectral window
    Int32,
    /// Complex pairs of IEEE-754 32-bit floats
    Float32,
    /// Autocorrelation floats (real parallel hands, complex cross hands)
    AutoFloat32,
}

impl DataType {
    /// Decode the small integer tag stored in the index file
    pub fn from_tag(tag: i16) -> Result<Self> {
        match tag {
            0 => Ok(DataType::Int16),
            1 => Ok(DataType::Int32),
            3 => Ok(DataType::Float32),
            10 => Ok(DataType::AutoFloat32),
            other => Err(StManError::UnsupportedEncoding(other)),
        }
    }

    /// Tag stored in the index file
    pub fn tag(self) -> i16 {
        match self {
            DataType::Int16 => 0,
            DataType::Int32 => 1,
            DataType::Float32 => 3,
            DataType::AutoFloat32 => 10,
        }
    }

    /// Width in bytes of one raw scalar
    pub fn scalar_width(self) -> usize {
        match self {
            DataType::Int16 => 2,
            DataType::Int32 | DataType::Float32 | DataType::AutoFloat32 => 4,
        }
    }

    /// Whether samples must be divided by a scale factor
    pub fn is_integer(self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32)
    }
}

/// Raw scalars stored per channel for autocorrelation data
pub(crate) fn auto_scalars_per_chan(n_pol: u32) -> Option<usize> {
    match n_pol {
        1 => Some(1),
        2 => Some(2),
        3 => Some(4),
        4 => Some(6),
        _ => None,
    }
}

/// Location and length of a raw block inside a BDF file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub file_index: u32,
    pub file_offset: u64,
    /// Bytes to read at `file_offset`
    pub len: u64,
}

/// A row-range index entry
///
/// Offsets and strides (`block_offset`, `step_bl`, `step_spw`) are counted in
/// raw scalars of the entry's encoding, not in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// First logical row covered by this entry
    pub row_start: u64,
    /// Index into the backing file name list
    pub file_index: u32,
    /// Byte offset of the block within its file
    pub file_offset: u64,
    /// Offset of this entry's data within the block
    pub block_offset: u32,
    pub data_type: DataType,
    pub n_bl: u32,
    pub n_spw: u32,
    pub n_chan: u32,
    pub n_pol: u32,
    /// Stride between consecutive baselines
    pub step_bl: u32,
    /// Stride between consecutive spectral windows of one baseline
    pub step_spw: u32,
    /// One de-quantization divisor per spectral window (integer encodings only)
    pub scale_factors: Vec<f64>,
}

impl IndexEntry {
    /// Entry for a densely packed single-spectral-window block at file 0, offset 0
    pub fn packed(row_start: u64, data_type: DataType, n_bl: u32, n_chan: u32, n_pol: u32) -> Self {
        let mut entry = Self {
            row_start,
            file_index: 0,
            file_offset: 0,
            block_offset: 0,
            data_type,
            n_bl,
            n_spw: 1,
            n_chan,
            n_pol,
            step_bl: 0,
            step_spw: 0,
            scale_factors: Vec::new(),
        };
        entry.step_bl = entry.cell_scalars() as u32;
        entry
    }

    /// Place the block at `file_offset` in file `file_index`
    pub fn at(mut self, file_index: u32, file_offset: u64) -> Self {
        self.file_index = file_index;
        self.file_offset = file_offset;
        self
    }

    pub fn with_scale_factors(mut self, scale_factors: Vec<f64>) -> Self {
        self.scale_factors = scale_factors;
        self
    }

    /// Number of logical rows: baseline-major, spectral window fastest
    pub fn row_count(&self) -> u64 {
        u64::from(self.n_bl) * u64::from(self.n_spw)
    }

    /// Exclusive end row; saturates for geometry that `check` rejects
    pub fn row_end(&self) -> u64 {
        self.row_start.saturating_add(self.row_count())
    }

    pub fn contains(&self, row: u64) -> bool {
        row >= self.row_start && row < self.row_end()
    }

    /// Polarization products in a decoded cell
    pub fn output_pols(&self) -> u32 {
        if self.data_type == DataType::AutoFloat32 && self.n_pol == 3 {
            4
        } else {
            self.n_pol
        }
    }

    /// Raw scalars holding one cell
    pub fn cell_scalars(&self) -> usize {
        let n_chan = self.n_chan as usize;
        match self.data_type {
            DataType::AutoFloat32 => n_chan * auto_scalars_per_chan(self.n_pol).unwrap_or(0),
            _ => 2 * n_chan * self.n_pol as usize,
        }
    }

    /// (baseline, spectral window) of a row inside this entry
    pub fn locate(&self, row: u64) -> (u32, u32) {
        let offset = row - self.row_start;
        let n_spw = u64::from(self.n_spw.max(1));
        ((offset / n_spw) as u32, (offset % n_spw) as u32)
    }

    /// First raw scalar of a cell, relative to the block start
    pub fn cell_start(&self, baseline: u32, spw: u32) -> u64 {
        self.checked_cell_start(baseline, spw).unwrap_or(u64::MAX)
    }

    /// Bytes from the block start needed to hold every cell of this entry
    pub fn extent_bytes(&self) -> u64 {
        self.checked_extent_bytes().unwrap_or(u64::MAX)
    }

    fn checked_cell_start(&self, baseline: u32, spw: u32) -> Option<u64> {
        let baseline_off = u64::from(baseline).checked_mul(u64::from(self.step_bl))?;
        let spw_off = u64::from(spw).checked_mul(u64::from(self.step_spw))?;
        u64::from(self.block_offset)
            .checked_add(baseline_off)?
            .checked_add(spw_off)
    }

    fn checked_extent_bytes(&self) -> Option<u64> {
        let last =
            self.checked_cell_start(self.n_bl.saturating_sub(1), self.n_spw.saturating_sub(1))?;
        last.checked_add(self.cell_scalars() as u64)?
            .checked_mul(self.data_type.scalar_width() as u64)
    }

    /// Check the geometry invariants of a single entry
    pub(crate) fn check(&self, n_files: usize) -> std::result::Result<(), String> {
        if self.file_index as usize >= n_files {
            return Err(format!(
                "entry at row {} references file {} but only {} files are listed",
                self.row_start, self.file_index, n_files
            ));
        }
        if self.n_bl == 0 || self.n_spw == 0 || self.n_chan == 0 || self.n_pol == 0 {
            return Err(format!("entry at row {} has an empty geometry", self.row_start));
        }
        if self.n_pol > 4 {
            return Err(format!(
                "entry at row {} has {} polarizations (max 4)",
                self.row_start, self.n_pol
            ));
        }

        if self.row_start.checked_add(self.row_count()).is_none() {
            return Err(format!(
                "entry at row {} with {} rows runs past the last addressable row",
                self.row_start,
                self.row_count()
            ));
        }

        // Every spectral window of an entry must share the same cell layout.
        let cell = self.cell_scalars() as u64;
        if self.n_spw > 1 && u64::from(self.step_spw) < cell {
            return Err(format!(
                "entry at row {}: spw stride {} smaller than cell size {}",
                self.row_start, self.step_spw, cell
            ));
        }
        let baseline_extent = u64::from(self.n_spw - 1)
            .checked_mul(u64::from(self.step_spw))
            .and_then(|spws| spws.checked_add(cell))
            .ok_or_else(|| {
                format!("entry at row {}: baseline extent overflows", self.row_start)
            })?;
        if self.n_bl > 1 && u64::from(self.step_bl) < baseline_extent {
            return Err(format!(
                "entry at row {}: baseline stride {} smaller than baseline extent {}",
                self.row_start, self.step_bl, baseline_extent
            ));
        }
        if self.checked_extent_bytes().is_none() {
            return Err(format!("entry at row {}: block extent overflows", self.row_start));
        }

        if self.data_type.is_integer() {
            if self.scale_factors.len() < self.n_spw as usize {
                return Err(format!(
                    "entry at row {} has {} scale factors for {} spectral windows",
                    self.row_start,
                    self.scale_factors.len(),
                    self.n_spw
                ));
            }
            if let Some(bad) = self
                .scale_factors
                .iter()
                .find(|f| !f.is_finite() || **f == 0.0)
            {
                return Err(format!(
                    "entry at row {} has invalid scale factor {}",
                    self.row_start, bad
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Persisted Form
// =============================================================================

/// Entry as serialized in the index body (data type kept as its raw tag)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EntryRecord {
    pub row_start: u64,
    pub file_index: u32,
    pub file_offset: u64,
    pub block_offset: u32,
    pub data_type: i16,
    pub n_bl: u32,
    pub n_spw: u32,
    pub n_chan: u32,
    pub n_pol: u32,
    pub step_bl: u32,
    pub step_spw: u32,
    pub scale_factors: Vec<f64>,
}

impl From<&IndexEntry> for EntryRecord {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            row_start: entry.row_start,
            file_index: entry.file_index,
            file_offset: entry.file_offset,
            block_offset: entry.block_offset,
            data_type: entry.data_type.tag(),
            n_bl: entry.n_bl,
            n_spw: entry.n_spw,
            n_chan: entry.n_chan,
            n_pol: entry.n_pol,
            step_bl: entry.step_bl,
            step_spw: entry.step_spw,
            scale_factors: entry.scale_factors.clone(),
        }
    }
}

impl TryFrom<EntryRecord> for IndexEntry {
    type Error = StManError;

    fn try_from(record: EntryRecord) -> Result<Self> {
        Ok(Self {
            row_start: record.row_start,
            file_index: record.file_index,
            file_offset: record.file_offset,
            block_offset: record.block_offset,
            data_type: DataType::from_tag(record.data_type)?,
            n_bl: record.n_bl,
            n_spw: record.n_spw,
            n_chan: record.n_chan,
            n_pol: record.n_pol,
            step_bl: record.step_bl,
            step_spw: record.step_spw,
            scale_factors: record.scale_factors,
        })
    }
}
