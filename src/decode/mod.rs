//! Decoders
//!
//! Turn one cell of a raw BDF block into complex samples.
//!
//! ## Encodings
//! - `Int16` / `Int32`: (re, im) integer pairs divided by the spectral
//!   window's scale factor
//! - `Float32`: (re, im) float pairs, already physical
//! - `AutoFloat32`: autocorrelations, see [`auto`]
//!
//! Output is channel-major with polarization varying fastest, so sample
//! `chan * pols + pol` holds polarization product `pol` of channel `chan`.
//!
//! The byte order is picked once per open table. Reading every scalar with
//! that order is the same as swapping whenever it differs from the host.

mod auto;
mod cross;
mod view;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_complex::Complex64;

use crate::error::{Result, StManError};
use crate::index::{DataType, IndexEntry};

pub use view::SampleView;

/// Byte order of the BDF samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderKind {
    Big,
    Little,
}

impl ByteOrderKind {
    pub fn from_big_endian(big_endian: bool) -> Self {
        if big_endian {
            ByteOrderKind::Big
        } else {
            ByteOrderKind::Little
        }
    }

    /// Byte order of the running machine
    pub fn host() -> Self {
        Self::from_big_endian(cfg!(target_endian = "big"))
    }

    /// Whether samples must be byte-swapped on this host
    pub fn needs_swap(self) -> bool {
        self != Self::host()
    }
}

/// Decode the cell of `baseline` / `spw` from the entry's raw block
pub fn decode_cell(
    raw: &[u8],
    entry: &IndexEntry,
    order: ByteOrderKind,
    baseline: u32,
    spw: u32,
) -> Result<Vec<Complex64>> {
    match order {
        ByteOrderKind::Big => decode_with::<BigEndian>(raw, entry, baseline, spw),
        ByteOrderKind::Little => decode_with::<LittleEndian>(raw, entry, baseline, spw),
    }
}

fn decode_with<B: ByteOrder>(
    raw: &[u8],
    entry: &IndexEntry,
    baseline: u32,
    spw: u32,
) -> Result<Vec<Complex64>> {
    if baseline >= entry.n_bl || spw >= entry.n_spw {
        return Err(StManError::InvalidState(format!(
            "cell (baseline {}, spw {}) outside entry at row {} ({} baselines, {} spws)",
            baseline, spw, entry.row_start, entry.n_bl, entry.n_spw
        )));
    }

    let view = SampleView::<B>::new(
        raw,
        entry.data_type.scalar_width(),
        entry.cell_start(baseline, spw),
        entry.cell_scalars(),
    )?;

    match entry.data_type {
        DataType::Int16 => Ok(cross::decode_int16(&view, scale_factor(entry, spw)?)),
        DataType::Int32 => Ok(cross::decode_int32(&view, scale_factor(entry, spw)?)),
        DataType::Float32 => Ok(cross::decode_float32(&view)),
        DataType::AutoFloat32 => auto::decode(&view, entry.n_chan, entry.n_pol),
    }
}

fn scale_factor(entry: &IndexEntry, spw: u32) -> Result<f64> {
    entry
        .scale_factors
        .get(spw as usize)
        .copied()
        .ok_or_else(|| {
            StManError::InvalidState(format!(
                "entry at row {} has no scale factor for spw {}",
                entry.row_start, spw
            ))
        })
}
