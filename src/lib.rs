//! # asdmstman
//!
//! A read-only storage manager that exposes ASDM correlator visibilities,
//! stored externally in BDF files, as table columns:
//! - Persisted row-range index loaded once at open
//! - Binary search over sparse row ranges with a sequential-access fast path
//! - Single-block lazy I/O cache
//! - Byte-order-aware decoding of 16/32-bit integer, float and
//!   autocorrelation encodings
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Table Engine                            │
//! │                (DataManager trait calls)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ (row, column)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   StorageManager                             │
//! └──────┬──────────────────┬──────────────────────┬────────────┘
//!        │                  │                      │
//!        ▼                  ▼                      ▼
//!  ┌─────────────┐   ┌─────────────┐        ┌─────────────┐
//!  │ RowResolver │──▶│ IndexStore  │        │  Decoders   │
//!  │  (window)   │   │  (sidecar)  │        │ (per type)  │
//!  └─────────────┘   └──────┬──────┘        └──────▲──────┘
//!                           │ BlockRef             │ raw bytes
//!                           ▼                      │
//!                    ┌─────────────┐               │
//!                    │ BlockCache  │───────────────┘
//!                    │ (BDF files) │
//!                    └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod resolver;
pub mod cache;
pub mod decode;
pub mod table;
pub mod manager;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StManError};
pub use config::Config;
pub use manager::StorageManager;
pub use num_complex::Complex64;

// =============================================================================
// Version Info
// =============================================================================

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
