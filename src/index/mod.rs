//! Index Module
//!
//! The persisted row-range index that maps logical rows onto raw blocks in
//! the backing BDF files.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (20 bytes)                                       │
//! │   StartTag: "ASDMIDX\0" (8) | Version: u32 (4)          │
//! │   BodyLen: u64 (8)                                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Body (BodyLen bytes, bincode, fixed-width integers)     │
//! │   big_endian: bool                                      │
//! │   file_names: [String]                                  │
//! │   entries:    [EntryRecord]                             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (12 bytes)                                       │
//! │   BodyCRC: u32 (4) | EndTag: "ASDMEND\0" (8)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Framing integers are little-endian. The `big_endian` flag describes the
//! BDF sample data, not the index itself.

mod entry;
mod store;
mod writer;

use bincode::Options;
use serde::{Deserialize, Serialize};

pub use entry::{BlockRef, DataType, IndexEntry};
pub use store::IndexStore;
pub use writer::{IndexSummary, IndexWriter};

pub(crate) use entry::{auto_scalars_per_chan, EntryRecord};

// =============================================================================
// Shared Constants (used by store and writer)
// =============================================================================

/// Tag opening every index file
pub(crate) const START_TAG: &[u8; 8] = b"ASDMIDX\0";

/// Tag closing every index file
pub(crate) const END_TAG: &[u8; 8] = b"ASDMEND\0";

/// Newest index format version this crate reads and writes
pub const VERSION: u32 = 1;

/// Stand-in path for entries that did not come from an index file
pub(crate) const UNCHECKED_ENTRY: &str = "<memory>";

/// Header size: StartTag (8) + Version (4) + BodyLen (8) = 20 bytes
pub(crate) const HEADER_SIZE: usize = 20;

/// Footer size: BodyCRC (4) + EndTag (8) = 12 bytes
pub(crate) const FOOTER_SIZE: usize = 12;

/// Serialized index body
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IndexBody {
    pub big_endian: bool,
    pub file_names: Vec<String>,
    pub entries: Vec<EntryRecord>,
}

/// bincode settings shared by reader and writer
pub(crate) fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}
