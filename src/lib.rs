//! enginelib: Engine Library database access
//!
//! This crate reads and writes the on-disk record libraries used by a
//! family of standalone DJ players. A library directory holds two SQLite
//! databases sharing a schema version:
//! - m.db (music store): tracks, crates, metadata
//! - p.db (performance store): waveforms, beat grids, cues, loops
//!
//! The crate covers three concerns: a registry of frozen schema versions
//! that can create and exactly validate each known revision, binary codecs
//! for the zlib-compressed performance blobs, and a storage facade issuing
//! the right SQL shape for the active version.

pub mod codec;
pub mod detect;
pub mod error;
pub mod metadata;
pub mod perfdata;
pub mod schema;
pub mod storage;
pub mod track;
pub mod version;

mod tables;

// Re-exports for convenience
pub use error::{Error, Result};
pub use metadata::{
    CanonicalIntegerMetadata, CanonicalStringMetadata, IntegerMetadataKind, IntegerMetadataRow,
    StringMetadataKind, StringMetadataRow,
};
pub use perfdata::{
    BeatData, BeatgridMarker, HighResWaveformData, HotCue, Loop, LoopsData,
    OverviewWaveformData, PadColor, PerformanceDataRow, QuickCuesData, SamplingInfo, TrackData,
    WaveformEntry, WaveformPoint,
};
pub use schema::{schema_for, SchemaDef, Store};
pub use storage::{InformationRow, Storage, TransactionGuard};
pub use track::TrackRow;
pub use version::{SchemaVersion, Variant, ALL_VERSIONS, LATEST_VERSION};
