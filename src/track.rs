//! Row model for the `Track` table
//!
//! A single record covers the union of all columns across the supported
//! schema versions; fields newer than the active version are simply ignored
//! by the storage layer when writing and come back as `None` when reading.

use serde::{Deserialize, Serialize};

/// One row of the `Track` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub play_order: Option<i64>,
    /// Track length in seconds.
    pub length: Option<i64>,
    pub length_calculated: Option<i64>,
    /// BPM rounded to an integer; the precise value is `bpm_analyzed`.
    pub bpm: Option<i64>,
    pub year: Option<i64>,
    /// Path relative to the library directory.
    pub relative_path: Option<String>,
    pub filename: Option<String>,
    pub bitrate: Option<i64>,
    pub bpm_analyzed: Option<f64>,
    pub track_type: Option<i64>,
    pub is_external_track: Option<i64>,
    pub uuid_of_external_database: Option<String>,
    pub id_track_in_external_database: Option<i64>,
    /// 1 is the placeholder id meaning "no album art".
    pub album_art_id: Option<i64>,
    /// Added in 1.15.0.
    pub file_bytes: Option<i64>,
    /// Added in 1.7.1.
    pub pdb_import_key: Option<i64>,
    /// Added in 1.15.0.
    pub uri: Option<String>,
    /// Added in 1.18.0.
    pub is_beatgrid_locked: Option<i64>,
}

/// Final path component of a relative track path.
pub fn filename_of(relative_path: &str) -> &str {
    match relative_path.rfind('/') {
        Some(pos) => &relative_path[pos + 1..],
        None => relative_path,
    }
}

/// File extension of a relative track path, without the dot.
pub fn file_extension_of(relative_path: &str) -> Option<&str> {
    let filename = filename_of(relative_path);
    filename.rfind('.').map(|pos| &filename[pos + 1..])
}
