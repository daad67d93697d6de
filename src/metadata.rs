//! Metadata type tags and row models
//!
//! Track metadata lives in two narrow tables keyed by (track id, type tag):
//! `MetaData` for strings and `MetaDataInteger` for integers. The tag space
//! is closed, and several "unknown" slots must be present with hard-coded
//! literal values for hardware players to accept the library. Do not clean
//! those slots up.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type tags of the string-valued `MetaData` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum StringMetadataKind {
    Title = 1,
    Artist = 2,
    Album = 3,
    Genre = 4,
    Comment = 5,
    Publisher = 6,
    Composer = 7,
    Unknown8 = 8,
    Unknown9 = 9,
    DurationMmSs = 10,
    EverPlayed = 12,
    FileExtension = 13,
    Unknown15 = 15,
    Unknown16 = 16,
    Unknown17 = 17,
}

impl StringMetadataKind {
    pub fn from_raw(raw: i64) -> Result<Self> {
        use StringMetadataKind::*;
        Ok(match raw {
            1 => Title,
            2 => Artist,
            3 => Album,
            4 => Genre,
            5 => Comment,
            6 => Publisher,
            7 => Composer,
            8 => Unknown8,
            9 => Unknown9,
            10 => DurationMmSs,
            12 => EverPlayed,
            13 => FileExtension,
            15 => Unknown15,
            16 => Unknown16,
            17 => Unknown17,
            _ => {
                return Err(Error::DatabaseInconsistency(format!(
                    "unknown string metadata type tag {raw}"
                )))
            }
        })
    }
}

/// Type tags of the integer-valued `MetaDataInteger` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum IntegerMetadataKind {
    LastPlayedTs = 1,
    LastModifiedTs = 2,
    LastAccessedTs = 3,
    MusicalKey = 4,
    Rating = 5,
    Unknown6 = 6,
    Unknown7 = 7,
    Unknown8 = 8,
    Unknown9 = 9,
    LastPlayHash = 10,
    Unknown11 = 11,
    Unknown12 = 12,
}

impl IntegerMetadataKind {
    pub fn from_raw(raw: i64) -> Result<Self> {
        use IntegerMetadataKind::*;
        Ok(match raw {
            1 => LastPlayedTs,
            2 => LastModifiedTs,
            3 => LastAccessedTs,
            4 => MusicalKey,
            5 => Rating,
            6 => Unknown6,
            7 => Unknown7,
            8 => Unknown8,
            9 => Unknown9,
            10 => LastPlayHash,
            11 => Unknown11,
            12 => Unknown12,
            _ => {
                return Err(Error::DatabaseInconsistency(format!(
                    "unknown integer metadata type tag {raw}"
                )))
            }
        })
    }
}

/// One row of the `MetaData` table. Slot rows exist even for NULL text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringMetadataRow {
    pub track_id: i64,
    pub kind: StringMetadataKind,
    pub text: Option<String>,
}

/// One row of the `MetaDataInteger` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerMetadataRow {
    pub track_id: i64,
    pub kind: IntegerMetadataKind,
    pub value: Option<i64>,
}

/// Input to the canonical 15-row string metadata write. The unknown slots
/// are not part of the input; they are filled with their required literals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStringMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub publisher: Option<String>,
    pub composer: Option<String>,
    /// Track duration formatted "MM:SS".
    pub duration_mm_ss: Option<String>,
    /// "1" once the track has ever been played.
    pub ever_played: Option<String>,
    pub file_extension: Option<String>,
}

/// Input to the canonical 12-row integer metadata write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalIntegerMetadata {
    pub musical_key: Option<i64>,
    pub rating: Option<i64>,
    pub last_played_ts: Option<i64>,
    pub last_modified_ts: Option<i64>,
    pub last_accessed_ts: Option<i64>,
    pub last_play_hash: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_kind_raw_mapping() {
        assert_eq!(StringMetadataKind::from_raw(1).unwrap(), StringMetadataKind::Title);
        assert_eq!(StringMetadataKind::from_raw(12).unwrap(), StringMetadataKind::EverPlayed);
        assert_eq!(StringMetadataKind::from_raw(15).unwrap(), StringMetadataKind::Unknown15);
        // 11 and 14 are holes in the tag space.
        assert!(StringMetadataKind::from_raw(11).is_err());
        assert!(StringMetadataKind::from_raw(14).is_err());
        assert_eq!(StringMetadataKind::EverPlayed as i64, 12);
    }

    #[test]
    fn test_integer_kind_raw_mapping() {
        assert_eq!(IntegerMetadataKind::from_raw(4).unwrap(), IntegerMetadataKind::MusicalKey);
        assert_eq!(IntegerMetadataKind::from_raw(10).unwrap(), IntegerMetadataKind::LastPlayHash);
        assert!(IntegerMetadataKind::from_raw(0).is_err());
        assert!(IntegerMetadataKind::from_raw(13).is_err());
        assert_eq!(IntegerMetadataKind::Unknown12 as i64, 12);
    }
}
