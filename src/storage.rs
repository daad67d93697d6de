//! Versioned storage access
//!
//! `Storage` is the sole conduit for row operations against a library. It
//! owns the SQLite connection (an in-memory main database with the two
//! stores attached as `music` and `perfdata`), knows the active schema
//! version, and issues the SQL shape appropriate for that version: columns
//! newer than the active schema are omitted from writes and come back as
//! `None` on reads.
//!
//! A handle is open from construction until drop; dropping it releases the
//! connection and every prepared statement on all exit paths.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use crate::detect::detect_version;
use crate::error::{Error, Result};
use crate::metadata::{
    CanonicalIntegerMetadata, CanonicalStringMetadata, IntegerMetadataKind, IntegerMetadataRow,
    StringMetadataKind, StringMetadataRow,
};
use crate::perfdata::{
    BeatData, HighResWaveformData, LoopsData, OverviewWaveformData, PerformanceDataRow,
    QuickCuesData, TrackData,
};
use crate::schema::{schema_for, SchemaDef};
use crate::track::TrackRow;
use crate::version::SchemaVersion;

/// The singleton `Information` row of the music store.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationRow {
    pub id: i64,
    pub uuid: String,
    pub schema_version_major: i64,
    pub schema_version_minor: i64,
    pub schema_version_patch: i64,
    pub current_played_indicator: i64,
    pub last_rekordbox_library_import_read_counter: i64,
}

/// An open library handle.
pub struct Storage {
    conn: Connection,
    version: SchemaVersion,
    schema: SchemaDef,
    directory: Option<PathBuf>,
    in_transaction: Cell<bool>,
}

fn attach_files(directory: &Path) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute(
        "ATTACH DATABASE ?1 AS music",
        params![directory.join("m.db").to_string_lossy().into_owned()],
    )?;
    conn.execute(
        "ATTACH DATABASE ?1 AS perfdata",
        params![directory.join("p.db").to_string_lossy().into_owned()],
    )?;
    Ok(conn)
}

impl Storage {
    /// Open an existing library directory. The directory and both database
    /// files must already exist.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        if !Self::exists(directory) {
            return Err(Error::LibraryNotFound(directory.to_path_buf()));
        }
        let conn = attach_files(directory)?;
        let version = detect_version(&conn)?;
        let schema = schema_for(&version)?;
        debug!(path = %directory.display(), %version, "opened library");
        Ok(Self {
            conn,
            version,
            schema,
            directory: Some(directory.to_path_buf()),
            in_transaction: Cell::new(false),
        })
    }

    /// Create a new library at the given schema version, creating the
    /// directory if it does not exist yet.
    pub fn create(directory: impl AsRef<Path>, version: SchemaVersion) -> Result<Self> {
        let directory = directory.as_ref();
        let schema = schema_for(&version)?;
        if !directory.is_dir() {
            fs::create_dir_all(directory)?;
        }
        let conn = attach_files(directory)?;
        schema.create(&conn)?;
        debug!(path = %directory.display(), %version, "created library");
        Ok(Self {
            conn,
            version,
            schema,
            directory: Some(directory.to_path_buf()),
            in_transaction: Cell::new(false),
        })
    }

    /// Create a throwaway library backed by anonymous in-memory stores.
    pub fn in_memory(version: SchemaVersion) -> Result<Self> {
        let schema = schema_for(&version)?;
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("ATTACH ':memory:' AS music; ATTACH ':memory:' AS perfdata;")?;
        schema.create(&conn)?;
        Ok(Self { conn, version, schema, directory: None, in_transaction: Cell::new(false) })
    }

    /// Whether a library already exists in the directory.
    pub fn exists(directory: impl AsRef<Path>) -> bool {
        let directory = directory.as_ref();
        directory.join("m.db").is_file() && directory.join("p.db").is_file()
    }

    /// Open the library in the directory, or create one at the given
    /// version when none exists. The flag reports whether it was created.
    pub fn open_or_create(
        directory: impl AsRef<Path>,
        version: SchemaVersion,
    ) -> Result<(Self, bool)> {
        let directory = directory.as_ref();
        if Self::exists(directory) {
            Ok((Self::open(directory)?, false))
        } else {
            Ok((Self::create(directory, version)?, true))
        }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Directory backing this library, absent for in-memory libraries.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Validate both stores against the active schema definition.
    pub fn verify(&self) -> Result<()> {
        self.schema.validate(&self.conn)
    }

    /// The library UUID, shared by both stores.
    pub fn uuid(&self) -> Result<String> {
        Ok(self.information()?.uuid)
    }

    /// Read the singleton `Information` row of the music store.
    pub fn information(&self) -> Result<InformationRow> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, schemaVersionMajor, schemaVersionMinor, \
             schemaVersionPatch, currentPlayedIndiciator, \
             lastRekordBoxLibraryImportReadCounter FROM music.Information",
        )?;
        let mut rows = stmt
            .query_map([], |row| {
                Ok(InformationRow {
                    id: row.get(0)?,
                    uuid: row.get(1)?,
                    schema_version_major: row.get(2)?,
                    schema_version_minor: row.get(3)?,
                    schema_version_patch: row.get(4)?,
                    current_played_indicator: row.get(5)?,
                    last_rekordbox_library_import_read_counter: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            n => Err(Error::DatabaseInconsistency(format!(
                "the Information table on music holds {n} rows, expected exactly one"
            ))),
        }
    }

    /// Begin a scoped transaction. Commits on [`TransactionGuard::commit`],
    /// rolls back when the guard is dropped without committing. Guards do
    /// not nest: an inner guard observes the outer transaction.
    pub fn transaction(&self) -> Result<TransactionGuard<'_>> {
        let owns = !self.in_transaction.get();
        if owns {
            self.conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION")?;
            self.in_transaction.set(true);
        }
        Ok(TransactionGuard { storage: self, owns, committed: false })
    }

    /// Columns of the `Track` table present in the active schema version,
    /// in binding order.
    fn track_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![
            "playOrder",
            "length",
            "lengthCalculated",
            "bpm",
            "year",
            "path",
            "filename",
            "bitrate",
            "bpmAnalyzed",
            "trackType",
            "isExternalTrack",
            "uuidOfExternalDatabase",
            "idTrackInExternalDatabase",
            "idAlbumArt",
        ];
        if self.version.is_at_least(1, 7, 1) {
            cols.push("pdbImportKey");
        }
        if self.version.is_at_least(1, 15, 0) {
            cols.push("fileBytes");
            cols.push("uri");
        }
        if self.version.is_at_least(1, 18, 0) {
            cols.push("isBeatGridLocked");
        }
        cols
    }

    /// Bind values matching [`Self::track_columns`]. Fields newer than the
    /// active version are silently ignored.
    fn track_values(&self, row: &TrackRow) -> Vec<Value> {
        let mut values: Vec<Value> = vec![
            row.play_order.into(),
            row.length.into(),
            row.length_calculated.into(),
            row.bpm.into(),
            row.year.into(),
            row.relative_path.clone().into(),
            row.filename.clone().into(),
            row.bitrate.into(),
            row.bpm_analyzed.into(),
            row.track_type.into(),
            row.is_external_track.into(),
            row.uuid_of_external_database.clone().into(),
            row.id_track_in_external_database.into(),
            row.album_art_id.into(),
        ];
        if self.version.is_at_least(1, 7, 1) {
            values.push(row.pdb_import_key.into());
        }
        if self.version.is_at_least(1, 15, 0) {
            values.push(row.file_bytes.into());
            values.push(row.uri.clone().into());
        }
        if self.version.is_at_least(1, 18, 0) {
            values.push(row.is_beatgrid_locked.into());
        }
        values
    }

    /// Insert a row into the `Track` table and return its id.
    pub fn create_track(&self, row: &TrackRow) -> Result<i64> {
        let cols = self.track_columns();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO music.Track ( {} ) VALUES ( {} )",
            cols.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(self.track_values(row)))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing row in the `Track` table.
    pub fn update_track(&self, id: i64, row: &TrackRow) -> Result<()> {
        let cols = self.track_columns();
        let assignments: Vec<String> = cols
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE music.Track SET {} WHERE id = ?{}",
            assignments.join(", "),
            cols.len() + 1
        );
        let mut values = self.track_values(row);
        values.push(id.into());
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Read a row from the `Track` table.
    pub fn get_track(&self, id: i64) -> Result<TrackRow> {
        let cols = self.track_columns();
        let sql = format!("SELECT {} FROM music.Track WHERE id = ?1", cols.join(", "));
        let version = self.version;
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                let mut track = TrackRow {
                    play_order: row.get(0)?,
                    length: row.get(1)?,
                    length_calculated: row.get(2)?,
                    bpm: row.get(3)?,
                    year: row.get(4)?,
                    relative_path: row.get(5)?,
                    filename: row.get(6)?,
                    bitrate: row.get(7)?,
                    bpm_analyzed: row.get(8)?,
                    track_type: row.get(9)?,
                    is_external_track: row.get(10)?,
                    uuid_of_external_database: row.get(11)?,
                    id_track_in_external_database: row.get(12)?,
                    album_art_id: row.get(13)?,
                    ..TrackRow::default()
                };
                let mut idx = 14;
                if version.is_at_least(1, 7, 1) {
                    track.pdb_import_key = row.get(idx)?;
                    idx += 1;
                }
                if version.is_at_least(1, 15, 0) {
                    track.file_bytes = row.get(idx)?;
                    track.uri = row.get(idx + 1)?;
                    idx += 2;
                }
                if version.is_at_least(1, 18, 0) {
                    track.is_beatgrid_locked = row.get(idx)?;
                }
                Ok(track)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match rows.len() {
            0 => Err(Error::TrackDeleted(id)),
            1 => Ok(rows.remove(0)),
            _ => Err(Error::TrackDatabaseInconsistency {
                message: "more than one track with the same id".into(),
                id,
            }),
        }
    }

    /// Delete a track row together with its metadata and performance data.
    /// The surrounding schema does not enforce this cascade, so the facade
    /// does.
    pub fn delete_track(&self, id: i64) -> Result<()> {
        let tx = self.transaction()?;
        self.conn.execute("DELETE FROM music.Track WHERE id = ?1", params![id])?;
        self.conn.execute("DELETE FROM music.MetaData WHERE id = ?1", params![id])?;
        self.conn.execute("DELETE FROM music.MetaDataInteger WHERE id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM perfdata.PerformanceData WHERE id = ?1", params![id])?;
        tx.commit()
    }

    /// Read one string metadata slot.
    pub fn get_meta_data(&self, id: i64, kind: StringMetadataKind) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT text FROM music.MetaData WHERE id = ?1 AND type = ?2 \
             AND text IS NOT NULL",
        )?;
        let texts = stmt
            .query_map(params![id, kind as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match texts.len() {
            0 => Ok(None),
            1 => Ok(texts.into_iter().next()),
            _ => Err(Error::TrackDatabaseInconsistency {
                message: "more than one MetaData entry of the same type for the same track"
                    .into(),
                id,
            }),
        }
    }

    /// Write one string metadata slot. A row is written even for `None`.
    pub fn set_meta_data(
        &self,
        id: i64,
        kind: StringMetadataKind,
        text: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "REPLACE INTO music.MetaData ( id, type, text ) VALUES ( ?1, ?2, ?3 )",
            params![id, kind as i64, text],
        )?;
        Ok(())
    }

    /// Read every string metadata slot row of a track, NULL text included.
    pub fn get_all_meta_data(&self, id: i64) -> Result<Vec<StringMetadataRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type, text FROM music.MetaData WHERE id = ?1")?;
        let raw = stmt
            .query_map(params![id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, Option<String>>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter()
            .map(|(track_id, kind, text)| {
                Ok(StringMetadataRow { track_id, kind: StringMetadataKind::from_raw(kind)?, text })
            })
            .collect()
    }

    /// Write the complete hardware-expected set of 15 string metadata rows
    /// for a track in a single statement. Rows are written even for absent
    /// values, and the unknown slots carry their required literals.
    pub fn set_canonical_meta_data(
        &self,
        id: i64,
        meta: &CanonicalStringMetadata,
    ) -> Result<()> {
        use StringMetadataKind::*;
        let slots: [(StringMetadataKind, Option<&str>); 15] = [
            (Title, meta.title.as_deref()),
            (Artist, meta.artist.as_deref()),
            (Album, meta.album.as_deref()),
            (Genre, meta.genre.as_deref()),
            (Comment, meta.comment.as_deref()),
            (Publisher, meta.publisher.as_deref()),
            (Composer, meta.composer.as_deref()),
            (Unknown8, None),
            (Unknown9, None),
            (DurationMmSs, meta.duration_mm_ss.as_deref()),
            (EverPlayed, meta.ever_played.as_deref()),
            (FileExtension, meta.file_extension.as_deref()),
            (Unknown15, Some("1")),
            (Unknown16, Some("1")),
            (Unknown17, None),
        ];
        let tuples: Vec<&str> = std::iter::repeat("( ?, ?, ? )").take(slots.len()).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO music.MetaData ( id, type, text ) VALUES {}",
            tuples.join(", ")
        );
        let mut values: Vec<Value> = Vec::with_capacity(3 * slots.len());
        for (kind, text) in slots {
            values.push(id.into());
            values.push((kind as i64).into());
            values.push(text.map(str::to_owned).into());
        }
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Read one integer metadata slot.
    pub fn get_meta_data_integer(
        &self,
        id: i64,
        kind: IntegerMetadataKind,
    ) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM music.MetaDataInteger WHERE id = ?1 AND type = ?2 \
             AND value IS NOT NULL",
        )?;
        let values = stmt
            .query_map(params![id, kind as i64], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match values.len() {
            0 => Ok(None),
            1 => Ok(values.into_iter().next()),
            _ => Err(Error::TrackDatabaseInconsistency {
                message:
                    "more than one MetaDataInteger entry of the same type for the same track"
                        .into(),
                id,
            }),
        }
    }

    /// Write one integer metadata slot. A row is written even for `None`.
    pub fn set_meta_data_integer(
        &self,
        id: i64,
        kind: IntegerMetadataKind,
        value: Option<i64>,
    ) -> Result<()> {
        self.conn.execute(
            "REPLACE INTO music.MetaDataInteger ( id, type, value ) VALUES ( ?1, ?2, ?3 )",
            params![id, kind as i64, value],
        )?;
        Ok(())
    }

    /// Read every integer metadata slot row of a track, NULL values
    /// included.
    pub fn get_all_meta_data_integer(&self, id: i64) -> Result<Vec<IntegerMetadataRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type, value FROM music.MetaDataInteger WHERE id = ?1")?;
        let raw = stmt
            .query_map(params![id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, Option<i64>>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter()
            .map(|(track_id, kind, value)| {
                Ok(IntegerMetadataRow {
                    track_id,
                    kind: IntegerMetadataKind::from_raw(kind)?,
                    value,
                })
            })
            .collect()
    }

    /// Write the complete 12-row integer metadata set for a track in a
    /// single statement.
    ///
    /// Hardware players have been observed to record integer metadata in
    /// the order 4, 5, 1, 2, 3, 6, 8, 7, 9, 10, 11, 12; the statement
    /// replicates that order for maximum compatibility.
    pub fn set_canonical_meta_data_integer(
        &self,
        id: i64,
        meta: &CanonicalIntegerMetadata,
    ) -> Result<()> {
        use IntegerMetadataKind::*;
        let slots: [(IntegerMetadataKind, Option<i64>); 12] = [
            (MusicalKey, meta.musical_key),
            (Rating, meta.rating),
            (LastPlayedTs, meta.last_played_ts),
            (LastModifiedTs, meta.last_modified_ts),
            (LastAccessedTs, meta.last_accessed_ts),
            (Unknown6, None),
            (Unknown8, None),
            (Unknown7, None),
            (Unknown9, None),
            (LastPlayHash, meta.last_play_hash),
            (Unknown11, Some(1)),
            (Unknown12, Some(1)),
        ];
        let tuples: Vec<&str> = std::iter::repeat("( ?, ?, ? )").take(slots.len()).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO music.MetaDataInteger ( id, type, value ) VALUES {}",
            tuples.join(", ")
        );
        let mut values: Vec<Value> = Vec::with_capacity(3 * slots.len());
        for (kind, value) in slots {
            values.push(id.into());
            values.push((kind as i64).into());
            values.push(value.into());
        }
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Columns of the `PerformanceData` table present in the active schema
    /// version, in binding order.
    fn performance_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![
            "id",
            "isAnalyzed",
            "isRendered",
            "trackData",
            "highResolutionWaveFormData",
            "overviewWaveFormData",
            "beatData",
            "quickCues",
            "loops",
            "hasSeratoValues",
        ];
        if self.version.is_at_least(1, 7, 1) {
            cols.push("hasRekordboxValues");
        }
        if self.version.is_at_least(1, 11, 1) {
            cols.push("hasTraktorValues");
        }
        cols
    }

    /// Read the performance data of a track, decoding every blob column.
    ///
    /// A track without a performance-data row has simply not been analysed
    /// yet; a default row is synthesized in that case.
    pub fn get_performance_data(&self, id: i64) -> Result<PerformanceDataRow> {
        struct RawRow {
            is_analyzed: i64,
            is_rendered: i64,
            track_data: Option<Vec<u8>>,
            high_res: Option<Vec<u8>>,
            overview: Option<Vec<u8>>,
            beat_data: Option<Vec<u8>>,
            quick_cues: Option<Vec<u8>>,
            loops: Option<Vec<u8>>,
            has_serato: i64,
            has_rekordbox: i64,
            has_traktor: i64,
        }

        let cols = self.performance_columns();
        let sql = format!(
            "SELECT {} FROM perfdata.PerformanceData WHERE id = ?1",
            cols.join(", ")
        );
        let version = self.version;
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(RawRow {
                    is_analyzed: row.get(1)?,
                    is_rendered: row.get(2)?,
                    track_data: row.get(3)?,
                    high_res: row.get(4)?,
                    overview: row.get(5)?,
                    beat_data: row.get(6)?,
                    quick_cues: row.get(7)?,
                    loops: row.get(8)?,
                    has_serato: row.get(9)?,
                    has_rekordbox: if version.is_at_least(1, 7, 1) { row.get(10)? } else { 0 },
                    has_traktor: if version.is_at_least(1, 11, 1) { row.get(11)? } else { 0 },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let raw = match rows.len() {
            0 => return Ok(PerformanceDataRow::new(id)),
            1 => rows.remove(0),
            _ => {
                return Err(Error::TrackDatabaseInconsistency {
                    message: "more than one PerformanceData row with the same id".into(),
                    id,
                })
            }
        };

        Ok(PerformanceDataRow {
            track_id: id,
            is_analyzed: raw.is_analyzed != 0,
            is_rendered: raw.is_rendered != 0,
            track_data: TrackData::decode(raw.track_data.as_deref().unwrap_or(&[]))?,
            high_res_waveform: HighResWaveformData::decode(raw.high_res.as_deref().unwrap_or(&[]))?,
            overview_waveform: OverviewWaveformData::decode(raw.overview.as_deref().unwrap_or(&[]))?,
            beat_data: BeatData::decode(raw.beat_data.as_deref().unwrap_or(&[]))?,
            quick_cues: QuickCuesData::decode(raw.quick_cues.as_deref().unwrap_or(&[]))?,
            loops: LoopsData::decode(raw.loops.as_deref().unwrap_or(&[]))?,
            has_serato_values: raw.has_serato != 0,
            has_rekordbox_values: raw.has_rekordbox != 0,
            has_traktor_values: raw.has_traktor != 0,
        })
    }

    /// Write the performance data of a track as one whole row. The row is
    /// inserted or replaced atomically; has-flag columns missing from older
    /// versions are dropped.
    pub fn set_performance_data(&self, row: &PerformanceDataRow) -> Result<()> {
        let cols = self.performance_columns();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO perfdata.PerformanceData ( {} ) VALUES ( {} )",
            cols.join(", "),
            placeholders.join(", ")
        );
        let mut values: Vec<Value> = vec![
            row.track_id.into(),
            (row.is_analyzed as i64).into(),
            (row.is_rendered as i64).into(),
            row.track_data.encode()?.into(),
            row.high_res_waveform.encode()?.into(),
            row.overview_waveform.encode()?.into(),
            row.beat_data.encode()?.into(),
            row.quick_cues.encode()?.into(),
            row.loops.encode()?.into(),
            (row.has_serato_values as i64).into(),
        ];
        if self.version.is_at_least(1, 7, 1) {
            values.push((row.has_rekordbox_values as i64).into());
        }
        if self.version.is_at_least(1, 11, 1) {
            values.push((row.has_traktor_values as i64).into());
        }
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Remove the performance-data row of a track, if any.
    pub fn clear_performance_data(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM perfdata.PerformanceData WHERE id = ?1", params![id])?;
        Ok(())
    }
}

/// Scoped transaction over a library handle.
///
/// The guard begins an exclusive transaction on acquisition, commits on
/// [`commit`](Self::commit) and rolls back when dropped uncommitted.
/// Nesting is flat: a guard acquired while a transaction is already active
/// is a no-op observer.
pub struct TransactionGuard<'a> {
    storage: &'a Storage,
    owns: bool,
    committed: bool,
}

impl TransactionGuard<'_> {
    pub fn commit(mut self) -> Result<()> {
        if self.owns {
            self.storage.conn.execute_batch("COMMIT")?;
            self.storage.in_transaction.set(false);
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.owns && !self.committed {
            let _ = self.storage.conn.execute_batch("ROLLBACK");
            self.storage.in_transaction.set(false);
        }
    }
}
