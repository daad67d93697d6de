//! Schema version detection
//!
//! Reads the stated version out of an opened library and resolves the
//! ambiguous 1.18.0 triple to its firmware or desktop variant by probing
//! the declared type of a discriminator column.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::Store;
use crate::version::{SchemaVersion, VERSION_1_18_0_EP, VERSION_1_18_0_FW};

/// Determine the schema version of the attached stores.
pub fn detect_version(conn: &Connection) -> Result<SchemaVersion> {
    // Both stores must carry an `Information` table.
    let table_count: i64 = conn.query_row(
        "SELECT SUM(rows) FROM ( \
         SELECT COUNT(*) AS rows FROM music.sqlite_master WHERE name = 'Information' \
         UNION ALL \
         SELECT COUNT(*) AS rows FROM perfdata.sqlite_master WHERE name = 'Information' )",
        [],
        |row| row.get(0),
    )?;
    if table_count != 2 {
        return Err(Error::DatabaseInconsistency(
            "did not find an Information table for both the music and \
             performance databases"
                .into(),
        ));
    }

    let music_version = read_version(conn, Store::Music)?;
    let perfdata_version = read_version(conn, Store::Perfdata)?;
    if music_version != perfdata_version {
        return Err(Error::DatabaseInconsistency(format!(
            "the stated schema versions do not match between the music ({music_version}) \
             and performance data ({perfdata_version}) databases"
        )));
    }

    // 1.18.0 exists in two variants told apart only by column typing.
    let version = if music_version.triple() == (1, 18, 0) {
        let is_numeric =
            column_type(conn, Store::Music, "Track", "isExternalTrack")?.as_deref()
                == Some("NUMERIC");
        if is_numeric {
            VERSION_1_18_0_FW
        } else {
            VERSION_1_18_0_EP
        }
    } else {
        music_version
    };

    if !version.is_supported() {
        return Err(Error::UnsupportedSchema(version));
    }
    debug!(%version, "detected schema version");
    Ok(version)
}

/// Read the version triple from one store's singleton `Information` row.
fn read_version(conn: &Connection, store: Store) -> Result<SchemaVersion> {
    let mut stmt = conn.prepare(&format!(
        "SELECT schemaVersionMajor, schemaVersionMinor, schemaVersionPatch \
         FROM {}.Information",
        store.schema_name()
    ))?;
    let mut rows = stmt
        .query_map([], |row| {
            Ok(SchemaVersion::new(row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match rows.len() {
        0 => Err(Error::DatabaseInconsistency(format!(
            "the Information table on {} holds no row",
            store.schema_name()
        ))),
        1 => Ok(rows.remove(0)),
        n => Err(Error::DatabaseInconsistency(format!(
            "the Information table on {} holds {n} rows, expected exactly one",
            store.schema_name()
        ))),
    }
}

/// Declared type of a column, if the column exists.
fn column_type(
    conn: &Connection,
    store: Store,
    table: &str,
    column: &str,
) -> Result<Option<String>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA {}.table_info('{}')",
        store.schema_name(),
        table
    ))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows.into_iter().find(|(name, _)| name == column).map(|(_, ty)| ty))
}
