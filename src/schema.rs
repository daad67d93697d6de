//! Versioned schema catalog
//!
//! One frozen definition exists per recognised schema version. A definition
//! can materialise itself on an empty pair of stores (DDL plus seed rows)
//! and can validate that an existing pair of stores matches it exactly:
//! every table, every column property, every index, in a canonical order.
//! Creation and validation are driven by the same table of values, so a
//! freshly created library always validates.
//!
//! Validation walks the reference definition and the observed SQLite
//! catalog in lockstep (tables by name, columns by name, indices by name,
//! index columns by rank) and stops at the first divergence, naming the
//! object in the error.

use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::tables;
use crate::version::SchemaVersion;

/// Which of the two attached stores a table lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Music,
    Perfdata,
}

impl Store {
    /// The attachment schema name clients must use.
    pub fn schema_name(&self) -> &'static str {
        match self {
            Store::Music => "music",
            Store::Perfdata => "perfdata",
        }
    }
}

/// Reference definition of one column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Declared SQL type, exactly as `PRAGMA table_info` reports it.
    pub sql_type: &'static str,
    pub not_null: bool,
    pub default_value: Option<&'static str>,
    /// 1-based rank within the primary key, 0 when not part of it.
    pub pk_rank: i64,
    pub auto_increment: bool,
}

/// Reference definition of one index.
#[derive(Debug, Clone)]
pub struct IndexDef {
    pub name: String,
    pub unique: bool,
    /// Creation method as `PRAGMA index_list` reports it: "c" for an
    /// explicit CREATE INDEX, "pk" for a primary-key autoindex.
    pub origin: &'static str,
    pub partial: bool,
    pub columns: Vec<&'static str>,
}

/// Reference definition of one table with its indices.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub store: Store,
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
    pub indices: Vec<IndexDef>,
}

impl TableDef {
    fn has_autoincrement(&self) -> bool {
        self.columns.iter().any(|c| c.auto_increment)
    }

    fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        let pk_count = self.columns.iter().filter(|c| c.pk_rank > 0).count();
        for column in &self.columns {
            let mut clause = format!("{} {}", column.name, column.sql_type);
            if column.pk_rank > 0 && pk_count == 1 {
                clause.push_str(" PRIMARY KEY");
                if column.auto_increment {
                    clause.push_str(" AUTOINCREMENT");
                }
            }
            if column.not_null {
                clause.push_str(" NOT NULL");
            }
            if let Some(default) = column.default_value {
                clause.push_str(&format!(" DEFAULT {default}"));
            }
            parts.push(clause);
        }
        if pk_count > 1 {
            let mut pk_cols: Vec<&ColumnDef> =
                self.columns.iter().filter(|c| c.pk_rank > 0).collect();
            pk_cols.sort_by_key(|c| c.pk_rank);
            let names: Vec<&str> = pk_cols.iter().map(|c| c.name).collect();
            parts.push(format!("PRIMARY KEY ( {} )", names.join(", ")));
        }
        format!(
            "CREATE TABLE {}.{} ( {} )",
            self.store.schema_name(),
            self.name,
            parts.join(", ")
        )
    }

    fn create_index_sql(&self) -> Vec<String> {
        self.indices
            .iter()
            .filter(|idx| idx.origin == "c")
            .map(|idx| {
                format!(
                    "CREATE {}INDEX {}.{} ON {} ( {} )",
                    if idx.unique { "UNIQUE " } else { "" },
                    self.store.schema_name(),
                    idx.name,
                    self.name,
                    idx.columns.join(", ")
                )
            })
            .collect()
    }
}

/// The frozen definition of one schema version across both stores.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    pub version: SchemaVersion,
    pub tables: Vec<TableDef>,
}

/// Look up the definition for a version. The registry is a pure table of
/// values; unknown versions are rejected.
pub fn schema_for(version: &SchemaVersion) -> Result<SchemaDef> {
    if !version.is_supported() {
        return Err(Error::UnsupportedSchema(*version));
    }
    Ok(SchemaDef { version: *version, tables: tables::tables_for(*version) })
}

impl SchemaDef {
    /// Materialise the schema on an empty pair of attached stores: all
    /// tables, all indices, and the seed rows (the `Information` row in
    /// both stores sharing a freshly generated UUID, and the placeholder
    /// "no album art" row). Returns the library UUID.
    pub fn create(&self, conn: &Connection) -> Result<String> {
        for table in &self.tables {
            conn.execute_batch(&table.create_table_sql())?;
            for sql in table.create_index_sql() {
                conn.execute_batch(&sql)?;
            }
        }

        let uuid = Uuid::new_v4().to_string();
        for store in [Store::Music, Store::Perfdata] {
            conn.execute(
                &format!(
                    "INSERT INTO {}.Information ( uuid, schemaVersionMajor, \
                     schemaVersionMinor, schemaVersionPatch, \
                     currentPlayedIndiciator, \
                     lastRekordBoxLibraryImportReadCounter ) \
                     VALUES ( ?1, ?2, ?3, ?4, 0, 0 )",
                    store.schema_name()
                ),
                rusqlite::params![uuid, self.version.major, self.version.minor, self.version.patch],
            )?;
        }
        // Track rows reference album art id 1 to mean "no album art".
        conn.execute("INSERT INTO music.AlbumArt ( id, hash, albumArt ) VALUES ( 1, '', NULL )", [])?;

        debug!(version = %self.version, uuid = %uuid, "created schema");
        Ok(uuid)
    }

    /// Validate that the attached stores match this definition exactly.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for store in [Store::Music, Store::Perfdata] {
            self.validate_store(conn, store)?;
        }
        debug!(version = %self.version, "schema validated");
        Ok(())
    }

    fn validate_store(&self, conn: &Connection, store: Store) -> Result<()> {
        let defs: Vec<&TableDef> = self.tables.iter().filter(|t| t.store == store).collect();

        let mut expected: Vec<&str> = defs.iter().map(|t| t.name).collect();
        // AUTOINCREMENT brings the internal sequence table with it.
        if defs.iter().any(|t| t.has_autoincrement()) {
            expected.push("sqlite_sequence");
        }
        expected.sort_unstable();

        let observed = observed_tables(conn, store)?;
        let mut iter = observed.iter();
        for exp in &expected {
            match iter.next() {
                None => {
                    return Err(Error::DatabaseInconsistency(format!(
                        "table {exp} missing from {}",
                        store.schema_name()
                    )))
                }
                Some(obs) if obs != exp => {
                    return Err(Error::DatabaseInconsistency(format!(
                        "table {obs} on {} in wrong order, expected {exp}",
                        store.schema_name()
                    )))
                }
                Some(_) => {}
            }
        }
        if iter.next().is_some() {
            return Err(Error::DatabaseInconsistency(format!(
                "table list for {} has more entries than expected",
                store.schema_name()
            )));
        }

        for table in defs {
            self.validate_table(conn, table)?;
        }
        Ok(())
    }

    fn validate_table(&self, conn: &Connection, table: &TableDef) -> Result<()> {
        let mut expected_cols: Vec<&ColumnDef> = table.columns.iter().collect();
        expected_cols.sort_unstable_by_key(|c| c.name);
        let observed_cols = observed_columns(conn, table.store, table.name)?;

        let mut iter = observed_cols.iter();
        for exp in &expected_cols {
            let obs = iter.next().ok_or_else(|| {
                Error::DatabaseInconsistency(format!(
                    "column {} missing on {}",
                    exp.name, table.name
                ))
            })?;
            if obs.name != exp.name {
                return Err(Error::DatabaseInconsistency(format!(
                    "column {} on {} in wrong order, expected {}",
                    obs.name, table.name, exp.name
                )));
            }
            if obs.sql_type != exp.sql_type {
                return Err(Error::DatabaseInconsistency(format!(
                    "column {} on {} has wrong type: {}, expected {}",
                    exp.name, table.name, obs.sql_type, exp.sql_type
                )));
            }
            if obs.not_null != exp.not_null {
                return Err(Error::DatabaseInconsistency(format!(
                    "column {} on {} has wrong nullability: {}",
                    exp.name, table.name, obs.not_null
                )));
            }
            if obs.default_value.as_deref() != exp.default_value {
                return Err(Error::DatabaseInconsistency(format!(
                    "column {} on {} has wrong default value: {:?}, expected {:?}",
                    exp.name, table.name, obs.default_value, exp.default_value
                )));
            }
            if obs.pk_rank != exp.pk_rank {
                return Err(Error::DatabaseInconsistency(format!(
                    "column {} on {} has wrong PK membership: {}",
                    exp.name, table.name, obs.pk_rank
                )));
            }
        }
        if iter.next().is_some() {
            return Err(Error::DatabaseInconsistency(format!(
                "columns for {} have more entries than expected",
                table.name
            )));
        }

        let mut expected_indices: Vec<&IndexDef> = table.indices.iter().collect();
        expected_indices.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        let observed_indices = observed_indices(conn, table.store, table.name)?;

        let mut iter = observed_indices.iter();
        for exp in &expected_indices {
            let obs = iter.next().ok_or_else(|| {
                Error::DatabaseInconsistency(format!(
                    "index {} missing on {}",
                    exp.name, table.name
                ))
            })?;
            if obs.name != exp.name {
                return Err(Error::DatabaseInconsistency(format!(
                    "index {} on {} in wrong order, expected {}",
                    obs.name, table.name, exp.name
                )));
            }
            if obs.unique != exp.unique {
                return Err(Error::DatabaseInconsistency(format!(
                    "index {} on {} has wrong uniqueness: {}",
                    exp.name, table.name, obs.unique
                )));
            }
            if obs.origin != exp.origin {
                return Err(Error::DatabaseInconsistency(format!(
                    "index {} on {} has wrong creation method: \"{}\"",
                    exp.name, table.name, obs.origin
                )));
            }
            if obs.partial != exp.partial {
                return Err(Error::DatabaseInconsistency(format!(
                    "index {} on {} has wrong partiality: {}",
                    exp.name, table.name, obs.partial
                )));
            }
        }
        if iter.next().is_some() {
            return Err(Error::DatabaseInconsistency(format!(
                "indices for {} have more entries than expected",
                table.name
            )));
        }

        for index in &table.indices {
            let observed = observed_index_columns(conn, table.store, &index.name)?;
            let mut iter = observed.iter();
            for (rank, exp_col) in index.columns.iter().enumerate() {
                let obs = iter.next().ok_or_else(|| {
                    Error::DatabaseInconsistency(format!(
                        "column {exp_col} missing from index {}",
                        index.name
                    ))
                })?;
                if obs.0 != rank as i64 {
                    return Err(Error::DatabaseInconsistency(format!(
                        "column {exp_col} on index {} has wrong rank: {}",
                        index.name, obs.0
                    )));
                }
                if obs.1 != *exp_col {
                    return Err(Error::DatabaseInconsistency(format!(
                        "column {} on index {} in wrong order, expected {exp_col}",
                        obs.1, index.name
                    )));
                }
            }
            if iter.next().is_some() {
                return Err(Error::DatabaseInconsistency(format!(
                    "index {} has more columns than expected",
                    index.name
                )));
            }
        }

        Ok(())
    }
}

struct ObservedColumn {
    name: String,
    sql_type: String,
    not_null: bool,
    default_value: Option<String>,
    pk_rank: i64,
}

struct ObservedIndex {
    name: String,
    unique: bool,
    origin: String,
    partial: bool,
}

fn observed_tables(conn: &Connection, store: Store) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT name FROM {}.sqlite_master WHERE type = 'table'",
        store.schema_name()
    ))?;
    let mut names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    names.sort_unstable();
    Ok(names)
}

fn observed_columns(conn: &Connection, store: Store, table: &str) -> Result<Vec<ObservedColumn>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA {}.table_info('{}')",
        store.schema_name(),
        table
    ))?;
    let mut cols = stmt
        .query_map([], |row| {
            Ok(ObservedColumn {
                name: row.get(1)?,
                sql_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                pk_rank: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    cols.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    Ok(cols)
}

fn observed_indices(conn: &Connection, store: Store, table: &str) -> Result<Vec<ObservedIndex>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA {}.index_list('{}')",
        store.schema_name(),
        table
    ))?;
    let mut indices = stmt
        .query_map([], |row| {
            Ok(ObservedIndex {
                name: row.get(1)?,
                unique: row.get::<_, i64>(2)? != 0,
                origin: row.get(3)?,
                partial: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    indices.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    Ok(indices)
}

fn observed_index_columns(
    conn: &Connection,
    store: Store,
    index: &str,
) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA {}.index_info('{}')",
        store.schema_name(),
        index
    ))?;
    let mut cols = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    cols.sort_unstable_by_key(|(rank, _)| *rank);
    Ok(cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{ALL_VERSIONS, VERSION_1_18_0_EP, VERSION_1_18_0_FW, VERSION_1_6_0};

    fn attached_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("ATTACH ':memory:' AS music; ATTACH ':memory:' AS perfdata;")
            .unwrap();
        conn
    }

    fn created(version: &SchemaVersion) -> (Connection, SchemaDef) {
        let conn = attached_conn();
        let schema = schema_for(version).unwrap();
        schema.create(&conn).unwrap();
        (conn, schema)
    }

    fn expect_inconsistency(result: Result<()>, needle: &str) {
        match result {
            Err(Error::DatabaseInconsistency(message)) => {
                assert!(
                    message.contains(needle),
                    "expected {needle:?} in {message:?}"
                );
            }
            other => panic!("expected DatabaseInconsistency, got {other:?}"),
        }
    }

    #[test]
    fn test_create_then_validate_every_version() {
        for version in ALL_VERSIONS {
            let (conn, schema) = created(&version);
            schema.validate(&conn).unwrap_or_else(|e| panic!("{version}: {e}"));
        }
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = schema_for(&SchemaVersion::new(1, 5, 0)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema(_)));
    }

    #[test]
    fn test_seed_rows_written() {
        let (conn, _) = created(&VERSION_1_6_0);
        let (uuid_m, major): (String, i64) = conn
            .query_row(
                "SELECT uuid, schemaVersionMajor FROM music.Information",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        let uuid_p: String = conn
            .query_row("SELECT uuid FROM perfdata.Information", [], |r| r.get(0))
            .unwrap();
        assert_eq!(uuid_m, uuid_p);
        assert_eq!(major, 1);
        assert!(uuid::Uuid::parse_str(&uuid_m).is_ok());
        let art_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM music.AlbumArt WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(art_count, 1);
    }

    #[test]
    fn test_renamed_column_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch("ALTER TABLE music.Track RENAME COLUMN bitrate TO bitrate2")
            .unwrap();
        expect_inconsistency(schema.validate(&conn), "bitrate");
    }

    #[test]
    fn test_added_column_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch("ALTER TABLE music.MetaData ADD COLUMN extra TEXT").unwrap();
        expect_inconsistency(schema.validate(&conn), "extra");
    }

    #[test]
    fn test_extra_table_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch("CREATE TABLE music.zzz ( x INTEGER )").unwrap();
        expect_inconsistency(schema.validate(&conn), "more entries than expected");
    }

    #[test]
    fn test_dropped_index_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch("DROP INDEX music.index_Track_path").unwrap();
        expect_inconsistency(schema.validate(&conn), "index_Track_path");
    }

    #[test]
    fn test_wrong_uniqueness_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch(
            "DROP INDEX music.index_Track_path; \
             CREATE UNIQUE INDEX music.index_Track_path ON Track ( path )",
        )
        .unwrap();
        expect_inconsistency(schema.validate(&conn), "wrong uniqueness");
    }

    #[test]
    fn test_wrong_nullability_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch(
            "DROP TABLE music.Historylist; \
             CREATE TABLE music.Historylist ( id INTEGER PRIMARY KEY AUTOINCREMENT, \
             title TEXT NOT NULL ); \
             CREATE INDEX music.index_Historylist_id ON Historylist ( id )",
        )
        .unwrap();
        expect_inconsistency(schema.validate(&conn), "wrong nullability");
    }

    #[test]
    fn test_wrong_default_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch(
            "DROP TABLE music.Historylist; \
             CREATE TABLE music.Historylist ( id INTEGER PRIMARY KEY AUTOINCREMENT, \
             title TEXT DEFAULT 'x' ); \
             CREATE INDEX music.index_Historylist_id ON Historylist ( id )",
        )
        .unwrap();
        expect_inconsistency(schema.validate(&conn), "wrong default value");
    }

    #[test]
    fn test_wrong_pk_membership_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch(
            "DROP TABLE music.MetaData; \
             CREATE TABLE music.MetaData ( id INTEGER, type INTEGER, text TEXT ); \
             CREATE INDEX music.index_MetaData_id ON MetaData ( id ); \
             CREATE INDEX music.index_MetaData_type ON MetaData ( type ); \
             CREATE INDEX music.index_MetaData_text ON MetaData ( text )",
        )
        .unwrap();
        expect_inconsistency(schema.validate(&conn), "wrong PK membership");
    }

    #[test]
    fn test_swapped_pk_order_detected() {
        let (conn, schema) = created(&VERSION_1_6_0);
        conn.execute_batch(
            "DROP TABLE music.MetaData; \
             CREATE TABLE music.MetaData ( id INTEGER, type INTEGER, text TEXT, \
             PRIMARY KEY ( type, id ) ); \
             CREATE INDEX music.index_MetaData_id ON MetaData ( id ); \
             CREATE INDEX music.index_MetaData_type ON MetaData ( type ); \
             CREATE INDEX music.index_MetaData_text ON MetaData ( text )",
        )
        .unwrap();
        expect_inconsistency(schema.validate(&conn), "PK membership");
    }

    #[test]
    fn test_variant_catalogs_differ_only_in_bool_types() {
        let (conn, _) = created(&VERSION_1_18_0_FW);
        let ep = schema_for(&VERSION_1_18_0_EP).unwrap();
        expect_inconsistency(ep.validate(&conn), "wrong type");
    }
}
