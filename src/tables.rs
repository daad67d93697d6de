//! Per-version table catalog
//!
//! The definitions below encode the full table layout of both stores for
//! every recognised schema version. Columns introduced by later versions
//! are gated on the version triple; the 1.18.0 desktop variant declares
//! its boolean columns as INTEGER where every other version uses NUMERIC.

use crate::schema::{ColumnDef, IndexDef, Store, TableDef};
use crate::version::{SchemaVersion, VERSION_1_18_0_EP};

struct Ctx {
    version: SchemaVersion,
    bool_type: &'static str,
}

fn col(name: &'static str, sql_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type,
        not_null: false,
        default_value: None,
        pk_rank: 0,
        auto_increment: false,
    }
}

/// `id INTEGER PRIMARY KEY AUTOINCREMENT`
fn id_pk() -> ColumnDef {
    ColumnDef { pk_rank: 1, auto_increment: true, ..col("id", "INTEGER") }
}

fn pk_col(name: &'static str, sql_type: &'static str, pk_rank: i64) -> ColumnDef {
    ColumnDef { pk_rank, ..col(name, sql_type) }
}

fn idx(name: String, columns: Vec<&'static str>) -> IndexDef {
    IndexDef { name, unique: false, origin: "c", partial: false, columns }
}

fn table_idx(table: &str, column: &'static str) -> IndexDef {
    idx(format!("index_{table}_{column}"), vec![column])
}

/// The implicit index SQLite creates for a composite primary key.
fn pk_autoindex(table: &str, columns: Vec<&'static str>) -> IndexDef {
    IndexDef {
        name: format!("sqlite_autoindex_{table}_1"),
        unique: true,
        origin: "pk",
        partial: false,
        columns,
    }
}

fn information(store: Store) -> TableDef {
    TableDef {
        store,
        name: "Information",
        columns: vec![
            id_pk(),
            col("uuid", "TEXT"),
            col("schemaVersionMajor", "INTEGER"),
            col("schemaVersionMinor", "INTEGER"),
            col("schemaVersionPatch", "INTEGER"),
            col("currentPlayedIndiciator", "INTEGER"),
            col("lastRekordBoxLibraryImportReadCounter", "INTEGER"),
        ],
        indices: vec![table_idx("Information", "id")],
    }
}

fn album_art() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "AlbumArt",
        columns: vec![id_pk(), col("hash", "TEXT"), col("albumArt", "BLOB")],
        indices: vec![table_idx("AlbumArt", "id"), table_idx("AlbumArt", "hash")],
    }
}

fn copied_track() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "CopiedTrack",
        columns: vec![
            pk_col("trackId", "INTEGER", 1),
            col("uuidOfSourceDatabase", "TEXT"),
            col("idOfTrackInSourceDatabase", "INTEGER"),
        ],
        indices: vec![table_idx("CopiedTrack", "trackId")],
    }
}

fn crate_() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "Crate",
        columns: vec![id_pk(), col("title", "TEXT"), col("path", "TEXT")],
        indices: vec![
            table_idx("Crate", "id"),
            table_idx("Crate", "title"),
            table_idx("Crate", "path"),
        ],
    }
}

fn crate_hierarchy() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "CrateHierarchy",
        columns: vec![col("crateId", "INTEGER"), col("crateIdChild", "INTEGER")],
        indices: vec![
            table_idx("CrateHierarchy", "crateId"),
            table_idx("CrateHierarchy", "crateIdChild"),
        ],
    }
}

fn crate_parent_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "CrateParentList",
        columns: vec![col("crateOriginId", "INTEGER"), col("crateParentId", "INTEGER")],
        indices: vec![
            table_idx("CrateParentList", "crateOriginId"),
            table_idx("CrateParentList", "crateParentId"),
        ],
    }
}

fn crate_track_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "CrateTrackList",
        columns: vec![col("crateId", "INTEGER"), col("trackId", "INTEGER")],
        indices: vec![
            table_idx("CrateTrackList", "crateId"),
            table_idx("CrateTrackList", "trackId"),
        ],
    }
}

fn historylist() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "Historylist",
        columns: vec![id_pk(), col("title", "TEXT")],
        indices: vec![table_idx("Historylist", "id")],
    }
}

fn historylist_track_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "HistorylistTrackList",
        columns: vec![
            col("historylistId", "INTEGER"),
            col("trackId", "INTEGER"),
            col("trackIdInOriginDatabase", "INTEGER"),
            col("databaseUuid", "TEXT"),
            col("date", "INTEGER"),
        ],
        indices: vec![
            table_idx("HistorylistTrackList", "historylistId"),
            table_idx("HistorylistTrackList", "trackId"),
            table_idx("HistorylistTrackList", "date"),
        ],
    }
}

fn meta_data() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "MetaData",
        columns: vec![
            pk_col("id", "INTEGER", 1),
            pk_col("type", "INTEGER", 2),
            col("text", "TEXT"),
        ],
        indices: vec![
            pk_autoindex("MetaData", vec!["id", "type"]),
            table_idx("MetaData", "id"),
            table_idx("MetaData", "type"),
            table_idx("MetaData", "text"),
        ],
    }
}

fn meta_data_integer() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "MetaDataInteger",
        columns: vec![
            pk_col("id", "INTEGER", 1),
            pk_col("type", "INTEGER", 2),
            col("value", "INTEGER"),
        ],
        indices: vec![
            pk_autoindex("MetaDataInteger", vec!["id", "type"]),
            table_idx("MetaDataInteger", "id"),
            table_idx("MetaDataInteger", "type"),
            table_idx("MetaDataInteger", "value"),
        ],
    }
}

fn playlist() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "Playlist",
        columns: vec![id_pk(), col("title", "TEXT")],
        indices: vec![table_idx("Playlist", "id")],
    }
}

fn playlist_track_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "PlaylistTrackList",
        columns: vec![
            col("playlistId", "INTEGER"),
            col("trackId", "INTEGER"),
            col("trackIdInOriginDatabase", "INTEGER"),
            col("databaseUuid", "TEXT"),
            col("trackNumber", "INTEGER"),
        ],
        indices: vec![
            table_idx("PlaylistTrackList", "playlistId"),
            table_idx("PlaylistTrackList", "trackId"),
        ],
    }
}

fn preparelist() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "Preparelist",
        columns: vec![id_pk(), col("title", "TEXT")],
        indices: vec![table_idx("Preparelist", "id")],
    }
}

fn preparelist_track_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "PreparelistTrackList",
        columns: vec![
            col("playlistId", "INTEGER"),
            col("trackId", "INTEGER"),
            col("trackIdInOriginDatabase", "INTEGER"),
            col("databaseUuid", "TEXT"),
            col("trackNumber", "INTEGER"),
        ],
        indices: vec![
            table_idx("PreparelistTrackList", "playlistId"),
            table_idx("PreparelistTrackList", "trackId"),
        ],
    }
}

fn track(ctx: &Ctx) -> TableDef {
    let mut columns = vec![
        id_pk(),
        col("playOrder", "INTEGER"),
        col("length", "INTEGER"),
        col("lengthCalculated", "INTEGER"),
        col("bpm", "INTEGER"),
        col("year", "INTEGER"),
        col("path", "TEXT"),
        col("filename", "TEXT"),
        col("bitrate", "INTEGER"),
        col("bpmAnalyzed", "REAL"),
        col("trackType", "INTEGER"),
        col("isExternalTrack", ctx.bool_type),
        col("uuidOfExternalDatabase", "TEXT"),
        col("idTrackInExternalDatabase", "INTEGER"),
        col("idAlbumArt", "INTEGER"),
    ];
    if ctx.version.is_at_least(1, 7, 1) {
        columns.push(col("pdbImportKey", "INTEGER"));
    }
    if ctx.version.is_at_least(1, 15, 0) {
        columns.push(col("fileBytes", "INTEGER"));
        columns.push(col("uri", "TEXT"));
    }
    if ctx.version.is_at_least(1, 18, 0) {
        columns.push(col("isBeatGridLocked", ctx.bool_type));
    }
    TableDef {
        store: Store::Music,
        name: "Track",
        columns,
        indices: vec![
            table_idx("Track", "id"),
            table_idx("Track", "path"),
            table_idx("Track", "filename"),
            table_idx("Track", "idAlbumArt"),
            table_idx("Track", "idTrackInExternalDatabase"),
            table_idx("Track", "uuidOfExternalDatabase"),
        ],
    }
}

fn list(ctx: &Ctx) -> TableDef {
    let mut columns = vec![
        pk_col("id", "INTEGER", 1),
        pk_col("type", "INTEGER", 2),
        col("title", "TEXT"),
        col("path", "TEXT"),
        col("isFolder", ctx.bool_type),
    ];
    if ctx.version.is_at_least(1, 13, 0) {
        columns.push(col("trackCount", "INTEGER"));
    }
    if ctx.version.is_at_least(1, 13, 1) {
        columns.push(col("ordering", "INTEGER"));
    }
    if ctx.version.is_at_least(1, 13, 2) {
        columns.push(col("isExplicitlyExported", ctx.bool_type));
    }
    TableDef {
        store: Store::Music,
        name: "List",
        columns,
        indices: vec![
            pk_autoindex("List", vec!["id", "type"]),
            table_idx("List", "id"),
            table_idx("List", "type"),
            table_idx("List", "path"),
        ],
    }
}

fn list_hierarchy() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "ListHierarchy",
        columns: vec![
            col("listId", "INTEGER"),
            col("listType", "INTEGER"),
            col("listIdChild", "INTEGER"),
            col("listTypeChild", "INTEGER"),
        ],
        indices: vec![
            table_idx("ListHierarchy", "listId"),
            table_idx("ListHierarchy", "listIdChild"),
        ],
    }
}

fn list_parent_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "ListParentList",
        columns: vec![
            col("listOriginId", "INTEGER"),
            col("listOriginType", "INTEGER"),
            col("listParentId", "INTEGER"),
            col("listParentType", "INTEGER"),
        ],
        indices: vec![
            table_idx("ListParentList", "listOriginId"),
            table_idx("ListParentList", "listParentId"),
        ],
    }
}

fn list_track_list() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "ListTrackList",
        columns: vec![
            col("listId", "INTEGER"),
            col("listType", "INTEGER"),
            col("trackId", "INTEGER"),
            col("trackIdInOriginDatabase", "INTEGER"),
            col("databaseUuid", "TEXT"),
            col("trackNumber", "INTEGER"),
        ],
        indices: vec![
            table_idx("ListTrackList", "listId"),
            table_idx("ListTrackList", "trackId"),
        ],
    }
}

fn change_log() -> TableDef {
    TableDef {
        store: Store::Music,
        name: "ChangeLog",
        columns: vec![id_pk(), col("trackId", "INTEGER"), col("type", "INTEGER")],
        indices: vec![table_idx("ChangeLog", "id"), table_idx("ChangeLog", "trackId")],
    }
}

fn performance_data(ctx: &Ctx) -> TableDef {
    let mut columns = vec![
        pk_col("id", "INTEGER", 1),
        col("isAnalyzed", ctx.bool_type),
        col("isRendered", ctx.bool_type),
        col("trackData", "BLOB"),
        col("highResolutionWaveFormData", "BLOB"),
        col("overviewWaveFormData", "BLOB"),
        col("beatData", "BLOB"),
        col("quickCues", "BLOB"),
        col("loops", "BLOB"),
        col("hasSeratoValues", ctx.bool_type),
    ];
    if ctx.version.is_at_least(1, 7, 1) {
        columns.push(col("hasRekordboxValues", ctx.bool_type));
    }
    if ctx.version.is_at_least(1, 11, 1) {
        columns.push(col("hasTraktorValues", ctx.bool_type));
    }
    TableDef {
        store: Store::Perfdata,
        name: "PerformanceData",
        columns,
        indices: vec![table_idx("PerformanceData", "id")],
    }
}

pub(crate) fn tables_for(version: SchemaVersion) -> Vec<TableDef> {
    let ctx = Ctx {
        version,
        bool_type: if version == VERSION_1_18_0_EP { "INTEGER" } else { "NUMERIC" },
    };

    let mut tables = vec![
        album_art(),
        copied_track(),
        crate_(),
        crate_hierarchy(),
        crate_parent_list(),
        crate_track_list(),
        historylist(),
        historylist_track_list(),
        information(Store::Music),
        meta_data(),
        meta_data_integer(),
        playlist(),
        playlist_track_list(),
        preparelist(),
        preparelist_track_list(),
        track(&ctx),
    ];
    if ctx.version.is_at_least(1, 9, 1) {
        tables.push(list(&ctx));
        tables.push(list_hierarchy());
        tables.push(list_parent_list());
        tables.push(list_track_list());
    }
    if ctx.version.is_at_least(1, 17, 0) {
        tables.push(change_log());
    }
    tables.push(information(Store::Perfdata));
    tables.push(performance_data(&ctx));
    tables
}
