//! Error types for enginelib

use std::path::PathBuf;

use thiserror::Error;

use crate::version::SchemaVersion;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no library found at {}", .0.display())]
    LibraryNotFound(PathBuf),

    #[error("unsupported schema version {0}")]
    UnsupportedSchema(SchemaVersion),

    #[error("database inconsistency: {0}")]
    DatabaseInconsistency(String),

    #[error("track {0} does not exist")]
    TrackDeleted(i64),

    #[error("track database inconsistency for track {id}: {message}")]
    TrackDatabaseInconsistency { message: String, id: i64 },

    #[error("corrupt blob: {0}")]
    CorruptBlob(String),

    #[error("unsupported blob version tag {0}")]
    UnsupportedBlobVersion(u8),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
