// Session store module
// SQLite persistence of derived series and raw-input provenance, one database per session

pub mod db;
pub mod models;
pub mod queries;

pub use db::{open_in_memory, open_session_db, DbConnection, SESSION_DB_FILE};
pub use models::{SeriesKey, SourceArtifact};
pub use queries::{
    file_sha256, list_artifacts, list_series, read_series, record_artifact, series_exists,
    write_series,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode '{key}': {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{key}' has not been computed yet; run `{step}` first")]
    NotComputed { key: SeriesKey, step: &'static str },

    #[error("Corrupt row in the {table} table: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
