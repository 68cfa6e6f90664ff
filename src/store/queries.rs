// Store operations
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::db::DbConnection;
use super::models::{SeriesKey, SourceArtifact};
use super::{StoreError, StoreResult};

// ==================== DERIVED SERIES ====================

/// Persist `value` under `key`, replacing any earlier value
pub fn write_series<T: Serialize + ?Sized>(db: &DbConnection, key: SeriesKey, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string(value).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })?;

    let conn = db.lock();
    conn.execute(
        "INSERT INTO derived_series (key, value_json, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        params![key.as_str(), json, Utc::now().to_rfc3339()],
    )?;

    log::debug!("Stored {} ({} bytes)", key, json.len());
    Ok(())
}

/// Load the value under `key`; a missing key is `NotComputed`
pub fn read_series<T: DeserializeOwned>(db: &DbConnection, key: SeriesKey) -> StoreResult<T> {
    let conn = db.lock();
    let json: Option<String> = conn
        .query_row(
            "SELECT value_json FROM derived_series WHERE key = ?1",
            [key.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let json = json.ok_or(StoreError::NotComputed {
        key,
        step: key.producer(),
    })?;

    serde_json::from_str(&json).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })
}

pub fn series_exists(db: &DbConnection, key: SeriesKey) -> StoreResult<bool> {
    let conn = db.lock();
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM derived_series WHERE key = ?1",
        [key.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Stored keys with their last update time
pub fn list_series(db: &DbConnection) -> StoreResult<Vec<(SeriesKey, DateTime<Utc>)>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT key, updated_at FROM derived_series ORDER BY key")?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, updated_at)| {
            let key = SeriesKey::from_name(&name).ok_or_else(|| StoreError::Corrupt {
                table: "derived_series",
                detail: format!("unknown key '{}'", name),
            })?;
            Ok((key, parse_timestamp("derived_series", &updated_at)?))
        })
        .collect()
}

// ==================== PROVENANCE ====================

/// Calculate the SHA-256 of a file's contents
pub fn file_sha256(path: &Path) -> StoreResult<(String, i64)> {
    let data = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok((hex::encode(hasher.finalize()), data.len() as i64))
}

/// Record a raw input file used by this session
/// A file already recorded under `kind` keeps its row; only a changed hash refreshes it.
pub fn record_artifact(db: &DbConnection, kind: &str, path: &Path) -> StoreResult<SourceArtifact> {
    let (sha256, bytes) = file_sha256(path)?;
    let path = path.display().to_string();

    let conn = db.lock();
    let changed = conn.execute(
        "INSERT INTO artifacts (id, kind, path, sha256, bytes, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(kind, path) DO UPDATE SET
            sha256 = excluded.sha256, bytes = excluded.bytes, recorded_at = excluded.recorded_at
         WHERE artifacts.sha256 != excluded.sha256",
        params![
            Uuid::new_v4().to_string(),
            kind,
            path,
            sha256,
            bytes,
            Utc::now().to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        log::debug!("{} {} unchanged since last recorded", kind, path);
    }

    let row = conn.query_row(
        &format!("{} WHERE kind = ?1 AND path = ?2", ARTIFACT_COLUMNS),
        params![kind, path],
        artifact_row,
    )?;
    into_artifact(row)
}

/// All recorded artifacts, oldest first
pub fn list_artifacts(db: &DbConnection) -> StoreResult<Vec<SourceArtifact>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!("{} ORDER BY recorded_at, rowid", ARTIFACT_COLUMNS))?;

    let rows = stmt
        .query_map([], artifact_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(into_artifact).collect()
}

const ARTIFACT_COLUMNS: &str = "SELECT id, kind, path, sha256, bytes, recorded_at FROM artifacts";

type ArtifactRow = (String, String, String, String, i64, String);

fn artifact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtifactRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_artifact((id, kind, path, sha256, bytes, recorded_at): ArtifactRow) -> StoreResult<SourceArtifact> {
    let id = Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt {
        table: "artifacts",
        detail: e.to_string(),
    })?;
    Ok(SourceArtifact {
        id,
        kind,
        path,
        sha256,
        bytes,
        recorded_at: parse_timestamp("artifacts", &recorded_at)?,
    })
}

fn parse_timestamp(table: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| StoreError::Corrupt {
            table,
            detail: format!("bad timestamp '{}': {}", value, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let db = open_in_memory().unwrap();
        write_series(&db, SeriesKey::ProbeTimestamps, &vec![1.0, 2.5]).unwrap();

        let probes: Vec<f64> = read_series(&db, SeriesKey::ProbeTimestamps).unwrap();
        assert_eq!(probes, vec![1.0, 2.5]);
        assert!(series_exists(&db, SeriesKey::ProbeTimestamps).unwrap());
    }

    #[test]
    fn test_overwrite_is_idempotent() {
        let db = open_in_memory().unwrap();
        write_series(&db, SeriesKey::ContrastValues, &vec!["0.50"]).unwrap();
        write_series(&db, SeriesKey::ContrastValues, &vec!["0.80"]).unwrap();
        write_series(&db, SeriesKey::ContrastValues, &vec!["0.80"]).unwrap();

        let values: Vec<String> = read_series(&db, SeriesKey::ContrastValues).unwrap();
        assert_eq!(values, vec!["0.80"]);
        assert_eq!(list_series(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_key_is_not_computed() {
        let db = open_in_memory().unwrap();
        let result: StoreResult<Vec<f64>> = read_series(&db, SeriesKey::FilteredProbes);
        match result {
            Err(StoreError::NotComputed { key, step }) => {
                assert_eq!(key, SeriesKey::FilteredProbes);
                assert_eq!(step, "filter");
            }
            other => panic!("expected NotComputed, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_is_json_error() {
        let db = open_in_memory().unwrap();
        write_series(&db, SeriesKey::LickTimestamps, "not a list").unwrap();
        let result: StoreResult<Vec<f64>> = read_series(&db, SeriesKey::LickTimestamps);
        assert!(matches!(result, Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_record_artifact_hash() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("meta.txt");
        fs::write(&path, b"hello world").unwrap();

        let db = open_in_memory().unwrap();
        let artifact = record_artifact(&db, "probe_metadata", &path).unwrap();
        assert_eq!(
            artifact.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(artifact.bytes, 11);

        let listed = list_artifacts(&db).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, artifact.id);
        assert_eq!(listed[0].kind, "probe_metadata");
    }
    #[test]
    fn test_rerecording_keeps_one_row() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pose.csv");
        fs::write(&path, b"a,b\n").unwrap();

        let db = open_in_memory().unwrap();
        let first = record_artifact(&db, "tongue_pose", &path).unwrap();
        let second = record_artifact(&db, "tongue_pose", &path).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.recorded_at, first.recorded_at);
        assert_eq!(list_artifacts(&db).unwrap().len(), 1);

        // Same file in another role is a separate row
        record_artifact(&db, "eye_pose", &path).unwrap();
        assert_eq!(list_artifacts(&db).unwrap().len(), 2);
    }

    #[test]
    fn test_changed_file_refreshes_hash() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("meta.txt");
        fs::write(&path, b"hello world").unwrap();

        let db = open_in_memory().unwrap();
        let first = record_artifact(&db, "probe_metadata", &path).unwrap();
        fs::write(&path, b"hello again, world").unwrap();
        let second = record_artifact(&db, "probe_metadata", &path).unwrap();

        assert_eq!(second.id, first.id);
        assert_ne!(second.sha256, first.sha256);
        assert_eq!(second.bytes, 18);

        let listed = list_artifacts(&db).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sha256, second.sha256);
    }
}
