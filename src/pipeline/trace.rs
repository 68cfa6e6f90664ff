// Session processing trace
// Append-only JSONL record of every stage run against a session folder

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trace file name, inside the session folder
pub const TRACE_FILE: &str = "pipeline_trace.jsonl";

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Processing stages that leave a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    ImportSaccades,
    Filter,
    Analyze,
    Rasters,
    Pupil,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::ImportSaccades => "import_saccades",
            Stage::Filter => "filter",
            Stage::Analyze => "analyze",
            Stage::Rasters => "rasters",
            Stage::Pupil => "pupil",
        }
    }

    pub fn start(self, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self, 0.0, message.into())
    }

    pub fn progress(self, progress: f32, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self, progress, message.into())
    }

    pub fn complete(self, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self, 1.0, message.into())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of the trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 time the entry was created
    pub timestamp: String,

    pub stage: Stage,

    /// Progress [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Optional structured data (event counts, kept trials, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: Stage, progress: f32, message: String) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            progress: progress.clamp(0.0, 1.0),
            message,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Appends entries to one session's trace file
#[derive(Debug, Clone)]
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    pub fn for_session(session_dir: &Path) -> Self {
        TraceWriter::new(session_dir.join(TRACE_FILE))
    }

    /// Append an entry, creating the file if needed
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json_line = entry.to_json_line()?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_progress_clamping() {
        assert_eq!(Stage::Filter.progress(-0.5, "x").progress, 0.0);
        assert_eq!(Stage::Filter.progress(1.5, "x").progress, 1.0);
    }

    #[test]
    fn test_entry_with_data() {
        let entry = Stage::Extract
            .complete("Extracted events")
            .with_data(serde_json::json!({ "probes": 240 }));

        assert_eq!(entry.stage, Stage::Extract);
        assert_eq!(entry.data.unwrap()["probes"], 240);
    }

    #[test]
    fn test_writer_appends_to_session_folder() {
        let temp_dir = TempDir::new().unwrap();
        let writer = TraceWriter::for_session(temp_dir.path());
        assert_eq!(writer.path(), temp_dir.path().join(TRACE_FILE));

        writer.write(&Stage::Extract.start("Start")).unwrap();
        writer.write(&Stage::Extract.complete("Done")).unwrap();

        let entries = read_trace_file(writer.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].progress, 0.0);
        assert_eq!(entries[1].progress, 1.0);
    }

    #[test]
    fn test_json_line_format() {
        let line = Stage::ImportSaccades.start("Importing").to_json_line().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains("\"stage\":\"import_saccades\""));
        assert!(!line.contains("\"data\""));
    }
}
