// Data models for the session store
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Names under which derived series are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKey {
    ProbeTimestamps,
    FrameTimestamps,
    PuffTimestamps,
    LickTimestamps,
    ContrastValues,
    FilteredProbes,
    FilteredContrast,
    SaccadeClassificationResults,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 8] = [
        SeriesKey::ProbeTimestamps,
        SeriesKey::FrameTimestamps,
        SeriesKey::PuffTimestamps,
        SeriesKey::LickTimestamps,
        SeriesKey::ContrastValues,
        SeriesKey::FilteredProbes,
        SeriesKey::FilteredContrast,
        SeriesKey::SaccadeClassificationResults,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKey::ProbeTimestamps => "probeTimestamps",
            SeriesKey::FrameTimestamps => "frameTimestamps",
            SeriesKey::PuffTimestamps => "puffTimestamps",
            SeriesKey::LickTimestamps => "lickTimestamps",
            SeriesKey::ContrastValues => "contrastValues",
            SeriesKey::FilteredProbes => "filteredProbes",
            SeriesKey::FilteredContrast => "filteredContrast",
            SeriesKey::SaccadeClassificationResults => "saccadeClassificationResults",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }

    /// Command that computes this series
    pub fn producer(&self) -> &'static str {
        match self {
            SeriesKey::FilteredProbes | SeriesKey::FilteredContrast => "filter",
            SeriesKey::SaccadeClassificationResults => "import-saccades",
            _ => "extract",
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw input file recorded with its content hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceArtifact {
    pub id: Uuid,
    pub kind: String,
    pub path: String,
    pub sha256: String,
    pub bytes: i64,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in SeriesKey::ALL {
            assert_eq!(SeriesKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(SeriesKey::from_name("pupilRadius"), None);
    }

    #[test]
    fn test_producer() {
        assert_eq!(SeriesKey::ProbeTimestamps.producer(), "extract");
        assert_eq!(SeriesKey::FilteredContrast.producer(), "filter");
        assert_eq!(SeriesKey::SaccadeClassificationResults.producer(), "import-saccades");
    }
}
