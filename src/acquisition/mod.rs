// Acquisition module
// Reads the raw session artifacts: acquisition log, pose tables, stimulus metadata

pub mod locate;
pub mod log_table;
pub mod metadata;
pub mod pose;
pub mod pulses;

pub use locate::{locate_artifact, ArtifactKind};
pub use log_table::{load_acquisition_log, AcquisitionLog};
pub use metadata::{load_contrast_values, parse_contrast_values};
pub use pose::PoseTable;
pub use pulses::{debounce, find_edges, width_in_samples, Edge};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Could not locate the {kind}: no match for '{pattern}'")]
    ArtifactNotFound { kind: ArtifactKind, pattern: String },

    #[error("Could not locate the {kind}: {count} matches for '{pattern}'")]
    AmbiguousArtifact {
        kind: ArtifactKind,
        pattern: String,
        count: usize,
    },

    #[error("Acquisition log is empty")]
    EmptyLog,

    #[error("Channel {channel} out of range (log has {columns} columns)")]
    ChannelOutOfRange { channel: usize, columns: usize },

    #[error("Row {row} of {file} has {found} columns, expected {expected}")]
    RaggedRow {
        file: String,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Pose table is malformed: {0}")]
    MalformedPose(String),

    #[error("Pose table has no column for ({bodypart}, {feature})")]
    MissingPoseColumn { bodypart: String, feature: String },
}
