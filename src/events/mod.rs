// Event extraction module
// Turns raw channel traces and pose tracks into timestamp series

pub mod extraction;
pub mod licks;
pub mod saccades;
pub mod types;

pub use extraction::{
    extract_channel_events, extract_frame_timestamps, extract_probe_timestamps,
    extract_puff_timestamps,
};
pub use licks::{detect_licks, find_peaks, likelihood_drop_frames};
pub use saccades::{
    saccade_timestamps, EyeSaccades, SaccadeClassification, SaccadeDirection, SaccadeGroup,
};
pub use types::{ensure_monotonic, timestamps_at, EventKind};

use thiserror::Error;

use crate::acquisition::AcquisitionError;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Index {index} is outside the {kind} series ({len} samples)")]
    IndexOutOfRange {
        kind: EventKind,
        index: usize,
        len: usize,
    },

    #[error("Cannot derive a sample interval from the timestamp column")]
    NoSampleInterval,

    #[error("{kind} timestamps go backwards at #{index} ({previous} then {value})")]
    NotMonotonic {
        kind: EventKind,
        index: usize,
        previous: f64,
        value: f64,
    },
}
