// Event types
// Event kinds and helpers shared by the timestamp series

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EventError;

/// Kinds of timestamped events derived from a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Stimulus presentation onset (one per trial)
    Probe,

    /// Camera frame onset (master camera exposure pulse)
    Frame,

    /// Air-puff onset
    Puff,

    /// Lick onset, from a sharp drop in spout-tracking likelihood
    Lick,

    /// Saccade onset, nasal or temporal
    Saccade,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Probe => "probe",
            EventKind::Frame => "frame",
            EventKind::Puff => "puff",
            EventKind::Lick => "lick",
            EventKind::Saccade => "saccade",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up `series[index]` for every index
/// Fails on the first index past the end of the series
pub fn timestamps_at(
    series: &[f64],
    indices: &[usize],
    kind: EventKind,
) -> Result<Vec<f64>, EventError> {
    indices
        .iter()
        .map(|&index| {
            series.get(index).copied().ok_or(EventError::IndexOutOfRange {
                kind,
                index,
                len: series.len(),
            })
        })
        .collect()
}

/// Every timestamp must be >= its predecessor
/// A log whose clock restarts mid-session (e.g. a second file starting at zero) fails here
pub fn ensure_monotonic(series: &[f64], kind: EventKind) -> Result<(), EventError> {
    match series.windows(2).position(|w| w[1] < w[0]) {
        Some(i) => Err(EventError::NotMonotonic {
            kind,
            index: i + 1,
            previous: series[i],
            value: series[i + 1],
        }),
        None => Ok(()),
    }
}
