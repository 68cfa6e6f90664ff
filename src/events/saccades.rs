// Saccade timestamps
// Saccades are detected and classified by direction upstream; this module maps
// the classified frame indices onto the frame-timestamp series.

use serde::{Deserialize, Serialize};

use super::types::{timestamps_at, EventKind};
use super::EventError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaccadeDirection {
    Nasal,
    Temporal,
}

/// Saccades of one direction: onset frame indices and their position waveforms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaccadeGroup {
    pub indices: Vec<usize>,

    #[serde(default)]
    pub waveforms: Vec<Vec<f64>>,
}

impl SaccadeGroup {
    /// Sample-wise mean of the waveforms
    /// Waveforms shorter than the first are ignored past their end
    pub fn mean_waveform(&self) -> Vec<f64> {
        let Some(width) = self.waveforms.first().map(|w| w.len()) else {
            return Vec::new();
        };

        (0..width)
            .map(|i| {
                let samples: Vec<f64> = self
                    .waveforms
                    .iter()
                    .filter_map(|w| w.get(i).copied())
                    .collect();
                samples.iter().sum::<f64>() / samples.len() as f64
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EyeSaccades {
    #[serde(default)]
    pub nasal: SaccadeGroup,

    #[serde(default)]
    pub temporal: SaccadeGroup,
}

impl EyeSaccades {
    pub fn group(&self, direction: SaccadeDirection) -> &SaccadeGroup {
        match direction {
            SaccadeDirection::Nasal => &self.nasal,
            SaccadeDirection::Temporal => &self.temporal,
        }
    }
}

/// Output of the external saccade classifier, as persisted under
/// `saccadeClassificationResults`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaccadeClassification {
    pub left: EyeSaccades,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<EyeSaccades>,
}

/// Timestamps of all left-eye saccades, both directions, in time order
pub fn saccade_timestamps(
    results: &SaccadeClassification,
    frame_timestamps: &[f64],
) -> Result<Vec<f64>, EventError> {
    let mut saccades = timestamps_at(frame_timestamps, &results.left.nasal.indices, EventKind::Saccade)?;
    saccades.extend(timestamps_at(
        frame_timestamps,
        &results.left.temporal.indices,
        EventKind::Saccade,
    )?);
    saccades.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    log::debug!(
        "Mapped {} nasal and {} temporal saccades onto frames",
        results.left.nasal.indices.len(),
        results.left.temporal.indices.len()
    );

    Ok(saccades)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> SaccadeClassification {
        SaccadeClassification {
            left: EyeSaccades {
                nasal: SaccadeGroup {
                    indices: vec![5, 1],
                    waveforms: vec![vec![0.0, 2.0, 4.0], vec![2.0, 4.0, 6.0]],
                },
                temporal: SaccadeGroup {
                    indices: vec![3],
                    waveforms: vec![vec![0.0, -1.0, -2.0]],
                },
            },
            right: None,
        }
    }

    #[test]
    fn test_saccade_timestamps_sorted() {
        let frames: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let saccades = saccade_timestamps(&results(), &frames).unwrap();
        assert_eq!(saccades, vec![0.5, 1.5, 2.5]);
    }

    #[test]
    fn test_saccade_index_past_frames() {
        let frames = vec![0.0, 0.5];
        assert!(matches!(
            saccade_timestamps(&results(), &frames),
            Err(EventError::IndexOutOfRange { kind: EventKind::Saccade, .. })
        ));
    }

    #[test]
    fn test_mean_waveform() {
        let r = results();
        assert_eq!(r.left.group(SaccadeDirection::Nasal).mean_waveform(), vec![1.0, 3.0, 5.0]);
        assert!(SaccadeGroup::default().mean_waveform().is_empty());
    }

    #[test]
    fn test_deserialize_without_waveforms() {
        let json = r#"{"left": {"nasal": {"indices": [1, 2]}, "temporal": {"indices": []}}}"#;
        let parsed: SaccadeClassification = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.left.nasal.indices, vec![1, 2]);
        assert!(parsed.left.nasal.waveforms.is_empty());
        assert!(parsed.right.is_none());
    }
}
