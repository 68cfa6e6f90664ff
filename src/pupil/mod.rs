// Pupil module
// Pupil radius from eye pose, and pupil measures aligned to probe onsets

pub mod peristimulus;

pub use peristimulus::{peristimulus_dilation, peristimulus_traces, DilationPoint, PupilTraces};

use crate::acquisition::{AcquisitionError, PoseTable};
use crate::config::PupilConfig;

/// Per-frame distance between the pupil center and edge keypoints
pub fn pupil_radius(pose: &PoseTable, config: &PupilConfig) -> Result<Vec<f64>, AcquisitionError> {
    let center_x = pose.column(&config.center_bodypart, "x")?;
    let center_y = pose.column(&config.center_bodypart, "y")?;
    let edge_x = pose.column(&config.edge_bodypart, "x")?;
    let edge_y = pose.column(&config.edge_bodypart, "y")?;

    let radius = center_x
        .iter()
        .zip(center_y)
        .zip(edge_x.iter().zip(edge_y))
        .map(|((cx, cy), (ex, ey))| (cx - ex).hypot(cy - ey))
        .collect();

    Ok(radius)
}

/// Index of the frame timestamp nearest to `t`; ties go to the earlier frame
///
/// `frames` must be sorted. Returns `None` for an empty series.
pub fn closest_frame(frames: &[f64], t: f64) -> Option<usize> {
    if frames.is_empty() {
        return None;
    }

    let after = frames.partition_point(|&f| f < t);
    if after == 0 {
        return Some(0);
    }
    if after == frames.len() {
        return Some(frames.len() - 1);
    }

    let before = after - 1;
    if t - frames[before] <= frames[after] - t {
        Some(before)
    } else {
        Some(after)
    }
}
