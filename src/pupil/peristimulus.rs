// Peri-stimulus pupil measures
// Dilation before each probe and radius traces around it, split by lick response

use serde::Serialize;

use crate::trials::{has_response, TimeWindow};

use super::closest_frame;

/// Change in radius over the frames leading up to one probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DilationPoint {
    pub probe_time: f64,

    /// Radius at the probe frame minus radius `lag` frames earlier
    pub dilation: f64,
    pub response: bool,
}

/// Dilation for every probe with at least `lag` frames of history
pub fn peristimulus_dilation(
    probes: &[f64],
    licks: &[f64],
    frames: &[f64],
    radius: &[f64],
    lag: usize,
    response_window: &TimeWindow,
) -> Vec<DilationPoint> {
    probes
        .iter()
        .filter_map(|&probe| {
            let frame = closest_frame(frames, probe)?;
            if frame < lag || frame >= radius.len() {
                log::debug!("Skipping probe at {:.3}s: frame {} lacks {} frames of history", probe, frame, lag);
                return None;
            }

            Some(DilationPoint {
                probe_time: probe,
                dilation: radius[frame] - radius[frame - lag],
                response: has_response(probe, licks, response_window),
            })
        })
        .collect()
}

/// Radius traces around probes, grouped by response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PupilTraces {
    /// Frames before the probe frame at which each trace starts
    pub half_width: usize,
    pub response: Vec<Vec<f64>>,
    pub no_response: Vec<Vec<f64>>,
}

impl PupilTraces {
    pub fn mean_response(&self) -> Vec<f64> {
        mean_trace(&self.response)
    }

    pub fn mean_no_response(&self) -> Vec<f64> {
        mean_trace(&self.no_response)
    }
}

/// Sample-wise mean of equal-length traces
fn mean_trace(traces: &[Vec<f64>]) -> Vec<f64> {
    let Some(width) = traces.first().map(|t| t.len()) else {
        return Vec::new();
    };

    (0..width)
        .map(|i| traces.iter().map(|t| t[i]).sum::<f64>() / traces.len() as f64)
        .collect()
}

/// Radius over frames [f - half_width, f + half_width) around each probe frame `f`
///
/// Probes whose trace would run off either end of the recording are skipped.
pub fn peristimulus_traces(
    probes: &[f64],
    licks: &[f64],
    frames: &[f64],
    radius: &[f64],
    half_width: usize,
    response_window: &TimeWindow,
) -> PupilTraces {
    let mut traces = PupilTraces {
        half_width,
        ..Default::default()
    };

    for &probe in probes {
        let Some(frame) = closest_frame(frames, probe) else {
            continue;
        };
        if frame < half_width || frame + half_width > radius.len() {
            continue;
        }

        let trace = radius[frame - half_width..frame + half_width].to_vec();
        if has_response(probe, licks, response_window) {
            traces.response.push(trace);
        } else {
            traces.no_response.push(trace);
        }
    }

    log::info!(
        "Collected {} response and {} no-response pupil traces",
        traces.response.len(),
        traces.no_response.len()
    );

    traces
}
