// Lick detection
// A lick occludes the spout, so spout-tracking likelihood drops sharply for that frame.
// Licks are the peaks of the negated first difference of the likelihood trace.

use super::types::{timestamps_at, EventKind};
use super::EventError;

/// Local maxima of `signal` with value >= `height`
///
/// A flat-topped peak reports its middle sample (left-biased for even widths).
/// Samples at either end of the signal are never peaks.
pub fn find_peaks(signal: &[f64], height: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }

            if signal[ahead] < signal[i] {
                let midpoint = (i + ahead - 1) / 2;
                if signal[midpoint] >= height {
                    peaks.push(midpoint);
                }
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Frame indices where the likelihood drops by at least `height` between consecutive frames
pub fn likelihood_drop_frames(likelihood: &[f64], height: f64) -> Vec<usize> {
    let drops: Vec<f64> = likelihood.windows(2).map(|w| w[0] - w[1]).collect();
    find_peaks(&drops, height)
}

/// Lick timestamps from a per-frame likelihood trace
pub fn detect_licks(
    likelihood: &[f64],
    frame_timestamps: &[f64],
    height: f64,
) -> Result<Vec<f64>, EventError> {
    let frames = likelihood_drop_frames(likelihood, height);
    let licks = timestamps_at(frame_timestamps, &frames, EventKind::Frame)?;

    log::info!(
        "Detected {} licks over {} tracked frames",
        licks.len(),
        likelihood.len()
    );

    Ok(licks)
}
