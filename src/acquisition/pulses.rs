// Digital pulse conditioning
// Debounces photodiode-style pulse trains and locates transitions on a channel

use serde::{Deserialize, Serialize};

/// Which transitions to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// Binarize `signal` at `threshold` and drop high runs shorter than `min_width` samples
///
/// The output is 0.0/1.0 so that a following edge search with a threshold of 0.5
/// sees exactly the surviving pulses.
pub fn debounce(signal: &[f64], min_width: usize, threshold: f64) -> Vec<f64> {
    let mut output: Vec<f64> = signal
        .iter()
        .map(|&v| if v > threshold { 1.0 } else { 0.0 })
        .collect();

    if min_width <= 1 {
        return output;
    }

    let mut run_start: Option<usize> = None;
    for i in 0..=output.len() {
        let high = i < output.len() && output[i] > 0.5;
        match (high, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start < min_width {
                    output[start..i].iter_mut().for_each(|v| *v = 0.0);
                }
                run_start = None;
            }
            _ => {}
        }
    }

    output
}

/// Indices `i` where `signal[i + 1] - signal[i]` crosses `threshold` in the requested direction
pub fn find_edges(signal: &[f64], edge: Edge, threshold: f64) -> Vec<usize> {
    signal
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| {
            let delta = w[1] - w[0];
            let hit = match edge {
                Edge::Rising => delta > threshold,
                Edge::Falling => delta < -threshold,
                Edge::Both => delta.abs() > threshold,
            };
            hit.then_some(i)
        })
        .collect()
}

/// Convert a pulse width in seconds to a whole number of samples
pub fn width_in_samples(width_s: f64, sample_interval_s: f64) -> usize {
    if sample_interval_s <= 0.0 || width_s <= 0.0 {
        return 0;
    }
    (width_s / sample_interval_s).round() as usize
}
