// Peri-saccadic stimulus histogram
// Distribution of probe onsets relative to saccades that have exactly one nearby probe

use serde::{Deserialize, Serialize};

use crate::trials::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    /// Window around each saccade searched for probes
    pub search: TimeWindow,

    /// Binned range
    pub lo: f64,
    pub hi: f64,
    pub bins: usize,
}

impl Default for HistogramSpec {
    fn default() -> Self {
        HistogramSpec {
            search: TimeWindow::open(-1.0, 1.0),
            lo: -0.1,
            hi: 0.15,
            bins: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,

    /// Every offset considered, including those outside the binned range
    pub offsets: Vec<f64>,
}

impl Histogram {
    /// Equal-width bins over [lo, hi]; the last bin is closed, values outside are dropped
    pub fn from_values(values: &[f64], lo: f64, hi: f64, bins: usize) -> Self {
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0; bins];

        for &value in values {
            if bins == 0 || !(lo..=hi).contains(&value) {
                continue;
            }
            let bin = (((value - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Histogram {
            edges,
            counts,
            offsets: values.to_vec(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

fn round_centiseconds(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Probe offsets (rounded to 0.01 s) for saccades with exactly one probe in the search window
pub fn perisaccadic_histogram(saccades: &[f64], probes: &[f64], spec: &HistogramSpec) -> Histogram {
    let offsets: Vec<f64> = saccades
        .iter()
        .filter_map(|&saccade| {
            let nearby: Vec<f64> = probes
                .iter()
                .map(|&p| round_centiseconds(p - saccade))
                .filter(|&offset| spec.search.contains(offset))
                .collect();
            match nearby.as_slice() {
                [only] => Some(*only),
                _ => None,
            }
        })
        .collect();

    log::debug!(
        "{} of {} saccades had exactly one probe nearby",
        offsets.len(),
        saccades.len()
    );

    Histogram::from_values(&offsets, spec.lo, spec.hi, spec.bins)
}
