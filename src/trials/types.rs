// Trial types
// Contrast labels, labeled trials, and the probe/contrast sets they are built from

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::TrialError;

/// Stimulus contrast label as written in the metadata log (e.g. "0.80")
///
/// Labels order by their numeric value; labels that are not numbers sort
/// after all numeric ones, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContrastLabel(pub String);

impl ContrastLabel {
    pub fn new(label: impl Into<String>) -> Self {
        ContrastLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Ord for ContrastLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ContrastLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ContrastLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One probe presentation and its derived labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// Position within the trial set it was classified from
    pub index: usize,

    /// Probe onset (seconds, acquisition clock)
    pub probe_time: f64,

    pub contrast: ContrastLabel,

    /// A saccade occurred within the peri-saccadic window of the probe
    pub near_saccade: bool,

    /// An air puff occurred within the puff window of the probe
    pub near_puff: bool,

    /// The animal licked within the response window after the probe
    pub response: bool,
}

/// Probe timestamps with their parallel contrast labels
///
/// Either the full session or a corrected (filtered, reindexed) subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialSet {
    pub probes: Vec<f64>,
    pub contrasts: Vec<ContrastLabel>,
}

impl TrialSet {
    /// Pair probes with contrast labels
    /// The metadata log may list more presentations than were detected; extra labels are dropped
    pub fn new(probes: Vec<f64>, contrasts: Vec<String>) -> Result<Self, TrialError> {
        if contrasts.len() < probes.len() {
            return Err(TrialError::LengthMismatch {
                probes: probes.len(),
                contrasts: contrasts.len(),
            });
        }

        let contrasts = contrasts
            .into_iter()
            .take(probes.len())
            .map(ContrastLabel)
            .collect();

        Ok(TrialSet { probes, contrasts })
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Keep the trials at `indices`, in the given order
    pub fn select(&self, indices: &[usize]) -> TrialSet {
        let indices: Vec<usize> = indices.iter().copied().filter(|&i| i < self.len()).collect();
        TrialSet {
            probes: indices.iter().map(|&i| self.probes[i]).collect(),
            contrasts: indices.iter().map(|&i| self.contrasts[i].clone()).collect(),
        }
    }

    /// Keep trials `start..end`, clamped to the set
    pub fn range(&self, start: usize, end: usize) -> TrialSet {
        let end = end.min(self.len());
        let start = start.min(end);
        TrialSet {
            probes: self.probes[start..end].to_vec(),
            contrasts: self.contrasts[start..end].to_vec(),
        }
    }

    pub fn contrast_strings(&self) -> Vec<String> {
        self.contrasts.iter().map(|c| c.0.clone()).collect()
    }
}
