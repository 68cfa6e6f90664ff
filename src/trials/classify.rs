// Trial classification
// Labels each probe by contrast, saccade and puff proximity, and lick response

use serde::{Deserialize, Serialize};

use crate::config::WindowConfig;

use super::types::{ContrastLabel, Trial, TrialSet};
use super::window::TimeWindow;

/// Windows used to label a trial, relative to its probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialWindows {
    pub saccade: TimeWindow,
    pub puff: TimeWindow,
    pub response: TimeWindow,
}

impl Default for TrialWindows {
    fn default() -> Self {
        TrialWindows::from(&WindowConfig::default())
    }
}

impl From<&WindowConfig> for TrialWindows {
    fn from(config: &WindowConfig) -> Self {
        TrialWindows {
            saccade: TimeWindow::open(config.saccade.0, config.saccade.1),
            puff: TimeWindow::open(config.puff.0, config.puff.1),
            response: TimeWindow::half_open(config.response.0, config.response.1),
        }
    }
}

/// Event series a trial set is classified against
#[derive(Debug, Clone, Copy)]
pub struct TrialEvents<'a> {
    pub saccades: &'a [f64],
    pub puffs: &'a [f64],
    pub licks: &'a [f64],
}

pub fn is_near_saccade(probe: f64, saccades: &[f64], window: &TimeWindow) -> bool {
    window.any_within(probe, saccades)
}

pub fn is_near_puff(probe: f64, puffs: &[f64], window: &TimeWindow) -> bool {
    window.any_within(probe, puffs)
}

/// Per-puff labels: whether any probe falls inside the window around each puff
pub fn probes_near_puff(puffs: &[f64], probes: &[f64], window: &TimeWindow) -> Vec<bool> {
    puffs
        .iter()
        .map(|&puff| window.any_within(puff, probes))
        .collect()
}

pub fn has_response(probe: f64, licks: &[f64], window: &TimeWindow) -> bool {
    window.any_within(probe, licks)
}

pub fn contrast_label(index: usize, contrasts: &[ContrastLabel]) -> Option<&ContrastLabel> {
    contrasts.get(index)
}

/// Label every trial in the set
pub fn classify_trials(set: &TrialSet, events: &TrialEvents, windows: &TrialWindows) -> Vec<Trial> {
    let trials: Vec<Trial> = set
        .probes
        .iter()
        .zip(set.contrasts.iter())
        .enumerate()
        .map(|(index, (&probe, contrast))| Trial {
            index,
            probe_time: probe,
            contrast: contrast.clone(),
            near_saccade: is_near_saccade(probe, events.saccades, &windows.saccade),
            near_puff: is_near_puff(probe, events.puffs, &windows.puff),
            response: has_response(probe, events.licks, &windows.response),
        })
        .collect();

    let peri = trials.iter().filter(|t| t.near_saccade).count();
    let responses = trials.iter().filter(|t| t.response).count();
    log::info!(
        "Classified {} trials: {} peri-saccadic, {} with responses",
        trials.len(),
        peri,
        responses
    );

    trials
}
