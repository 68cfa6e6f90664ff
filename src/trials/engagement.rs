// Engagement filter
// Drops stretches of trials where the animal stopped licking, using smoothed reaction times

use crate::config::EngagementConfig;

use super::savgol::savgol_filter;
use super::types::TrialSet;
use super::TrialError;

/// Latency from each probe to the first lick after it
///
/// Probes with no later lick get `sentinel`; a late lick keeps its full latency.
pub fn reaction_times(probes: &[f64], licks: &[f64], sentinel: f64) -> Vec<f64> {
    probes
        .iter()
        .map(|&probe| {
            licks
                .iter()
                .map(|&lick| lick - probe)
                .filter(|&latency| latency > 0.0)
                .reduce(f64::min)
                .unwrap_or(sentinel)
        })
        .collect()
}

/// Indices of trials whose smoothed reaction time is below the threshold
pub fn engaged_indices(
    probes: &[f64],
    licks: &[f64],
    config: &EngagementConfig,
) -> Result<Vec<usize>, TrialError> {
    let latencies = reaction_times(probes, licks, config.sentinel_s);
    let smoothed = savgol_filter(&latencies, config.window_length, config.poly_order)?;

    Ok(smoothed
        .iter()
        .enumerate()
        .filter(|(_, &latency)| latency < config.threshold_s)
        .map(|(i, _)| i)
        .collect())
}

/// Corrected trial set keeping only engaged trials
pub fn filter_engaged(
    set: &TrialSet,
    licks: &[f64],
    config: &EngagementConfig,
) -> Result<TrialSet, TrialError> {
    let keep = engaged_indices(&set.probes, licks, config)?;
    log::info!("Engagement filter kept {} of {} trials", keep.len(), set.len());
    Ok(set.select(&keep))
}
