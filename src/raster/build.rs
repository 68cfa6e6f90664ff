// Raster construction
// Lick offsets per probe, per contrast group, per saccade partition, and per saccade

use std::collections::BTreeMap;

use crate::aggregate::Partition;
use crate::trials::{ContrastLabel, TimeWindow, Trial, TrialSet};

use super::{Raster, RasterRow, RasterSeries, SeriesColor};

/// Rows left empty between the extra- and peri-saccadic blocks
pub const PARTITION_GAP_ROWS: usize = 5;

fn rows_from(references: &[f64], events: &[f64], window: &TimeWindow, first_row: usize) -> Vec<RasterRow> {
    references
        .iter()
        .enumerate()
        .map(|(i, &reference)| RasterRow {
            row: first_row + i,
            offsets: window.offsets_within(reference, events),
        })
        .collect()
}

/// Licks relative to every probe, one row per trial
pub fn lick_raster(probes: &[f64], licks: &[f64], window: TimeWindow) -> Raster {
    Raster {
        title: "Licks".to_string(),
        x_label: "Time from probe (sec)".to_string(),
        window,
        series: vec![RasterSeries {
            label: "Lick".to_string(),
            color: SeriesColor::Black,
            rows: rows_from(probes, licks, &window, 0),
        }],
    }
}

/// Probe times grouped by contrast, highest contrast first
fn group_by_contrast<'a>(
    entries: impl Iterator<Item = (f64, &'a ContrastLabel)>,
) -> Vec<(ContrastLabel, Vec<f64>)> {
    let mut groups: BTreeMap<ContrastLabel, Vec<f64>> = BTreeMap::new();
    for (probe, contrast) in entries {
        groups.entry(contrast.clone()).or_default().push(probe);
    }
    groups.into_iter().rev().collect()
}

/// Licks relative to probes, stacked in contrast groups
///
/// `display` maps a contrast to its legend label.
pub fn contrast_raster(
    set: &TrialSet,
    licks: &[f64],
    window: TimeWindow,
    display: impl Fn(&ContrastLabel) -> String,
) -> Raster {
    let groups = group_by_contrast(set.probes.iter().copied().zip(set.contrasts.iter()));

    let mut next_row = 0;
    let series = groups
        .iter()
        .enumerate()
        .map(|(i, (contrast, probes))| {
            let rows = rows_from(probes, licks, &window, next_row);
            next_row += probes.len();
            RasterSeries {
                label: display(contrast),
                color: SeriesColor::cycle(i),
                rows,
            }
        })
        .collect();

    Raster {
        title: "Licks by contrast".to_string(),
        x_label: "Time from probe (sec)".to_string(),
        window,
        series,
    }
}

/// Contrast groups split by saccade partition; extra-saccadic block on top
pub fn partition_raster(
    trials: &[Trial],
    licks: &[f64],
    window: TimeWindow,
    display: impl Fn(&ContrastLabel) -> String,
) -> Raster {
    let mut series = Vec::new();
    let mut next_row = 0;

    for (block, partition) in Partition::ALL.into_iter().enumerate() {
        if block > 0 {
            next_row += PARTITION_GAP_ROWS;
        }

        let members = trials
            .iter()
            .filter(|t| Partition::of(t) == partition)
            .map(|t| (t.probe_time, &t.contrast));

        for (i, (contrast, probes)) in group_by_contrast(members).iter().enumerate() {
            let rows = rows_from(probes, licks, &window, next_row);
            next_row += probes.len();
            series.push(RasterSeries {
                label: format!("{} {}", partition, display(contrast)),
                color: SeriesColor::cycle(i),
                rows,
            });
        }
    }

    Raster {
        title: "Licks by contrast and saccade proximity".to_string(),
        x_label: "Time from probe (sec)".to_string(),
        window,
        series,
    }
}

/// Licks (black) and probes (red) relative to every saccade
pub fn saccade_raster(saccades: &[f64], licks: &[f64], probes: &[f64], window: TimeWindow) -> Raster {
    Raster {
        title: "Licks and probes around saccades".to_string(),
        x_label: "Time from saccade (sec)".to_string(),
        window,
        series: vec![
            RasterSeries {
                label: "Lick".to_string(),
                color: SeriesColor::Black,
                rows: rows_from(saccades, licks, &window, 0),
            },
            RasterSeries {
                label: "Probe".to_string(),
                color: SeriesColor::Red,
                rows: rows_from(saccades, probes, &window, 0),
            },
        ],
    }
}
