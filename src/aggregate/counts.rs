// Response counts
// (responses, totals) per partition and contrast; sessions pool by summing counts

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::config::ContrastLevelConfig;
use crate::trials::{ContrastLabel, Trial};

use super::psychometric::PsychometricCurve;

/// Saccade-proximity class of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Extrasaccadic,
    Perisaccadic,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Extrasaccadic, Partition::Perisaccadic];

    pub fn of(trial: &Trial) -> Self {
        if trial.near_saccade {
            Partition::Perisaccadic
        } else {
            Partition::Extrasaccadic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Extrasaccadic => "extrasaccadic",
            Partition::Perisaccadic => "perisaccadic",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCounts {
    pub responses: usize,
    pub totals: usize,
}

impl ResponseCounts {
    pub fn record(&mut self, response: bool) {
        self.totals += 1;
        if response {
            self.responses += 1;
        }
    }

    /// Fraction of trials with a response; NaN when there are no trials
    pub fn rate(&self) -> f64 {
        if self.totals == 0 {
            f64::NAN
        } else {
            self.responses as f64 / self.totals as f64
        }
    }
}

impl AddAssign for ResponseCounts {
    fn add_assign(&mut self, other: Self) {
        self.responses += other.responses;
        self.totals += other.totals;
    }
}

impl Add for ResponseCounts {
    type Output = ResponseCounts;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// One line of a session or pooled summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub partition: Partition,
    pub contrast: ContrastLabel,
    pub display: String,
    pub responses: usize,
    pub totals: usize,

    /// Response rate, null when the bucket is empty
    pub rate: f64,

    /// Rate divided by the anchor rate
    pub normalized: f64,
}

/// Response counts of one session, or of several pooled sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAggregate {
    buckets: BTreeMap<(Partition, ContrastLabel), ResponseCounts>,
    displays: BTreeMap<ContrastLabel, String>,
    sessions: usize,
}

impl SessionAggregate {
    /// Bucket trials; every configured level is present even if never presented
    pub fn from_trials(trials: &[Trial], levels: &[ContrastLevelConfig]) -> Self {
        let mut aggregate = SessionAggregate {
            sessions: 1,
            ..Default::default()
        };

        for level in levels {
            let label = ContrastLabel::new(level.label.clone());
            aggregate.displays.insert(label.clone(), level.display.clone());
            for partition in Partition::ALL {
                aggregate.buckets.entry((partition, label.clone())).or_default();
            }
        }

        for trial in trials {
            let label = aggregate.canonical(&trial.contrast);
            aggregate
                .buckets
                .entry((Partition::of(trial), label))
                .or_default()
                .record(trial.response);
        }

        aggregate
    }

    /// Configured label with the same numeric value, else the label itself
    fn canonical(&self, label: &ContrastLabel) -> ContrastLabel {
        if self.displays.contains_key(label) {
            return label.clone();
        }
        let Some(value) = label.value() else {
            return label.clone();
        };

        self.displays
            .keys()
            .find(|known| known.value().is_some_and(|v| (v - value).abs() < 1e-9))
            .cloned()
            .unwrap_or_else(|| label.clone())
    }

    /// Sum another aggregate's counts into this one
    pub fn merge(&mut self, other: &SessionAggregate) {
        for (key, counts) in &other.buckets {
            *self.buckets.entry(key.clone()).or_default() += *counts;
        }
        for (label, display) in &other.displays {
            self.displays
                .entry(label.clone())
                .or_insert_with(|| display.clone());
        }
        self.sessions += other.sessions;
    }

    /// Counts-first pooling across sessions
    pub fn pool<'a>(aggregates: impl IntoIterator<Item = &'a SessionAggregate>) -> Self {
        aggregates
            .into_iter()
            .fold(SessionAggregate::default(), |mut pooled, aggregate| {
                pooled.merge(aggregate);
                pooled
            })
    }

    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Every contrast with a bucket, in level order
    pub fn contrasts(&self) -> Vec<ContrastLabel> {
        let labels: BTreeSet<&ContrastLabel> = self.buckets.keys().map(|(_, label)| label).collect();
        labels.into_iter().cloned().collect()
    }

    /// Display name of a contrast, matching configured levels numerically
    pub fn display(&self, contrast: &ContrastLabel) -> String {
        self.displays
            .get(&self.canonical(contrast))
            .cloned()
            .unwrap_or_else(|| contrast.to_string())
    }

    pub fn counts(&self, partition: Partition, contrast: &ContrastLabel) -> ResponseCounts {
        self.buckets
            .get(&(partition, contrast.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Number of trials in a partition
    pub fn partition_total(&self, partition: Partition) -> usize {
        self.buckets
            .iter()
            .filter(|((p, _), _)| *p == partition)
            .map(|(_, counts)| counts.totals)
            .sum()
    }

    /// Highest contrast with a numeric value; text labels never anchor the curve
    pub fn anchor_contrast(&self) -> Option<ContrastLabel> {
        self.contrasts()
            .into_iter()
            .filter(|label| label.value().is_some())
            .max()
    }

    /// Response rate of the highest-contrast extra-saccadic bucket
    pub fn anchor_rate(&self) -> f64 {
        self.anchor_contrast()
            .map(|highest| self.counts(Partition::Extrasaccadic, &highest).rate())
            .unwrap_or(f64::NAN)
    }

    pub fn psychometric(&self) -> PsychometricCurve {
        PsychometricCurve::from_aggregate(self)
    }

    pub fn rows(&self) -> Vec<SummaryRow> {
        let anchor = self.anchor_rate();
        self.buckets
            .iter()
            .map(|((partition, contrast), counts)| SummaryRow {
                partition: *partition,
                contrast: contrast.clone(),
                display: self.display(contrast),
                responses: counts.responses,
                totals: counts.totals,
                rate: counts.rate(),
                normalized: counts.rate() / anchor,
            })
            .collect()
    }
}
