// Psychometric curves
// Response rate per contrast for each partition, raw and normalized by the anchor condition

use serde::Serialize;

use super::counts::{Partition, SessionAggregate};
use crate::trials::ContrastLabel;

#[derive(Debug, Clone, Serialize)]
pub struct PsychometricCurve {
    pub contrasts: Vec<ContrastLabel>,
    pub displays: Vec<String>,

    /// Response rates, one per contrast (NaN where a bucket is empty)
    pub extrasaccadic: Vec<f64>,
    pub perisaccadic: Vec<f64>,

    /// Extra-saccadic response rate at the highest contrast
    pub anchor: f64,

    /// Number of sessions pooled into the curve
    pub sessions: usize,
}

impl PsychometricCurve {
    pub fn from_aggregate(aggregate: &SessionAggregate) -> Self {
        let contrasts = aggregate.contrasts();
        let rates = |partition: Partition| -> Vec<f64> {
            contrasts
                .iter()
                .map(|c| aggregate.counts(partition, c).rate())
                .collect()
        };

        PsychometricCurve {
            displays: contrasts.iter().map(|c| aggregate.display(c)).collect(),
            extrasaccadic: rates(Partition::Extrasaccadic),
            perisaccadic: rates(Partition::Perisaccadic),
            anchor: aggregate.anchor_rate(),
            sessions: aggregate.sessions(),
            contrasts,
        }
    }

    pub fn rates(&self, partition: Partition) -> &[f64] {
        match partition {
            Partition::Extrasaccadic => &self.extrasaccadic,
            Partition::Perisaccadic => &self.perisaccadic,
        }
    }

    /// Rates divided by the anchor rate
    pub fn normalized(&self, partition: Partition) -> Vec<f64> {
        self.rates(partition).iter().map(|r| r / self.anchor).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContrastConfig;
    use crate::trials::Trial;

    fn trial(contrast: &str, near_saccade: bool, response: bool) -> Trial {
        Trial {
            index: 0,
            probe_time: 0.0,
            contrast: ContrastLabel::new(contrast),
            near_saccade,
            near_puff: false,
            response,
        }
    }

    #[test]
    fn test_curve_normalized_by_anchor() {
        let trials = vec![
            trial("0.80", false, true),
            trial("0.80", false, true),
            trial("0.80", false, false),
            trial("0.80", false, true),
            trial("0.50", false, true),
            trial("0.50", false, false),
            trial("0.80", true, true),
            trial("0.80", true, false),
        ];
        let aggregate = SessionAggregate::from_trials(&trials, &ContrastConfig::default().levels);
        let curve = aggregate.psychometric();

        assert_eq!(curve.displays, vec!["0%", "5%", "10%", "30%"]);
        assert_eq!(curve.anchor, 0.75);

        let extra = curve.normalized(Partition::Extrasaccadic);
        assert!((extra[0] - 0.5 / 0.75).abs() < 1e-12);
        assert!(extra[1].is_nan());
        assert_eq!(extra[3], 1.0);

        let peri = curve.normalized(Partition::Perisaccadic);
        assert!((peri[3] - 0.5 / 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_curve_without_anchor_is_nan() {
        let trials = vec![trial("0.50", false, true)];
        let aggregate = SessionAggregate::from_trials(&trials, &ContrastConfig::default().levels);
        let curve = aggregate.psychometric();
        assert!(curve.anchor.is_nan());
        assert!(curve.normalized(Partition::Extrasaccadic)[0].is_nan());
        assert_eq!(curve.extrasaccadic[0], 1.0);
    }
}
