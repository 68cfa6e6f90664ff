// Time windows relative to a reference event

use serde::{Deserialize, Serialize};

/// Interval of offsets (seconds) from a reference event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub lo: f64,
    pub hi: f64,

    /// Whether an offset equal to `hi` is inside
    pub hi_inclusive: bool,
}

impl TimeWindow {
    /// (lo, hi)
    pub fn open(lo: f64, hi: f64) -> Self {
        TimeWindow {
            lo,
            hi,
            hi_inclusive: false,
        }
    }

    /// (lo, hi]
    pub fn half_open(lo: f64, hi: f64) -> Self {
        TimeWindow {
            lo,
            hi,
            hi_inclusive: true,
        }
    }

    pub fn contains(&self, offset: f64) -> bool {
        offset > self.lo && (offset < self.hi || (self.hi_inclusive && offset == self.hi))
    }

    /// True if any event falls inside the window around `reference`
    pub fn any_within(&self, reference: f64, events: &[f64]) -> bool {
        events.iter().any(|&t| self.contains(t - reference))
    }

    /// Offsets of the events inside the window around `reference`, in event order
    pub fn offsets_within(&self, reference: f64, events: &[f64]) -> Vec<f64> {
        events
            .iter()
            .map(|&t| t - reference)
            .filter(|&offset| self.contains(offset))
            .collect()
    }
}

impl From<(f64, f64)> for TimeWindow {
    fn from((lo, hi): (f64, f64)) -> Self {
        TimeWindow::open(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_window_excludes_bounds() {
        let window = TimeWindow::open(-0.05, 0.05);
        assert!(window.contains(0.0));
        assert!(window.contains(0.049));
        assert!(!window.contains(0.05));
        assert!(!window.contains(-0.05));
    }

    #[test]
    fn test_half_open_window_includes_upper_bound() {
        let window = TimeWindow::half_open(0.0, 0.5);
        assert!(!window.contains(0.0));
        assert!(window.contains(0.5));
        assert!(!window.contains(0.5001));
    }

    #[test]
    fn test_offsets_within() {
        let window = TimeWindow::open(-1.0, 5.0);
        let offsets = window.offsets_within(10.0, &[8.0, 9.5, 10.0, 14.0, 15.0]);
        assert_eq!(offsets, vec![-0.5, 0.0, 4.0]);
    }
}
