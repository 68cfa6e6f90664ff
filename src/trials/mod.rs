// Trial classification module
// Per-probe labels (contrast, saccade and puff proximity, response) and trial-set filters

pub mod classify;
pub mod engagement;
pub mod savgol;
pub mod types;
pub mod window;

pub use classify::{
    classify_trials, contrast_label, has_response, is_near_puff, is_near_saccade,
    probes_near_puff, TrialEvents, TrialWindows,
};
pub use engagement::{engaged_indices, filter_engaged, reaction_times};
pub use savgol::savgol_filter;
pub use types::{ContrastLabel, Trial, TrialSet};
pub use window::TimeWindow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("Smoothing needs at least {window} trials, got {trials}")]
    TooFewTrials { trials: usize, window: usize },

    #[error("Invalid smoothing parameters: window {window}, order {order}")]
    InvalidSmoothing { window: usize, order: usize },

    #[error("Polynomial fit matrix is singular")]
    SingularFit,

    #[error("{probes} probes but {contrasts} contrast labels")]
    LengthMismatch { probes: usize, contrasts: usize },
}
