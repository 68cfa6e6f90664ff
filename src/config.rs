// Analysis configuration
// Session wiring, detection thresholds, trial windows and contrast levels, loaded from TOML

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full analysis configuration for one or more sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub artifacts: ArtifactPatterns,
    pub channels: ChannelConfig,
    pub licks: LickConfig,
    pub windows: WindowConfig,
    pub engagement: EngagementConfig,
    pub contrast: ContrastConfig,
    pub pupil: PupilConfig,
}

/// Glob patterns (relative to the session folder) locating each raw artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPatterns {
    /// Folder holding the acquisition `.dat` files
    pub acquisition_folder: String,

    /// Stimulus metadata text log
    pub probe_metadata: String,

    /// Pose-estimation table tracking the tongue and lick spout
    pub tongue_pose: String,

    /// Pose-estimation table tracking the left eye
    pub eye_pose: String,
}

impl Default for ArtifactPatterns {
    fn default() -> Self {
        ArtifactPatterns {
            acquisition_folder: "labjack/*dreadd*".to_string(),
            probe_metadata: "videos/*ProbeMetadata.txt".to_string(),
            tongue_pose: "videos/*licksNov3shuffle1*.csv".to_string(),
            eye_pose: "videos/*leftCam*shuffle1*.csv".to_string(),
        }
    }
}

/// Fixed column wiring of the acquisition log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Field separator of the `.dat` files (single ASCII character)
    pub log_delimiter: char,

    pub timestamp_column: usize,
    pub probe_column: usize,
    pub frame_column: usize,
    pub puff_column: usize,

    /// Minimum first-difference magnitude counted as a transition
    pub edge_threshold: f64,

    /// Probe pulses shorter than this (seconds) are discarded before edge detection
    pub probe_min_pulse_width_s: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            log_delimiter: '\t',
            timestamp_column: 0,
            probe_column: 6,
            frame_column: 7,
            puff_column: 8,
            edge_threshold: 0.5,
            probe_min_pulse_width_s: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LickConfig {
    pub bodypart: String,
    pub feature: String,

    /// Minimum height of a likelihood drop (negated first difference) counted as a lick
    pub peak_height: f64,
}

impl Default for LickConfig {
    fn default() -> Self {
        LickConfig {
            bodypart: "spout".to_string(),
            feature: "likelihood".to_string(),
            peak_height: 0.9,
        }
    }
}

/// Time windows in seconds, relative to the reference event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Open window around a probe in which a saccade makes the trial peri-saccadic
    pub saccade: (f64, f64),

    /// Open window around a probe in which a puff marks the trial
    pub puff: (f64, f64),

    /// Half-open window (lo, hi] after a probe in which a lick counts as a response
    pub response: (f64, f64),

    /// Lick raster window for the full trial set
    pub raster: (f64, f64),

    /// Lick raster window for the corrected trial set and saccade-aligned rasters
    pub raster_corrected: (f64, f64),
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            saccade: (-0.05, 0.05),
            puff: (-1.0, 1.0),
            response: (0.0, 0.5),
            raster: (-1.0, 5.0),
            raster_corrected: (-2.0, 5.0),
        }
    }
}

/// Disengagement filter over smoothed reaction times
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Reaction time assigned when no lick follows a probe (seconds)
    pub sentinel_s: f64,

    /// Savitzky-Golay window length (odd)
    pub window_length: usize,

    /// Savitzky-Golay polynomial order
    pub poly_order: usize,

    /// Trials with smoothed reaction time below this are kept (seconds)
    pub threshold_s: f64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        EngagementConfig {
            sentinel_s: 15.0,
            window_length: 15,
            poly_order: 3,
            threshold_s: 13.0,
        }
    }
}

/// A canonical contrast level: metadata label plus axis display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastLevelConfig {
    pub label: String,
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    /// Substring ending the contrast value on each metadata line
    pub delimiter: String,

    /// Levels always reported, even when a session never presented them
    pub levels: Vec<ContrastLevelConfig>,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        let level = |label: &str, display: &str| ContrastLevelConfig {
            label: label.to_string(),
            display: display.to_string(),
        };

        ContrastConfig {
            delimiter: ",".to_string(),
            levels: vec![
                level("0.50", "0%"),
                level("0.55", "5%"),
                level("0.60", "10%"),
                level("0.80", "30%"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PupilConfig {
    pub center_bodypart: String,
    pub edge_bodypart: String,

    /// Frames between the baseline and probe samples of the dilation measure
    pub dilation_lag_frames: usize,

    /// Frames before and after the probe in a peri-stimulus trace
    pub trace_half_width_frames: usize,
}

impl Default for PupilConfig {
    fn default() -> Self {
        PupilConfig {
            center_bodypart: "center".to_string(),
            edge_bodypart: "nasal".to_string(),
            dilation_lag_frames: 50,
            trace_half_width_frames: 300,
        }
    }
}

impl AnalysisConfig {
    /// Check values are internally consistent
    /// Returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let windows = [
            ("saccade", self.windows.saccade),
            ("puff", self.windows.puff),
            ("response", self.windows.response),
            ("raster", self.windows.raster),
            ("raster_corrected", self.windows.raster_corrected),
        ];
        for (name, (lo, hi)) in windows {
            if !(lo < hi) {
                return invalid(format!("{} window must satisfy lo < hi, got ({}, {})", name, lo, hi));
            }
        }

        if !self.channels.log_delimiter.is_ascii() {
            return invalid(format!(
                "log_delimiter must be an ASCII character, got {:?}",
                self.channels.log_delimiter
            ));
        }
        if self.channels.edge_threshold <= 0.0 {
            return invalid(format!(
                "edge_threshold must be > 0, got {}",
                self.channels.edge_threshold
            ));
        }
        if self.channels.probe_min_pulse_width_s < 0.0 {
            return invalid(format!(
                "probe_min_pulse_width_s must be >= 0, got {}",
                self.channels.probe_min_pulse_width_s
            ));
        }
        if self.licks.peak_height <= 0.0 {
            return invalid(format!("peak_height must be > 0, got {}", self.licks.peak_height));
        }

        let e = &self.engagement;
        if e.window_length % 2 == 0 {
            return invalid(format!("window_length must be odd, got {}", e.window_length));
        }
        if e.poly_order >= e.window_length {
            return invalid(format!(
                "poly_order ({}) must be less than window_length ({})",
                e.poly_order, e.window_length
            ));
        }
        if e.sentinel_s <= 0.0 {
            return invalid(format!("sentinel_s must be > 0, got {}", e.sentinel_s));
        }

        if self.contrast.delimiter.is_empty() {
            return invalid("contrast delimiter must not be empty".to_string());
        }
        for level in &self.contrast.levels {
            if level.label.trim().is_empty() {
                return invalid("contrast level labels must not be empty".to_string());
            }
        }

        if self.pupil.dilation_lag_frames == 0 || self.pupil.trace_half_width_frames == 0 {
            return invalid("pupil frame offsets must be > 0".to_string());
        }

        Ok(())
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, else the default location, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Using config at {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/gonogo/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gonogo").join("config.toml"))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
