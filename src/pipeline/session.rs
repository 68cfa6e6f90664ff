// Session façade
// Locates raw artifacts, runs each processing stage, and persists derived series.
// Every stage reads its inputs from the store and returns its outputs; nothing is cached on the session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acquisition::{
    load_acquisition_log, load_contrast_values, locate_artifact, AcquisitionError, ArtifactKind,
    PoseTable,
};
use crate::aggregate::SessionAggregate;
use crate::config::AnalysisConfig;
use crate::events::{
    detect_licks, ensure_monotonic, extract_frame_timestamps, extract_probe_timestamps,
    extract_puff_timestamps, saccade_timestamps, EventError, EventKind, SaccadeClassification,
};
use crate::pupil::pupil_radius;
use crate::store::{self, DbConnection, SeriesKey, SourceArtifact, StoreError};
use crate::trials::{
    classify_trials, filter_engaged, Trial, TrialError, TrialEvents, TrialSet, TrialWindows,
};

use super::trace::{Stage, TraceEntry, TraceError, TraceWriter};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} is not a session folder")]
    NotAFolder(PathBuf),

    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Event extraction error: {0}")]
    Event(#[from] EventError),

    #[error("Trial error: {0}")]
    Trial(#[from] TrialError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Counts of the series written by `extract`
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub session: String,
    pub probes: usize,
    pub frames: usize,
    pub puffs: usize,
    pub licks: usize,
    pub contrasts: usize,
}

/// One derived series: when it was last written, or which command writes it
#[derive(Debug, Clone, Serialize)]
pub struct SeriesStatus {
    pub key: &'static str,
    pub updated_at: Option<DateTime<Utc>>,
    pub producer: &'static str,
}

/// What the session store holds
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session: String,
    pub series: Vec<SeriesStatus>,
    pub artifacts: Vec<SourceArtifact>,
}

/// Classified trials and their response counts
#[derive(Debug, Clone)]
pub struct SessionAnalysis {
    pub trials: Vec<Trial>,
    pub aggregate: SessionAggregate,
}

/// One recording session folder and its derived-series store
pub struct Session {
    folder: PathBuf,
    name: String,
    config: AnalysisConfig,
    db: DbConnection,
    trace: TraceWriter,
}

impl Session {
    pub fn open(folder: &Path, config: AnalysisConfig) -> SessionResult<Self> {
        if !folder.is_dir() {
            return Err(SessionError::NotAFolder(folder.to_path_buf()));
        }

        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| folder.display().to_string());
        let db = store::open_session_db(folder)?;

        Ok(Session {
            folder: folder.to_path_buf(),
            name,
            config,
            db,
            trace: TraceWriter::for_session(folder),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn db(&self) -> &DbConnection {
        &self.db
    }

    /// Append an entry to the session's pipeline trace
    pub fn trace(&self, entry: TraceEntry) -> SessionResult<()> {
        self.trace.write(&entry)?;
        Ok(())
    }

    /// Path of a raw artifact, located by its configured pattern
    pub fn locate(&self, kind: ArtifactKind) -> SessionResult<PathBuf> {
        let patterns = &self.config.artifacts;
        let pattern = match kind {
            ArtifactKind::AcquisitionFolder => &patterns.acquisition_folder,
            ArtifactKind::ProbeMetadata => &patterns.probe_metadata,
            ArtifactKind::TonguePose => &patterns.tongue_pose,
            ArtifactKind::EyePose => &patterns.eye_pose,
        };
        Ok(locate_artifact(&self.folder, kind, pattern)?)
    }

    // ==================== EXTRACTION ====================

    /// Derive probe, frame, puff and lick timestamps and contrast labels from the raw artifacts
    pub fn extract(&self) -> SessionResult<ExtractionSummary> {
        self.trace(Stage::Extract.start(format!("Extracting events for {}", self.name)))?;

        let log_folder = self.locate(ArtifactKind::AcquisitionFolder)?;
        let acquisition = load_acquisition_log(&log_folder, self.config.channels.log_delimiter as u8)?;
        for source in &acquisition.sources {
            store::record_artifact(&self.db, ArtifactKind::AcquisitionFolder.as_str(), source)?;
        }

        let channels = &self.config.channels;
        let probes = extract_probe_timestamps(&acquisition, channels)?;
        let frames = extract_frame_timestamps(&acquisition, channels)?;
        let puffs = extract_puff_timestamps(&acquisition, channels)?;
        ensure_monotonic(&probes, EventKind::Probe)?;
        ensure_monotonic(&frames, EventKind::Frame)?;
        ensure_monotonic(&puffs, EventKind::Puff)?;
        store::write_series(&self.db, SeriesKey::ProbeTimestamps, &probes)?;
        store::write_series(&self.db, SeriesKey::FrameTimestamps, &frames)?;
        store::write_series(&self.db, SeriesKey::PuffTimestamps, &puffs)?;
        self.trace(Stage::Extract.progress(0.5, "Extracted channel events"))?;

        let tongue_path = self.locate(ArtifactKind::TonguePose)?;
        let tongue = PoseTable::load(&tongue_path)?;
        store::record_artifact(&self.db, ArtifactKind::TonguePose.as_str(), &tongue_path)?;
        let lick_config = &self.config.licks;
        let likelihood = tongue.column(&lick_config.bodypart, &lick_config.feature)?;
        let licks = detect_licks(likelihood, &frames, lick_config.peak_height)?;
        store::write_series(&self.db, SeriesKey::LickTimestamps, &licks)?;

        let metadata_path = self.locate(ArtifactKind::ProbeMetadata)?;
        let contrasts =
            load_contrast_values(&metadata_path, &self.config.contrast.delimiter, probes.len())?;
        store::record_artifact(&self.db, ArtifactKind::ProbeMetadata.as_str(), &metadata_path)?;
        store::write_series(&self.db, SeriesKey::ContrastValues, &contrasts)?;

        let summary = ExtractionSummary {
            session: self.name.clone(),
            probes: probes.len(),
            frames: frames.len(),
            puffs: puffs.len(),
            licks: licks.len(),
            contrasts: contrasts.len(),
        };

        self.trace(
            Stage::Extract
                .complete("Extraction complete")
                .with_data(serde_json::to_value(&summary)?),
        )?;

        Ok(summary)
    }

    /// Store the external saccade classifier's output for this session
    pub fn import_saccades(&self, path: &Path) -> SessionResult<SaccadeClassification> {
        let contents = std::fs::read_to_string(path)?;
        let results: SaccadeClassification = serde_json::from_str(&contents)?;

        // Indices must map onto frames that exist; without frames the check waits for `extract`
        if store::series_exists(&self.db, SeriesKey::FrameTimestamps)? {
            saccade_timestamps(&results, &self.frames()?)?;
        } else {
            log::warn!("{}: no frame timestamps yet, saccade indices not checked", self.name);
        }

        store::write_series(&self.db, SeriesKey::SaccadeClassificationResults, &results)?;
        self.trace(Stage::ImportSaccades.complete("Imported saccade classification").with_data(
            serde_json::json!({
                "nasal": results.left.nasal.indices.len(),
                "temporal": results.left.temporal.indices.len(),
            }),
        ))?;

        Ok(results)
    }

    // ==================== STORED SERIES ====================

    /// Every derived series with its update time, plus the recorded raw inputs
    pub fn status(&self) -> SessionResult<SessionStatus> {
        let stored = store::list_series(&self.db)?;
        let series = SeriesKey::ALL
            .into_iter()
            .map(|key| SeriesStatus {
                key: key.as_str(),
                updated_at: stored
                    .iter()
                    .find(|(stored_key, _)| *stored_key == key)
                    .map(|(_, at)| *at),
                producer: key.producer(),
            })
            .collect();

        Ok(SessionStatus {
            session: self.name.clone(),
            series,
            artifacts: store::list_artifacts(&self.db)?,
        })
    }

    pub fn probes(&self) -> SessionResult<Vec<f64>> {
        Ok(store::read_series(&self.db, SeriesKey::ProbeTimestamps)?)
    }

    pub fn frames(&self) -> SessionResult<Vec<f64>> {
        Ok(store::read_series(&self.db, SeriesKey::FrameTimestamps)?)
    }

    pub fn puffs(&self) -> SessionResult<Vec<f64>> {
        Ok(store::read_series(&self.db, SeriesKey::PuffTimestamps)?)
    }

    pub fn licks(&self) -> SessionResult<Vec<f64>> {
        Ok(store::read_series(&self.db, SeriesKey::LickTimestamps)?)
    }

    pub fn contrasts(&self) -> SessionResult<Vec<String>> {
        Ok(store::read_series(&self.db, SeriesKey::ContrastValues)?)
    }

    pub fn saccade_results(&self) -> SessionResult<SaccadeClassification> {
        Ok(store::read_series(&self.db, SeriesKey::SaccadeClassificationResults)?)
    }

    /// Left-eye saccade timestamps, in time order
    pub fn saccades(&self) -> SessionResult<Vec<f64>> {
        let results = self.saccade_results()?;
        let frames = self.frames()?;
        Ok(saccade_timestamps(&results, &frames)?)
    }

    /// The full trial set, or the corrected one written by a filter
    pub fn trial_set(&self, filtered: bool) -> SessionResult<TrialSet> {
        if filtered {
            let probes: Vec<f64> = store::read_series(&self.db, SeriesKey::FilteredProbes)?;
            let contrasts: Vec<String> = store::read_series(&self.db, SeriesKey::FilteredContrast)?;
            Ok(TrialSet::new(probes, contrasts)?)
        } else {
            Ok(TrialSet::new(self.probes()?, self.contrasts()?)?)
        }
    }

    // ==================== FILTERS ====================

    fn store_filtered(&self, set: &TrialSet, how: &str) -> SessionResult<()> {
        store::write_series(&self.db, SeriesKey::FilteredProbes, &set.probes)?;
        store::write_series(&self.db, SeriesKey::FilteredContrast, &set.contrast_strings())?;
        self.trace(
            Stage::Filter
                .complete(format!("Stored {} corrected trials ({})", set.len(), how))
                .with_data(serde_json::json!({ "kept": set.len() })),
        )
    }

    /// Keep trials where the animal was engaged, judged from smoothed reaction times
    pub fn filter_engaged(&self) -> SessionResult<TrialSet> {
        let set = self.trial_set(false)?;
        let corrected = filter_engaged(&set, &self.licks()?, &self.config.engagement)?;
        self.store_filtered(&corrected, "engagement")?;
        Ok(corrected)
    }

    /// Keep trials `start..end`
    pub fn filter_range(&self, start: usize, end: usize) -> SessionResult<TrialSet> {
        let corrected = self.trial_set(false)?.range(start, end);
        self.store_filtered(&corrected, &format!("range {}..{}", start, end))?;
        Ok(corrected)
    }

    // ==================== ANALYSIS ====================

    pub fn windows(&self) -> TrialWindows {
        TrialWindows::from(&self.config.windows)
    }

    pub fn classify(&self, filtered: bool) -> SessionResult<Vec<Trial>> {
        let set = self.trial_set(filtered)?;
        let saccades = self.saccades()?;
        let puffs = self.puffs()?;
        let licks = self.licks()?;

        let events = TrialEvents {
            saccades: &saccades,
            puffs: &puffs,
            licks: &licks,
        };
        Ok(classify_trials(&set, &events, &self.windows()))
    }

    pub fn analyze(&self, filtered: bool) -> SessionResult<SessionAnalysis> {
        self.trace(Stage::Analyze.start(if filtered {
            "Analyzing corrected trials"
        } else {
            "Analyzing all trials"
        }))?;

        let trials = self.classify(filtered)?;
        let aggregate = SessionAggregate::from_trials(&trials, &self.config.contrast.levels);

        self.trace(Stage::Analyze.complete("Analysis complete").with_data(serde_json::json!({
            "trials": trials.len(),
            "anchor": aggregate.anchor_rate(),
        })))?;

        Ok(SessionAnalysis { trials, aggregate })
    }

    /// Per-frame pupil radius from the eye pose table
    pub fn pupil_radius(&self) -> SessionResult<Vec<f64>> {
        let path = self.locate(ArtifactKind::EyePose)?;
        let pose = PoseTable::load(&path)?;
        store::record_artifact(&self.db, ArtifactKind::EyePose.as_str(), &path)?;
        Ok(pupil_radius(&pose, &self.config.pupil)?)
    }
}
