// Subcommand handlers
// Each handler opens the session(s), runs one stage, and prints a JSON summary on stdout

use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::aggregate::{SessionAggregate, SummaryRow};
use crate::cli::{Commands, FilterMode};
use crate::config::AnalysisConfig;
use crate::pipeline::{pool_sessions, Session, SessionError, SkippedSession, Stage};
use crate::pupil::{peristimulus_dilation, peristimulus_traces};
use crate::raster::{
    contrast_raster, lick_raster, partition_raster, perisaccadic_histogram, saccade_raster,
    HistogramSpec,
};
use crate::render::{self, RenderError};
use crate::store::StoreError;
use crate::trials::TimeWindow;

pub const PSYCHOMETRIC_FIGURE: &str = "psychometric.svg";
pub const PARTITION_RASTER_FIGURE: &str = "licks_by_partition.svg";
pub const LICK_RASTER_FIGURE: &str = "licks.svg";
pub const CONTRAST_RASTER_FIGURE: &str = "licks_by_contrast.svg";
pub const SACCADE_RASTER_FIGURE: &str = "saccade_aligned.svg";
pub const HISTOGRAM_FIGURE: &str = "perisaccadic_probes.svg";
pub const WAVEFORM_FIGURE: &str = "saccade_waveforms.svg";
pub const DILATION_FIGURE: &str = "pupil_dilation.svg";
pub const PUPIL_TRACE_FIGURE: &str = "pupil_traces.svg";

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub session: String,
    pub filtered: bool,
    pub trials: usize,

    /// Null when the anchor bucket is empty
    pub anchor: f64,
    pub rows: Vec<SummaryRow>,
    pub figures: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct PoolReport {
    pub sessions: usize,
    pub included: Vec<PathBuf>,
    pub skipped: Vec<SkippedSession>,
    pub anchor: f64,
    pub rows: Vec<SummaryRow>,
    pub figure: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FigureReport {
    pub session: String,
    pub figures: Vec<PathBuf>,
}

/// Run one parsed subcommand
pub fn dispatch(command: Commands, config: AnalysisConfig) -> anyhow::Result<()> {
    match command {
        Commands::Extract { session } => run_extract(&session, config),
        Commands::ImportSaccades { session, file } => run_import_saccades(&session, &file, config),
        Commands::Filter { session, mode } => run_filter(&session, &mode, config),
        Commands::Analyze {
            session,
            filtered,
            plots,
        } => run_analyze(&session, filtered, plots.as_deref(), config),
        Commands::Pool {
            sessions,
            filtered,
            plot,
        } => run_pool(&sessions, filtered, plot.as_deref(), &config),
        Commands::Rasters {
            session,
            out_dir,
            filtered,
        } => run_rasters(&session, &out_dir, filtered, config),
        Commands::Pupil { session, out_dir } => run_pupil(&session, &out_dir, config),
        Commands::Status { session } => run_status(&session, config),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_session(folder: &Path, config: AnalysisConfig) -> anyhow::Result<Session> {
    Session::open(folder, config)
        .with_context(|| format!("Failed to open session {}", folder.display()))
}

/// Draw one figure; a figure with nothing to draw is skipped with a warning
fn draw_figure(
    path: PathBuf,
    draw: impl FnOnce(&Path) -> Result<(), RenderError>,
) -> anyhow::Result<Option<PathBuf>> {
    match draw(&path) {
        Ok(()) => Ok(Some(path)),
        Err(RenderError::Empty(reason)) => {
            log::warn!("Skipping {}: {}", path.display(), reason);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to draw {}", path.display())),
    }
}

fn is_not_computed(err: &SessionError) -> bool {
    matches!(err, SessionError::Store(StoreError::NotComputed { .. }))
}

// ==================== SESSION COMMANDS ====================

fn run_extract(folder: &Path, config: AnalysisConfig) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    let summary = session
        .extract()
        .with_context(|| format!("Extraction failed for {}", session.name()))?;
    print_json(&summary)
}

fn run_status(folder: &Path, config: AnalysisConfig) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    print_json(&session.status()?)
}

fn run_import_saccades(folder: &Path, file: &Path, config: AnalysisConfig) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    let results = session
        .import_saccades(file)
        .with_context(|| format!("Failed to import saccades from {}", file.display()))?;

    print_json(&serde_json::json!({
        "session": session.name(),
        "nasal": results.left.nasal.indices.len(),
        "temporal": results.left.temporal.indices.len(),
        "right_eye": results.right.is_some(),
    }))
}

fn run_filter(folder: &Path, mode: &FilterMode, config: AnalysisConfig) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    let total = session.probes()?.len();

    let corrected = match mode.range.as_deref() {
        Some(&[start, end]) => session.filter_range(start, end)?,
        Some(other) => anyhow::bail!("--range takes START END, got {:?}", other),
        None => session.filter_engaged()?,
    };

    print_json(&serde_json::json!({
        "session": session.name(),
        "total": total,
        "kept": corrected.len(),
    }))
}

fn run_analyze(
    folder: &Path,
    filtered: bool,
    plots: Option<&Path>,
    config: AnalysisConfig,
) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    let analysis = session
        .analyze(filtered)
        .with_context(|| format!("Analysis failed for {}", session.name()))?;

    let mut figures = Vec::new();
    if let Some(dir) = plots {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let curve = analysis.aggregate.psychometric();
        figures.extend(draw_figure(dir.join(PSYCHOMETRIC_FIGURE), |path| {
            render::render_psychometric(&curve, path)
        })?);

        let windows = &session.config().windows;
        let (lo, hi) = if filtered {
            windows.raster_corrected
        } else {
            windows.raster
        };
        let raster = partition_raster(
            &analysis.trials,
            &session.licks()?,
            TimeWindow::open(lo, hi),
            |c| analysis.aggregate.display(c),
        );
        figures.extend(draw_figure(dir.join(PARTITION_RASTER_FIGURE), |path| {
            render::render_raster(&raster, path)
        })?);
    }

    print_json(&AnalysisReport {
        session: session.name().to_string(),
        filtered,
        trials: analysis.trials.len(),
        anchor: analysis.aggregate.anchor_rate(),
        rows: analysis.aggregate.rows(),
        figures,
    })
}

fn run_rasters(
    folder: &Path,
    out_dir: &Path,
    filtered: bool,
    config: AnalysisConfig,
) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    session.trace(Stage::Rasters.start(format!("Drawing rasters for {}", session.name())))?;

    let windows = &session.config().windows;
    let (lo, hi) = if filtered {
        windows.raster_corrected
    } else {
        windows.raster
    };
    let raster_window = TimeWindow::open(lo, hi);
    let (lo, hi) = windows.raster_corrected;
    let saccade_window = TimeWindow::open(lo, hi);

    let set = session.trial_set(filtered)?;
    let licks = session.licks()?;
    let levels = SessionAggregate::from_trials(&[], &session.config().contrast.levels);

    let mut figures = Vec::new();
    let licks_raster = lick_raster(&set.probes, &licks, raster_window);
    figures.extend(draw_figure(out_dir.join(LICK_RASTER_FIGURE), |path| {
        render::render_raster(&licks_raster, path)
    })?);

    let by_contrast = contrast_raster(&set, &licks, raster_window, |c| levels.display(c));
    figures.extend(draw_figure(out_dir.join(CONTRAST_RASTER_FIGURE), |path| {
        render::render_raster(&by_contrast, path)
    })?);

    match session.saccade_results() {
        Ok(results) => {
            let saccades = session.saccades()?;

            let aligned = saccade_raster(&saccades, &licks, &set.probes, saccade_window);
            figures.extend(draw_figure(out_dir.join(SACCADE_RASTER_FIGURE), |path| {
                render::render_raster(&aligned, path)
            })?);

            let histogram = perisaccadic_histogram(&saccades, &set.probes, &HistogramSpec::default());
            figures.extend(draw_figure(out_dir.join(HISTOGRAM_FIGURE), |path| {
                render::render_histogram(&histogram, "Probes around saccades", path)
            })?);

            figures.extend(draw_figure(out_dir.join(WAVEFORM_FIGURE), |path| {
                render::render_saccade_waveforms(&results.left, path)
            })?);
        }
        Err(e) if is_not_computed(&e) => {
            log::warn!("No saccade classification for {}; skipping saccade figures", session.name());
        }
        Err(e) => return Err(e.into()),
    }

    session.trace(
        Stage::Rasters
            .complete(format!("Drew {} figures", figures.len()))
            .with_data(serde_json::json!({ "figures": figures })),
    )?;

    print_json(&FigureReport {
        session: session.name().to_string(),
        figures,
    })
}

fn run_pupil(folder: &Path, out_dir: &Path, config: AnalysisConfig) -> anyhow::Result<()> {
    let session = open_session(folder, config)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    session.trace(Stage::Pupil.start(format!("Measuring pupil for {}", session.name())))?;

    let radius = session
        .pupil_radius()
        .with_context(|| format!("No pupil radius for {}", session.name()))?;
    let probes = session.probes()?;
    let licks = session.licks()?;
    let frames = session.frames()?;
    let response = session.windows().response;
    let pupil = &session.config().pupil;

    let dilation = peristimulus_dilation(
        &probes,
        &licks,
        &frames,
        &radius,
        pupil.dilation_lag_frames,
        &response,
    );
    let traces = peristimulus_traces(
        &probes,
        &licks,
        &frames,
        &radius,
        pupil.trace_half_width_frames,
        &response,
    );

    let mut figures = Vec::new();
    figures.extend(draw_figure(out_dir.join(DILATION_FIGURE), |path| {
        render::render_dilation(&dilation, path)
    })?);
    figures.extend(draw_figure(out_dir.join(PUPIL_TRACE_FIGURE), |path| {
        render::render_pupil_traces(&traces, path)
    })?);

    session.trace(Stage::Pupil.complete("Pupil figures drawn").with_data(serde_json::json!({
        "dilation_points": dilation.len(),
        "response_traces": traces.response.len(),
        "no_response_traces": traces.no_response.len(),
    })))?;

    print_json(&FigureReport {
        session: session.name().to_string(),
        figures,
    })
}

// ==================== POOLING ====================

fn run_pool(
    folders: &[PathBuf],
    filtered: bool,
    plot: Option<&Path>,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let pooled = pool_sessions(folders, config, filtered);
    if pooled.included.is_empty() {
        anyhow::bail!("None of the {} sessions could be analyzed", folders.len());
    }

    let mut figure = None;
    if let Some(path) = plot {
        let curve = pooled.aggregate.psychometric();
        figure = draw_figure(path.to_path_buf(), |path| {
            render::render_psychometric(&curve, path)
        })?;
    }

    print_json(&PoolReport {
        sessions: pooled.aggregate.sessions(),
        anchor: pooled.aggregate.anchor_rate(),
        rows: pooled.aggregate.rows(),
        included: pooled.included,
        skipped: pooled.skipped,
        figure,
    })
}
