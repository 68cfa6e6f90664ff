// End-to-end pipeline over a synthetic session folder
// 100 Hz acquisition log, 20 Hz camera, four probes, two licks, one peri-saccadic trial

use std::fs;
use std::path::{Path, PathBuf};

use gonogo_lib::aggregate::{Partition, ResponseCounts};
use gonogo_lib::config::AnalysisConfig;
use gonogo_lib::events::EventError;
use gonogo_lib::pipeline::{pool_sessions, read_trace_file, Session, SessionError, TRACE_FILE};
use gonogo_lib::pupil::{peristimulus_dilation, peristimulus_traces};
use gonogo_lib::raster::{contrast_raster, lick_raster, partition_raster};
use gonogo_lib::render;
use gonogo_lib::store::{self, StoreError};
use gonogo_lib::trials::{ContrastLabel, TimeWindow};
use tempfile::TempDir;

const ROWS: usize = 1200;
const PROBE_EDGES: [usize; 4] = [200, 400, 600, 800];
const GLITCH_ROW: usize = 500;
const PUFF_EDGE: usize = 750;

/// Camera frame k is the toggle after row 5k + 4, i.e. t = 0.05k + 0.04
const FRAMES: usize = 239;
const LICK_FRAMES: [usize; 2] = [41, 123];
const NASAL_SACCADE_FRAME: usize = 119;
const TEMPORAL_SACCADE_FRAME: usize = 10;

fn pulse(row: usize, edge: usize, width: usize) -> bool {
    row > edge && row <= edge + width
}

fn acquisition_log() -> String {
    let mut text = String::from("Time\tAIN0\tAIN1\tAIN2\tAIN3\tAIN4\tProbe\tCamera\tPuff\n");
    for row in 0..ROWS {
        let probe = PROBE_EDGES.iter().any(|&edge| pulse(row, edge, 10)) || row == GLITCH_ROW;
        let camera = (row / 5) % 2 == 1;
        let puff = pulse(row, PUFF_EDGE, 5);
        text.push_str(&format!(
            "{:.4}\t0\t0\t0\t0\t0\t{}\t{}\t{}\n",
            row as f64 * 0.01,
            probe as u8,
            camera as u8,
            puff as u8
        ));
    }
    text
}

fn tongue_pose() -> String {
    let mut text = String::from(
        "scorer,DLC,DLC,DLC\nbodyparts,spout,spout,spout\ncoords,x,y,likelihood\n",
    );
    for frame in 0..FRAMES {
        let occluded = LICK_FRAMES.iter().any(|&lick| frame == lick + 1);
        let likelihood = if occluded { 0.01 } else { 0.99 };
        text.push_str(&format!("{},50.0,60.0,{}\n", frame, likelihood));
    }
    text
}

fn eye_pose() -> String {
    let mut text = String::from(
        "scorer,DLC,DLC,DLC,DLC,DLC,DLC\n\
         bodyparts,center,center,center,nasal,nasal,nasal\n\
         coords,x,y,likelihood,x,y,likelihood\n",
    );
    for frame in 0..FRAMES {
        let radius = 10.0 + 0.01 * frame as f64;
        text.push_str(&format!(
            "{},100.0,100.0,0.99,{},100.0,0.99\n",
            frame,
            100.0 + radius
        ));
    }
    text
}

fn write_session(root: &Path, name: &str) -> PathBuf {
    let folder = root.join(name);
    let labjack = folder.join("labjack").join("m1_dreadd_day1");
    let videos = folder.join("videos");
    fs::create_dir_all(&labjack).unwrap();
    fs::create_dir_all(&videos).unwrap();

    fs::write(labjack.join("m1_0.dat"), acquisition_log()).unwrap();
    fs::write(
        videos.join("m1_ProbeMetadata.txt"),
        "contrast,duration\n0.80,0.5\n0.50,0.5\n0.80,0.5\n0.60,0.5\n",
    )
    .unwrap();
    fs::write(videos.join("m1_licksNov3shuffle1_500.csv"), tongue_pose()).unwrap();
    fs::write(videos.join("m1_leftCamDLC_shuffle1_100.csv"), eye_pose()).unwrap();

    folder
}

fn write_saccades(folder: &Path) -> PathBuf {
    let path = folder.join("saccades.json");
    fs::write(
        &path,
        format!(
            r#"{{"left": {{"nasal": {{"indices": [{}], "waveforms": [[0.0, 2.0, 4.0]]}},
                 "temporal": {{"indices": [{}], "waveforms": [[0.0, -2.0, -4.0]]}}}}}}"#,
            NASAL_SACCADE_FRAME, TEMPORAL_SACCADE_FRAME
        ),
    )
    .unwrap();
    path
}

fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "{:?} vs {:?}", got, want);
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-9, "{:?} vs {:?}", got, want);
    }
}

#[test]
fn test_extract_derives_all_series() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    let session = Session::open(&folder, AnalysisConfig::default()).unwrap();

    let summary = session.extract().unwrap();
    assert_eq!(summary.probes, 4);
    assert_eq!(summary.frames, FRAMES);
    assert_eq!(summary.puffs, 1);
    assert_eq!(summary.licks, 2);
    assert_eq!(summary.contrasts, 4);

    // The one-sample glitch at 5.0 s is debounced away
    assert_close(&session.probes().unwrap(), &[2.0, 4.0, 6.0, 8.0]);
    assert_close(&session.puffs().unwrap(), &[7.5]);
    assert_close(&session.licks().unwrap(), &[2.09, 6.19]);
    assert_eq!(session.contrasts().unwrap(), vec!["0.80", "0.50", "0.80", "0.60"]);

    let artifacts = store::list_artifacts(session.db()).unwrap();
    let kinds: Vec<&str> = artifacts.iter().map(|a| a.kind.as_str()).collect();
    assert!(kinds.contains(&"acquisition_folder"));
    assert!(kinds.contains(&"tongue_pose"));
    assert!(kinds.contains(&"probe_metadata"));
    assert!(artifacts.iter().all(|a| a.sha256.len() == 64 && a.bytes > 0));

    let trace = read_trace_file(&folder.join(TRACE_FILE)).unwrap();
    assert!(trace.len() >= 2);
    assert_eq!(trace.last().unwrap().progress, 1.0);
}

#[test]
fn test_extraction_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    let session = Session::open(&folder, AnalysisConfig::default()).unwrap();

    session.extract().unwrap();
    let first = session.licks().unwrap();
    let recorded = store::list_artifacts(session.db()).unwrap();
    session.extract().unwrap();
    assert_eq!(session.licks().unwrap(), first);

    // Re-extracting unchanged inputs keeps one provenance row per file
    let again = store::list_artifacts(session.db()).unwrap();
    assert_eq!(again.len(), recorded.len());
    assert_eq!(
        again.iter().map(|a| a.id).collect::<Vec<_>>(),
        recorded.iter().map(|a| a.id).collect::<Vec<_>>()
    );
}

#[test]
fn test_restarted_clock_fails_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    // A second log file whose time column starts over at zero
    fs::write(
        folder.join("labjack").join("m1_dreadd_day1").join("m1_1.dat"),
        acquisition_log(),
    )
    .unwrap();

    let session = Session::open(&folder, AnalysisConfig::default()).unwrap();
    assert!(matches!(
        session.extract(),
        Err(SessionError::Event(EventError::NotMonotonic { .. }))
    ));
    assert!(session.probes().is_err());
}

#[test]
fn test_analysis_classifies_trials() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    let session = Session::open(&folder, AnalysisConfig::default()).unwrap();
    session.extract().unwrap();

    assert!(matches!(
        session.analyze(false),
        Err(SessionError::Store(StoreError::NotComputed { .. }))
    ));

    session.import_saccades(&write_saccades(&folder)).unwrap();
    assert_close(&session.saccades().unwrap(), &[0.54, 5.99]);

    let analysis = session.analyze(false).unwrap();
    let responses: Vec<bool> = analysis.trials.iter().map(|t| t.response).collect();
    let near_saccade: Vec<bool> = analysis.trials.iter().map(|t| t.near_saccade).collect();
    let near_puff: Vec<bool> = analysis.trials.iter().map(|t| t.near_puff).collect();
    assert_eq!(responses, vec![true, false, true, false]);
    assert_eq!(near_saccade, vec![false, false, true, false]);
    assert_eq!(near_puff, vec![false, false, false, true]);

    let aggregate = &analysis.aggregate;
    let high = ContrastLabel::new("0.80");
    assert_eq!(
        aggregate.counts(Partition::Extrasaccadic, &high),
        ResponseCounts { responses: 1, totals: 1 }
    );
    assert_eq!(
        aggregate.counts(Partition::Perisaccadic, &high),
        ResponseCounts { responses: 1, totals: 1 }
    );
    assert_eq!(aggregate.partition_total(Partition::Extrasaccadic), 3);
    assert_eq!(aggregate.partition_total(Partition::Perisaccadic), 1);
    assert_eq!(aggregate.anchor_rate(), 1.0);

    // Every configured level is reported; 0.55 was never presented
    let rows = aggregate.rows();
    assert_eq!(rows.len(), 8);
    assert!(rows
        .iter()
        .any(|r| r.contrast.as_str() == "0.55" && r.totals == 0 && r.rate.is_nan()));
}

#[test]
fn test_filters_write_corrected_trials() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    let session = Session::open(&folder, AnalysisConfig::default()).unwrap();
    session.extract().unwrap();
    session.import_saccades(&write_saccades(&folder)).unwrap();

    // Four trials cannot fill the smoothing window
    assert!(session.filter_engaged().is_err());

    let corrected = session.filter_range(0, 3).unwrap();
    assert_eq!(corrected.len(), 3);

    let analysis = session.analyze(true).unwrap();
    assert_eq!(analysis.trials.len(), 3);
    assert_eq!(analysis.aggregate.partition_total(Partition::Extrasaccadic), 2);
}

#[test]
fn test_pooling_sums_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let folders: Vec<PathBuf> = ["m1", "m2"]
        .iter()
        .map(|name| {
            let folder = write_session(temp_dir.path(), name);
            let session = Session::open(&folder, AnalysisConfig::default()).unwrap();
            session.extract().unwrap();
            session.import_saccades(&write_saccades(&folder)).unwrap();
            folder
        })
        .collect();

    let pooled = pool_sessions(&folders, &AnalysisConfig::default(), false);
    assert_eq!(pooled.aggregate.sessions(), 2);
    assert!(pooled.skipped.is_empty());
    assert_eq!(
        pooled
            .aggregate
            .counts(Partition::Extrasaccadic, &ContrastLabel::new("0.80")),
        ResponseCounts { responses: 2, totals: 2 }
    );
}

#[test]
fn test_figures_render() {
    let temp_dir = TempDir::new().unwrap();
    let folder = write_session(temp_dir.path(), "m1");
    let mut config = AnalysisConfig::default();
    config.pupil.trace_half_width_frames = 20;

    let session = Session::open(&folder, config).unwrap();
    session.extract().unwrap();
    session.import_saccades(&write_saccades(&folder)).unwrap();

    let out = temp_dir.path().join("figures");
    fs::create_dir_all(&out).unwrap();

    let analysis = session.analyze(false).unwrap();
    let licks = session.licks().unwrap();
    let set = session.trial_set(false).unwrap();
    let window = TimeWindow::open(-1.0, 5.0);

    let raster = lick_raster(&set.probes, &licks, window);
    assert_eq!(raster.tick_count(), 4);
    render::render_raster(&raster, &out.join("licks.svg")).unwrap();

    let by_contrast = contrast_raster(&set, &licks, window, |c| analysis.aggregate.display(c));
    assert_eq!(by_contrast.series[0].label, "30%");
    render::render_raster(&by_contrast, &out.join("contrast.svg")).unwrap();

    let partitioned = partition_raster(&analysis.trials, &licks, window, |c| {
        analysis.aggregate.display(c)
    });
    render::render_raster(&partitioned, &out.join("partition.svg")).unwrap();

    render::render_psychometric(&analysis.aggregate.psychometric(), &out.join("curve.svg"))
        .unwrap();

    let radius = session.pupil_radius().unwrap();
    assert_eq!(radius.len(), FRAMES);

    let frames = session.frames().unwrap();
    let response = session.windows().response;
    let pupil = &session.config().pupil;

    // The first probe's frame has fewer than 50 frames of history
    let dilation = peristimulus_dilation(
        &set.probes,
        &licks,
        &frames,
        &radius,
        pupil.dilation_lag_frames,
        &response,
    );
    assert_eq!(dilation.len(), 3);
    assert!(dilation.iter().all(|p| (p.dilation - 0.5).abs() < 1e-9));
    render::render_dilation(&dilation, &out.join("dilation.svg")).unwrap();

    let traces = peristimulus_traces(
        &set.probes,
        &licks,
        &frames,
        &radius,
        pupil.trace_half_width_frames,
        &response,
    );
    assert_eq!(traces.response.len() + traces.no_response.len(), 4);
    render::render_pupil_traces(&traces, &out.join("traces.svg")).unwrap();

    let waveforms = session.saccade_results().unwrap();
    render::render_saccade_waveforms(&waveforms.left, &out.join("waves.svg")).unwrap();

    for name in ["licks", "contrast", "partition", "curve", "dilation", "traces", "waves"] {
        assert!(out.join(format!("{}.svg", name)).exists(), "{} not drawn", name);
    }
}
