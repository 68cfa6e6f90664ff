// Line and scatter figures: psychometric curves, pupil measures, saccade waveforms

use plotters::prelude::*;
use std::path::Path;

use super::{padded_range, RenderError, FIGURE_SIZE};
use crate::aggregate::{Partition, PsychometricCurve};
use crate::events::{EyeSaccades, SaccadeDirection};
use crate::pupil::{DilationPoint, PupilTraces};

fn partition_color(partition: Partition) -> RGBColor {
    match partition {
        Partition::Extrasaccadic => RED,
        Partition::Perisaccadic => BLUE,
    }
}

/// Normalized response rate per contrast, one line per partition
///
/// Empty buckets (NaN) are left out of the line.
pub fn render_psychometric(curve: &PsychometricCurve, path: &Path) -> Result<(), RenderError> {
    if curve.contrasts.is_empty() {
        return Err(RenderError::Empty("psychometric curve has no contrasts"));
    }

    let lines: Vec<(Partition, Vec<(f64, f64)>)> = Partition::ALL
        .into_iter()
        .map(|partition| {
            let points = curve
                .normalized(partition)
                .into_iter()
                .enumerate()
                .filter(|(_, rate)| rate.is_finite())
                .map(|(i, rate)| (i as f64, rate))
                .collect();
            (partition, points)
        })
        .collect();

    let y_max = lines
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.1))
        .fold(1.0_f64, f64::max)
        * 1.15;
    let x_max = (curve.contrasts.len() - 1) as f64;
    let displays = curve.displays.clone();

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Psychometric curve ({} session(s))", curve.sessions),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(x_max + 0.5), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(curve.contrasts.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                displays.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Contrast")
        .y_desc("Normalized response rate")
        .draw()?;

    for (partition, points) in &lines {
        let color = partition_color(*partition);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))?
            .label(partition.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    root.present()?;
    log::info!("Wrote psychometric curve to {}", path.display());
    Ok(())
}

/// Dilation before each probe against probe time; responses blue, misses red
pub fn render_dilation(points: &[DilationPoint], path: &Path) -> Result<(), RenderError> {
    if points.is_empty() {
        return Err(RenderError::Empty("no probes with enough pupil history"));
    }

    let (x_lo, x_hi) = padded_range(points.iter().map(|p| p.probe_time), (0.0, 1.0));
    let (y_lo, y_hi) = padded_range(
        points.iter().map(|p| p.dilation).chain(std::iter::once(0.0)),
        (-1.0, 1.0),
    );

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Peri-stimulus dilation", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Probe time (sec)")
        .y_desc("Radius change (px)")
        .draw()?;

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x_lo, 0.0), (x_hi, 0.0)],
        BLACK,
    )))?;

    chart.draw_series(points.iter().map(|p| {
        let color = if p.response { BLUE } else { RED };
        Circle::new((p.probe_time, p.dilation), 4, color.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Individual traces faint, group means solid; responses blue, misses red
pub fn render_pupil_traces(traces: &PupilTraces, path: &Path) -> Result<(), RenderError> {
    let groups = [
        (&traces.response, traces.mean_response(), BLUE, "response"),
        (&traces.no_response, traces.mean_no_response(), RED, "no response"),
    ];
    if groups.iter().all(|(individual, _, _, _)| individual.is_empty()) {
        return Err(RenderError::Empty("no pupil traces"));
    }

    let offset = traces.half_width as f64;
    let (y_lo, y_hi) = padded_range(
        groups
            .iter()
            .flat_map(|(individual, _, _, _)| individual.iter().flatten().copied()),
        (0.0, 1.0),
    );

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Peri-stimulus pupil radius", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-offset..offset, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Frames from probe")
        .y_desc("Pupil radius (px)")
        .draw()?;

    let as_points = |trace: &[f64]| -> Vec<(f64, f64)> {
        trace
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64 - offset, v))
            .collect()
    };

    for (individual, mean, color, label) in &groups {
        let faint = color.mix(0.1);
        for trace in individual.iter() {
            chart.draw_series(LineSeries::new(as_points(trace), &faint))?;
        }

        let color = *color;
        chart
            .draw_series(LineSeries::new(as_points(mean), color.stroke_width(2)))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Nasal (blue) and temporal (red) waveforms with their means in black
pub fn render_saccade_waveforms(saccades: &EyeSaccades, path: &Path) -> Result<(), RenderError> {
    let directions = [
        (SaccadeDirection::Nasal, BLUE),
        (SaccadeDirection::Temporal, RED),
    ];

    let all_samples = directions
        .iter()
        .flat_map(|(direction, _)| saccades.group(*direction).waveforms.iter().flatten().copied());
    let width = directions
        .iter()
        .flat_map(|(direction, _)| saccades.group(*direction).waveforms.iter().map(|w| w.len()))
        .max()
        .unwrap_or(0);
    if width == 0 {
        return Err(RenderError::Empty("no saccade waveforms"));
    }
    let (y_lo, y_hi) = padded_range(all_samples, (-1.0, 1.0));

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Saccade waveforms", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..(width - 1).max(1) as f64, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Sample")
        .y_desc("Eye position")
        .draw()?;

    let as_points = |wave: &[f64]| -> Vec<(f64, f64)> {
        wave.iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64, v))
            .collect()
    };

    for (direction, color) in &directions {
        let group = saccades.group(*direction);
        let faint = color.mix(0.05);
        for wave in &group.waveforms {
            chart.draw_series(LineSeries::new(as_points(wave), &faint))?;
        }
        chart.draw_series(LineSeries::new(
            as_points(&group.mean_waveform()),
            BLACK.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}
