// Raster and histogram figures

use plotters::prelude::*;
use std::path::Path;

use super::{series_rgb, RenderError, FIGURE_SIZE, RASTER_SIZE};
use crate::raster::{Histogram, Raster};

/// One vertical tick per event, one row per reference event, first row at the top
pub fn render_raster(raster: &Raster, path: &Path) -> Result<(), RenderError> {
    let rows = raster.row_count().max(1);
    // Row r is drawn at y = top - r so that row 0 sits at the top
    let top = (rows - 1) as f64;

    let root = SVGBackend::new(path, RASTER_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&raster.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(raster.window.lo..raster.window.hi, -0.5..(top + 0.5))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(raster.x_label.as_str())
        .y_desc("Trial")
        .y_label_formatter(&|y| format!("{}", (top - y).round()))
        .draw()?;

    for series in &raster.series {
        let color = series_rgb(series.color);
        let ticks = series.rows.iter().flat_map(|row| {
            let y = top - row.row as f64;
            row.offsets
                .iter()
                .map(move |&x| PathElement::new(vec![(x, y - 0.5), (x, y + 0.5)], color))
        });

        chart
            .draw_series(ticks)?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y - 5), (x, y + 5)], color));
    }

    if raster.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    root.present()?;
    log::info!("Wrote raster '{}' to {}", raster.title, path.display());
    Ok(())
}

/// Unfilled bars over the histogram's bin edges
pub fn render_histogram(histogram: &Histogram, title: &str, path: &Path) -> Result<(), RenderError> {
    let (Some(&lo), Some(&hi)) = (histogram.edges.first(), histogram.edges.last()) else {
        return Err(RenderError::Empty("histogram has no bins"));
    };
    let y_max = histogram.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Probe time from saccade (sec)")
        .y_desc("Count")
        .draw()?;

    chart.draw_series(
        histogram
            .edges
            .windows(2)
            .zip(histogram.counts.iter())
            .map(|(edge, &count)| {
                Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], BLACK.stroke_width(1))
            }),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{lick_raster, perisaccadic_histogram, HistogramSpec};
    use crate::trials::TimeWindow;
    use tempfile::TempDir;

    #[test]
    fn test_render_raster_writes_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("licks.svg");
        let raster = lick_raster(&[1.0, 5.0], &[1.2, 1.4, 5.3], TimeWindow::open(-1.0, 5.0));

        render_raster(&raster, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_render_empty_raster() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.svg");
        let raster = lick_raster(&[], &[], TimeWindow::open(-1.0, 5.0));
        render_raster(&raster, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_histogram() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hist.svg");
        let histogram = perisaccadic_histogram(&[10.0], &[10.02], &HistogramSpec::default());
        render_histogram(&histogram, "Peri-saccadic probes", &path).unwrap();
        assert!(path.exists());
    }
}
