// Figure rendering
// Draws prepared rasters, curves and pupil data to SVG files with plotters

pub mod curves;
pub mod rasters;

pub use curves::{
    render_dilation, render_psychometric, render_pupil_traces, render_saccade_waveforms,
};
pub use rasters::{render_histogram, render_raster};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::style::{RGBColor, BLACK, BLUE, GREEN, RED};
use thiserror::Error;

use crate::raster::SeriesColor;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("Nothing to draw: {0}")]
    Empty(&'static str),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

/// Figure size in pixels
pub const FIGURE_SIZE: (u32, u32) = (900, 700);

/// Size used for rasters, which are tall
pub const RASTER_SIZE: (u32, u32) = (600, 1000);

pub(crate) fn series_rgb(color: SeriesColor) -> RGBColor {
    match color {
        SeriesColor::Black => BLACK,
        SeriesColor::Blue => BLUE,
        SeriesColor::Green => GREEN,
        SeriesColor::Red => RED,
    }
}

/// Finite min and max of `values`, padded; falls back to `fallback` when there are none
pub(crate) fn padded_range(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return fallback;
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let margin = (hi - lo) * 0.1;
    (lo - margin, hi + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0].into_iter(), (0.0, 1.0)), (-1.0, 11.0));
        assert_eq!(padded_range([f64::NAN].into_iter(), (0.0, 1.0)), (0.0, 1.0));
        assert_eq!(padded_range([2.0, 2.0].into_iter(), (0.0, 1.0)), (1.0, 3.0));
    }
}
