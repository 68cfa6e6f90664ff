// Raster module
// Event offsets relative to reference events, grouped into stacked rows for plotting

pub mod build;
pub mod histogram;

pub use build::{contrast_raster, lick_raster, partition_raster, saccade_raster};
pub use histogram::{perisaccadic_histogram, Histogram, HistogramSpec};

use serde::{Deserialize, Serialize};

use crate::trials::TimeWindow;

/// Tick color of a raster series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Black,
    Blue,
    Green,
    Red,
}

impl SeriesColor {
    /// Group colors, highest contrast first
    pub const PALETTE: [SeriesColor; 4] = [
        SeriesColor::Black,
        SeriesColor::Blue,
        SeriesColor::Green,
        SeriesColor::Red,
    ];

    pub fn cycle(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }
}

/// One row of ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterRow {
    /// Vertical position, 0 at the top
    pub row: usize,
    pub offsets: Vec<f64>,
}

/// Rows drawn in one color under one legend label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSeries {
    pub label: String,
    pub color: SeriesColor,
    pub rows: Vec<RasterRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    pub title: String,
    pub x_label: String,
    pub window: TimeWindow,
    pub series: Vec<RasterSeries>,
}

impl Raster {
    /// Number of row positions spanned, including gaps
    pub fn row_count(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| r.row + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn tick_count(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| r.offsets.len())
            .sum()
    }
}
