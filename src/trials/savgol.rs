// Savitzky-Golay smoothing
// Least-squares polynomial smoothing over a sliding window. The first and last
// half-windows are taken from the polynomial fitted to the edge window.

use nalgebra::{DMatrix, DVector};

use super::TrialError;

/// Projection matrix of the least-squares polynomial fit over one window
///
/// Row `j` maps the window's samples to the fitted value at position `j`.
fn fit_projection(window: usize, order: usize) -> Result<DMatrix<f64>, TrialError> {
    let half = (window / 2) as f64;
    let vandermonde = DMatrix::from_fn(window, order + 1, |row, col| {
        (row as f64 - half).powi(col as i32)
    });

    let normal = vandermonde.transpose() * &vandermonde;
    let inverse = normal.try_inverse().ok_or(TrialError::SingularFit)?;

    Ok(&vandermonde * inverse * vandermonde.transpose())
}

/// Smooth `values` with a window of `window` samples and a polynomial of degree `order`
///
/// `window` must be odd and larger than `order`, and no longer than the series.
pub fn savgol_filter(values: &[f64], window: usize, order: usize) -> Result<Vec<f64>, TrialError> {
    if window % 2 == 0 || order >= window {
        return Err(TrialError::InvalidSmoothing { window, order });
    }
    if values.len() < window {
        return Err(TrialError::TooFewTrials {
            trials: values.len(),
            window,
        });
    }

    let projection = fit_projection(window, order)?;
    let half = window / 2;
    let n = values.len();
    let mut smoothed = vec![0.0; n];

    let weights: Vec<f64> = projection.row(half).iter().copied().collect();
    for i in half..n - half {
        smoothed[i] = weights
            .iter()
            .zip(&values[i - half..=i + half])
            .map(|(w, v)| w * v)
            .sum();
    }

    let head = DVector::from_column_slice(&values[..window]);
    let tail = DVector::from_column_slice(&values[n - window..]);
    let head_fit = &projection * head;
    let tail_fit = &projection * tail;
    for j in 0..half {
        smoothed[j] = head_fit[j];
        smoothed[n - half + j] = tail_fit[window - half + j];
    }

    Ok(smoothed)
}
