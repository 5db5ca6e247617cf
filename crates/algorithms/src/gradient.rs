//! Oriented gradient cues from half-disc label histograms
//!
//! For every pixel and orientation, the labels inside a disc neighborhood
//! are split by the diameter at that orientation, histogrammed per side,
//! optionally smoothed, and reduced to a chi-squared dissimilarity. The
//! result is one gradient-magnitude map per orientation.

use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use mpb_core::{Error, Grid, Result};

use crate::filters::{gaussian_filter_1d, standard_orientations, AngleUnit};
use crate::maybe_rayon::*;
use crate::signal::{convolve_fft, ConvMode};

/// Denominator floor for the chi-squared reduction; near-empty bins are
/// scored against 1.0 instead of blowing up
const CHI_DENOM_EPS: f64 = 1e-5;

/// Parameters for the oriented gradient scan
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientHistParams {
    /// Disc radius in pixels
    pub radius: usize,
    /// Number of orientations over [0, 180)
    pub n_ori: usize,
    /// Histogram resolution; every label must lie in [0, num_bins)
    pub num_bins: usize,
    /// Optional 1D histogram smoothing kernel (odd length). `None` leaves
    /// the histograms raw, matching an impulse kernel.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub smoothing_kernel: Option<Array1<f64>>,
}

impl Default for GradientHistParams {
    fn default() -> Self {
        Self {
            radius: 5,
            n_ori: 8,
            num_bins: 32,
            smoothing_kernel: None,
        }
    }
}

/// Disc weight mask of the given radius: 1 inside the disc, 0 outside,
/// with the exact center excluded. Symmetric under 180-degree rotation.
pub fn disc_weight_mask(radius: usize) -> Array2<f64> {
    let r = radius as isize;
    let r_sq = r * r;
    let size = 2 * radius + 1;

    let mut mask = Array2::from_shape_fn((size, size), |(i, j)| {
        let x = i as isize - r;
        let y = j as isize - r;
        if x * x + y * y <= r_sq {
            1.0
        } else {
            0.0
        }
    });
    mask[(radius, radius)] = 0.0;
    mask
}

/// Per-offset angle (degrees, in (-180, 180]) relative to the disc center,
/// measured with y up and x right. Used to assign each disc offset to the
/// left or right half for a given orientation.
pub fn orientation_slice_map(radius: usize) -> Array2<f64> {
    let r = radius as isize;
    let size = 2 * radius + 1;

    Array2::from_shape_fn((size, size), |(i, j)| {
        let y = (r - i as isize) as f64;
        let x = (j as isize - r) as f64;
        y.atan2(x).to_degrees()
    })
}

/// Chi-squared dissimilarity between two histograms.
///
/// Per bin: 0.5 * (r - l)^2 / (r + l), with denominators below 1e-5
/// replaced by 1.0. Symmetric in its arguments; zero iff the histograms
/// are identical.
pub fn chi_squared_distance(left: ArrayView1<'_, f64>, right: ArrayView1<'_, f64>) -> f64 {
    left.iter()
        .zip(right.iter())
        .map(|(&l, &r)| {
            let diff = r - l;
            let mut denom = r + l;
            if denom < CHI_DENOM_EPS {
                denom = 1.0;
            }
            0.5 * diff * diff / denom
        })
        .sum()
}

/// The histogram smoothing kernel the upstream cue pipeline pairs with a
/// `num_bins`-bin gradient scan: an order-0 Gaussian with scale
/// `num_bins * sigma` and half-length floor(3 * scale + 0.5).
pub fn histogram_smoothing_kernel(num_bins: usize, sigma: f64) -> Result<Array1<f64>> {
    if num_bins == 0 {
        return Err(Error::invalid_parameter(
            "num_bins",
            num_bins,
            "histogram resolution must be positive",
        ));
    }
    let scale = num_bins as f64 * sigma;
    let half_len = (3.0 * scale + 0.5) as usize;
    gaussian_filter_1d(half_len, scale, 0, false)
}

/// Compute one oriented gradient map per orientation from a label map.
///
/// The label map is reflect-padded by `radius` so every pixel sees a full
/// disc. For each pixel and orientation, disc labels are histogrammed into
/// the left/right half-disc (slice-map angles in (theta-180, theta] go
/// right — offsets exactly on the boundary fall right), each histogram is
/// smoothed and normalized to a distribution, and the pair is reduced with
/// [`chi_squared_distance`].
pub fn oriented_gradient_hist(
    labels: &Grid<u32>,
    params: &GradientHistParams,
) -> Result<Vec<Grid<f64>>> {
    let (rows, cols) = labels.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    if params.radius == 0 {
        return Err(Error::invalid_parameter(
            "radius",
            params.radius,
            "disc radius must be positive",
        ));
    }
    if params.n_ori == 0 {
        return Err(Error::invalid_parameter(
            "n_ori",
            params.n_ori,
            "at least one orientation required",
        ));
    }
    if params.num_bins == 0 {
        return Err(Error::invalid_parameter(
            "num_bins",
            params.num_bins,
            "histogram resolution must be positive",
        ));
    }
    if let Some(kernel) = &params.smoothing_kernel {
        if kernel.is_empty() || kernel.len() % 2 == 0 {
            return Err(Error::invalid_parameter(
                "smoothing_kernel",
                kernel.len(),
                "smoothing kernel length must be odd",
            ));
        }
    }
    if let Some(&max_label) = labels.data().iter().max() {
        if max_label as usize >= params.num_bins {
            return Err(Error::Algorithm(format!(
                "label {} exceeds histogram resolution {}",
                max_label, params.num_bins
            )));
        }
    }

    debug!(
        rows,
        cols,
        radius = params.radius,
        n_ori = params.n_ori,
        num_bins = params.num_bins,
        "computing oriented gradient histograms"
    );

    let r = params.radius;
    let n_ori = params.n_ori;
    let num_bins = params.num_bins;
    let oris = standard_orientations(n_ori, AngleUnit::Degrees);
    let padded = labels.reflect_pad(r)?;

    // Flatten the disc once: (row offset, col offset, slice angle)
    let weights = disc_weight_mask(r);
    let slice_map = orientation_slice_map(r);
    let size = 2 * r + 1;
    let mut disc = Vec::new();
    for u in 0..size {
        for v in 0..size {
            if weights[(u, v)] != 0.0 {
                disc.push((u, v, slice_map[(u, v)]));
            }
        }
    }

    let row_maps: Vec<Vec<Vec<f64>>> = (0..rows)
        .into_par_iter()
        .map(|i| {
            let mut out = vec![vec![0.0; cols]; n_ori];
            let mut hist_left = vec![0.0; num_bins];
            let mut hist_right = vec![0.0; num_bins];

            for j in 0..cols {
                for (idx, &ori) in oris.iter().enumerate() {
                    hist_left.fill(0.0);
                    hist_right.fill(0.0);

                    for &(u, v, angle) in &disc {
                        let bin = unsafe { padded.get_unchecked(i + u, j + v) } as usize;
                        if angle > ori - 180.0 && angle <= ori {
                            hist_right[bin] += 1.0;
                        } else {
                            hist_left[bin] += 1.0;
                        }
                    }

                    out[idx][j] = reduce_hist_pair(
                        &hist_left,
                        &hist_right,
                        params.smoothing_kernel.as_ref(),
                    );
                }
            }
            out
        })
        .collect();

    let mut gradients: Vec<Grid<f64>> = (0..n_ori).map(|_| Grid::new(rows, cols)).collect();
    for (i, row_map) in row_maps.into_iter().enumerate() {
        for (idx, row_vals) in row_map.into_iter().enumerate() {
            for (j, v) in row_vals.into_iter().enumerate() {
                gradients[idx].data_mut()[(i, j)] = v;
            }
        }
    }

    Ok(gradients)
}

/// Smooth, normalize and reduce one histogram pair to its gradient value
fn reduce_hist_pair(left: &[f64], right: &[f64], smoothing: Option<&Array1<f64>>) -> f64 {
    let (mut left, mut right) = match smoothing {
        Some(kernel) => (
            convolve_fft(ArrayView1::from(left), kernel.view(), ConvMode::Same),
            convolve_fft(ArrayView1::from(right), kernel.view(), ConvMode::Same),
        ),
        None => (
            Array1::from_iter(left.iter().copied()),
            Array1::from_iter(right.iter().copied()),
        ),
    };

    // Normalize each side by its own total; an empty side stays raw
    let sum_l = left.sum();
    if sum_l != 0.0 {
        left.mapv_inplace(|v| v / sum_l);
    }
    let sum_r = right.sum();
    if sum_r != 0.0 {
        right.mapv_inplace(|v| v / sum_r);
    }

    chi_squared_distance(left.view(), right.view())
}
