//! Texton labeling: filter-bank responses clustered into discrete labels
//!
//! Convolves an image with the texton filter bank at two scales, stacks the
//! per-pixel responses into feature vectors and quantizes them with k-means.

use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use mpb_core::{Error, Grid, Result};

use crate::filters::texton_filter_bank;
use crate::maybe_rayon::*;

/// Parameters for texton labeling
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextonParams {
    /// Number of filter orientations per scale
    pub n_ori: usize,
    /// Gaussian scale of the small filter bank
    pub sigma_small: f64,
    /// Gaussian scale of the large filter bank
    pub sigma_large: f64,
    /// Number of texton clusters (labels lie in [0, k))
    pub k: usize,
    /// Maximum k-means iterations per attempt (default: 10)
    pub max_iterations: usize,
    /// Convergence threshold — stop when centroids move less than this (default: 1e-4)
    pub convergence: f64,
    /// Number of restarts; the attempt with the lowest within-cluster
    /// sum of squares wins (default: 3)
    pub attempts: usize,
    /// Seed for centroid initialization
    pub seed: u64,
}

impl Default for TextonParams {
    fn default() -> Self {
        Self {
            n_ori: 8,
            sigma_small: 2.0,
            sigma_large: 2.0 * std::f64::consts::SQRT_2,
            k: 32,
            max_iterations: 10,
            convergence: 1e-4,
            attempts: 3,
            seed: 42,
        }
    }
}

/// Apply a 2D kernel to an image with reflected borders.
///
/// The kernel is anchored at its center and applied as a sliding dot
/// product; reads past the image edge are mirrored (edge sample repeated).
/// Kernel extents must be odd.
pub fn convolve_reflect(image: &Grid<f64>, kernel: &Array2<f64>) -> Result<Grid<f64>> {
    let (rows, cols) = image.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    let (krows, kcols) = kernel.dim();
    if krows % 2 == 0 || kcols % 2 == 0 || krows == 0 || kcols == 0 {
        return Err(Error::invalid_parameter(
            "kernel",
            format!("{}x{}", krows, kcols),
            "kernel extents must be odd",
        ));
    }

    let kr = (krows / 2) as isize;
    let kc = (kcols / 2) as isize;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row_data = vec![0.0; cols];
            for (j, out) in row_data.iter_mut().enumerate() {
                let mut acc = 0.0;
                for u in 0..krows {
                    let r = reflect_index(i as isize + u as isize - kr, rows);
                    for v in 0..kcols {
                        let c = reflect_index(j as isize + v as isize - kc, cols);
                        acc += kernel[(u, v)] * unsafe { image.get_unchecked(r, c) };
                    }
                }
                *out = acc;
            }
            row_data
        })
        .collect();

    Grid::from_vec(data, rows, cols)
}

/// Mirror an index into [0, n), repeating the edge sample, for any overhang
fn reflect_index(idx: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let folded = idx.rem_euclid(period);
    if folded >= n as isize {
        (period - 1 - folded) as usize
    } else {
        folded as usize
    }
}

/// Compute the per-pixel texton label map of an image.
///
/// Builds texton filter banks at `sigma_small` and `sigma_large`
/// (2 * (2 * n_ori + 1) kernels total), convolves the image with every
/// kernel, and clusters the stacked response vectors into `k` labels.
///
/// Identical inputs with an identical seed reproduce identical labels.
pub fn texton_map(image: &Grid<f64>, params: &TextonParams) -> Result<Grid<u32>> {
    let (rows, cols) = image.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    if params.n_ori == 0 {
        return Err(Error::invalid_parameter(
            "n_ori",
            params.n_ori,
            "at least one orientation required",
        ));
    }
    if params.k == 0 {
        return Err(Error::invalid_parameter("k", params.k, "at least one cluster required"));
    }
    if params.attempts == 0 || params.max_iterations == 0 {
        return Err(Error::invalid_parameter(
            "attempts/max_iterations",
            format!("{}/{}", params.attempts, params.max_iterations),
            "at least one attempt and one iteration required",
        ));
    }
    let n = rows * cols;
    if n < params.k {
        return Err(Error::Algorithm(format!(
            "not enough pixels ({}) for {} clusters",
            n, params.k
        )));
    }

    debug!(
        rows,
        cols,
        n_ori = params.n_ori,
        k = params.k,
        "computing texton map"
    );

    let mut bank = texton_filter_bank(params.n_ori, params.sigma_small)?;
    bank.extend(texton_filter_bank(params.n_ori, params.sigma_large)?);

    // Feature vector field: one row per pixel, one column per bank entry
    let mut samples = Array2::<f64>::zeros((n, bank.len()));
    for (f, kernel) in bank.iter().enumerate() {
        let response = convolve_reflect(image, &kernel.data)?;
        for ((i, j), &v) in response.data().indexed_iter() {
            samples[(i * cols + j, f)] = v;
        }
    }

    let labels = cluster_features(samples.view(), params);
    Grid::from_vec(labels, rows, cols)
}

/// Multi-restart k-means over row-vector samples; returns the assignment of
/// the attempt with the lowest within-cluster sum of squares.
fn cluster_features(samples: ArrayView2<'_, f64>, params: &TextonParams) -> Vec<u32> {
    let run = |attempt: usize| {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(attempt as u64));
        kmeans_once(
            samples,
            params.k,
            params.max_iterations,
            params.convergence,
            &mut rng,
        )
    };

    let (mut best_labels, mut best_score) = run(0);
    for attempt in 1..params.attempts {
        let (labels, compactness) = run(attempt);
        if compactness < best_score {
            best_labels = labels;
            best_score = compactness;
        }
    }
    best_labels
}

/// One k-means run: k-means++ seeding, Lloyd iterations bounded by
/// `max_iter` and `eps`, returning (labels, compactness).
fn kmeans_once(
    samples: ArrayView2<'_, f64>,
    k: usize,
    max_iter: usize,
    eps: f64,
    rng: &mut ChaCha8Rng,
) -> (Vec<u32>, f64) {
    let (n, dim) = samples.dim();

    // k-means++ seeding: each next centroid drawn with probability
    // proportional to the squared distance from the chosen ones
    let mut centroids = Array2::<f64>::zeros((k, dim));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&samples.row(first));

    let mut nearest_sq = vec![f64::INFINITY; n];
    for c in 1..k {
        let prev = centroids.row(c - 1);
        for (i, d) in nearest_sq.iter_mut().enumerate() {
            let dist = squared_distance(samples.row(i), prev);
            if dist < *d {
                *d = dist;
            }
        }

        let total: f64 = nearest_sq.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in nearest_sq.iter().enumerate() {
                target -= d;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&samples.row(pick));
    }

    for _ in 0..max_iter {
        // Assignment step
        let labels: Vec<u32> = (0..n)
            .into_par_iter()
            .map(|i| nearest_centroid(samples.row(i), &centroids).0 as u32)
            .collect();

        // Update step
        let mut sums = Array2::<f64>::zeros((k, dim));
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            let mut row = sums.row_mut(label as usize);
            row += &samples.row(i);
            counts[label as usize] += 1;
        }

        let mut max_shift = 0.0_f64;
        for c in 0..k {
            if counts[c] == 0 {
                continue; // keep empty cluster centroid
            }
            let inv = 1.0 / counts[c] as f64;
            let mut shift_sq = 0.0;
            for d in 0..dim {
                let updated = sums[(c, d)] * inv;
                let delta = updated - centroids[(c, d)];
                shift_sq += delta * delta;
                centroids[(c, d)] = updated;
            }
            max_shift = max_shift.max(shift_sq.sqrt());
        }

        if max_shift < eps {
            break;
        }
    }

    // Final assignment and compactness against the settled centroids
    let assigned: Vec<(u32, f64)> = (0..n)
        .into_par_iter()
        .map(|i| {
            let (label, dist) = nearest_centroid(samples.row(i), &centroids);
            (label as u32, dist)
        })
        .collect();

    let compactness = assigned.iter().map(|&(_, d)| d).sum();
    (assigned.into_iter().map(|(l, _)| l).collect(), compactness)
}

fn nearest_centroid(
    sample: ndarray::ArrayView1<'_, f64>,
    centroids: &Array2<f64>,
) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(sample, centroid);
        if dist < best.1 {
            best = (c, dist);
        }
    }
    best
}

fn squared_distance(a: ndarray::ArrayView1<'_, f64>, b: ndarray::ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_params(k: usize) -> TextonParams {
        TextonParams {
            n_ori: 2,
            sigma_small: 1.0,
            sigma_large: std::f64::consts::SQRT_2,
            k,
            ..Default::default()
        }
    }

    #[test]
    fn test_convolve_reflect_impulse_identity() {
        let image = Grid::from_vec((0..16).map(|v| v as f64).collect(), 4, 4).unwrap();
        let kernel = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = convolve_reflect(&image, &kernel).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_convolve_reflect_box_on_constant() {
        let image = Grid::filled(6, 6, 3.0);
        let kernel = Array2::from_elem((3, 3), 1.0 / 9.0);
        let out = convolve_reflect(&image, &kernel).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                assert!((out.get(i, j).unwrap() - 3.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_convolve_reflect_rejects_even_kernel() {
        let image = Grid::filled(4, 4, 1.0);
        let kernel = Array2::from_elem((2, 3), 1.0);
        assert!(convolve_reflect(&image, &kernel).is_err());
    }

    #[test]
    fn test_reflect_index_folding() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-2, 5), 1);
        assert_eq!(reflect_index(0, 5), 0);
        assert_eq!(reflect_index(4, 5), 4);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
    }

    #[test]
    fn test_labels_within_range() {
        let image = Grid::from_vec(
            (0..144).map(|v| ((v * 7) % 13) as f64).collect(),
            12,
            12,
        )
        .unwrap();
        let params = small_params(4);
        let labels = texton_map(&image, &params).unwrap();
        assert_eq!(labels.shape(), (12, 12));
        for &label in labels.data().iter() {
            assert!(label < 4, "label {} out of range", label);
        }
    }

    #[test]
    fn test_uniform_image_single_label() {
        let image = Grid::filled(10, 10, 5.0);
        let params = small_params(3);
        let labels = texton_map(&image, &params).unwrap();

        let first = labels.get(0, 0).unwrap();
        for &label in labels.data().iter() {
            assert_eq!(label, first, "uniform image should map to one texton");
        }
    }

    #[test]
    fn test_seeded_determinism() {
        let image = Grid::from_vec(
            (0..100).map(|v| ((v * 31) % 17) as f64).collect(),
            10,
            10,
        )
        .unwrap();
        let params = small_params(5);
        let a = texton_map(&image, &params).unwrap();
        let b = texton_map(&image, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_clusters_rejected() {
        let image = Grid::filled(3, 3, 1.0);
        let params = small_params(10);
        assert!(texton_map(&image, &params).is_err());
    }

    #[test]
    fn test_zero_orientations_rejected() {
        let image = Grid::filled(8, 8, 1.0);
        let params = TextonParams {
            n_ori: 0,
            ..small_params(2)
        };
        assert!(texton_map(&image, &params).is_err());
    }
}
