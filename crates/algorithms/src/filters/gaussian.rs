//! Multi-order Gaussian kernels and their building blocks

use ndarray::{Array, Array1, Array2, Dimension};

use mpb_core::{Error, Result};

use crate::filters::rotate::rotate_2d_crop;
use crate::signal::hilbert_1d;

/// Unit of an angle argument or result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Degrees,
    Radians,
}

/// Which half-extent [`support_rotated`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Kernel normalization policy.
///
/// Derivative kernels (order >= 1) are zero-mean so a constant input yields
/// zero response; the plain smoothing kernel keeps its mean so a constant
/// input passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Subtract the mean, then scale so the absolute values sum to 1
    ZeroMean,
    /// Scale so the absolute values sum to 1
    NonZeroMean,
}

/// Scale a kernel into a unit-L1 distribution per the given policy.
///
/// A degenerate kernel whose absolute sum is below 1e-12 is left unscaled.
pub fn normalize_distribution<D: Dimension>(data: &mut Array<f64, D>, policy: Normalization) {
    if data.is_empty() {
        return;
    }

    if policy == Normalization::ZeroMean {
        let mean = data.sum() / data.len() as f64;
        data.mapv_inplace(|v| v - mean);
    }

    let sum_abs: f64 = data.iter().map(|v| v.abs()).sum();
    if sum_abs > 1e-12 {
        data.mapv_inplace(|v| v / sum_abs);
    }
}

/// `n_ori` filter orientations evenly spaced over the half-circle [0, 180).
///
/// Returns an empty list for `n_ori == 0`.
pub fn standard_orientations(n_ori: usize, unit: AngleUnit) -> Vec<f64> {
    let span = match unit {
        AngleUnit::Degrees => 180.0,
        AngleUnit::Radians => std::f64::consts::PI,
    };
    (0..n_ori)
        .map(|i| i as f64 * span / n_ori as f64)
        .collect()
}

/// Half-extent along one axis needed so a square of half-length `x` x `y`,
/// rotated by `ori` (radians), still covers the original support.
pub fn support_rotated(x: usize, y: usize, ori: f64, axis: Axis) -> usize {
    let (p, q) = match axis {
        Axis::X => (x as f64 * ori.cos(), y as f64 * ori.sin()),
        Axis::Y => (y as f64 * ori.cos(), x as f64 * ori.sin()),
    };
    let mag = (p - q).abs().max((p + q).abs());
    mag as usize + 1
}

fn check_sigma(sigma: f64) -> Result<()> {
    if sigma <= 0.0 || !sigma.is_finite() {
        return Err(Error::invalid_parameter(
            "sigma",
            sigma,
            "Gaussian scale must be positive",
        ));
    }
    Ok(())
}

fn check_deriv(deriv: u8) -> Result<()> {
    if deriv > 2 {
        return Err(Error::invalid_parameter(
            "deriv",
            deriv,
            "derivative order must be 0, 1 or 2",
        ));
    }
    Ok(())
}

/// 1D Gaussian filter of derivative order 0, 1 or 2, length `2*half_len + 1`.
///
/// Order 1 multiplies entry i by (half_len - i), order 2 by
/// ((i - half_len)^2 / sigma - 1). With `hilbert` the kernel is replaced by
/// its quadrature companion before normalization. Derivative kernels are
/// normalized zero-mean, the order-0 kernel keeps its mean.
pub fn gaussian_filter_1d(
    half_len: usize,
    sigma: f64,
    deriv: u8,
    hilbert: bool,
) -> Result<Array1<f64>> {
    check_sigma(sigma)?;
    check_deriv(deriv)?;

    let len = 2 * half_len + 1;
    let h = half_len as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel = Array1::from_shape_fn(len, |i| {
        let x = i as f64 - h;
        (-x * x / two_sigma_sq).exp()
    });
    let sum = kernel.sum();
    kernel.mapv_inplace(|v| v / sum);

    match deriv {
        1 => {
            for (i, v) in kernel.iter_mut().enumerate() {
                *v *= h - i as f64;
            }
        }
        2 => {
            for (i, v) in kernel.iter_mut().enumerate() {
                let x = i as f64 - h;
                *v *= x * x / sigma - 1.0;
            }
        }
        _ => {}
    }

    if hilbert {
        kernel = hilbert_1d(kernel.view())?;
    }

    let policy = if deriv > 0 {
        Normalization::ZeroMean
    } else {
        Normalization::NonZeroMean
    };
    normalize_distribution(&mut kernel, policy);

    Ok(kernel)
}

/// [`gaussian_filter_1d`] with the half-length derived as floor(3 * sigma)
pub fn gaussian_filter_1d_auto(sigma: f64, deriv: u8, hilbert: bool) -> Result<Array1<f64>> {
    check_sigma(sigma)?;
    gaussian_filter_1d((sigma * 3.0) as usize, sigma, deriv, hilbert)
}

/// 2D anisotropic Gaussian-derivative filter.
///
/// An order-0 filter along x (sigma_x) and an order-`deriv` filter along y
/// (sigma_y, optionally Hilbert-transformed) are synthesized on a support
/// large enough to survive rotation, combined as an outer product, rotated
/// by `ori` (radians) and cropped back to `2*half_len + 1` square.
pub fn gaussian_filter_2d(
    half_len: usize,
    ori: f64,
    sigma_x: f64,
    sigma_y: f64,
    deriv: u8,
    hilbert: bool,
) -> Result<Array2<f64>> {
    check_sigma(sigma_x)?;
    check_sigma(sigma_y)?;
    check_deriv(deriv)?;

    let len = 2 * half_len + 1;
    let half_rot_x = support_rotated(half_len, half_len, ori, Axis::X);
    let half_rot_y = support_rotated(half_len, half_len, ori, Axis::Y);
    let half_rot = half_rot_x.max(half_rot_y);

    let fx = gaussian_filter_1d(half_rot, sigma_x, 0, false)?;
    let fy = gaussian_filter_1d(half_rot, sigma_y, deriv, hilbert)?;

    let rot_len = 2 * half_rot + 1;
    let outer = Array2::from_shape_fn((rot_len, rot_len), |(i, j)| fx[i] * fy[j]);

    let mut kernel = rotate_2d_crop(&outer, ori, len, len)?;

    let policy = if deriv > 0 {
        Normalization::ZeroMean
    } else {
        Normalization::NonZeroMean
    };
    normalize_distribution(&mut kernel, policy);

    Ok(kernel)
}

/// [`gaussian_filter_2d`] with the half-length derived as
/// max(floor(3 * sigma_x), floor(3 * sigma_y))
pub fn gaussian_filter_2d_auto(
    ori: f64,
    sigma_x: f64,
    sigma_y: f64,
    deriv: u8,
    hilbert: bool,
) -> Result<Array2<f64>> {
    check_sigma(sigma_x)?;
    check_sigma(sigma_y)?;
    let half_len = ((sigma_x * 3.0) as usize).max((sigma_y * 3.0) as usize);
    gaussian_filter_2d(half_len, ori, sigma_x, sigma_y, deriv, hilbert)
}

/// Center-surround (difference of Gaussians) filter.
///
/// The surround is an order-0 filter at (sigma_x, sigma_y); the center is the
/// same filter with both scales divided by `scale_factor`. Their difference
/// is normalized zero-mean so it responds to local contrast blobs only.
pub fn center_surround_filter(
    sigma_x: f64,
    sigma_y: f64,
    scale_factor: f64,
) -> Result<Array2<f64>> {
    check_sigma(sigma_x)?;
    check_sigma(sigma_y)?;
    if scale_factor <= 1.0 || !scale_factor.is_finite() {
        return Err(Error::invalid_parameter(
            "scale_factor",
            scale_factor,
            "center/surround ratio must exceed 1",
        ));
    }

    let half_len = ((sigma_x * 3.0) as usize).max((sigma_y * 3.0) as usize);
    let center = gaussian_filter_2d(
        half_len,
        0.0,
        sigma_x / scale_factor,
        sigma_y / scale_factor,
        0,
        false,
    )?;
    let surround = gaussian_filter_2d(half_len, 0.0, sigma_x, sigma_y, 0, false)?;

    let mut kernel = surround - center;
    normalize_distribution(&mut kernel, Normalization::ZeroMean);

    Ok(kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_orientations_degrees() {
        let oris = standard_orientations(4, AngleUnit::Degrees);
        assert_eq!(oris, vec![0.0, 45.0, 90.0, 135.0]);
    }

    #[test]
    fn test_standard_orientations_radians() {
        let oris = standard_orientations(2, AngleUnit::Radians);
        assert_eq!(oris.len(), 2);
        assert!((oris[1] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_standard_orientations_empty() {
        assert!(standard_orientations(0, AngleUnit::Degrees).is_empty());
    }

    #[test]
    fn test_gaussian_1d_order0_sums_to_one() {
        for half_len in [3, 6, 12] {
            let k = gaussian_filter_1d(half_len, 2.0, 0, false).unwrap();
            assert_eq!(k.len(), 2 * half_len + 1);
            assert!(
                (k.sum() - 1.0).abs() < 1e-10,
                "order-0 kernel should sum to 1, got {}",
                k.sum()
            );
        }
    }

    #[test]
    fn test_gaussian_1d_derivatives_sum_to_zero() {
        for deriv in [1, 2] {
            let k = gaussian_filter_1d(6, 2.0, deriv, false).unwrap();
            assert!(
                k.sum().abs() < 1e-10,
                "order-{} kernel should sum to 0, got {}",
                deriv,
                k.sum()
            );
        }
    }

    #[test]
    fn test_gaussian_1d_symmetry() {
        let k1 = gaussian_filter_1d(6, 2.0, 1, false).unwrap();
        let k2 = gaussian_filter_1d(6, 2.0, 2, false).unwrap();
        let len = k1.len();
        for i in 0..len {
            // first derivative is odd, second is even
            assert!((k1[i] + k1[len - 1 - i]).abs() < 1e-10);
            assert!((k2[i] - k2[len - 1 - i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_gaussian_1d_auto_half_len() {
        let k = gaussian_filter_1d_auto(2.0, 0, false).unwrap();
        assert_eq!(k.len(), 13); // floor(3 * 2.0) = 6 -> 2*6+1
    }

    #[test]
    fn test_gaussian_1d_rejects_bad_params() {
        assert!(gaussian_filter_1d(6, 0.0, 0, false).is_err());
        assert!(gaussian_filter_1d(6, -1.0, 0, false).is_err());
        assert!(gaussian_filter_1d(6, 1.0, 3, false).is_err());
    }

    #[test]
    fn test_normalize_degenerate_is_noop() {
        let mut zeros = Array1::<f64>::zeros(5);
        normalize_distribution(&mut zeros, Normalization::NonZeroMean);
        assert!(zeros.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_support_rotated_axis_aligned() {
        // At 0 the x-extent is untouched; at 90 degrees the axes swap
        assert_eq!(support_rotated(5, 3, 0.0, Axis::X), 6);
        assert_eq!(support_rotated(5, 3, 0.0, Axis::Y), 4);
        let quarter = std::f64::consts::FRAC_PI_2;
        assert_eq!(support_rotated(5, 3, quarter, Axis::X), 4);
        assert_eq!(support_rotated(5, 3, quarter, Axis::Y), 6);
    }

    #[test]
    fn test_support_rotated_covers_diagonal() {
        let quarter = std::f64::consts::FRAC_PI_4;
        let h = support_rotated(5, 5, quarter, Axis::X);
        // A 45-degree rotation needs sqrt(2) * 5 plus margin
        assert!(h >= 8, "diagonal support too small: {}", h);
    }

    #[test]
    fn test_gaussian_2d_order0_sums_to_one() {
        let k = gaussian_filter_2d_auto(0.0, 2.0, 1.0, 0, false).unwrap();
        assert_eq!(k.dim(), (13, 13));
        assert!((k.sum() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_gaussian_2d_deriv_sums_to_zero() {
        let oris = standard_orientations(4, AngleUnit::Radians);
        for &ori in &oris {
            let k = gaussian_filter_2d_auto(ori, 2.0, 2.0 / 3.0, 2, false).unwrap();
            assert!(
                k.sum().abs() < 1e-10,
                "derivative kernel at {} should be zero-mean",
                ori
            );
        }
    }

    #[test]
    fn test_center_surround_zero_mean() {
        let k = center_surround_filter(2.0, 2.0, std::f64::consts::SQRT_2).unwrap();
        assert_eq!(k.dim(), (13, 13));
        assert!(k.sum().abs() < 1e-10);
        // Surround minus center: negative in the middle, positive ring around
        assert!(k[(6, 6)] < 0.0);
    }

    #[test]
    fn test_center_surround_rejects_factor() {
        assert!(center_surround_filter(2.0, 2.0, 1.0).is_err());
        assert!(center_surround_filter(2.0, 2.0, 0.5).is_err());
    }
}
