//! Oriented filter sets and the texton filter bank

use ndarray::Array2;
use tracing::debug;

use mpb_core::Result;

use crate::filters::gaussian::{
    center_surround_filter, gaussian_filter_2d_auto, standard_orientations, AngleUnit,
};

/// Elongation ratio of the even/odd oriented sets
const OE_ELONGATION: f64 = 3.0;

/// A synthesized 2D kernel together with its semantic tags.
///
/// The tags identify the kernel's role inside a bank: derivative order,
/// orientation (radians), scale and whether it is the quadrature (odd)
/// companion. A center-surround kernel carries order 0 and orientation 0.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Kernel weights, odd square extent
    pub data: Array2<f64>,
    /// Derivative order along the oriented axis (0, 1 or 2)
    pub deriv: u8,
    /// Orientation in radians, in [0, pi)
    pub orientation: f64,
    /// Gaussian scale along the oriented axis
    pub sigma: f64,
    /// Whether the kernel is Hilbert-transformed (odd phase)
    pub hilbert: bool,
}

/// One anisotropic Gaussian-derivative kernel per standard orientation.
///
/// Each kernel uses sigma_x = sigma along the orientation and
/// sigma_y = sigma / elongation across it. `n_ori == 0` yields an empty set.
pub fn oriented_filter_set(
    n_ori: usize,
    sigma: f64,
    deriv: u8,
    hilbert: bool,
    elongation: f64,
) -> Result<Vec<Kernel>> {
    if elongation <= 0.0 || !elongation.is_finite() {
        return Err(mpb_core::Error::invalid_parameter(
            "elongation",
            elongation,
            "anisotropy ratio must be positive",
        ));
    }

    let sigma_x = sigma;
    let sigma_y = sigma / elongation;

    standard_orientations(n_ori, AngleUnit::Radians)
        .into_iter()
        .map(|ori| {
            let data = gaussian_filter_2d_auto(ori, sigma_x, sigma_y, deriv, hilbert)?;
            Ok(Kernel {
                data,
                deriv,
                orientation: ori,
                sigma,
                hilbert,
            })
        })
        .collect()
}

/// Even-phase oriented set: second derivative, no quadrature
pub fn even_filter_set(n_ori: usize, sigma: f64) -> Result<Vec<Kernel>> {
    oriented_filter_set(n_ori, sigma, 2, false, OE_ELONGATION)
}

/// Odd-phase oriented set: second derivative, Hilbert-transformed
pub fn odd_filter_set(n_ori: usize, sigma: f64) -> Result<Vec<Kernel>> {
    oriented_filter_set(n_ori, sigma, 2, true, OE_ELONGATION)
}

/// The texton filter bank at a single scale: the even set, the odd set, and
/// one isotropic center-surround kernel (scale ratio sqrt(2)), in that
/// index order — `2 * n_ori + 1` kernels.
pub fn texton_filter_bank(n_ori: usize, sigma: f64) -> Result<Vec<Kernel>> {
    debug!(n_ori, sigma, "synthesizing texton filter bank");

    let mut bank = even_filter_set(n_ori, sigma)?;
    bank.extend(odd_filter_set(n_ori, sigma)?);

    let cs = center_surround_filter(sigma, sigma, std::f64::consts::SQRT_2)?;
    bank.push(Kernel {
        data: cs,
        deriv: 0,
        orientation: 0.0,
        sigma,
        hilbert: false,
    });

    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_structure() {
        for n_ori in [1, 4, 8] {
            let bank = texton_filter_bank(n_ori, 2.0).unwrap();
            assert_eq!(bank.len(), 2 * n_ori + 1);

            for (i, kernel) in bank.iter().enumerate() {
                if i < n_ori {
                    assert_eq!(kernel.deriv, 2, "entry {} should be even", i);
                    assert!(!kernel.hilbert);
                } else if i < 2 * n_ori {
                    assert_eq!(kernel.deriv, 2, "entry {} should be odd", i);
                    assert!(kernel.hilbert);
                } else {
                    assert_eq!(kernel.deriv, 0, "last entry is center-surround");
                    assert!(!kernel.hilbert);
                }
            }
        }
    }

    #[test]
    fn test_bank_orientations_increase() {
        let bank = texton_filter_bank(8, 2.0).unwrap();
        for i in 1..8 {
            assert!(bank[i].orientation > bank[i - 1].orientation);
            assert!((bank[i].orientation - bank[i + 8].orientation).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bank_kernels_zero_mean() {
        let bank = texton_filter_bank(4, 2.0).unwrap();
        for kernel in &bank {
            // every bank member is zero-mean (derivative or center-surround)
            assert!(
                kernel.data.sum().abs() < 1e-9,
                "bank kernel should be zero-mean, got {}",
                kernel.data.sum()
            );
        }
    }

    #[test]
    fn test_empty_oriented_set() {
        let set = oriented_filter_set(0, 2.0, 2, false, 3.0).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_oriented_set_rejects_elongation() {
        assert!(oriented_filter_set(4, 2.0, 2, false, 0.0).is_err());
    }
}
