//! # mpb Algorithms
//!
//! Oriented local-contrast cues for boundary detection and segmentation.
//!
//! ## Components
//!
//! - **signal**: FFT linear convolution and the discrete Hilbert transform
//! - **filters**: multi-order Gaussian kernels, quadrature pairs,
//!   center-surround filters and oriented filter banks
//! - **texton**: per-pixel texture labels from clustered filter responses
//! - **gradient**: half-disc label histograms reduced to one oriented
//!   gradient map per orientation

pub mod filters;
pub mod gradient;
mod maybe_rayon;
pub mod signal;
pub mod texton;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::filters::{
        center_surround_filter, even_filter_set, gaussian_filter_1d, gaussian_filter_2d,
        odd_filter_set, oriented_filter_set, standard_orientations, texton_filter_bank,
        AngleUnit, Kernel,
    };
    pub use crate::gradient::{
        chi_squared_distance, histogram_smoothing_kernel, oriented_gradient_hist,
        GradientHistParams,
    };
    pub use crate::signal::{convolve_fft, hilbert_1d, ConvMode};
    pub use crate::texton::{texton_map, TextonParams};
    pub use mpb_core::prelude::*;
}
