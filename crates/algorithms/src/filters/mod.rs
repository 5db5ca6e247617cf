//! Gaussian-derivative filter synthesis
//!
//! - **gaussian**: 1D/2D multi-order Gaussian kernels, quadrature pairs,
//!   center-surround filters, support sizing and orientation spacing
//! - **rotate**: kernel rotation with center crop
//! - **bank**: oriented filter sets and the texton filter bank

mod bank;
mod gaussian;
mod rotate;

pub use bank::{
    even_filter_set, odd_filter_set, oriented_filter_set, texton_filter_bank, Kernel,
};
pub use gaussian::{
    center_surround_filter, gaussian_filter_1d, gaussian_filter_1d_auto, gaussian_filter_2d,
    gaussian_filter_2d_auto, normalize_distribution, standard_orientations, support_rotated,
    AngleUnit, Axis, Normalization,
};
pub use rotate::rotate_2d_crop;
