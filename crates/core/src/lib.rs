//! # mpb Core
//!
//! Core types for the mpb oriented local-contrast library.
//!
//! This crate provides:
//! - [`Grid<T>`]: a dense 2D plane of cell values backed by `ndarray`
//! - [`GridElement`]: the trait bounding usable cell types
//! - [`Error`]/[`Result`]: the shared error type for all mpb crates

pub mod error;
pub mod grid;

pub use error::{Error, Result};
pub use grid::{Grid, GridElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::grid::{Grid, GridElement};
}
