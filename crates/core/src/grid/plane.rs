//! Main Grid type

use crate::error::{Error, Result};
use crate::grid::GridElement;
use ndarray::Array2;

/// A dense 2D grid of cell values.
///
/// `Grid<T>` stores values of type `T` in row-major order. It is the common
/// container for images, filter-response planes, label maps and gradient maps.
///
/// # Type Parameters
///
/// - `T`: The cell value type, must implement [`GridElement`]
///
/// # Example
///
/// ```
/// use mpb_core::Grid;
///
/// let mut grid: Grid<f64> = Grid::new(100, 100);
/// grid.set(10, 20, 42.0).unwrap();
/// assert_eq!(grid.get(10, 20).unwrap(), 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: GridElement> {
    /// Cell data stored in row-major order (row, col)
    data: Array2<T>,
}

impl<T: GridElement> Grid<T> {
    /// Create a new grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// Create a new grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
        }
    }

    /// Create a grid from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions { rows, cols });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self { data: array })
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self { data }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Border handling

    /// Expand the grid by `margin` cells on every side, filling the border by
    /// mirror reflection about the grid edge (the edge row/column itself is
    /// repeated: `..cba|abc..|cba..`).
    ///
    /// Requires `margin <= min(rows, cols)` so a single reflection suffices.
    pub fn reflect_pad(&self, margin: usize) -> Result<Grid<T>> {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        if margin > rows || margin > cols {
            return Err(Error::invalid_parameter(
                "margin",
                margin,
                format!("must not exceed grid extent ({rows}, {cols})"),
            ));
        }

        let m = margin as isize;
        let reflect = |idx: isize, n: usize| -> usize {
            if idx < 0 {
                (-idx - 1) as usize
            } else if idx >= n as isize {
                2 * n - 1 - idx as usize
            } else {
                idx as usize
            }
        };

        let padded = Array2::from_shape_fn((rows + 2 * margin, cols + 2 * margin), |(i, j)| {
            let src_r = reflect(i as isize - m, rows);
            let src_c = reflect(j as isize - m, cols);
            unsafe { self.get_unchecked(src_r, src_c) }
        });

        Ok(Grid::from_array(padded))
    }
}
