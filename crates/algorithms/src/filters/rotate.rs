//! Kernel rotation with center crop

use ndarray::{s, Array2};

use mpb_core::{Error, Result};

/// Rotate a 2D kernel about its center by `angle` (radians, positive =
/// counter-clockwise), then crop symmetrically to `out_rows` x `out_cols`.
///
/// Sampling uses inverse mapping with bilinear interpolation; reads outside
/// the source support contribute 0. At `angle == 0` with the full output
/// extent the input is returned unchanged.
pub fn rotate_2d_crop(
    input: &Array2<f64>,
    angle: f64,
    out_rows: usize,
    out_cols: usize,
) -> Result<Array2<f64>> {
    let (rows, cols) = input.dim();
    if out_rows > rows || out_cols > cols {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: out_rows,
            ac: out_cols,
        });
    }
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }

    let cy = (rows - 1) as f64 / 2.0;
    let cx = (cols - 1) as f64 / 2.0;
    let (sin, cos) = angle.sin_cos();

    let rotated = Array2::from_shape_fn((rows, cols), |(i, j)| {
        // Inverse rotation of the destination coordinate
        let dy = i as f64 - cy;
        let dx = j as f64 - cx;
        let src_x = cos * dx - sin * dy + cx;
        let src_y = sin * dx + cos * dy + cy;

        bilinear(input, src_y, src_x)
    });

    let border_r = (rows - out_rows) / 2;
    let border_c = (cols - out_cols) / 2;
    Ok(rotated
        .slice(s![
            border_r..border_r + out_rows,
            border_c..border_c + out_cols
        ])
        .to_owned())
}

/// Bilinear sample at fractional (row, col); out-of-support reads are 0
fn bilinear(input: &Array2<f64>, y: f64, x: f64) -> f64 {
    let (rows, cols) = input.dim();

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = 0.0;
    for (dy, wy) in [(0.0, 1.0 - fy), (1.0, fy)] {
        for (dx, wx) in [(0.0, 1.0 - fx), (1.0, fx)] {
            let w = wy * wx;
            if w == 0.0 {
                continue;
            }
            let r = y0 + dy;
            let c = x0 + dx;
            if r >= 0.0 && c >= 0.0 && (r as usize) < rows && (c as usize) < cols {
                acc += w * input[(r as usize, c as usize)];
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_grid(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| (i * cols + j) as f64)
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let input = index_grid(7, 7);
        let output = rotate_2d_crop(&input, 0.0, 7, 7).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_zero_rotation_crops_center() {
        let input = index_grid(5, 5);
        let output = rotate_2d_crop(&input, 0.0, 3, 3).unwrap();
        assert_eq!(output, input.slice(s![1..4, 1..4]).to_owned());
    }

    #[test]
    fn test_quarter_turn_moves_corner() {
        let mut input = Array2::zeros((3, 3));
        input[(0, 2)] = 1.0;

        let output = rotate_2d_crop(&input, std::f64::consts::FRAC_PI_2, 3, 3).unwrap();
        // Counter-clockwise: the top-right cell lands top-left
        assert!((output[(0, 0)] - 1.0).abs() < 1e-10);
        assert!(output[(0, 2)].abs() < 1e-10);
    }

    #[test]
    fn test_crop_larger_than_input_rejected() {
        let input = index_grid(3, 3);
        assert!(rotate_2d_crop(&input, 0.0, 5, 3).is_err());
    }
}
