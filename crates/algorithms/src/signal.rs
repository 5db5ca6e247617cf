//! 1D signal primitives: FFT linear convolution and the Hilbert transform
//!
//! The convolution here is the workhorse shared by filter synthesis
//! (quadrature pairs) and the gradient engine (histogram smoothing).

use ndarray::{Array1, ArrayView1};

use mpb_core::{Error, Result};

/// How much of the linear convolution to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvMode {
    /// A slice of length `a.len()` centered on the full result
    Same,
    /// The entire `a.len() + b.len() - 1` result
    Full,
}

/// A complex number for FFT computation
#[derive(Debug, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

/// Next power of 2 >= n
fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// In-place Cooley-Tukey radix-2 FFT.
/// `inverse` = true for inverse FFT (divides by n).
fn fft_1d(data: &mut [Complex], inverse: bool) {
    let n = data.len();
    assert!(n.is_power_of_two(), "FFT length must be power of 2");

    // Bit reversal
    let mut j = 0_usize;
    for i in 0..n {
        if i < j {
            data.swap(i, j);
        }
        let mut m = n >> 1;
        while m > 0 && j & m != 0 {
            j ^= m;
            m >>= 1;
        }
        j |= m;
    }

    // Butterfly stages
    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = sign * 2.0 * std::f64::consts::PI / len as f64;
        let wn = Complex::new(angle.cos(), angle.sin());

        let mut k = 0;
        while k < n {
            let mut w = Complex::new(1.0, 0.0);
            for m in 0..half {
                let u = data[k + m];
                let t = w.mul(data[k + m + half]);
                data[k + m] = u.add(t);
                data[k + m + half] = u.sub(t);
                w = w.mul(wn);
            }
            k += len;
        }
        len <<= 1;
    }

    if inverse {
        let inv_n = 1.0 / n as f64;
        for c in data.iter_mut() {
            c.re *= inv_n;
            c.im *= inv_n;
        }
    }
}

/// Linear convolution of two 1D signals via the frequency domain.
///
/// Both signals are zero-padded to a power-of-2 length >= `a+b-1`,
/// transformed, multiplied pointwise and transformed back.
///
/// [`ConvMode::Full`] returns all `a+b-1` samples; [`ConvMode::Same`]
/// returns the length-`a` slice centered on the full result (so for an
/// odd-length `b`, sample `i` aligns with input sample `i`).
///
/// Either input being empty yields an empty output.
pub fn convolve_fft(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, mode: ConvMode) -> Array1<f64> {
    if a.is_empty() || b.is_empty() {
        return Array1::zeros(0);
    }

    let full_len = a.len() + b.len() - 1;
    let size = next_pow2(full_len);

    let mut fa = vec![Complex::zero(); size];
    for (c, &v) in fa.iter_mut().zip(a.iter()) {
        *c = Complex::new(v, 0.0);
    }
    let mut fb = vec![Complex::zero(); size];
    for (c, &v) in fb.iter_mut().zip(b.iter()) {
        *c = Complex::new(v, 0.0);
    }

    fft_1d(&mut fa, false);
    fft_1d(&mut fb, false);
    for (ca, cb) in fa.iter_mut().zip(fb.iter()) {
        *ca = ca.mul(*cb);
    }
    fft_1d(&mut fa, true);

    match mode {
        ConvMode::Full => Array1::from_iter(fa[..full_len].iter().map(|c| c.re)),
        ConvMode::Same => {
            let offset = (b.len() - 1) / 2;
            Array1::from_iter(fa[offset..offset + a.len()].iter().map(|c| c.re))
        }
    }
}

/// Discrete Hilbert transform of an odd-length 1D signal.
///
/// The kernel entry at offset m from the center is 0 for even m and
/// 1/(pi*m) otherwise; the signal is convolved with it at the input length.
/// Turns an even (symmetric) filter into its odd quadrature companion.
pub fn hilbert_1d(signal: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    let len = signal.len();
    if len == 0 || len % 2 == 0 {
        return Err(Error::invalid_parameter(
            "signal length",
            len,
            "Hilbert transform requires an odd-length signal",
        ));
    }

    let half_len = (len - 1) as isize / 2;
    let kernel = Array1::from_shape_fn(len, |i| {
        let m = i as isize - half_len;
        if m % 2 == 0 {
            0.0
        } else {
            1.0 / (std::f64::consts::PI * m as f64)
        }
    });

    Ok(convolve_fft(signal, kernel.view(), ConvMode::Same))
}
