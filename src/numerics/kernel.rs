//! Convolution kernels and block resampling of images.

use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;

use ndarray::{s, Array2, ArrayView2, Zip};

fn check_odd_square(kernel: &ArrayView2<f64>) -> Result<usize, ConfigurationError> {
    let (ny, nx) = kernel.dim();
    if ny != nx || ny % 2 == 0 {
        return Err(ConfigurationError::Psf(format!(
            "kernel must be square with an odd size, got {ny}x{nx}"
        )));
    }
    Ok(ny)
}

/// Kernel divided by its sum, zero-sum kernels are left untouched
pub fn normalize(mut kernel: Array2<f64>) -> Array2<f64> {
    let total = kernel.sum();
    if total != 0.0 {
        kernel /= total;
    }
    kernel
}

/// Centered `size x size` snapshot of an odd square kernel, zero padded if `size` is larger
pub fn cut_kernel(kernel: ArrayView2<f64>, size: usize) -> Result<Array2<f64>, ConfigurationError> {
    let n = check_odd_square(&kernel)?;
    if size % 2 == 0 {
        return Err(ConfigurationError::Psf(format!("kernel size must be odd, got {size}")));
    }
    let mut out = Array2::zeros((size, size));
    if size <= n {
        let start = (n - size) / 2;
        out.assign(&kernel.slice(s![start..start + size, start..start + size]));
    } else {
        let start = (size - n) / 2;
        out.slice_mut(s![start..start + n, start..start + n]).assign(&kernel);
    }
    Ok(out)
}

/// Block-sum a supersampled kernel down to regular pixels
///
/// The kernel is zero padded symmetrically so that the number of regular pixels is odd and the
/// center stays at the center.
pub fn degrade_kernel(kernel: ArrayView2<f64>, factor: usize) -> Result<Array2<f64>, ConfigurationError> {
    let n = check_odd_square(&kernel)?;
    if factor == 0 {
        return Err(ConfigurationError::Numerics("supersampling factor must be positive".into()));
    }
    if factor == 1 {
        return Ok(kernel.to_owned());
    }
    let mut num_low = n.div_ceil(factor);
    if num_low % 2 == 0 {
        num_low += 1;
    }
    let num_high = num_low * factor;
    let start = (num_high - n) / 2;
    let mut padded = Array2::zeros((num_high, num_high));
    padded.slice_mut(s![start..start + n, start..start + n]).assign(&kernel);
    Ok(Array2::from_shape_fn((num_low, num_low), |(i, j)| {
        padded
            .slice(s![i * factor..(i + 1) * factor, j * factor..(j + 1) * factor])
            .sum()
    }))
}

/// Split a supersampled kernel into a regular-pixel part and a supersampled central part
///
/// The central `size` regular pixels (`size * factor` supersampled ones, made odd) are kept at
/// high resolution; the rest is degraded to regular pixels. Both parts are rescaled so that their
/// total flux is one.
pub fn split_kernel(
    kernel: ArrayView2<f64>,
    size: usize,
    factor: usize,
) -> Result<(Array2<f64>, Array2<f64>), ConfigurationError> {
    let n = check_odd_square(&kernel)?;
    if factor <= 1 {
        return Err(ConfigurationError::Numerics(format!(
            "kernel splitting needs a supersampling factor above one, got {factor}"
        )));
    }
    let mut n_sub = size * factor;
    if n_sub % 2 == 0 {
        n_sub += 1;
    }
    let n_sub = n_sub.min(n);
    let mut high_res = cut_kernel(kernel, n_sub)?;

    let mut hole = kernel.to_owned();
    let start = (n - n_sub) / 2;
    hole.slice_mut(s![start..start + n_sub, start..start + n_sub]).fill(0.0);
    let mut low_res = degrade_kernel(hole.view(), factor)?;

    let flux_high = high_res.sum();
    let flux_low = low_res.sum();
    if flux_low > 0.0 {
        low_res *= (1.0 - flux_high) / flux_low;
    } else {
        high_res = normalize(high_res);
    }
    Ok((low_res, high_res))
}

/// Normalized circular Gaussian kernel truncated at `truncation` standard deviations
///
/// `sigma` is in pixels. The kernel radius follows the usual filter convention
/// `round(truncation * sigma)`.
pub fn gaussian_kernel(sigma: f64, truncation: f64) -> Array2<f64> {
    let radius = (truncation * sigma + 0.5).floor().max(0.0) as usize;
    let size = 2 * radius + 1;
    let c = radius as f64;
    let kernel = Array2::from_shape_fn((size, size), |(i, j)| {
        let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2);
        if sigma > 0.0 {
            (-0.5 * r2 / sigma.powi(2)).exp()
        } else if r2 == 0.0 {
            1.0
        } else {
            0.0
        }
    });
    normalize(kernel)
}

/// Zero-padded 2D convolution with the output the size of the input
///
/// The kernel is flipped, so this is a true convolution rather than a correlation.
pub fn convolve_same<T: Float>(image: ArrayView2<T>, kernel: ArrayView2<f64>) -> Array2<T> {
    let (rows, cols) = image.dim();
    let (k_rows, k_cols) = kernel.dim();
    let (pad_rows, pad_cols) = (k_rows / 2, k_cols / 2);
    let mut output = Array2::zeros((rows, cols));
    for ((ki, kj), &w) in kernel.indexed_iter() {
        if w == 0.0 {
            continue;
        }
        let w = T::lit(w);
        // output[i, j] += image[i + pad - ki, j + pad - kj] * w
        let di = pad_rows as isize - ki as isize;
        let dj = pad_cols as isize - kj as isize;
        let (out_rows, in_rows) = overlap(rows, di);
        let (out_cols, in_cols) = overlap(cols, dj);
        if out_rows.is_empty() || out_cols.is_empty() {
            continue;
        }
        Zip::from(output.slice_mut(s![out_rows, out_cols]))
            .and(image.slice(s![in_rows, in_cols]))
            .for_each(|o, &x| *o += x * w);
    }
    output
}

/// Output and input index ranges of a shift by `d` along an axis of length `n`
fn overlap(n: usize, d: isize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let shift = d.unsigned_abs();
    if shift >= n {
        return (0..0, 0..0);
    }
    if d >= 0 {
        (0..n - shift, shift..n)
    } else {
        (shift..n, 0..n - shift)
    }
}

/// Average `factor x factor` blocks, turning a supersampled image into a regular one
pub fn re_size<T: Float>(image: ArrayView2<T>, factor: usize) -> Result<Array2<T>, EvaluationError> {
    let (rows, cols) = image.dim();
    if factor == 0 || rows % factor != 0 || cols % factor != 0 {
        return Err(EvaluationError::Shape {
            expected: vec![rows - rows % factor.max(1), cols - cols % factor.max(1)],
            actual: vec![rows, cols],
        });
    }
    if factor == 1 {
        return Ok(image.to_owned());
    }
    let norm = T::lit(1.0 / (factor * factor) as f64);
    Ok(Array2::from_shape_fn((rows / factor, cols / factor), |(i, j)| {
        image
            .slice(s![i * factor..(i + 1) * factor, j * factor..(j + 1) * factor])
            .fold(T::zero(), |acc, &x| acc + x)
            * norm
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn delta_kernel_is_identity() {
        let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0], [0.5, 0.0, -1.0]];
        let delta = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        assert_eq!(convolve_same(image.view(), delta.view()), image);
    }

    #[test]
    fn convolution_flips_the_kernel() {
        let image = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let kernel = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        // impulse response of a true convolution is the kernel itself
        assert_eq!(convolve_same(image.view(), kernel.view()), kernel);
        let shifted = array![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        assert_eq!(
            convolve_same(shifted.view(), kernel.view()),
            array![[5.0, 6.0, 0.0], [8.0, 9.0, 0.0], [0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn block_average() {
        let image = array![[1.0, 3.0, 0.0, 0.0], [1.0, 3.0, 4.0, 4.0]];
        assert_eq!(re_size(image.view(), 2).unwrap(), array![[2.0, 2.0]]);
        assert!(re_size(image.view(), 3).is_err());
    }

    #[test]
    fn cut_and_pad() {
        let kernel = gaussian_kernel(1.0, 4.0);
        assert_eq!(kernel.dim(), (9, 9));
        assert_abs_diff_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        let cut = cut_kernel(kernel.view(), 3).unwrap();
        assert_eq!(cut[[1, 1]], kernel[[4, 4]]);
        let padded = cut_kernel(cut.view(), 5).unwrap();
        assert_eq!(padded[[0, 0]], 0.0);
        assert_eq!(padded[[2, 2]], kernel[[4, 4]]);
        assert!(cut_kernel(kernel.view(), 4).is_err());
        assert!(cut_kernel(array![[1.0, 0.0]].view(), 1).is_err());
    }

    #[test]
    fn split_conserves_flux() {
        let kernel = gaussian_kernel(3.0, 4.0);
        let (low, high) = split_kernel(kernel.view(), 3, 3).unwrap();
        assert_eq!(high.dim(), (9, 9));
        assert_eq!(low.dim().0 % 2, 1);
        assert_abs_diff_eq!(low.sum() + high.sum(), 1.0, epsilon = 1e-12);
        assert!(split_kernel(kernel.view(), 3, 1).is_err());
    }

    #[test]
    fn degrade_keeps_center() {
        let mut kernel = Array2::zeros((9, 9));
        kernel[[4, 4]] = 1.0;
        let low = degrade_kernel(kernel.view(), 3).unwrap();
        assert_eq!(low.dim(), (3, 3));
        assert_eq!(low[[1, 1]], 1.0);
    }
}
