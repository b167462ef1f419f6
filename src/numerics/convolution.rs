use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;
use crate::numerics::kernel::{convolve_same, cut_kernel, gaussian_kernel, normalize, re_size, split_kernel};

use enum_dispatch::enum_dispatch;
use macro_const::macro_const;
use ndarray::{Array2, ArrayView2};

/// PSF convolution of a model image, possibly evaluated on a supersampled grid
#[enum_dispatch]
pub trait ConvolutionTrait {
    /// Convolve a single image at the resolution the strategy works on
    fn convolution2d<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError>;

    /// Convolved image on the regular pixel grid
    ///
    /// `image_low_res` is on the regular grid, `image_high_res` on the supersampled one; a
    /// strategy only reads the images it needs.
    fn re_size_convolve<T: Float>(
        &self,
        image_low_res: ArrayView2<T>,
        image_high_res: Option<ArrayView2<T>>,
    ) -> Result<Array2<T>, EvaluationError>;

    /// Centered kernel of odd `size`, in the pixels the kernel is applied on
    fn pixel_kernel(&self, size: usize) -> Result<Array2<f64>, ConfigurationError>;
}

macro_const! {
    const PIXEL_KERNEL_DOC: &str = r"
Direct convolution of a regular-resolution image with a pixelated kernel

The output has the size of the input, outer pixels see zero padding.
";
}

#[doc = PIXEL_KERNEL_DOC!()]
#[derive(Clone, Debug, PartialEq)]
pub struct PixelKernelConvolution {
    kernel: Array2<f64>,
}

impl PixelKernelConvolution {
    pub fn new(kernel: Array2<f64>) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> ArrayView2<f64> {
        self.kernel.view()
    }

    /// Same convolution with the transposed kernel
    pub fn transposed(&self) -> Self {
        Self::new(self.kernel.t().to_owned())
    }
}

impl ConvolutionTrait for PixelKernelConvolution {
    fn convolution2d<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError> {
        Ok(convolve_same(image, self.kernel.view()))
    }

    fn re_size_convolve<T: Float>(
        &self,
        image_low_res: ArrayView2<T>,
        _image_high_res: Option<ArrayView2<T>>,
    ) -> Result<Array2<T>, EvaluationError> {
        self.convolution2d(image_low_res)
    }

    fn pixel_kernel(&self, size: usize) -> Result<Array2<f64>, ConfigurationError> {
        Ok(normalize(cut_kernel(self.kernel.view(), size)?))
    }
}

macro_const! {
    const SUBGRID_DOC: &str = r"
Convolution on the supersampled grid with an optional regular-resolution correction

With a supersampling kernel size set, only the central part of the supersampled kernel is
applied at high resolution; its wings are degraded to regular pixels and applied to the regular
image. The two contributions are added after the high-resolution result is block-averaged.
";
}

#[doc = SUBGRID_DOC!()]
#[derive(Clone, Debug, PartialEq)]
pub struct SubgridKernelConvolution {
    supersampling_factor: usize,
    high_res: PixelKernelConvolution,
    low_res: Option<PixelKernelConvolution>,
}

impl SubgridKernelConvolution {
    pub fn new(
        kernel_supersampled: ArrayView2<f64>,
        supersampling_factor: usize,
        supersampling_kernel_size: Option<usize>,
    ) -> Result<Self, ConfigurationError> {
        if supersampling_factor == 0 {
            return Err(ConfigurationError::Numerics(
                "supersampling factor must be positive".into(),
            ));
        }
        let (high_res, low_res) = match supersampling_kernel_size {
            None => (kernel_supersampled.to_owned(), None),
            Some(size) => {
                let (low, high) = split_kernel(kernel_supersampled, size, supersampling_factor)?;
                (high, Some(PixelKernelConvolution::new(low)))
            }
        };
        Ok(Self {
            supersampling_factor,
            high_res: PixelKernelConvolution::new(high_res),
            low_res,
        })
    }

    pub fn supersampling_factor(&self) -> usize {
        self.supersampling_factor
    }
}

impl ConvolutionTrait for SubgridKernelConvolution {
    /// Takes the supersampled image
    fn convolution2d<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError> {
        let mut convolved = re_size(self.high_res.convolution2d(image)?.view(), self.supersampling_factor)?;
        if let Some(low_res) = &self.low_res {
            let resized = re_size(image, self.supersampling_factor)?;
            convolved += &low_res.convolution2d(resized.view())?;
        }
        Ok(convolved)
    }

    fn re_size_convolve<T: Float>(
        &self,
        image_low_res: ArrayView2<T>,
        image_high_res: Option<ArrayView2<T>>,
    ) -> Result<Array2<T>, EvaluationError> {
        let image_high_res = image_high_res.ok_or_else(|| EvaluationError::Shape {
            expected: vec![
                image_low_res.nrows() * self.supersampling_factor,
                image_low_res.ncols() * self.supersampling_factor,
            ],
            actual: vec![],
        })?;
        let mut convolved = re_size(
            self.high_res.convolution2d(image_high_res)?.view(),
            self.supersampling_factor,
        )?;
        if let Some(low_res) = &self.low_res {
            convolved += &low_res.convolution2d(image_low_res)?;
        }
        Ok(convolved)
    }

    /// Snapshot of the high-resolution part
    fn pixel_kernel(&self, size: usize) -> Result<Array2<f64>, ConfigurationError> {
        self.high_res.pixel_kernel(size)
    }
}

macro_const! {
    const MULTI_GAUSSIAN_DOC: &str = r"
PSF approximated by a weighted sum of circular Gaussians

Widths are given in angular units and divided by the pixel scale; with supersampled convolution
they are further multiplied by the supersampling factor. Weights are renormalized to sum to one.
Each Gaussian is truncated at `truncation` standard deviations.
";
}

#[doc = MULTI_GAUSSIAN_DOC!()]
#[derive(Clone, Debug, PartialEq)]
pub struct MultiGaussianConvolution {
    sigmas_pixel: Vec<f64>,
    fractions: Vec<f64>,
    supersampling_factor: usize,
    supersampling_convolution: bool,
    truncation: f64,
    kernels: Vec<Array2<f64>>,
}

impl MultiGaussianConvolution {
    pub fn new(
        sigmas: &[f64],
        fractions: &[f64],
        pixel_scale: f64,
        supersampling_factor: usize,
        supersampling_convolution: bool,
        truncation: f64,
    ) -> Result<Self, ConfigurationError> {
        if sigmas.is_empty() || sigmas.len() != fractions.len() {
            return Err(ConfigurationError::Psf(format!(
                "need one fraction per Gaussian, got {} widths and {} fractions",
                sigmas.len(),
                fractions.len()
            )));
        }
        if !(pixel_scale > 0.0) || supersampling_factor == 0 {
            return Err(ConfigurationError::Numerics(format!(
                "pixel scale {pixel_scale} and supersampling factor {supersampling_factor} must be positive"
            )));
        }
        let total: f64 = fractions.iter().sum();
        if !(total > 0.0) {
            return Err(ConfigurationError::Psf("Gaussian fractions must sum to a positive value".into()));
        }
        let scale = if supersampling_convolution {
            supersampling_factor as f64
        } else {
            1.0
        };
        let sigmas_pixel: Vec<f64> = sigmas.iter().map(|s| s / pixel_scale * scale).collect();
        let kernels = sigmas_pixel
            .iter()
            .map(|&sigma| gaussian_kernel(sigma, truncation))
            .collect();
        Ok(Self {
            sigmas_pixel,
            fractions: fractions.iter().map(|f| f / total).collect(),
            supersampling_factor,
            supersampling_convolution,
            truncation,
            kernels,
        })
    }

    pub fn sigmas_pixel(&self) -> &[f64] {
        &self.sigmas_pixel
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn truncation(&self) -> f64 {
        self.truncation
    }
}

impl ConvolutionTrait for MultiGaussianConvolution {
    fn convolution2d<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError> {
        let mut convolved = Array2::zeros(image.dim());
        for (kernel, &fraction) in self.kernels.iter().zip(&self.fractions) {
            let fraction = T::lit(fraction);
            convolved.zip_mut_with(&convolve_same(image, kernel.view()), |acc, &x| {
                *acc += x * fraction
            });
        }
        Ok(convolved)
    }

    fn re_size_convolve<T: Float>(
        &self,
        image_low_res: ArrayView2<T>,
        image_high_res: Option<ArrayView2<T>>,
    ) -> Result<Array2<T>, EvaluationError> {
        match (self.supersampling_convolution, image_high_res) {
            (true, Some(high_res)) => re_size(self.convolution2d(high_res)?.view(), self.supersampling_factor),
            (true, None) => Err(EvaluationError::Shape {
                expected: vec![
                    image_low_res.nrows() * self.supersampling_factor,
                    image_low_res.ncols() * self.supersampling_factor,
                ],
                actual: vec![],
            }),
            (false, _) => self.convolution2d(image_low_res),
        }
    }

    /// Sum of the Gaussians sampled at pixel centers, normalized
    fn pixel_kernel(&self, size: usize) -> Result<Array2<f64>, ConfigurationError> {
        if size % 2 == 0 {
            return Err(ConfigurationError::Psf(format!("kernel size must be odd, got {size}")));
        }
        let c = (size / 2) as f64;
        let kernel = Array2::from_shape_fn((size, size), |(i, j)| {
            let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2);
            self.sigmas_pixel
                .iter()
                .zip(&self.fractions)
                .map(|(sigma, fraction)| {
                    if *sigma > 0.0 {
                        fraction / (2.0 * std::f64::consts::PI * sigma.powi(2)) * (-0.5 * r2 / sigma.powi(2)).exp()
                    } else if r2 == 0.0 {
                        *fraction
                    } else {
                        0.0
                    }
                })
                .sum()
        });
        Ok(normalize(kernel))
    }
}

/// Convolution strategy, fixed when the numerics are built
#[enum_dispatch(ConvolutionTrait)]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Convolution {
    PixelKernel(PixelKernelConvolution),
    Subgrid(SubgridKernelConvolution),
    MultiGaussian(MultiGaussianConvolution),
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn delta(size: usize) -> Array2<f64> {
        let mut kernel = Array2::zeros((size, size));
        kernel[[size / 2, size / 2]] = 1.0;
        kernel
    }

    fn image() -> Array2<f64> {
        Array2::from_shape_fn((6, 4), |(i, j)| (i * 4 + j) as f64)
    }

    #[test]
    fn delta_kernel_reproduces_input() {
        let conv = Convolution::from(PixelKernelConvolution::new(delta(5)));
        let image = image();
        assert_eq!(conv.re_size_convolve(image.view(), None).unwrap(), image);
        assert_eq!(conv.pixel_kernel(3).unwrap(), delta(3));
    }

    #[test]
    fn transposed_kernel() {
        let conv = PixelKernelConvolution::new(array![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        assert_eq!(conv.transposed().kernel()[[1, 0]], 1.0);
    }

    #[test]
    fn subgrid_with_delta_kernel_is_block_average() {
        let conv = SubgridKernelConvolution::new(delta(7).view(), 2, None).unwrap();
        let high = Array2::from_shape_fn((4, 4), |(i, j)| (i + j) as f64);
        let low = re_size(high.view(), 2).unwrap();
        let out = conv.re_size_convolve(low.view(), Some(high.view())).unwrap();
        assert_eq!(out, low);
        assert_eq!(conv.convolution2d(high.view()).unwrap(), low);
        assert!(conv.re_size_convolve(low.view(), None).is_err());
    }

    #[test]
    fn subgrid_split_conserves_flux_of_flat_image() {
        let kernel = gaussian_kernel(2.0, 3.0);
        let conv = SubgridKernelConvolution::new(kernel.view(), 3, Some(1)).unwrap();
        // a flat image far from the edges keeps its value
        let high = Array2::from_elem((60, 60), 1.0);
        let low = re_size(high.view(), 3).unwrap();
        let out = conv.re_size_convolve(low.view(), Some(high.view())).unwrap();
        assert_abs_diff_eq!(out[[10, 10]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn multi_gaussian() {
        let conv = MultiGaussianConvolution::new(&[0.1, 0.2], &[2.0, 2.0], 0.1, 2, true, 4.0).unwrap();
        assert_eq!(conv.fractions(), &[0.5, 0.5]);
        assert_abs_diff_eq!(conv.sigmas_pixel()[1], 4.0, epsilon = 1e-12);
        let kernel = conv.pixel_kernel(11).unwrap();
        assert_abs_diff_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(kernel, kernel.t(), epsilon = 1e-15);
        assert!(conv.pixel_kernel(10).is_err());

        let flat = Array2::from_elem((80, 80), 2.0);
        let low = re_size(flat.view(), 2).unwrap();
        let out = conv.re_size_convolve(low.view(), Some(flat.view())).unwrap();
        assert_eq!(out.dim(), (40, 40));
        assert_abs_diff_eq!(out[[20, 20]], 2.0, epsilon = 1e-10);
        assert!(MultiGaussianConvolution::new(&[0.1], &[], 0.1, 1, false, 4.0).is_err());
    }
}
