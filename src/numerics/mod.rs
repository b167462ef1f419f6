//! Turning continuous surface brightness into a pixel image.
//!
//! [`Numerics`] owns the (possibly supersampled) evaluation coordinates and the PSF convolution
//! strategy. Both are fixed at construction: a different PSF or supersampling setup needs a new
//! [`Numerics`].

use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;
use crate::grid::GridProvider;
use crate::instrument::{Psf, PsfKind};

use ndarray::{Array1, Array2, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod convolution;
pub use convolution::{
    Convolution, ConvolutionTrait, MultiGaussianConvolution, PixelKernelConvolution,
    SubgridKernelConvolution,
};

pub mod kernel;

/// Supersampling and convolution options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NumericsSettings {
    /// Sub-pixels per pixel along each axis
    pub supersampling_factor: usize,
    /// Convolve on the supersampled grid instead of the regular one
    pub supersampling_convolution: bool,
    /// Size in regular pixels of the central kernel part convolved at high resolution
    pub supersampling_kernel_size: Option<usize>,
    /// Gaussian kernels are truncated at this many standard deviations
    pub convolution_truncation: f64,
}

impl Default for NumericsSettings {
    fn default() -> Self {
        Self {
            supersampling_factor: 1,
            supersampling_convolution: false,
            supersampling_kernel_size: None,
            convolution_truncation: 4.0,
        }
    }
}

/// Evaluation coordinates plus the PSF convolution of a single image
#[derive(Clone, Debug)]
pub struct Numerics {
    shape: (usize, usize),
    supersampling_factor: usize,
    x: Array1<f64>,
    y: Array1<f64>,
    convolution: Option<Convolution>,
}

impl Numerics {
    pub fn new<G: GridProvider>(
        grid: &G,
        psf: &Psf,
        settings: &NumericsSettings,
    ) -> Result<Self, ConfigurationError> {
        let factor = settings.supersampling_factor;
        if factor == 0 {
            return Err(ConfigurationError::Numerics(
                "supersampling factor must be at least one".into(),
            ));
        }
        if settings.supersampling_kernel_size.is_some_and(|size| size % 2 == 0) {
            return Err(ConfigurationError::Numerics(
                "supersampling kernel size must be odd".into(),
            ));
        }
        let convolution = Self::build_convolution(grid.pixel_width(), psf, settings)?;
        let (x, y) = grid.supersampled_coordinates(factor);
        Ok(Self {
            shape: grid.num_pixel_axes(),
            supersampling_factor: factor,
            x,
            y,
            convolution,
        })
    }

    fn build_convolution(
        pixel_width: f64,
        psf: &Psf,
        settings: &NumericsSettings,
    ) -> Result<Option<Convolution>, ConfigurationError> {
        let factor = settings.supersampling_factor;
        let supersampled = settings.supersampling_convolution && factor > 1;
        let convolution: Convolution = match psf.kind() {
            PsfKind::None => {
                log::debug!("no PSF, images are not convolved");
                return Ok(None);
            }
            PsfKind::Gaussian { .. } | PsfKind::MultiGaussian { .. } => {
                let (sigmas, fractions) = psf.gaussian_components().unwrap_or_default();
                log::debug!("multi-Gaussian convolution with {} components", sigmas.len());
                MultiGaussianConvolution::new(
                    &sigmas,
                    &fractions,
                    pixel_width,
                    factor,
                    supersampled,
                    psf.truncation().unwrap_or(settings.convolution_truncation),
                )?
                .into()
            }
            PsfKind::Pixel { kernel, .. } if !supersampled => {
                log::debug!("pixel kernel convolution with a {:?} kernel", kernel.dim());
                PixelKernelConvolution::new(kernel.clone()).into()
            }
            PsfKind::Pixel { .. } => {
                let kernel = psf.kernel_supersampled(factor).ok_or_else(|| {
                    ConfigurationError::Psf(format!(
                        "supersampled convolution needs a kernel supersampled by {factor}"
                    ))
                })?;
                log::debug!(
                    "subgrid convolution with a {:?} kernel, factor {factor}",
                    kernel.dim()
                );
                SubgridKernelConvolution::new(kernel.view(), factor, settings.supersampling_kernel_size)?.into()
            }
        };
        Ok(Some(convolution))
    }

    /// Flattened coordinates the surface brightness must be evaluated at
    pub fn coordinates_evaluate(&self) -> (&Array1<f64>, &Array1<f64>) {
        (&self.x, &self.y)
    }

    /// Evaluation coordinates in the scalar type of the model
    pub fn coordinates_as<T: Float>(&self) -> (Array1<T>, Array1<T>) {
        (self.x.mapv(T::lit), self.y.mapv(T::lit))
    }

    /// Regular image shape `(num_y, num_x)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn supersampling_factor(&self) -> usize {
        self.supersampling_factor
    }

    pub fn convolution(&self) -> Option<&Convolution> {
        self.convolution.as_ref()
    }

    /// Pixel image from surface brightness evaluated at [`Numerics::coordinates_evaluate`]
    pub fn re_size_convolve<T: Float>(
        &self,
        flux: ArrayView1<T>,
        unconvolved: bool,
    ) -> Result<Array2<T>, EvaluationError> {
        let (ny, nx) = self.shape;
        let f = self.supersampling_factor;
        let high_res = flux
            .to_owned()
            .into_shape_with_order((ny * f, nx * f))
            .map_err(|_| EvaluationError::Shape {
                expected: vec![ny * f * nx * f],
                actual: vec![flux.len()],
            })?;
        let low_res = kernel::re_size(high_res.view(), f)?;
        match &self.convolution {
            Some(convolution) if !unconvolved => {
                convolution.re_size_convolve(low_res.view(), Some(high_res.view()))
            }
            _ => Ok(low_res),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelGrid;

    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn no_psf_block_averages() {
        let grid = PixelGrid::new(3, 2, 1.0).unwrap();
        let settings = NumericsSettings {
            supersampling_factor: 2,
            ..Default::default()
        };
        let numerics = Numerics::new(&grid, &Psf::none(), &settings).unwrap();
        assert!(numerics.convolution().is_none());
        let (x, _) = numerics.coordinates_evaluate();
        assert_eq!(x.len(), 24);
        let image = numerics.re_size_convolve(x.view(), false).unwrap();
        // block average of sub-pixel x coordinates is the pixel center
        assert_abs_diff_eq!(image.row(0).to_vec()[..], [-1.0, 0.0, 1.0][..], epsilon = 1e-12);
        assert!(numerics.re_size_convolve(x.slice(ndarray::s![..5]), false).is_err());
    }

    #[test]
    fn strategy_follows_psf() {
        let grid = PixelGrid::new(8, 8, 0.1).unwrap();
        let default = NumericsSettings::default();
        let gaussian = Numerics::new(&grid, &Psf::gaussian(0.3, None), &default).unwrap();
        assert!(matches!(gaussian.convolution(), Some(Convolution::MultiGaussian(_))));

        let mut kernel = Array2::zeros((5, 5));
        kernel[[2, 2]] = 1.0;
        let pixel = Psf::pixel(kernel.clone()).unwrap();
        let direct = Numerics::new(&grid, &pixel, &default).unwrap();
        assert!(matches!(direct.convolution(), Some(Convolution::PixelKernel(_))));

        let supersampled = NumericsSettings {
            supersampling_factor: 3,
            supersampling_convolution: true,
            ..Default::default()
        };
        assert!(matches!(
            Numerics::new(&grid, &pixel, &supersampled),
            Err(ConfigurationError::Psf(_))
        ));
        let mut fine = Array2::zeros((15, 15));
        fine[[7, 7]] = 1.0;
        let pixel = pixel.with_supersampled_kernel(fine, 3).unwrap();
        let subgrid = Numerics::new(&grid, &pixel, &supersampled).unwrap();
        assert!(matches!(subgrid.convolution(), Some(Convolution::Subgrid(_))));

        let zero = NumericsSettings {
            supersampling_factor: 0,
            ..Default::default()
        };
        assert!(Numerics::new(&grid, &pixel, &zero).is_err());
    }

    #[test]
    fn delta_psf_keeps_image() {
        let grid = PixelGrid::new(4, 3, 1.0).unwrap();
        let mut kernel = Array2::zeros((3, 3));
        kernel[[1, 1]] = 1.0;
        let numerics = Numerics::new(&grid, &Psf::pixel(kernel).unwrap(), &NumericsSettings::default()).unwrap();
        let flux = Array1::linspace(0.0, 11.0, 12);
        let image = numerics.re_size_convolve(flux.view(), false).unwrap();
        assert_eq!(image, flux.into_shape_with_order((3, 4)).unwrap());
    }

    #[test]
    fn settings_serde() {
        let settings: NumericsSettings = serde_json::from_str(r#"{"supersampling_factor": 3}"#).unwrap();
        assert_eq!(settings.supersampling_factor, 3);
        assert_eq!(settings.convolution_truncation, 4.0);
    }
}
