use crate::error::ConfigurationError;
use crate::numerics::kernel::normalize;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// `fwhm = FWHM_PER_SIGMA * sigma` for a Gaussian
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;

/// Shape of the point-spread function
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "psf_type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum PsfKind {
    None,
    Gaussian {
        /// Full width at half maximum, angular units
        fwhm: f64,
        truncation: Option<f64>,
    },
    Pixel {
        /// Odd square kernel on regular pixels, normalized
        kernel: Array2<f64>,
        /// Kernel on sub-pixels with its supersampling factor
        kernel_supersampled: Option<(usize, Array2<f64>)>,
    },
    MultiGaussian {
        /// Standard deviations, angular units
        sigmas: Vec<f64>,
        fractions: Vec<f64>,
        truncation: Option<f64>,
    },
}

/// Point-spread function of the instrument
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Psf {
    kind: PsfKind,
    pixel_size: Option<f64>,
}

fn check_kernel(kernel: &Array2<f64>) -> Result<(), ConfigurationError> {
    let (ny, nx) = kernel.dim();
    if ny != nx || ny % 2 == 0 {
        return Err(ConfigurationError::Psf(format!(
            "kernel must be square with an odd size, got {ny}x{nx}"
        )));
    }
    if kernel.iter().any(|x| !x.is_finite()) || !(kernel.sum() > 0.0) {
        return Err(ConfigurationError::Psf(
            "kernel values must be finite with a positive sum".into(),
        ));
    }
    Ok(())
}

impl Psf {
    fn from_kind(kind: PsfKind) -> Self {
        Self {
            kind,
            pixel_size: None,
        }
    }

    /// Perfect seeing
    pub fn none() -> Self {
        Self::from_kind(PsfKind::None)
    }

    pub fn gaussian(fwhm: f64, truncation: Option<f64>) -> Self {
        Self::from_kind(PsfKind::Gaussian { fwhm, truncation })
    }

    /// Pixelated kernel, normalized to unit sum
    pub fn pixel(kernel: Array2<f64>) -> Result<Self, ConfigurationError> {
        check_kernel(&kernel)?;
        Ok(Self::from_kind(PsfKind::Pixel {
            kernel: normalize(kernel),
            kernel_supersampled: None,
        }))
    }

    /// Attach a kernel sampled on a grid `factor` times finer, pixel PSFs only
    pub fn with_supersampled_kernel(
        mut self,
        kernel: Array2<f64>,
        factor: usize,
    ) -> Result<Self, ConfigurationError> {
        check_kernel(&kernel)?;
        if factor < 2 {
            return Err(ConfigurationError::Psf(format!(
                "supersampling factor of a kernel must be at least 2, got {factor}"
            )));
        }
        match &mut self.kind {
            PsfKind::Pixel {
                kernel_supersampled,
                ..
            } => {
                *kernel_supersampled = Some((factor, normalize(kernel)));
                Ok(self)
            }
            _ => Err(ConfigurationError::Psf(
                "only pixel PSFs can hold a supersampled kernel".into(),
            )),
        }
    }

    pub fn multi_gaussian(
        sigmas: Vec<f64>,
        fractions: Vec<f64>,
        truncation: Option<f64>,
    ) -> Result<Self, ConfigurationError> {
        if sigmas.is_empty() || sigmas.len() != fractions.len() {
            return Err(ConfigurationError::Psf(format!(
                "need one fraction per Gaussian, got {} widths and {} fractions",
                sigmas.len(),
                fractions.len()
            )));
        }
        Ok(Self::from_kind(PsfKind::MultiGaussian {
            sigmas,
            fractions,
            truncation,
        }))
    }

    pub fn kind(&self) -> &PsfKind {
        &self.kind
    }

    /// Pixel width the PSF is used with, set by the image it belongs to
    pub fn set_pixel_size(&mut self, pixel_size: f64) {
        self.pixel_size = Some(pixel_size);
    }

    pub fn pixel_size(&self) -> Option<f64> {
        self.pixel_size
    }

    /// Regular-pixel kernel of pixel PSFs
    pub fn kernel_point_source(&self) -> Option<&Array2<f64>> {
        match &self.kind {
            PsfKind::Pixel { kernel, .. } => Some(kernel),
            _ => None,
        }
    }

    /// Supersampled kernel, if one with exactly this factor is known
    pub fn kernel_supersampled(&self, factor: usize) -> Option<&Array2<f64>> {
        match &self.kind {
            PsfKind::Pixel {
                kernel_supersampled: Some((f, kernel)),
                ..
            } if *f == factor => Some(kernel),
            _ => None,
        }
    }

    /// Standard deviations and flux fractions of Gaussian PSFs
    pub fn gaussian_components(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        match &self.kind {
            PsfKind::Gaussian { fwhm, .. } => Some((vec![fwhm / FWHM_PER_SIGMA], vec![1.0])),
            PsfKind::MultiGaussian {
                sigmas, fractions, ..
            } => Some((sigmas.clone(), fractions.clone())),
            _ => None,
        }
    }

    /// Truncation of Gaussian PSFs, in standard deviations
    pub fn truncation(&self) -> Option<f64> {
        match &self.kind {
            PsfKind::Gaussian { truncation, .. } | PsfKind::MultiGaussian { truncation, .. } => {
                *truncation
            }
            _ => None,
        }
    }
}

impl Default for Psf {
    fn default() -> Self {
        Self::none()
    }
}
