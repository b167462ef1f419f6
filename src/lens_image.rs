use crate::error::{ConfigurationError, EvaluationError, LensingError};
use crate::float_trait::Float;
use crate::grid::{GridProvider, PixelGrid};
use crate::instrument::{Noise, NoiseProvider, Psf};
use crate::model::{LightModel, MassModel, RayMapper, Selection};
use crate::numerics::{Numerics, NumericsSettings};
use crate::params::{ModelClass, ModelKwargs, ProfileKwargs};

use ndarray::{Array2, ArrayView2, Zip};

/// Which parts of the model image to compute and how
#[derive(Clone, Debug, PartialEq)]
pub struct ModelOptions {
    /// Skip the PSF convolution
    pub unconvolved: bool,
    pub source_add: bool,
    pub lens_light_add: bool,
    pub k_lens: Selection,
    pub k_source: Selection,
    pub k_lens_light: Selection,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            unconvolved: false,
            source_add: true,
            lens_light_add: true,
            k_lens: Selection::All,
            k_source: Selection::All,
            k_lens_light: Selection::All,
        }
    }
}

/// Lensed images of a source behind a lens, as seen by an instrument
///
/// Building the image sets the PSF pixel size and creates the model grids of pixelated
/// components through the grid provider. The numerics (evaluation coordinates and convolution)
/// are fixed until [`LensImage::update_psf`] is called.
#[derive(Clone, Debug)]
pub struct LensImage<G = PixelGrid, N = Noise> {
    grid: G,
    psf: Psf,
    noise: Option<N>,
    mass: MassModel,
    source: LightModel,
    lens_light: LightModel,
    numerics_settings: NumericsSettings,
    numerics: Numerics,
}

impl<G, N> LensImage<G, N>
where
    G: GridProvider,
    N: NoiseProvider,
{
    pub fn new(
        grid: G,
        mut psf: Psf,
        noise: Option<N>,
        mass: MassModel,
        source: LightModel,
        lens_light: LightModel,
        numerics_settings: NumericsSettings,
    ) -> Result<Self, ConfigurationError> {
        psf.set_pixel_size(grid.pixel_width());
        let numerics = Numerics::new(&grid, &psf, &numerics_settings)?;
        let mut image = Self {
            grid,
            psf,
            noise,
            mass,
            source,
            lens_light,
            numerics_settings,
            numerics,
        };
        image.attach_model_grids(false)?;
        Ok(image)
    }

    /// Create the model grids of pixelated components again, replacing existing ones
    pub fn recompute_model_grids(&mut self) -> Result<(), ConfigurationError> {
        self.attach_model_grids(true)
    }

    fn attach_model_grids(&mut self, overwrite: bool) -> Result<(), ConfigurationError> {
        if self.mass.has_pixels() {
            self.grid
                .create_model_grid(ModelClass::Lens, self.mass.pixel_grid_settings(), overwrite)?;
            let axes = self
                .grid
                .model_pixel_axes(ModelClass::Lens)
                .ok_or(ConfigurationError::MissingModelGrid(ModelClass::Lens))?;
            self.mass.set_pixel_grid(axes)?;
        }
        for (class, model) in [
            (ModelClass::Source, &mut self.source),
            (ModelClass::LensLight, &mut self.lens_light),
        ] {
            if model.has_pixels() {
                self.grid
                    .create_model_grid(class, model.pixel_grid_settings(), overwrite)?;
                let axes = self
                    .grid
                    .model_pixel_axes(class)
                    .ok_or(ConfigurationError::MissingModelGrid(class))?;
                model.set_pixel_grid(axes)?;
            }
        }
        Ok(())
    }

    /// Replace the PSF, rebuilding the numerics
    pub fn update_psf(&mut self, mut psf: Psf) -> Result<(), ConfigurationError> {
        psf.set_pixel_size(self.grid.pixel_width());
        self.numerics = Numerics::new(&self.grid, &psf, &self.numerics_settings)?;
        self.psf = psf;
        Ok(())
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn psf(&self) -> &Psf {
        &self.psf
    }

    pub fn noise(&self) -> Option<&N> {
        self.noise.as_ref()
    }

    pub fn noise_mut(&mut self) -> Option<&mut N> {
        self.noise.as_mut()
    }

    pub fn mass_model(&self) -> &MassModel {
        &self.mass
    }

    pub fn source_model(&self) -> &LightModel {
        &self.source
    }

    pub fn lens_light_model(&self) -> &LightModel {
        &self.lens_light
    }

    pub fn numerics(&self) -> &Numerics {
        &self.numerics
    }

    /// Source surface brightness on the image pixels, lensed unless `de_lensed`
    pub fn source_surface_brightness<T: Float>(
        &self,
        kwargs_source: &[ProfileKwargs<T>],
        kwargs_lens: &[ProfileKwargs<T>],
        de_lensed: bool,
        options: &ModelOptions,
    ) -> Result<Array2<T>, EvaluationError> {
        if self.source.is_empty() {
            return Ok(Array2::zeros(self.grid.num_pixel_axes()));
        }
        let (x, y) = self.numerics.coordinates_as::<T>();
        let flux = if de_lensed {
            self.source
                .surface_brightness(x.view(), y.view(), kwargs_source, &options.k_source)?
        } else {
            RayMapper::new(&self.mass, &self.source).image_flux_joint(
                x.view(),
                y.view(),
                kwargs_lens,
                kwargs_source,
                &options.k_lens,
                &options.k_source,
            )?
        };
        self.numerics.re_size_convolve(flux.view(), options.unconvolved)
    }

    /// Lens light surface brightness on the image pixels
    pub fn lens_surface_brightness<T: Float>(
        &self,
        kwargs_lens_light: &[ProfileKwargs<T>],
        options: &ModelOptions,
    ) -> Result<Array2<T>, EvaluationError> {
        let (x, y) = self.numerics.coordinates_as::<T>();
        let flux = self.lens_light.surface_brightness(
            x.view(),
            y.view(),
            kwargs_lens_light,
            &options.k_lens_light,
        )?;
        self.numerics.re_size_convolve(flux.view(), options.unconvolved)
    }

    /// Noiseless model image
    pub fn model<T: Float>(
        &self,
        kwargs: &ModelKwargs<T>,
        options: &ModelOptions,
    ) -> Result<Array2<T>, EvaluationError> {
        let mut model = Array2::zeros(self.grid.num_pixel_axes());
        if options.source_add {
            model += &self.source_surface_brightness(&kwargs.source, &kwargs.lens, false, options)?;
        }
        if options.lens_light_add {
            model += &self.lens_surface_brightness(&kwargs.lens_light, options)?;
        }
        Ok(model)
    }

    fn noise_provider(&self) -> Result<&N, ConfigurationError> {
        self.noise.as_ref().ok_or(ConfigurationError::MissingNoiseProvider)
    }

    /// Model image plus a noise realisation fixed by `noise_seed`
    ///
    /// The simulated image becomes the data of the noise provider. With `compute_true_noise_map`
    /// the noise map is also fixed to the one of the noiseless model, so residuals of the
    /// simulated data are normalized by the true noise.
    pub fn simulation(
        &mut self,
        kwargs: &ModelKwargs<f64>,
        options: &ModelOptions,
        noise_seed: u64,
        add_poisson: bool,
        add_gaussian: bool,
        compute_true_noise_map: bool,
    ) -> Result<Array2<f64>, LensingError> {
        let model = self.model(kwargs, options)?;
        let noise = self
            .noise
            .as_mut()
            .ok_or(ConfigurationError::MissingNoiseProvider)?;
        let simulated =
            &model + &noise.realisation(model.view(), noise_seed, add_poisson, add_gaussian);
        noise.set_data(simulated.clone());
        if compute_true_noise_map {
            noise.compute_noise_map_from_model(model.view());
        }
        Ok(simulated)
    }

    /// `(model - data) / sigma`, with `sigma` from the model-dependent noise variance
    pub fn normalized_residuals<T: Float>(
        &self,
        data: ArrayView2<f64>,
        model: ArrayView2<T>,
        mask: Option<ArrayView2<f64>>,
    ) -> Result<Array2<T>, LensingError> {
        let noise = self.noise_provider()?;
        let shape = self.grid.num_pixel_axes();
        for array_shape in [Some(data.dim()), Some(model.dim()), mask.map(|m| m.dim())]
            .into_iter()
            .flatten()
        {
            if array_shape != shape {
                return Err(EvaluationError::Shape {
                    expected: vec![shape.0, shape.1],
                    actual: vec![array_shape.0, array_shape.1],
                }
                .into());
            }
        }
        let variance = noise.variance(model);
        let mut residuals = Zip::from(&model)
            .and(&data)
            .and(&variance)
            .map_collect(|&m, &d, &v| (m - T::lit(d)) / v.sqrt());
        if let Some(mask) = mask {
            residuals.zip_mut_with(&mask, |r, &w| *r *= T::lit(w));
        }
        Ok(residuals)
    }

    /// Sum of squared normalized residuals per unmasked pixel
    pub fn reduced_chi2<T: Float>(
        &self,
        data: ArrayView2<f64>,
        model: ArrayView2<T>,
        mask: Option<ArrayView2<f64>>,
    ) -> Result<T, LensingError> {
        let residuals = self.normalized_residuals(data, model, mask)?;
        let num_data_points = match mask {
            Some(mask) => mask.sum(),
            None => residuals.len() as f64,
        };
        let chi2 = residuals.fold(T::zero(), |acc, &r| acc + r * r);
        Ok(chi2 / T::lit(num_data_points))
    }
}
