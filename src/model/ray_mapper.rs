use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::model::{LightModel, MassModel, Selection};
use crate::params::ProfileKwargs;

use ndarray::{Array1, ArrayView1};

/// Lens equation: maps image-plane positions to the source plane and evaluates the source there
#[derive(Clone, Copy, Debug)]
pub struct RayMapper<'a> {
    mass: &'a MassModel,
    source: &'a LightModel,
}

impl<'a> RayMapper<'a> {
    pub fn new(mass: &'a MassModel, source: &'a LightModel) -> Self {
        Self { mass, source }
    }

    /// Source-plane coordinates of every image-plane position
    pub fn ray_shoot<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        mass_kwargs: &[ProfileKwargs<T>],
        mass_selection: &Selection,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        self.mass.ray_shooting(x, y, mass_kwargs, mass_selection)
    }

    /// Lensed source surface brightness at image-plane positions
    pub fn image_flux_joint<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        mass_kwargs: &[ProfileKwargs<T>],
        source_kwargs: &[ProfileKwargs<T>],
        mass_selection: &Selection,
        source_selection: &Selection,
    ) -> Result<Array1<T>, EvaluationError> {
        let (x_source, y_source) = self.ray_shoot(x, y, mass_kwargs, mass_selection)?;
        self.source
            .surface_brightness(x_source.view(), y_source.view(), source_kwargs, source_selection)
    }
}
