use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;
use crate::grid::{PixelAxes, PixelGridSettings};
use crate::model::composite::Composite;
use crate::model::Selection;
use crate::params::ProfileKwargs;
use crate::profiles::{LightProfile, LightProfileTrait, ProfileFamily, ProfileRegistry};

use ndarray::{Array1, ArrayView1};
use std::sync::Arc;

/// Sum of light profiles, used for both the source and the lens light
#[derive(Clone, Debug)]
pub struct LightModel {
    composite: Composite<LightProfile>,
}

impl LightModel {
    /// Light model of built-in profiles
    pub fn new<S: AsRef<str>>(identifiers: &[S]) -> Result<Self, ConfigurationError> {
        Self::with_registry(identifiers, ProfileRegistry::global(), PixelGridSettings::default())
    }

    pub fn with_registry<S: AsRef<str>>(
        identifiers: &[S],
        registry: &ProfileRegistry,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            composite: Composite::from_identifiers(
                ProfileFamily::Light,
                identifiers,
                |name| registry.make_light(name),
                pixel_grid_settings,
            )?,
        })
    }

    pub fn from_profiles(
        profiles: Vec<LightProfile>,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            composite: Composite::from_profiles(ProfileFamily::Light, profiles, pixel_grid_settings)?,
        })
    }

    pub fn len(&self) -> usize {
        self.composite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn profiles(&self) -> impl Iterator<Item = &LightProfile> {
        self.composite.profiles()
    }

    pub fn has_pixels(&self) -> bool {
        self.composite.pixel_index().is_some()
    }

    pub fn pixelated_index(&self) -> Option<usize> {
        self.composite.pixel_index()
    }

    pub fn pixel_grid_settings(&self) -> &PixelGridSettings {
        self.composite.pixel_grid_settings()
    }

    pub fn pixel_axes(&self) -> Option<&PixelAxes> {
        self.composite.pixel_axes()
    }

    pub fn set_pixel_grid(&mut self, axes: Arc<PixelAxes>) -> Result<(), ConfigurationError> {
        self.composite.set_pixel_grid(axes)
    }

    /// Total surface brightness of the selected profiles
    pub fn surface_brightness<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<Array1<T>, EvaluationError> {
        if x.len() != y.len() {
            return Err(EvaluationError::Shape {
                expected: vec![x.len()],
                actual: vec![y.len()],
            });
        }
        let mut flux = Array1::zeros(x.len());
        for (profile, kwargs) in self.composite.selected(kwargs, selection)? {
            flux += &profile.function(x, y, kwargs)?;
        }
        Ok(flux)
    }
}
