use crate::error::{ConfigurationError, EvaluationError};
use crate::grid::{PixelAxes, PixelGridSettings};
use crate::model::Selection;
use crate::params::ProfileKwargs;
use crate::profiles::{ProfileFamily, ProfileTrait};

use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered profile list shared by the mass and light models
#[derive(Clone, Debug)]
pub(crate) struct Composite<P> {
    family: ProfileFamily,
    profiles: Vec<Arc<P>>,
    pixel_index: Option<usize>,
    pixel_grid_settings: PixelGridSettings,
}

impl<P> Composite<P>
where
    P: ProfileTrait + Clone,
{
    /// Resolve identifiers, repeated non-pixelated identifiers share one instance
    pub fn from_identifiers<S, F>(
        family: ProfileFamily,
        identifiers: &[S],
        make: F,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError>
    where
        S: AsRef<str>,
        F: Fn(&str) -> Result<P, ConfigurationError>,
    {
        let mut shared: BTreeMap<&str, Arc<P>> = BTreeMap::new();
        let mut profiles = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            let profile = match shared.get(identifier) {
                Some(profile) => profile.clone(),
                None => {
                    let profile = Arc::new(make(identifier)?);
                    if !profile.is_pixelated() {
                        shared.insert(identifier, profile.clone());
                    }
                    profile
                }
            };
            profiles.push(profile);
        }
        Self::new(family, profiles, pixel_grid_settings)
    }

    pub fn from_profiles(
        family: ProfileFamily,
        profiles: Vec<P>,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            family,
            profiles.into_iter().map(Arc::new).collect(),
            pixel_grid_settings,
        )
    }

    fn new(
        family: ProfileFamily,
        profiles: Vec<Arc<P>>,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        let pixelated: Vec<usize> = profiles
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.is_pixelated().then_some(i))
            .collect();
        if pixelated.len() > 1 {
            return Err(ConfigurationError::MultiplePixelatedProfiles {
                family,
                count: pixelated.len(),
            });
        }
        Ok(Self {
            family,
            profiles,
            pixel_index: pixelated.first().copied(),
            pixel_grid_settings,
        })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &P> {
        self.profiles.iter().map(|p| p.as_ref())
    }

    pub fn pixel_index(&self) -> Option<usize> {
        self.pixel_index
    }

    pub fn pixel_grid_settings(&self) -> &PixelGridSettings {
        &self.pixel_grid_settings
    }

    pub fn pixel_axes(&self) -> Option<&PixelAxes> {
        self.pixel_index
            .and_then(|i| self.profiles[i].pixel_axes())
    }

    pub fn set_pixel_grid(&mut self, axes: Arc<PixelAxes>) -> Result<(), ConfigurationError> {
        let index = self
            .pixel_index
            .ok_or(ConfigurationError::NoPixelatedComponent {
                family: self.family,
            })?;
        if Arc::make_mut(&mut self.profiles[index]).set_pixel_axes(axes) {
            log::debug!("attached pixel grid to {} profile #{index}", self.family);
            Ok(())
        } else {
            Err(ConfigurationError::NotPixelated {
                family: self.family,
                index,
            })
        }
    }

    /// Selected profiles with their keyword arguments
    pub fn selected<'a, T>(
        &'a self,
        kwargs: &'a [ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<impl Iterator<Item = (&'a P, &'a ProfileKwargs<T>)>, EvaluationError> {
        if kwargs.len() < self.len() {
            return Err(EvaluationError::KwargsLength {
                expected: self.len(),
                actual: kwargs.len(),
            });
        }
        let mask = selection.mask(self.len())?;
        Ok(self
            .profiles
            .iter()
            .zip(kwargs)
            .zip(mask)
            .filter_map(|((profile, kwargs), keep)| keep.then_some((profile.as_ref(), kwargs))))
    }
}
