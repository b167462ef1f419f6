use crate::error::ConfigurationError;
use crate::profiles::light::{
    Gaussian, LightProfile, PixelatedLight, Sersic, SersicElliptic, Uniform,
};
use crate::profiles::mass::{MassProfile, PixelatedPotential, PointMass, Shear, ShearGammaPsi, Sis};
use crate::profiles::ProfileFamily;

use lazy_static::lazy_static;
use std::collections::BTreeMap;

/// Constructor of a fresh mass profile instance
pub type MassFactory = fn() -> MassProfile;

/// Constructor of a fresh light profile instance
pub type LightFactory = fn() -> LightProfile;

/// Identifier to profile constructor mapping
///
/// New profile types are registered here without touching the model composites.
#[derive(Clone, Debug)]
pub struct ProfileRegistry {
    mass: BTreeMap<String, MassFactory>,
    light: BTreeMap<String, LightFactory>,
}

lazy_static! {
    static ref BUILTIN: ProfileRegistry = ProfileRegistry::builtin();
}

impl ProfileRegistry {
    pub fn empty() -> Self {
        Self {
            mass: BTreeMap::new(),
            light: BTreeMap::new(),
        }
    }

    /// Registry with every profile shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register_mass("SHEAR", || Shear::default().into())
            .register_mass("SHEAR_GAMMA_PSI", || ShearGammaPsi::default().into())
            .register_mass("SIS", || Sis::default().into())
            .register_mass("POINT_MASS", || PointMass::default().into())
            .register_mass("PIXELATED", || PixelatedPotential::new().into())
            .register_light("UNIFORM", || Uniform::default().into())
            .register_light("GAUSSIAN", || Gaussian::default().into())
            .register_light("SERSIC", || Sersic::default().into())
            .register_light("SERSIC_ELLIPSE", || SersicElliptic::default().into())
            .register_light("PIXELATED", || PixelatedLight::new().into());
        registry
    }

    /// Process-wide registry of the built-in profiles
    pub fn global() -> &'static Self {
        &BUILTIN
    }

    pub fn register_mass(&mut self, name: impl Into<String>, factory: MassFactory) -> &mut Self {
        self.mass.insert(name.into(), factory);
        self
    }

    pub fn register_light(&mut self, name: impl Into<String>, factory: LightFactory) -> &mut Self {
        self.light.insert(name.into(), factory);
        self
    }

    pub fn mass_names(&self) -> Vec<String> {
        self.mass.keys().cloned().collect()
    }

    pub fn light_names(&self) -> Vec<String> {
        self.light.keys().cloned().collect()
    }

    pub fn make_mass(&self, name: &str) -> Result<MassProfile, ConfigurationError> {
        self.mass
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigurationError::UnknownProfile {
                family: ProfileFamily::Mass,
                name: name.to_owned(),
                known: self.mass_names(),
            })
    }

    pub fn make_light(&self, name: &str) -> Result<LightProfile, ConfigurationError> {
        self.light
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigurationError::UnknownProfile {
                family: ProfileFamily::Light,
                name: name.to_owned(),
                known: self.light_names(),
            })
    }

    /// Declared parameter names and pixel parameter of the profile `name` of `family`
    pub fn describe(
        &self,
        family: ProfileFamily,
        name: &str,
    ) -> Result<(&'static [&'static str], Option<&'static str>), ConfigurationError> {
        use crate::profiles::ProfileTrait;

        Ok(match family {
            ProfileFamily::Mass => {
                let profile = self.make_mass(name)?;
                (profile.param_names(), profile.pixel_param())
            }
            ProfileFamily::Light => {
                let profile = self.make_light(name)?;
                (profile.param_names(), profile.pixel_param())
            }
        })
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
