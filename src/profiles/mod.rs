//! Lens mass and light profiles behind one evaluation contract.
//!
//! Every profile exposes its declared parameter names through [`ProfileTrait`]; mass profiles
//! add potential, deflection and hessian evaluation ([`MassProfileTrait`]), light profiles add
//! surface brightness ([`LightProfileTrait`]). Profiles are looked up by identifier in a
//! [`ProfileRegistry`].
//!
//! Pixelated profiles are the only ones with state: they may hold the pixel axes of an
//! externally created model grid. The grid is shared, the profile never resizes it.

use crate::grid::PixelAxes;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of profile an identifier refers to
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProfileFamily {
    Mass,
    Light,
}

impl fmt::Display for ProfileFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mass => f.write_str("mass"),
            Self::Light => f.write_str("light"),
        }
    }
}

/// Properties shared by all profiles
#[enum_dispatch]
pub trait ProfileTrait {
    /// Declared parameter names, in flat-vector order
    fn param_names(&self) -> &'static [&'static str];

    /// Name of the parameter holding a 2D pixel block, pixelated profiles only
    fn pixel_param(&self) -> Option<&'static str> {
        None
    }

    fn is_pixelated(&self) -> bool {
        self.pixel_param().is_some()
    }

    /// Axes of the attached pixel grid
    fn pixel_axes(&self) -> Option<&PixelAxes> {
        None
    }

    /// Attach pixel axes, returns `false` if the profile is not pixelated
    fn set_pixel_axes(&mut self, _axes: Arc<PixelAxes>) -> bool {
        false
    }
}

/// Names of the coordinate arrays every pixelated profile requires as fixed parameters
pub const PIXEL_COORDINATE_PARAMS: [&str; 2] = ["x_coords", "y_coords"];

pub mod light;
pub use light::{LightProfile, LightProfileTrait};

pub mod mass;
pub use mass::{Hessian, MassProfile, MassProfileTrait};

pub(crate) mod pointwise;

pub(crate) mod pixel_interp;

pub mod registry;
pub use registry::{LightFactory, MassFactory, ProfileRegistry};
