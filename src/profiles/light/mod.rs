use crate::grid::PixelAxes;
use std::sync::Arc;
use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::ProfileKwargs;
use crate::profiles::ProfileTrait;

use enum_dispatch::enum_dispatch;
use ndarray::{Array1, ArrayView1};

mod gaussian;
pub use gaussian::Gaussian;

mod pixelated;
pub use pixelated::PixelatedLight;

mod sersic;
pub use sersic::{Sersic, SersicElliptic};

mod uniform;
pub use uniform::Uniform;

/// Surface brightness of a light distribution
#[enum_dispatch]
pub trait LightProfileTrait: ProfileTrait {
    /// Surface brightness at every `(x, y)` pair
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError>;
}

/// Light profile, see the variant types for the parameters of each
#[enum_dispatch(ProfileTrait, LightProfileTrait)]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum LightProfile {
    Uniform(Uniform),
    Gaussian(Gaussian),
    Sersic(Sersic),
    SersicElliptic(SersicElliptic),
    Pixelated(PixelatedLight),
}
