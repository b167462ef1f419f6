use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::light::LightProfileTrait;
use crate::profiles::pointwise::map_xy;
use crate::profiles::ProfileTrait;

use ndarray::{Array1, ArrayView1};

/// Spatially constant surface brightness `amp`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Uniform {}

impl ProfileTrait for Uniform {
    fn param_names(&self) -> &'static [&'static str] {
        &["amp"]
    }
}

impl LightProfileTrait for Uniform {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let amp = kwargs.scalar("amp")?;
        map_xy(x, y, |_, _| amp)
    }
}
