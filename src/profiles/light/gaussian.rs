use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::light::LightProfileTrait;
use crate::profiles::pointwise::map_xy;
use crate::profiles::ProfileTrait;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};
use std::f64::consts::TAU;

macro_const! {
    const DOC: &str = r"
Circular Gaussian normalized to total flux `amp`

$$
I(x, y) = \frac{A}{2\pi\sigma^2} \exp\left(-\frac{(x - x\_c)^2 + (y - y\_c)^2}{2\sigma^2}\right).
$$

- Parameters: `amp`, `sigma`, `center_x`, `center_y`
";
}

#[doc = DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gaussian {}

impl ProfileTrait for Gaussian {
    fn param_names(&self) -> &'static [&'static str] {
        &["amp", "sigma", "center_x", "center_y"]
    }
}

impl LightProfileTrait for Gaussian {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let amp: T = kwargs.scalar("amp")?;
        let sigma: T = kwargs.scalar("sigma")?;
        let cx = kwargs.scalar("center_x")?;
        let cy = kwargs.scalar("center_y")?;
        let sigma2 = sigma * sigma;
        let norm = amp / (T::lit(TAU) * sigma2);
        map_xy(x, y, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            norm * (-(dx * dx + dy * dy) / (T::two() * sigma2)).exp()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn total_flux_is_amplitude() {
        let kwargs: ProfileKwargs<f64> = [("amp", 3.0), ("sigma", 0.3), ("center_x", 0.1), ("center_y", -0.2)]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.into()))
            .collect();
        let step = 0.02;
        let axis = Array1::from_shape_fn(200, |i| -2.0 + step * (i as f64 + 0.5));
        let x = Array2::from_shape_fn((200, 200), |(_, j)| axis[j]).into_shape_with_order(40_000).unwrap();
        let y = Array2::from_shape_fn((200, 200), |(i, _)| axis[i]).into_shape_with_order(40_000).unwrap();
        let flux = Gaussian {}.function(x.view(), y.view(), &kwargs).unwrap();
        assert_relative_eq!(flux.sum() * step * step, 3.0, max_relative = 1e-6);
    }
}
