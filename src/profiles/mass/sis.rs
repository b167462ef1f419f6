use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::mass::{Hessian, MassProfileTrait};
use crate::profiles::pointwise::{map_xy, map_xy2, map_xy3};
use crate::profiles::ProfileTrait;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};

macro_const! {
    const DOC: &str = r"
Singular isothermal sphere

$$
\psi(x, y) = \theta\_E \sqrt{x'^2 + y'^2},
$$
where $x' = x - x\_c$, $y' = y - y\_c$. The radius is floored at $10^{-6}$ to keep the
deflection finite at the center.

- Parameters: `theta_E`, `center_x`, `center_y`
";
}

const MIN_RADIUS: f64 = 1e-6;

#[doc = DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sis {}

fn parameters<T: Float>(kwargs: &ProfileKwargs<T>) -> Result<(T, T, T), EvaluationError> {
    Ok((
        kwargs.scalar("theta_E")?,
        kwargs.scalar("center_x")?,
        kwargs.scalar("center_y")?,
    ))
}

fn radius<T: Float>(x: T, y: T) -> T {
    x.hypot(y).max(T::lit(MIN_RADIUS))
}

impl ProfileTrait for Sis {
    fn param_names(&self) -> &'static [&'static str] {
        &["theta_E", "center_x", "center_y"]
    }
}

impl MassProfileTrait for Sis {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let (theta_e, cx, cy) = parameters(kwargs)?;
        map_xy(x, y, |x, y| theta_e * (x - cx).hypot(y - cy))
    }

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        let (theta_e, cx, cy) = parameters(kwargs)?;
        map_xy2(x, y, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            let r = radius(dx, dy);
            (theta_e * dx / r, theta_e * dy / r)
        })
    }

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError> {
        let (theta_e, cx, cy) = parameters(kwargs)?;
        let (f_xx, f_yy, f_xy) = map_xy3(x, y, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            let r = radius(dx, dy);
            let r3 = r * r * r;
            (
                theta_e * dy * dy / r3,
                theta_e * dx * dx / r3,
                -theta_e * dx * dy / r3,
            )
        })?;
        Ok(Hessian { f_xx, f_yy, f_xy })
    }
}
