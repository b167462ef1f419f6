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
Point mass

$$
\psi(x, y) = \theta\_E^2 \ln r, \quad r = \sqrt{(x - x\_c)^2 + (y - y\_c)^2}.
$$
The radius is floored at $10^{-6}$.

- Parameters: `theta_E`, `center_x`, `center_y`
";
}

const MIN_RADIUS: f64 = 1e-6;

#[doc = DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointMass {}

fn parameters<T: Float>(kwargs: &ProfileKwargs<T>) -> Result<(T, T, T), EvaluationError> {
    let theta_e: T = kwargs.scalar("theta_E")?;
    Ok((
        theta_e * theta_e,
        kwargs.scalar("center_x")?,
        kwargs.scalar("center_y")?,
    ))
}

impl ProfileTrait for PointMass {
    fn param_names(&self) -> &'static [&'static str] {
        &["theta_E", "center_x", "center_y"]
    }
}

impl MassProfileTrait for PointMass {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let (theta_e2, cx, cy) = parameters(kwargs)?;
        map_xy(x, y, |x, y| {
            theta_e2 * (x - cx).hypot(y - cy).max(T::lit(MIN_RADIUS)).ln()
        })
    }

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        let (theta_e2, cx, cy) = parameters(kwargs)?;
        map_xy2(x, y, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            let r2 = (dx * dx + dy * dy).max(T::lit(MIN_RADIUS * MIN_RADIUS));
            (theta_e2 * dx / r2, theta_e2 * dy / r2)
        })
    }

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError> {
        let (theta_e2, cx, cy) = parameters(kwargs)?;
        let (f_xx, f_yy, f_xy) = map_xy3(x, y, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            let r2 = (dx * dx + dy * dy).max(T::lit(MIN_RADIUS * MIN_RADIUS));
            let r4 = r2 * r2;
            let f_xx = theta_e2 * (dy * dy - dx * dx) / r4;
            (f_xx, -f_xx, -T::two() * theta_e2 * dx * dy / r4)
        })?;
        Ok(Hessian { f_xx, f_yy, f_xy })
    }
}
