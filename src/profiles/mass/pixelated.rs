use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::grid::PixelAxes;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::mass::{Hessian, MassProfileTrait};
use crate::profiles::pixel_interp::{gradient, RegularGrid};
use crate::profiles::ProfileTrait;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1, Axis};
use std::sync::Arc;

macro_const! {
    const DOC: &str = r"
Lensing potential defined on a regular pixel grid

The potential is bilinearly interpolated between pixel centers and vanishes outside the grid.
Deflection angles interpolate the grid gradient (central differences inside, one-sided at the
edges), the hessian interpolates the second differences.

- Parameters: `pixels` (2D block of shape `(num_y, num_x)`), `x_coords`, `y_coords`
";
}

#[doc = DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelatedPotential {
    axes: Option<Arc<PixelAxes>>,
}

impl PixelatedPotential {
    pub fn new() -> Self {
        Self::default()
    }

    fn grid<T: Float>(&self, kwargs: &ProfileKwargs<T>) -> Result<RegularGrid, EvaluationError> {
        RegularGrid::resolve(kwargs, self.axes.as_deref())
    }
}

impl ProfileTrait for PixelatedPotential {
    fn param_names(&self) -> &'static [&'static str] {
        &["pixels", "x_coords", "y_coords"]
    }

    fn pixel_param(&self) -> Option<&'static str> {
        Some("pixels")
    }

    fn pixel_axes(&self) -> Option<&PixelAxes> {
        self.axes.as_deref()
    }

    fn set_pixel_axes(&mut self, axes: Arc<PixelAxes>) -> bool {
        self.axes = Some(axes);
        true
    }
}

impl MassProfileTrait for PixelatedPotential {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let grid = self.grid(kwargs)?;
        grid.bilinear(kwargs.grid("pixels")?, x, y)
    }

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        let grid = self.grid(kwargs)?;
        let pixels = kwargs.grid("pixels")?;
        grid.check_shape(&pixels)?;
        let (dx, dy) = grid.steps();
        let gx = gradient(pixels, dx, Axis(1));
        let gy = gradient(pixels, dy, Axis(0));
        Ok((
            grid.bilinear(gx.view(), x, y)?,
            grid.bilinear(gy.view(), x, y)?,
        ))
    }

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError> {
        let grid = self.grid(kwargs)?;
        let pixels = kwargs.grid("pixels")?;
        grid.check_shape(&pixels)?;
        let (dx, dy) = grid.steps();
        let gx = gradient(pixels, dx, Axis(1));
        let gy = gradient(pixels, dy, Axis(0));
        let gxx = gradient(gx.view(), dx, Axis(1));
        let gyy = gradient(gy.view(), dy, Axis(0));
        let gxy = gradient(gx.view(), dy, Axis(0));
        Ok(Hessian {
            f_xx: grid.bilinear(gxx.view(), x, y)?,
            f_yy: grid.bilinear(gyy.view(), x, y)?,
            f_xy: grid.bilinear(gxy.view(), x, y)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn quadratic_potential() -> (PixelatedPotential, ProfileKwargs<f64>) {
        let axis = Array1::<f64>::linspace(-2.0, 2.0, 21);
        // psi = 0.5 * (x^2 + y^2), rows along y
        let pixels = Array2::from_shape_fn((21, 21), |(i, j)| 0.5 * (axis[j].powi(2) + axis[i].powi(2)));
        let mut kwargs = ProfileKwargs::new();
        kwargs.insert("pixels".into(), ParamValue::Grid(pixels));
        let mut profile = PixelatedPotential::new();
        assert!(profile.set_pixel_axes(Arc::new(PixelAxes::new(axis.clone(), axis))));
        (profile, kwargs)
    }

    #[test]
    fn deflection_of_quadratic_potential() {
        let (profile, kwargs) = quadratic_potential();
        let x = array![0.5, -1.0, 0.3];
        let y = array![0.2, 1.0, -0.6];
        let (ax, ay) = profile.derivatives(x.view(), y.view(), &kwargs).unwrap();
        assert_abs_diff_eq!(ax, x, epsilon = 1e-10);
        assert_abs_diff_eq!(ay, y, epsilon = 1e-10);
        let h = profile.hessian(x.view(), y.view(), &kwargs).unwrap();
        assert_abs_diff_eq!(h.f_xx, Array1::ones(3), epsilon = 1e-10);
        assert_abs_diff_eq!(h.f_xy, Array1::zeros(3), epsilon = 1e-10);
    }

    #[test]
    fn zero_outside_grid() {
        let (profile, kwargs) = quadratic_potential();
        let x = array![3.0];
        let y = array![0.0];
        assert_abs_diff_eq!(profile.function(x.view(), y.view(), &kwargs).unwrap()[0], 0.0);
    }

    #[test]
    fn no_geometry() {
        let (_, kwargs) = quadratic_potential();
        let x = array![0.0];
        assert_eq!(
            PixelatedPotential::new().function(x.view(), x.view(), &kwargs),
            Err(EvaluationError::PixelGridNotSet)
        );
    }
}
