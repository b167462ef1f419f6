use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::grid::PixelAxes;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::light::LightProfileTrait;
use crate::profiles::pixel_interp::RegularGrid;
use crate::profiles::ProfileTrait;

use ndarray::{Array1, ArrayView1};
use std::sync::Arc;

/// Surface brightness given on a regular pixel grid
///
/// The `image` block has shape `(num_y, num_x)` and is bilinearly interpolated; the profile
/// vanishes outside the grid. Pixel geometry comes from `x_coords`/`y_coords` when present,
/// otherwise from the attached model grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelatedLight {
    axes: Option<Arc<PixelAxes>>,
}

impl PixelatedLight {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileTrait for PixelatedLight {
    fn param_names(&self) -> &'static [&'static str] {
        &["image", "x_coords", "y_coords"]
    }

    fn pixel_param(&self) -> Option<&'static str> {
        Some("image")
    }

    fn pixel_axes(&self) -> Option<&PixelAxes> {
        self.axes.as_deref()
    }

    fn set_pixel_axes(&mut self, axes: Arc<PixelAxes>) -> bool {
        self.axes = Some(axes);
        true
    }
}

impl LightProfileTrait for PixelatedLight {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let grid = RegularGrid::resolve(kwargs, self.axes.as_deref())?;
        grid.bilinear(kwargs.grid("image")?, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn explicit_coordinates_win_over_attached_grid() {
        let mut profile = PixelatedLight::new();
        profile.set_pixel_axes(Arc::new(PixelAxes::new(array![-10.0, 10.0], array![-10.0, 10.0])));
        let mut kwargs = ProfileKwargs::new();
        kwargs.insert("image".into(), array![[1.0, 2.0], [3.0, 4.0]].into());
        kwargs.insert("x_coords".into(), array![0.0, 1.0].into());
        kwargs.insert("y_coords".into(), array![0.0, 1.0].into());
        let flux = profile
            .function(array![0.5, 1.0].view(), array![0.5, 1.0].view(), &kwargs)
            .unwrap();
        assert_abs_diff_eq!(flux, array![2.5, 4.0], epsilon = 1e-12);
    }

    #[test]
    fn wrong_block_shape() {
        let mut kwargs = ProfileKwargs::new();
        kwargs.insert("image".into(), array![[1.0, 2.0, 3.0]].into());
        kwargs.insert("x_coords".into(), array![0.0, 1.0].into());
        kwargs.insert("y_coords".into(), array![0.0, 1.0].into());
        let x = array![0.0];
        assert!(matches!(
            PixelatedLight::new().function(x.view(), x.view(), &kwargs),
            Err(EvaluationError::Shape { .. })
        ));
    }
}
