use crate::error::EvaluationError;
use crate::grid::{GridProvider, PixelAxes};
use crate::instrument::NoiseProvider;
use crate::lens_image::LensImage;
use crate::linear::{derivative_operator, SparseMatrix};
use crate::model::Selection;
use crate::params::{ModelKwargs, ProfileKwargs};
use crate::profiles::pixel_interp::{gradient, RegularGrid};

use ndarray::{Array1, Array2, Axis};

/// Linear response of the lensed image to perturbations of a potential on the data grid
#[derive(Clone, Debug, PartialEq)]
pub struct DsdOperator {
    /// `-(diag(dS/dx) D_x + diag(dS/dy) D_y)`, square in the number of data pixels
    pub matrix: SparseMatrix,
    /// Source gradient along `x` at the ray-shot data pixels, in flux units
    pub grad_s_x: Array2<f64>,
    pub grad_s_y: Array2<f64>,
}

fn signed_step(coords: impl Iterator<Item = f64>, default: f64) -> f64 {
    let first_two: Vec<f64> = coords.take(2).collect();
    match first_two[..] {
        [a, b] => b - a,
        _ => default,
    }
}

/// Build the DsD operator of a smooth lens model
///
/// The source is evaluated unlensed on the numerics grid, differentiated there, and the
/// gradients are interpolated at the source-plane positions of the data pixels.
pub fn build_dsd_operator<G, N>(
    image: &LensImage<G, N>,
    kwargs: &ModelKwargs<f64>,
) -> Result<DsdOperator, EvaluationError>
where
    G: GridProvider,
    N: NoiseProvider,
{
    let grid = image.grid();
    let (ny, nx) = grid.num_pixel_axes();
    let pixel_width = grid.pixel_width();
    let numerics = image.numerics();
    let factor = numerics.supersampling_factor();
    let (ny_num, nx_num) = (ny * factor, nx * factor);

    let (x_num, y_num) = numerics.coordinates_evaluate();
    let axes = PixelAxes::new(
        x_num.iter().take(nx_num).copied().collect(),
        y_num.iter().step_by(nx_num).copied().collect(),
    );
    let source = image
        .source_model()
        .surface_brightness(x_num.view(), y_num.view(), &kwargs.source, &Selection::All)?
        .into_shape_with_order((ny_num, nx_num))
        .map_err(|_| EvaluationError::Shape {
            expected: vec![ny_num, nx_num],
            actual: vec![x_num.len()],
        })?;
    let sub_width = pixel_width / factor as f64;
    let grad_x_num = gradient(source.view(), signed_step(axes.x.iter().copied(), sub_width), Axis(1));
    let grad_y_num = gradient(source.view(), signed_step(axes.y.iter().copied(), sub_width), Axis(0));

    let (x_grid, y_grid) = grid.pixel_coordinates();
    let x_data: Array1<f64> = x_grid.iter().copied().collect();
    let y_data: Array1<f64> = y_grid.iter().copied().collect();
    let (x_src, y_src) = image.mass_model().ray_shooting(
        x_data.view(),
        y_data.view(),
        &kwargs.lens,
        &Selection::All,
    )?;

    let interpolator = RegularGrid::resolve(&ProfileKwargs::<f64>::new(), Some(&axes))?;
    let area = pixel_width * pixel_width;
    let grad_s_x = interpolator.bilinear(grad_x_num.view(), x_src.view(), y_src.view())? * area;
    let grad_s_y = interpolator.bilinear(grad_y_num.view(), x_src.view(), y_src.view())? * area;

    let step_x = signed_step(x_grid.row(0).iter().copied(), pixel_width);
    let step_y = signed_step(y_grid.column(0).iter().copied(), pixel_width);
    let d_x = derivative_operator((ny, nx), step_x, Axis(1))?;
    let d_y = derivative_operator((ny, nx), step_y, Axis(0))?;
    let matrix = -(d_x
        .scale_rows(grad_s_x.view())?
        .add(&d_y.scale_rows(grad_s_y.view())?)?);

    let to_image = |flat: Array1<f64>| {
        flat.into_shape_with_order((ny, nx))
            .map_err(|_| EvaluationError::Shape {
                expected: vec![ny, nx],
                actual: vec![ny * nx],
            })
    };
    Ok(DsdOperator {
        matrix,
        grad_s_x: to_image(grad_s_x)?,
        grad_s_y: to_image(grad_s_y)?,
    })
}
