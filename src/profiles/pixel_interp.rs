use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::grid::PixelAxes;
use crate::params::{KwargsExt, ProfileKwargs};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Origin and signed step of a regular axis
#[derive(Clone, Copy, Debug)]
struct RegularAxis {
    start: f64,
    step: f64,
    len: usize,
}

impl RegularAxis {
    fn new(coords: impl Iterator<Item = f64>) -> Result<Self, EvaluationError> {
        let coords: Vec<f64> = coords.collect();
        if coords.len() < 2 {
            return Err(EvaluationError::Shape {
                expected: vec![2],
                actual: vec![coords.len()],
            });
        }
        Ok(Self {
            start: coords[0],
            step: coords[1] - coords[0],
            len: coords.len(),
        })
    }

    /// Lower node index and fractional offset, `None` outside the axis
    fn locate<T: Float>(&self, x: T) -> Option<(usize, T)> {
        let frac = (x - T::lit(self.start)) / T::lit(self.step);
        let f = frac.value();
        let last = (self.len - 1) as f64;
        if !(0.0..=last).contains(&f) {
            return None;
        }
        let lower = (f.floor() as usize).min(self.len - 2);
        Some((lower, frac - T::lit(lower as f64)))
    }
}

/// Regular pixel grid geometry used by pixelated profiles
#[derive(Clone, Copy, Debug)]
pub(crate) struct RegularGrid {
    x: RegularAxis,
    y: RegularAxis,
}

impl RegularGrid {
    /// Geometry from `x_coords`/`y_coords` kwargs, falling back to attached axes
    pub(crate) fn resolve<T: Float>(
        kwargs: &ProfileKwargs<T>,
        attached: Option<&PixelAxes>,
    ) -> Result<Self, EvaluationError> {
        match (kwargs.axis("x_coords"), kwargs.axis("y_coords")) {
            (Ok(x), Ok(y)) => Ok(Self {
                x: RegularAxis::new(x.iter().map(|v| v.value()))?,
                y: RegularAxis::new(y.iter().map(|v| v.value()))?,
            }),
            _ => {
                let axes = attached.ok_or(EvaluationError::PixelGridNotSet)?;
                Ok(Self {
                    x: RegularAxis::new(axes.x.iter().copied())?,
                    y: RegularAxis::new(axes.y.iter().copied())?,
                })
            }
        }
    }

    pub(crate) fn shape(&self) -> (usize, usize) {
        (self.y.len, self.x.len)
    }

    pub(crate) fn steps(&self) -> (f64, f64) {
        (self.x.step, self.y.step)
    }

    pub(crate) fn check_shape<T>(&self, values: &ArrayView2<T>) -> Result<(), EvaluationError> {
        let (ny, nx) = self.shape();
        if values.dim() == (ny, nx) {
            Ok(())
        } else {
            Err(EvaluationError::Shape {
                expected: vec![ny, nx],
                actual: values.shape().to_vec(),
            })
        }
    }

    /// Bilinear interpolation of `values`, zero outside the grid
    pub(crate) fn bilinear<T: Float>(
        &self,
        values: ArrayView2<T>,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        self.check_shape(&values)?;
        if x.len() != y.len() {
            return Err(EvaluationError::Shape {
                expected: vec![x.len()],
                actual: vec![y.len()],
            });
        }
        Ok(Zip::from(&x).and(&y).map_collect(|&x, &y| {
            match (self.x.locate(x), self.y.locate(y)) {
                (Some((i, t)), Some((j, u))) => {
                    let one = T::one();
                    (one - t) * (one - u) * values[[j, i]]
                        + t * (one - u) * values[[j, i + 1]]
                        + (one - t) * u * values[[j + 1, i]]
                        + t * u * values[[j + 1, i + 1]]
                }
                _ => T::zero(),
            }
        }))
    }
}

/// First derivative along `axis`: central differences inside, one-sided at the edges
pub(crate) fn gradient<T: Float>(values: ArrayView2<T>, step: f64, axis: Axis) -> Array2<T> {
    let n = values.len_of(axis);
    let mut out = Array2::zeros(values.raw_dim());
    if n < 2 {
        return out;
    }
    let step = T::lit(step);
    let two_step = T::two() * step;
    for k in 0..n {
        let (lo, hi, denom) = if k == 0 {
            (0, 1, step)
        } else if k == n - 1 {
            (n - 2, n - 1, step)
        } else {
            (k - 1, k + 1, two_step)
        };
        let diff = &values.index_axis(axis, hi) - &values.index_axis(axis, lo);
        out.index_axis_mut(axis, k)
            .assign(&diff.mapv(|d| d / denom));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn kwargs_with_axes(x: Array1<f64>, y: Array1<f64>) -> ProfileKwargs<f64> {
        let mut kwargs = ProfileKwargs::new();
        kwargs.insert("x_coords".into(), ParamValue::Axis(x));
        kwargs.insert("y_coords".into(), ParamValue::Axis(y));
        kwargs
    }

    #[test]
    fn bilinear_reproduces_nodes_and_planes() {
        let kwargs = kwargs_with_axes(array![0.0, 1.0, 2.0], array![0.0, 1.0]);
        let grid = RegularGrid::resolve(&kwargs, None).unwrap();
        // plane z = x + 10 y
        let values = array![[0.0, 1.0, 2.0], [10.0, 11.0, 12.0]];
        let x = array![0.0, 2.0, 0.5, 1.25, 3.0];
        let y = array![0.0, 1.0, 0.5, 0.75, 0.5];
        let z = grid.bilinear(values.view(), x.view(), y.view()).unwrap();
        assert_abs_diff_eq!(z, array![0.0, 12.0, 5.5, 8.75, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn attached_axes_are_used_without_kwargs() {
        let axes = PixelAxes::new(array![-1.0, 1.0], array![-1.0, 1.0]);
        assert!(matches!(
            RegularGrid::resolve::<f64>(&ProfileKwargs::new(), None),
            Err(EvaluationError::PixelGridNotSet)
        ));
        let grid = RegularGrid::resolve::<f64>(&ProfileKwargs::new(), Some(&axes)).unwrap();
        assert_eq!(grid.shape(), (2, 2));
    }

    #[test]
    fn decreasing_axis() {
        let kwargs = kwargs_with_axes(array![1.0, 0.0], array![0.0, 1.0]);
        let grid = RegularGrid::resolve(&kwargs, None).unwrap();
        let values = array![[1.0, 0.0], [1.0, 0.0]];
        let z = grid
            .bilinear(values.view(), array![0.25].view(), array![0.5].view())
            .unwrap();
        assert_abs_diff_eq!(z[0], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn gradient_of_plane_is_constant() {
        let values = array![[0.0, 1.0, 2.0], [10.0, 11.0, 12.0], [20.0, 21.0, 22.0]];
        let gx = gradient(values.view(), 0.5, Axis(1));
        let gy = gradient(values.view(), 2.0, Axis(0));
        assert_abs_diff_eq!(gx, Array2::from_elem((3, 3), 2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(gy, Array2::from_elem((3, 3), 5.0), epsilon = 1e-12);
    }
}
