use crate::error::EvaluationError;
use crate::linear::SparseMatrix;

use ndarray::{Array1, ArrayView1};

/// Bilinear resampling operator from a square grid to arbitrary positions
#[derive(Clone, Debug, PartialEq)]
pub struct BilinearInterpolation {
    /// `(num_out, num_in)` weights, empty rows for positions outside the input grid
    pub matrix: SparseMatrix,
    /// Column sums clipped from below at one
    pub norm: Array1<f64>,
    /// Output positions strictly inside the input grid
    pub selection: Array1<bool>,
    /// Number of negative weights after renormalization
    pub num_negative: usize,
}

/// Sign as a step, zero for zero
fn sign(v: f64) -> isize {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// One axis of the input grid: node coordinates, bin edges and orientation
struct BinnedAxis {
    coords: Vec<f64>,
    lower: f64,
    upper: f64,
    dir: isize,
}

impl BinnedAxis {
    fn new(coords: Vec<f64>, half_pixel: f64) -> Self {
        let dir = if coords[0] > coords[coords.len() - 1] { -1 } else { 1 };
        let lower = coords[0] - dir as f64 * half_pixel;
        let upper = coords[coords.len() - 1] + dir as f64 * half_pixel;
        Self {
            coords,
            lower,
            upper,
            dir,
        }
    }

    fn contains(&self, v: f64) -> bool {
        let (min, max) = if self.dir > 0 {
            (self.lower, self.upper)
        } else {
            (self.upper, self.lower)
        };
        v > min && v < max
    }

    fn bin(&self, v: f64) -> usize {
        let n = self.coords.len();
        let t = (v - self.lower) / (self.upper - self.lower) * n as f64;
        (t.floor().max(0.0) as usize).min(n - 1)
    }

    fn neighbour(&self, index: usize, delta: f64) -> Option<usize> {
        let k = index as isize + self.dir * sign(delta);
        (0..self.coords.len() as isize)
            .contains(&k)
            .then_some(k as usize)
    }
}

/// Operator mapping values on the square `(x_in, y_in)` grid to the `(x_out, y_out)` positions
///
/// Input coordinates are row-major flattened, `x` varying fastest. Every output position inside
/// the grid takes the four nearest nodes with weights `(1 - |dx|)(1 - |dy|)` in pixel units,
/// renormalized over the neighbours that exist, unless they sum to zero. Negative weights only
/// show up for non-uniform grids; they are always counted and reported with a warning when
/// `warning` is set.
pub fn build_bilinear_interpolation(
    x_in: ArrayView1<f64>,
    y_in: ArrayView1<f64>,
    x_out: ArrayView1<f64>,
    y_out: ArrayView1<f64>,
    warning: bool,
) -> Result<BilinearInterpolation, EvaluationError> {
    let num_in = x_in.len();
    let num_pix = (num_in as f64).sqrt().round() as usize;
    if num_pix < 2 || num_pix * num_pix != num_in || y_in.len() != num_in {
        return Err(EvaluationError::Shape {
            expected: vec![num_pix.max(2) * num_pix.max(2)],
            actual: vec![x_in.len(), y_in.len()],
        });
    }
    if x_out.len() != y_out.len() {
        return Err(EvaluationError::Shape {
            expected: vec![x_out.len()],
            actual: vec![y_out.len()],
        });
    }

    let delta_pix = (x_in[0] - x_in[1]).abs();
    let half_pix = 0.5 * delta_pix;
    let x_axis = BinnedAxis::new(x_in.iter().take(num_pix).copied().collect(), half_pix);
    let y_axis = BinnedAxis::new(y_in.iter().step_by(num_pix).copied().collect(), half_pix);

    let selection: Array1<bool> = x_out
        .iter()
        .zip(&y_out)
        .map(|(&x, &y)| x_axis.contains(x) && y_axis.contains(y))
        .collect();

    let mut triplets = vec![];
    let mut num_negative = 0;
    for (row, ((&x, &y), _)) in x_out
        .iter()
        .zip(&y_out)
        .zip(&selection)
        .enumerate()
        .filter(|(_, (_, selected))| **selected)
    {
        let ix = x_axis.bin(x);
        let iy = y_axis.bin(y);
        let dx = x - x_axis.coords[ix];
        let dy = y - y_axis.coords[iy];
        let ix2 = x_axis.neighbour(ix, dx);
        let iy3 = y_axis.neighbour(iy, dy);
        let neighbours = [
            Some((ix, iy)),
            ix2.map(|i| (i, iy)),
            iy3.map(|j| (ix, j)),
            ix2.zip(iy3),
        ];
        let weights: Vec<(usize, f64)> = neighbours
            .into_iter()
            .flatten()
            .map(|(i, j)| {
                let col = i + j * num_pix;
                let dist_x = (x - x_in[col]) / delta_pix;
                let dist_y = (y - y_in[col]) / delta_pix;
                (col, (1.0 - dist_x.abs()) * (1.0 - dist_y.abs()))
            })
            .collect();
        let norm: f64 = weights.iter().map(|(_, w)| w).sum();
        // weights of a non-uniform grid can cancel out, these stay unnormalized
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for (col, w) in weights {
            let w = w / norm;
            if w < 0.0 {
                num_negative += 1;
            }
            triplets.push((row, col, w));
        }
    }
    if warning && num_negative > 0 {
        log::warn!("{num_negative} bilinear interpolation weights are negative");
    }

    let matrix = SparseMatrix::from_triplets((x_out.len(), num_in), triplets)?;
    let norm = matrix.column_sums().mapv(|s| s.max(1.0));
    Ok(BilinearInterpolation {
        matrix,
        norm,
        selection,
        num_negative,
    })
}
