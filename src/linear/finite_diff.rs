use crate::error::EvaluationError;
use crate::linear::SparseMatrix;

use ndarray::Axis;

/// Stencil `(offset, weight)` of the first derivative at node `k` of `n`, unit step
fn stencil(k: usize, n: usize) -> Vec<(isize, f64)> {
    match n {
        0 | 1 => vec![],
        2 => vec![(-(k as isize), -1.0), (1 - k as isize, 1.0)],
        _ if k == 0 => vec![(0, -1.5), (1, 2.0), (2, -0.5)],
        _ if k == n - 1 => vec![(-2, 0.5), (-1, -2.0), (0, 1.5)],
        _ => vec![(-1, -0.5), (1, 0.5)],
    }
}

/// First derivative along `axis` of a row-major flattened `(num_y, num_x)` grid
///
/// Second-order accurate: central differences inside, three-point one-sided differences at the
/// edges. Axes shorter than three nodes fall back to a two-point difference.
pub fn derivative_operator(
    shape: (usize, usize),
    step: f64,
    axis: Axis,
) -> Result<SparseMatrix, EvaluationError> {
    let (ny, nx) = shape;
    let n = ny * nx;
    let (len, stride) = match axis.index() {
        0 => (ny, nx),
        1 => (nx, 1),
        _ => {
            return Err(EvaluationError::Shape {
                expected: vec![ny, nx],
                actual: vec![axis.index()],
            })
        }
    };
    let triplets = (0..n).flat_map(|row| {
        let k = if stride == 1 { row % nx } else { row / nx };
        stencil(k, len).into_iter().map(move |(offset, weight)| {
            let col = row as isize + offset * stride as isize;
            (row, col as usize, weight / step)
        })
    });
    SparseMatrix::from_triplets((n, n), triplets)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn quadratic_is_exact() {
        let (ny, nx) = (4, 5);
        let step = 0.5;
        // f = x^2 + 3 y with x = j * step, y = i * step
        let f = Array1::from_shape_fn(ny * nx, |k| {
            let (i, j) = (k / nx, k % nx);
            (j as f64 * step).powi(2) + 3.0 * i as f64 * step
        });
        let dx = derivative_operator((ny, nx), step, Axis(1)).unwrap();
        let dy = derivative_operator((ny, nx), step, Axis(0)).unwrap();
        let dfdx = dx.dot(f.view()).unwrap();
        let dfdy = dy.dot(f.view()).unwrap();
        for k in 0..ny * nx {
            let x = (k % nx) as f64 * step;
            assert_abs_diff_eq!(dfdx[k], 2.0 * x, epsilon = 1e-12);
            assert_abs_diff_eq!(dfdy[k], 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rows_sum_to_zero() {
        let d = derivative_operator((3, 2), 1.0, Axis(1)).unwrap();
        assert_eq!(d.shape(), (6, 6));
        for s in d.row_sums() {
            assert_abs_diff_eq!(s, 0.0, epsilon = 1e-15);
        }
        assert!(derivative_operator((3, 2), 1.0, Axis(2)).is_err());
    }
}
