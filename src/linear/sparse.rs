use crate::error::EvaluationError;
use crate::float_trait::Float;

use ndarray::{Array1, Array2, ArrayView1};
use std::collections::BTreeMap;
use std::ops::Neg;

/// Sparse real matrix in coordinate format
///
/// Entries are kept sorted row-major with no duplicated `(row, column)` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    shape: (usize, usize),
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            shape,
            rows: vec![],
            cols: vec![],
            values: vec![],
        }
    }

    /// Matrix from `(row, column, value)` triplets, duplicated positions are summed
    pub fn from_triplets(
        shape: (usize, usize),
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, EvaluationError> {
        let mut entries = BTreeMap::new();
        for (row, col, value) in triplets {
            if row >= shape.0 || col >= shape.1 {
                return Err(EvaluationError::Shape {
                    expected: vec![shape.0, shape.1],
                    actual: vec![row + 1, col + 1],
                });
            }
            *entries.entry((row, col)).or_insert(0.0) += value;
        }
        let mut matrix = Self::zeros(shape);
        for ((row, col), value) in entries {
            matrix.rows.push(row);
            matrix.cols.push(col);
            matrix.values.push(value);
        }
        Ok(matrix)
    }

    /// Square matrix with `diagonal` on its main diagonal
    pub fn diagonal(diagonal: ArrayView1<f64>) -> Self {
        let n = diagonal.len();
        let mut matrix = Self::zeros((n, n));
        matrix.rows = (0..n).collect();
        matrix.cols = (0..n).collect();
        matrix.values = diagonal.to_vec();
        matrix
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.triplets()
            .find(|&(r, c, _)| r == row && c == col)
            .map_or(0.0, |(_, _, v)| v)
    }

    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Matrix-vector product
    pub fn dot<T: Float>(&self, x: ArrayView1<T>) -> Result<Array1<T>, EvaluationError> {
        if x.len() != self.shape.1 {
            return Err(EvaluationError::Shape {
                expected: vec![self.shape.1],
                actual: vec![x.len()],
            });
        }
        let mut out = Array1::zeros(self.shape.0);
        for (row, col, value) in self.triplets() {
            out[row] += T::lit(value) * x[col];
        }
        Ok(out)
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros(self.shape);
        for (row, col, value) in self.triplets() {
            dense[[row, col]] += value;
        }
        dense
    }

    /// `diag(factors) * self`
    pub fn scale_rows(&self, factors: ArrayView1<f64>) -> Result<Self, EvaluationError> {
        if factors.len() != self.shape.0 {
            return Err(EvaluationError::Shape {
                expected: vec![self.shape.0],
                actual: vec![factors.len()],
            });
        }
        let mut scaled = self.clone();
        for (value, &row) in scaled.values.iter_mut().zip(&self.rows) {
            *value *= factors[row];
        }
        Ok(scaled)
    }

    pub fn add(&self, other: &Self) -> Result<Self, EvaluationError> {
        if self.shape != other.shape {
            return Err(EvaluationError::Shape {
                expected: vec![self.shape.0, self.shape.1],
                actual: vec![other.shape.0, other.shape.1],
            });
        }
        Self::from_triplets(self.shape, self.triplets().chain(other.triplets()))
    }

    pub fn column_sums(&self) -> Array1<f64> {
        let mut sums = Array1::zeros(self.shape.1);
        for (_, col, value) in self.triplets() {
            sums[col] += value;
        }
        sums
    }

    pub fn row_sums(&self) -> Array1<f64> {
        let mut sums = Array1::zeros(self.shape.0);
        for (row, _, value) in self.triplets() {
            sums[row] += value;
        }
        sums
    }
}

impl Neg for SparseMatrix {
    type Output = Self;

    fn neg(mut self) -> Self {
        self.values.iter_mut().for_each(|v| *v = -*v);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn duplicates_are_summed() {
        let m = SparseMatrix::from_triplets((2, 3), [(1, 2, 1.0), (0, 0, 2.0), (1, 2, 0.5)]).unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(1, 2), 1.5);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.to_dense(), array![[2.0, 0.0, 0.0], [0.0, 0.0, 1.5]]);
        assert_eq!(m.column_sums(), array![2.0, 0.0, 1.5]);
        assert_eq!(m.row_sums(), array![2.0, 1.5]);
    }

    #[test]
    fn out_of_range_entry() {
        assert!(SparseMatrix::from_triplets((2, 2), [(2, 0, 1.0)]).is_err());
    }

    #[test]
    fn product_and_arithmetic() {
        let m = SparseMatrix::from_triplets((2, 2), [(0, 1, 2.0), (1, 0, 3.0)]).unwrap();
        assert_eq!(m.dot(array![1.0, 4.0].view()).unwrap(), array![8.0, 3.0]);
        assert!(m.dot(array![1.0].view()).is_err());

        let d = SparseMatrix::diagonal(array![1.0, -1.0].view());
        let sum = m.add(&d).unwrap();
        assert_eq!(sum.to_dense(), array![[1.0, 2.0], [3.0, -1.0]]);

        let scaled = sum.scale_rows(array![2.0, 0.0].view()).unwrap();
        assert_eq!((-scaled).to_dense(), array![[-2.0, -4.0], [-0.0, 0.0]]);
    }
}
