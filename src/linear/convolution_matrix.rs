use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::numerics::kernel::normalize;

use ndarray::{s, Array1, Array2, ArrayView2};

/// Full 2D convolution with a normalized kernel as a dense doubly block Toeplitz matrix
///
/// Images are flattened row-major. The product is the full convolution of shape
/// `image + kernel - 1`; [`ConvolutionMatrix::apply`] crops it back to the image shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvolutionMatrix {
    matrix: Array2<f64>,
    image_shape: (usize, usize),
    output_shape: (usize, usize),
    row_crop: usize,
    col_crop: usize,
}

impl ConvolutionMatrix {
    pub fn new(kernel: ArrayView2<f64>, image_shape: (usize, usize)) -> Self {
        let kernel = normalize(kernel.to_owned());
        let (i_rows, i_cols) = image_shape;
        let (f_rows, f_cols) = kernel.dim();
        let output_shape = (i_rows + f_rows - 1, i_cols + f_cols - 1);
        let (o_rows, o_cols) = output_shape;
        let mut matrix = Array2::zeros((o_rows * o_cols, i_rows * i_cols));
        // block (p, i) is the Toeplitz matrix of kernel row p - i
        for i in 0..i_rows {
            for j in 0..i_cols {
                let col = i * i_cols + j;
                for ((a, b), &w) in kernel.indexed_iter() {
                    matrix[[(i + a) * o_cols + j + b, col]] = w;
                }
            }
        }
        Self {
            matrix,
            image_shape,
            output_shape,
            row_crop: (o_rows - i_rows) / 2,
            col_crop: (o_cols - i_cols) / 2,
        }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Shape of the full convolution
    pub fn output_shape(&self) -> (usize, usize) {
        self.output_shape
    }

    /// Rows and columns to drop on each side of the full convolution
    pub fn crop(&self) -> (usize, usize) {
        (self.row_crop, self.col_crop)
    }

    /// Full convolution of `image`
    pub fn apply_full<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError> {
        if image.dim() != self.image_shape {
            return Err(EvaluationError::Shape {
                expected: vec![self.image_shape.0, self.image_shape.1],
                actual: image.shape().to_vec(),
            });
        }
        let flat: Vec<T> = image.iter().copied().collect();
        let product: Array1<T> = self
            .matrix
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&flat)
                    .fold(T::zero(), |acc, (&m, &x)| if m == 0.0 { acc } else { acc + T::lit(m) * x })
            })
            .collect();
        product
            .into_shape_with_order(self.output_shape)
            .map_err(|_| EvaluationError::Shape {
                expected: vec![self.output_shape.0, self.output_shape.1],
                actual: vec![self.matrix.nrows()],
            })
    }

    /// Convolution cropped to the image shape
    pub fn apply<T: Float>(&self, image: ArrayView2<T>) -> Result<Array2<T>, EvaluationError> {
        let full = self.apply_full(image)?;
        let (rows, cols) = self.image_shape;
        Ok(full
            .slice(s![
                self.row_crop..self.row_crop + rows,
                self.col_crop..self.col_crop + cols
            ])
            .to_owned())
    }
}
