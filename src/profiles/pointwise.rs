use crate::error::EvaluationError;
use crate::float_trait::Float;

use ndarray::{Array1, ArrayView1, Zip};

fn check_same_len<T>(x: &ArrayView1<T>, y: &ArrayView1<T>) -> Result<(), EvaluationError> {
    if x.len() == y.len() {
        Ok(())
    } else {
        Err(EvaluationError::Shape {
            expected: vec![x.len()],
            actual: vec![y.len()],
        })
    }
}

/// Evaluate a closed-form scalar field at every `(x, y)` pair
pub(crate) fn map_xy<T, F>(
    x: ArrayView1<T>,
    y: ArrayView1<T>,
    f: F,
) -> Result<Array1<T>, EvaluationError>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    check_same_len(&x, &y)?;
    Ok(Zip::from(&x).and(&y).map_collect(|&x, &y| f(x, y)))
}

/// Evaluate a closed-form vector field at every `(x, y)` pair
pub(crate) fn map_xy2<T, F>(
    x: ArrayView1<T>,
    y: ArrayView1<T>,
    f: F,
) -> Result<(Array1<T>, Array1<T>), EvaluationError>
where
    T: Float,
    F: Fn(T, T) -> (T, T),
{
    check_same_len(&x, &y)?;
    let pairs = Zip::from(&x).and(&y).map_collect(|&x, &y| f(x, y));
    Ok((pairs.mapv(|p| p.0), pairs.mapv(|p| p.1)))
}

/// Evaluate a closed-form symmetric-tensor field at every `(x, y)` pair
pub(crate) fn map_xy3<T, F>(
    x: ArrayView1<T>,
    y: ArrayView1<T>,
    f: F,
) -> Result<(Array1<T>, Array1<T>, Array1<T>), EvaluationError>
where
    T: Float,
    F: Fn(T, T) -> (T, T, T),
{
    check_same_len(&x, &y)?;
    let triples = Zip::from(&x).and(&y).map_collect(|&x, &y| f(x, y));
    Ok((
        triples.mapv(|p| p.0),
        triples.mapv(|p| p.1),
        triples.mapv(|p| p.2),
    ))
}
