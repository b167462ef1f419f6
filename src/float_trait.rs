use std::fmt::Debug;
use std::ops::{AddAssign, MulAssign};

/// Scalar type every field evaluation is generic over.
///
/// Geometry, kernels and prior metadata are stored as `f64`; they enter the
/// evaluation through [`Float::lit`]. Evaluating the same code with dual
/// numbers yields derivatives with respect to the free parameters.
pub trait Float:
    'static + num_traits::Float + AddAssign<Self> + MulAssign<Self> + Debug + Send + Sync
{
    /// Convert a plain constant into the scalar type
    fn lit(x: f64) -> Self;

    #[inline]
    fn half() -> Self {
        Self::lit(0.5)
    }

    #[inline]
    fn two() -> Self {
        Self::lit(2.0)
    }

    /// Plain value, dropping any derivative part
    #[inline]
    fn value(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl Float for f32 {
    #[inline]
    fn lit(x: f64) -> Self {
        x as f32
    }
}

impl Float for f64 {
    #[inline]
    fn lit(x: f64) -> Self {
        x
    }
}

#[cfg(test)]
impl<const N: usize> Float for hyperdual::Hyperdual<f64, N> {
    #[inline]
    fn lit(x: f64) -> Self {
        Self::from_real(x)
    }
}
