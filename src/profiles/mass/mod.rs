use crate::grid::PixelAxes;
use std::sync::Arc;
use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::ProfileKwargs;
use crate::profiles::ProfileTrait;

use enum_dispatch::enum_dispatch;
use ndarray::{Array1, ArrayView1};

mod pixelated;
pub use pixelated::PixelatedPotential;

mod point_mass;
pub use point_mass::PointMass;

mod shear;
pub use shear::{Shear, ShearGammaPsi};

mod sis;
pub use sis::Sis;

/// Second derivatives of a lensing potential
#[derive(Clone, Debug, PartialEq)]
pub struct Hessian<T> {
    pub f_xx: Array1<T>,
    pub f_yy: Array1<T>,
    pub f_xy: Array1<T>,
}

impl<T: Float> Hessian<T> {
    pub fn zeros(n: usize) -> Self {
        Self {
            f_xx: Array1::zeros(n),
            f_yy: Array1::zeros(n),
            f_xy: Array1::zeros(n),
        }
    }

    /// Convergence `(f_xx + f_yy) / 2`
    pub fn kappa(&self) -> Array1<T> {
        (&self.f_xx + &self.f_yy).mapv(|v| v * T::half())
    }
}

/// Lensing potential, its gradient (the deflection angle) and its hessian
///
/// `x` and `y` are flat coordinate arrays of equal length, every output has the same length.
#[enum_dispatch]
pub trait MassProfileTrait: ProfileTrait {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError>;

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError>;

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError>;
}

/// Mass profile, see the variant types for the parameters of each
#[enum_dispatch(ProfileTrait, MassProfileTrait)]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum MassProfile {
    Shear(Shear),
    ShearGammaPsi(ShearGammaPsi),
    Sis(Sis),
    PointMass(PointMass),
    Pixelated(PixelatedPotential),
}
