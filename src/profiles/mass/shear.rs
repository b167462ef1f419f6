use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::mass::{Hessian, MassProfileTrait};
use crate::profiles::pointwise::{map_xy, map_xy2};
use crate::profiles::ProfileTrait;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};

macro_const! {
    const SHEAR_DOC: &str = r"
External shear in terms of its two Cartesian components

$$
\psi(x, y) = \frac12 \left(\gamma\_1 x'^2 + 2\gamma\_2 x' y' - \gamma\_1 y'^2\right),
$$
where $x' = x - \mathrm{ra}\_0$ and $y' = y - \mathrm{dec}\_0$.

- Parameters: `gamma1`, `gamma2`, `ra_0` (default 0), `dec_0` (default 0)
";
}

#[doc = SHEAR_DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shear {}

struct ShearComponents<T> {
    gamma1: T,
    gamma2: T,
    ra_0: T,
    dec_0: T,
}

impl<T: Float> ShearComponents<T> {
    fn cartesian(kwargs: &ProfileKwargs<T>) -> Result<Self, EvaluationError> {
        Ok(Self {
            gamma1: kwargs.scalar("gamma1")?,
            gamma2: kwargs.scalar("gamma2")?,
            ra_0: kwargs.scalar_or("ra_0", T::zero())?,
            dec_0: kwargs.scalar_or("dec_0", T::zero())?,
        })
    }

    fn polar(kwargs: &ProfileKwargs<T>) -> Result<Self, EvaluationError> {
        let gamma_ext: T = kwargs.scalar("gamma_ext")?;
        let psi_ext: T = kwargs.scalar("psi_ext")?;
        let (sin, cos) = (T::two() * psi_ext).sin_cos();
        Ok(Self {
            gamma1: gamma_ext * cos,
            gamma2: gamma_ext * sin,
            ra_0: kwargs.scalar_or("ra_0", T::zero())?,
            dec_0: kwargs.scalar_or("dec_0", T::zero())?,
        })
    }

    fn function(&self, x: ArrayView1<T>, y: ArrayView1<T>) -> Result<Array1<T>, EvaluationError> {
        map_xy(x, y, |x, y| {
            let x = x - self.ra_0;
            let y = y - self.dec_0;
            T::half() * (self.gamma1 * x * x + T::two() * self.gamma2 * x * y - self.gamma1 * y * y)
        })
    }

    fn derivatives(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        map_xy2(x, y, |x, y| {
            let x = x - self.ra_0;
            let y = y - self.dec_0;
            (
                self.gamma1 * x + self.gamma2 * y,
                self.gamma2 * x - self.gamma1 * y,
            )
        })
    }

    fn hessian(&self, n: usize) -> Hessian<T> {
        Hessian {
            f_xx: Array1::from_elem(n, self.gamma1),
            f_yy: Array1::from_elem(n, -self.gamma1),
            f_xy: Array1::from_elem(n, self.gamma2),
        }
    }
}

fn check_same_len<T>(x: &ArrayView1<T>, y: &ArrayView1<T>) -> Result<usize, EvaluationError> {
    if x.len() == y.len() {
        Ok(x.len())
    } else {
        Err(EvaluationError::Shape {
            expected: vec![x.len()],
            actual: vec![y.len()],
        })
    }
}

impl ProfileTrait for Shear {
    fn param_names(&self) -> &'static [&'static str] {
        &["gamma1", "gamma2", "ra_0", "dec_0"]
    }
}

impl MassProfileTrait for Shear {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        ShearComponents::cartesian(kwargs)?.function(x, y)
    }

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        ShearComponents::cartesian(kwargs)?.derivatives(x, y)
    }

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError> {
        let n = check_same_len(&x, &y)?;
        Ok(ShearComponents::cartesian(kwargs)?.hessian(n))
    }
}

macro_const! {
    const SHEAR_GAMMA_PSI_DOC: &str = r"
External shear in terms of its magnitude and position angle

Same potential as [Shear] with $\gamma\_1 = \gamma\_\mathrm{ext} \cos 2\psi\_\mathrm{ext}$ and
$\gamma\_2 = \gamma\_\mathrm{ext} \sin 2\psi\_\mathrm{ext}$.

- Parameters: `gamma_ext`, `psi_ext`, `ra_0` (default 0), `dec_0` (default 0)
";
}

#[doc = SHEAR_GAMMA_PSI_DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShearGammaPsi {}

impl ProfileTrait for ShearGammaPsi {
    fn param_names(&self) -> &'static [&'static str] {
        &["gamma_ext", "psi_ext", "ra_0", "dec_0"]
    }
}

impl MassProfileTrait for ShearGammaPsi {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        ShearComponents::polar(kwargs)?.function(x, y)
    }

    fn derivatives<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        ShearComponents::polar(kwargs)?.derivatives(x, y)
    }

    fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Hessian<T>, EvaluationError> {
        let n = check_same_len(&x, &y)?;
        Ok(ShearComponents::polar(kwargs)?.hessian(n))
    }
}
