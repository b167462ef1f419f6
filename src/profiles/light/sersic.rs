use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::params::{KwargsExt, ProfileKwargs};
use crate::profiles::light::LightProfileTrait;
use crate::profiles::pointwise::map_xy;
use crate::profiles::ProfileTrait;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};

/// Radii below this value are evaluated at this value
const SMOOTHING: f64 = 0.001;

/// Maximum ellipticity modulus
const MAX_ELLIPTICITY: f64 = 0.9999;

macro_const! {
    const SERSIC_DOC: &str = r"
Spherical Sérsic profile

$$
I(R) = A \exp\left(-b\_n \left[\left(\frac{R}{R\_\mathrm{sersic}}\right)^{1/n} - 1\right]\right),
$$
with $b\_n = 1.9992 n - 0.3271$, so that $A$ is the brightness at the half-light radius.

- Parameters: `amp`, `R_sersic`, `n_sersic`, `center_x`, `center_y`
";
}

#[doc = SERSIC_DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sersic {}

struct SersicShape<T> {
    amp: T,
    r_sersic: T,
    inv_n: T,
    b_n: T,
    center_x: T,
    center_y: T,
}

impl<T: Float> SersicShape<T> {
    fn from_kwargs(kwargs: &ProfileKwargs<T>) -> Result<Self, EvaluationError> {
        let n_sersic: T = kwargs.scalar("n_sersic")?;
        Ok(Self {
            amp: kwargs.scalar("amp")?,
            r_sersic: kwargs.scalar("R_sersic")?,
            inv_n: n_sersic.recip(),
            b_n: T::lit(1.9992) * n_sersic - T::lit(0.3271),
            center_x: kwargs.scalar("center_x")?,
            center_y: kwargs.scalar("center_y")?,
        })
    }

    fn brightness(&self, r: T) -> T {
        let r = r.max(T::lit(SMOOTHING));
        self.amp * (-self.b_n * ((r / self.r_sersic).powf(self.inv_n) - T::one())).exp()
    }
}

impl ProfileTrait for Sersic {
    fn param_names(&self) -> &'static [&'static str] {
        &["amp", "R_sersic", "n_sersic", "center_x", "center_y"]
    }
}

impl LightProfileTrait for Sersic {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let shape = SersicShape::from_kwargs(kwargs)?;
        map_xy(x, y, |x, y| {
            shape.brightness((x - shape.center_x).hypot(y - shape.center_y))
        })
    }
}

macro_const! {
    const SERSIC_ELLIPSE_DOC: &str = r"
Elliptical Sérsic profile

Same radial profile as [Sersic], evaluated at the elliptical radius
$R = \sqrt{q x'^2 + y'^2 / q}$ in the frame rotated by $\phi = \frac12 \arctan(e\_2 / e\_1)$,
with axis ratio $q = (1 - |e|) / (1 + |e|)$ and $|e|$ capped at 0.9999.

- Parameters: `amp`, `R_sersic`, `n_sersic`, `e1`, `e2`, `center_x`, `center_y`
";
}

#[doc = SERSIC_ELLIPSE_DOC!()]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SersicElliptic {}

impl ProfileTrait for SersicElliptic {
    fn param_names(&self) -> &'static [&'static str] {
        &["amp", "R_sersic", "n_sersic", "e1", "e2", "center_x", "center_y"]
    }
}

impl LightProfileTrait for SersicElliptic {
    fn function<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &ProfileKwargs<T>,
    ) -> Result<Array1<T>, EvaluationError> {
        let shape = SersicShape::from_kwargs(kwargs)?;
        let e1: T = kwargs.scalar("e1")?;
        let e2: T = kwargs.scalar("e2")?;
        let phi = e2.atan2(e1) * T::half();
        let c = e1.hypot(e2).min(T::lit(MAX_ELLIPTICITY));
        let q = (T::one() - c) / (T::one() + c);
        let (sin, cos) = phi.sin_cos();
        map_xy(x, y, |x, y| {
            let (dx, dy) = (x - shape.center_x, y - shape.center_y);
            let x_ = cos * dx + sin * dy;
            let y_ = -sin * dx + cos * dy;
            shape.brightness((q * x_ * x_ + y_ * y_ / q).sqrt())
        })
    }
}
