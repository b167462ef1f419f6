use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[enum_dispatch]
pub trait LnPrior1DTrait: Clone + Debug {
    /// Evaluate the natural logarithm of the prior at x
    ///
    /// If `grad` is `Some`, the gradient d(ln_prior)/dx is also computed and stored in it.
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64;
}

/// Natural logarithm of prior for a single slot of the flat parameter vector
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum LnPrior1D {
    None(NoneLnPrior1D),
    Uniform(UniformLnPrior1D),
    Gaussian(GaussianLnPrior1D),
}

impl LnPrior1D {
    pub fn none() -> Self {
        NoneLnPrior1D {}.into()
    }

    pub fn uniform(lower: f64, upper: f64, bound_penalty: f64) -> Self {
        UniformLnPrior1D {
            lower,
            upper,
            bound_penalty,
        }
        .into()
    }

    pub fn gaussian(mean: f64, width: f64) -> Self {
        GaussianLnPrior1D { mean, width }.into()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NoneLnPrior1D {}

impl LnPrior1DTrait for NoneLnPrior1D {
    fn ln_prior_1d(&self, _x: f64, grad: Option<&mut f64>) -> f64 {
        if let Some(g) = grad {
            *g = 0.0;
        }
        0.0
    }
}

/// Flat inside `[lower, upper]`, `-bound_penalty` outside
///
/// The penalty is a soft barrier, a not-a-number value is treated as out of bounds.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct UniformLnPrior1D {
    pub lower: f64,
    pub upper: f64,
    pub bound_penalty: f64,
}

impl UniformLnPrior1D {
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        if let Some(g) = grad {
            *g = 0.0;
        }
        if self.contains(x) {
            0.0
        } else {
            -self.bound_penalty
        }
    }
}

/// Unnormalized Gaussian, `-0.5 ((x - mean) / width)^2`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GaussianLnPrior1D {
    pub mean: f64,
    pub width: f64,
}

impl LnPrior1DTrait for GaussianLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        let z = (x - self.mean) / self.width;
        if let Some(g) = grad {
            *g = -z / self.width;
        }
        -0.5 * z * z
    }
}
