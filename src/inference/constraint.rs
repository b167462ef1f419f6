use crate::float_trait::Float;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// `ln(1 + e^x)` without overflow
fn softplus<T: Float>(x: T) -> T {
    x.max(T::zero()) + (-x.abs()).exp().ln_1p()
}

fn sigmoid<T: Float>(x: T) -> T {
    T::one() / (T::one() + (-x).exp())
}

/// Support of a site together with its bijection from the real line
#[enum_dispatch]
pub trait ConstraintTrait: Clone + Debug {
    /// Map an unconstrained value into the support
    fn forward<T: Float>(&self, x: T) -> T;

    /// Map a value of the support back to the real line
    fn inverse<T: Float>(&self, y: T) -> T;

    /// `ln |d forward / dx|` at the unconstrained value `x`
    fn log_abs_det_jacobian<T: Float>(&self, x: T) -> T;

    fn contains(&self, y: f64) -> bool;

    /// Whether the support is the whole real line, so no transform is needed
    fn is_real(&self) -> bool {
        false
    }
}

#[enum_dispatch(ConstraintTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "constraint", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Constraint {
    Real(RealConstraint),
    GreaterThan(GreaterThanConstraint),
    LessThan(LessThanConstraint),
    Interval(IntervalConstraint),
}

impl Constraint {
    pub fn real() -> Self {
        RealConstraint {}.into()
    }

    pub fn positive() -> Self {
        Self::greater_than(0.0)
    }

    pub fn greater_than(lower: f64) -> Self {
        GreaterThanConstraint { lower }.into()
    }

    pub fn less_than(upper: f64) -> Self {
        LessThanConstraint { upper }.into()
    }

    pub fn interval(lower: f64, upper: f64) -> Self {
        IntervalConstraint { lower, upper }.into()
    }

    pub fn unit_interval() -> Self {
        Self::interval(0.0, 1.0)
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Self::real()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RealConstraint {}

impl ConstraintTrait for RealConstraint {
    fn forward<T: Float>(&self, x: T) -> T {
        x
    }

    fn inverse<T: Float>(&self, y: T) -> T {
        y
    }

    fn log_abs_det_jacobian<T: Float>(&self, _x: T) -> T {
        T::zero()
    }

    fn contains(&self, y: f64) -> bool {
        y.is_finite()
    }

    fn is_real(&self) -> bool {
        true
    }
}

/// `(lower, inf)` through `lower + exp(x)`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GreaterThanConstraint {
    pub lower: f64,
}

impl ConstraintTrait for GreaterThanConstraint {
    fn forward<T: Float>(&self, x: T) -> T {
        T::lit(self.lower) + x.exp()
    }

    fn inverse<T: Float>(&self, y: T) -> T {
        (y - T::lit(self.lower)).ln()
    }

    fn log_abs_det_jacobian<T: Float>(&self, x: T) -> T {
        x
    }

    fn contains(&self, y: f64) -> bool {
        y > self.lower
    }
}

/// `(-inf, upper)` through `upper - exp(x)`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LessThanConstraint {
    pub upper: f64,
}

impl ConstraintTrait for LessThanConstraint {
    fn forward<T: Float>(&self, x: T) -> T {
        T::lit(self.upper) - x.exp()
    }

    fn inverse<T: Float>(&self, y: T) -> T {
        (T::lit(self.upper) - y).ln()
    }

    fn log_abs_det_jacobian<T: Float>(&self, x: T) -> T {
        x
    }

    fn contains(&self, y: f64) -> bool {
        y < self.upper
    }
}

/// `(lower, upper)` through a scaled logistic sigmoid
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IntervalConstraint {
    pub lower: f64,
    pub upper: f64,
}

impl ConstraintTrait for IntervalConstraint {
    fn forward<T: Float>(&self, x: T) -> T {
        T::lit(self.lower) + T::lit(self.upper - self.lower) * sigmoid(x)
    }

    fn inverse<T: Float>(&self, y: T) -> T {
        let p = (y - T::lit(self.lower)) / T::lit(self.upper - self.lower);
        p.ln() - (-p).ln_1p()
    }

    fn log_abs_det_jacobian<T: Float>(&self, x: T) -> T {
        T::lit((self.upper - self.lower).ln()) - softplus(x) - softplus(-x)
    }

    fn contains(&self, y: f64) -> bool {
        y > self.lower && y < self.upper
    }
}
