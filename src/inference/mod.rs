//! Substitution of unconstrained values into probabilistic programs.
//!
//! Samplers and optimizers work on the whole real line. Sites declare the support of their
//! values with a [`Constraint`]; values are pushed through its bijection and, for random
//! variables, the log-determinant of the Jacobian enters the joint density.

mod constraint;
pub use constraint::{
    Constraint, ConstraintTrait, GreaterThanConstraint, IntervalConstraint, LessThanConstraint,
    RealConstraint,
};

mod reparam;
pub use reparam::{
    constrain, potential_energy, unconstrain, unconstrain_reparam, Reparam, Site, SiteKind,
    SiteValues,
};
