//! Priors on the flat parameter vector.
//!
//! Priors are declared per named parameter ([`PriorDeclaration`]) and resolved by a
//! [`PriorEvaluator`] into per-slot metadata aligned with the vector produced by a
//! [`ParameterCodec`](crate::ParameterCodec).

mod declaration;
pub use declaration::{ModelPriors, PriorDeclaration, PriorKind};

mod evaluator;
pub use evaluator::{PriorConfig, PriorEvaluator};

pub mod ln_prior_1d;
pub use ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
