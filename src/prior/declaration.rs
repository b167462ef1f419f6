use crate::error::ValidationError;
use crate::params::{ParamValue, PerClass};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prior declared for one named parameter
///
/// Uniform bounds of a pixelated profile's block are either scalars broadcast to every pixel or
/// arrays with the block shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorDeclaration {
    Uniform {
        lower: ParamValue<f64>,
        upper: ParamValue<f64>,
    },
    Gaussian {
        mean: f64,
        width: f64,
    },
}

impl PriorDeclaration {
    pub fn uniform(lower: impl Into<ParamValue<f64>>, upper: impl Into<ParamValue<f64>>) -> Self {
        Self::Uniform {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn gaussian(mean: f64, width: f64) -> Self {
        Self::Gaussian { mean, width }
    }

    /// Declaration from the `(kind, a, b)` tuple form
    pub fn from_tuple(
        name: &str,
        kind: &str,
        a: ParamValue<f64>,
        b: ParamValue<f64>,
    ) -> Result<Self, ValidationError> {
        match kind {
            "uniform" => Ok(Self::Uniform { lower: a, upper: b }),
            "gaussian" => match (a, b) {
                (ParamValue::Scalar(mean), ParamValue::Scalar(width)) => {
                    Ok(Self::Gaussian { mean, width })
                }
                _ => Err(ValidationError::NonScalarBounds {
                    name: name.to_owned(),
                }),
            },
            _ => Err(ValidationError::UnsupportedPriorKind {
                name: name.to_owned(),
                kind: kind.to_owned(),
            }),
        }
    }

    pub fn kind(&self) -> PriorKind {
        match self {
            Self::Uniform { .. } => PriorKind::Uniform,
            Self::Gaussian { .. } => PriorKind::Gaussian,
        }
    }
}

/// Prior declarations of every profile, keyed by parameter name
pub type ModelPriors = PerClass<BTreeMap<String, PriorDeclaration>>;

/// Prior attached to one slot of the flat vector
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PriorKind {
    #[default]
    None,
    Uniform,
    Gaussian,
}
