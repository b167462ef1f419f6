#![doc = include_str!("../README.md")]

#[cfg(test)]
mod tests;

mod error;
pub use error::{ConfigurationError, EvaluationError, LensingError, ValidationError};

mod float_trait;
pub use float_trait::Float;

pub mod grid;
pub use grid::{GridProvider, PixelAxes, PixelGrid, PixelGridSettings};

pub mod inference;

pub mod instrument;
pub use instrument::{Noise, NoiseProvider, Psf, PsfKind};

mod lens_image;
pub use lens_image::{LensImage, ModelOptions};

pub mod linear;

pub mod model;
pub use model::{LightModel, MassModel, RayMapper, Selection};

pub mod numerics;
pub use numerics::{Numerics, NumericsSettings};

pub mod params;
pub use params::{
    FixedParameters, ModelClass, ModelKwargs, ModelSpec, ParamValue, ParameterCodec, Parameters,
    PerClass, ProfileKwargs,
};

pub mod prior;
pub use prior::{ModelPriors, PriorConfig, PriorDeclaration, PriorEvaluator, PriorKind};

pub mod profiles;
pub use profiles::{LightProfile, MassProfile, ProfileFamily, ProfileRegistry};

pub use ndarray;
