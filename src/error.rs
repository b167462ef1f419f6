use crate::params::ModelClass;
use crate::profiles::ProfileFamily;

/// Malformed model description, raised at construction or decode time
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown {family} profile '{name}', known profiles are {known:?}")]
    UnknownProfile {
        family: ProfileFamily,
        name: String,
        known: Vec<String>,
    },

    #[error("'x_coords' and 'y_coords' must be fixed for pixelated {class} profile #{index}")]
    MissingPixelGeometry { class: ModelClass, index: usize },

    #[error("'{name}' must be a fixed parameter of pixelated {class} profile #{index}")]
    FreeCoordinateParameter {
        class: ModelClass,
        index: usize,
        name: String,
    },

    #[error("at most one pixelated {family} profile is supported, got {count}")]
    MultiplePixelatedProfiles { family: ProfileFamily, count: usize },

    #[error("{family} profile #{index} is not pixelated")]
    NotPixelated { family: ProfileFamily, index: usize },

    #[error("{family} model has no pixelated component")]
    NoPixelatedComponent { family: ProfileFamily },

    #[error("impossible to generate a noise realisation because no noise provider has been set")]
    MissingNoiseProvider,

    #[error("{what} for {class} has {actual} entries, but the model has {expected} profiles")]
    ListLength {
        what: &'static str,
        class: ModelClass,
        expected: usize,
        actual: usize,
    },

    #[error("no model grid named '{0}' has been created")]
    MissingModelGrid(ModelClass),

    #[error("invalid numerics settings: {0}")]
    Numerics(String),

    #[error("invalid PSF: {0}")]
    Psf(String),
}

/// Prior declaration that cannot be turned into per-parameter prior metadata
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("prior kind '{kind}' of parameter '{name}' is not supported, use 'uniform' or 'gaussian'")]
    UnsupportedPriorKind { name: String, kind: String },

    #[error("gaussian prior for pixelated {class} profile #{index} is not supported")]
    GaussianPriorOnPixels { class: ModelClass, index: usize },

    #[error("prior references unknown parameter '{name}' of {class} profile #{index}")]
    UnknownParameter {
        class: ModelClass,
        index: usize,
        name: String,
    },

    #[error("per-pixel bounds of '{name}' have shape {actual:?}, pixel grid is {expected:?}")]
    BoundsShape {
        name: String,
        expected: (usize, usize),
        actual: Vec<usize>,
    },

    #[error("bounds of scalar parameter '{name}' must be scalars")]
    NonScalarBounds { name: String },
}

/// Failure while evaluating a model for concrete parameter values
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("parameter vector has length {actual}, expected {expected}")]
    VectorLength { expected: usize, actual: usize },

    #[error("parameter '{0}' is missing")]
    MissingParameter(String),

    #[error("parameter '{name}' must be {expected}")]
    WrongParameterKind {
        name: String,
        expected: &'static str,
    },

    #[error("got {actual} keyword-argument sets for {expected} profiles")]
    KwargsLength { expected: usize, actual: usize },

    #[error("profile selection is invalid for {num_profiles} profiles: {reason}")]
    Selection { num_profiles: usize, reason: String },

    #[error("array shape mismatch: expected {expected:?}, got {actual:?}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("pixelated profile has no pixel grid attached and no coordinates were given")]
    PixelGridNotSet,

    #[error("samples must be a non-empty matrix of finite values with {expected} columns")]
    InvalidSamples { expected: usize },
}

/// Any error produced by this crate
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LensingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
