//! Structured model parameters and their flat-vector representation.

mod codec;
pub use codec::{ParameterCodec, ProfileLayout, Slot};

mod parameters;
pub use parameters::{latex_symbol, Parameters};

mod value;
pub use value::{
    kwargs_to_float, FixedParameters, KwargsExt, ModelClass, ModelKwargs, ModelSpec, ParamValue,
    PerClass, ProfileKwargs,
};
