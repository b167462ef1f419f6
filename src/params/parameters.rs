use crate::error::{EvaluationError, LensingError};
use crate::float_trait::Float;
use crate::params::codec::ParameterCodec;
use crate::params::value::{FixedParameters, ModelKwargs, ModelSpec};
use crate::prior::{ModelPriors, PriorConfig, PriorEvaluator, PriorKind};
use crate::profiles::ProfileRegistry;

use ndarray::{Array1, ArrayView2, Axis};
use ndarray_stats::interpolate::Midpoint;
use ndarray_stats::QuantileExt;
use noisy_float::prelude::*;
use std::sync::OnceLock;

/// LaTeX label of a parameter name, the name itself if no label is known
pub fn latex_symbol(name: &str) -> String {
    if let Some(index) = name.strip_prefix("a_").and_then(|i| i.parse::<usize>().ok()) {
        return format!("$a_{{{index}}}$");
    }
    let symbol = match name {
        "theta_E" => r"$\theta_{\rm E}$",
        "gamma" => r"$\gamma'$",
        "gamma_ext" => r"$\gamma_{\rm ext}$",
        "psi_ext" => r"$\psi_{\rm ext}$",
        "gamma1" => r"$\gamma_{\rm 1, ext}$",
        "gamma2" => r"$\gamma_{\rm 2, ext}$",
        "ra_0" => r"$x_{\rm 0, ext}$",
        "dec_0" => r"$y_{\rm 0, ext}$",
        "amp" => r"$A$",
        "sigma" => r"$\sigma$",
        "R_sersic" => r"$R_{\rm Sersic}$",
        "n_sersic" => r"$n_{\rm Sersic}$",
        "e1" => r"$e_1$",
        "e2" => r"$e_2$",
        "center_x" => r"$c_{x,0}$",
        "center_y" => r"$c_{y,0}$",
        _ => name,
    };
    symbol.to_owned()
}

/// Estimate of the flat vector with a lazily decoded structured view
#[derive(Debug, Default)]
struct Estimate {
    values: Option<Vec<f64>>,
    kwargs: OnceLock<ModelKwargs<f64>>,
}

impl Estimate {
    fn set(&mut self, values: Vec<f64>) {
        self.values = Some(values);
        self.kwargs = OnceLock::new();
    }

    fn kwargs(&self, codec: &ParameterCodec) -> Result<Option<&ModelKwargs<f64>>, EvaluationError> {
        let Some(values) = &self.values else {
            return Ok(None);
        };
        if let Some(kwargs) = self.kwargs.get() {
            return Ok(Some(kwargs));
        }
        let decoded = codec.decode(values)?;
        Ok(Some(self.kwargs.get_or_init(|| decoded)))
    }
}

/// Model parameters: vector layout, priors, initial values and fit estimates
///
/// Maximum-likelihood (ML) and maximum-a-posteriori (MAP) estimates are stored as flat vectors;
/// their structured views are decoded on first access and dropped whenever the estimate is
/// replaced or [`Parameters::invalidate`] is called.
#[derive(Debug)]
pub struct Parameters {
    codec: ParameterCodec,
    prior: PriorEvaluator,
    init_kwargs: ModelKwargs<f64>,
    init_values: Vec<f64>,
    names: Vec<String>,
    ml: Estimate,
    map: Estimate,
}

impl Parameters {
    pub fn new(
        spec: &ModelSpec,
        init: &ModelKwargs<f64>,
        priors: &ModelPriors,
        fixed: &FixedParameters,
        config: &PriorConfig,
    ) -> Result<Self, LensingError> {
        Self::with_registry(spec, init, priors, fixed, config, ProfileRegistry::global())
    }

    pub fn with_registry(
        spec: &ModelSpec,
        init: &ModelKwargs<f64>,
        priors: &ModelPriors,
        fixed: &FixedParameters,
        config: &PriorConfig,
        registry: &ProfileRegistry,
    ) -> Result<Self, LensingError> {
        let codec = ParameterCodec::new(spec, fixed, registry)?;
        let prior = PriorEvaluator::new(&codec, priors, config)?;
        let init_values = codec.encode(init)?;
        // fixed values always win over initial ones
        let init_kwargs = codec.decode(&init_values)?;
        let names = codec.names();
        Ok(Self {
            codec,
            prior,
            init_kwargs,
            init_values,
            names,
            ml: Estimate::default(),
            map: Estimate::default(),
        })
    }

    pub fn codec(&self) -> &ParameterCodec {
        &self.codec
    }

    pub fn prior(&self) -> &PriorEvaluator {
        &self.prior
    }

    pub fn num_parameters(&self) -> usize {
        self.codec.num_parameters()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn symbols(&self) -> Vec<String> {
        self.names.iter().map(|name| latex_symbol(name)).collect()
    }

    pub fn prior_kinds(&self) -> &[PriorKind] {
        self.prior.kinds()
    }

    pub fn bounds(&self) -> (&Array1<f64>, &Array1<f64>) {
        self.prior.bounds()
    }

    pub fn args_to_kwargs<T: Float>(&self, args: &[T]) -> Result<ModelKwargs<T>, EvaluationError> {
        self.codec.decode(args)
    }

    pub fn kwargs_to_args<T: Float>(&self, kwargs: &ModelKwargs<T>) -> Result<Vec<T>, EvaluationError> {
        self.codec.encode(kwargs)
    }

    /// Starting point: the ML estimate once it is set, unless `original` is requested
    pub fn initial_values(&self, original: bool) -> &[f64] {
        match (&self.ml.values, original) {
            (Some(ml), false) => ml,
            _ => &self.init_values,
        }
    }

    pub fn initial_kwargs(&self, original: bool) -> Result<&ModelKwargs<f64>, EvaluationError> {
        if !original {
            if let Some(kwargs) = self.ml.kwargs(&self.codec)? {
                return Ok(kwargs);
            }
        }
        Ok(&self.init_kwargs)
    }

    pub fn set_best_fit(&mut self, values: Vec<f64>) -> Result<(), EvaluationError> {
        if values.len() != self.num_parameters() {
            return Err(EvaluationError::VectorLength {
                expected: self.num_parameters(),
                actual: values.len(),
            });
        }
        self.ml.set(values);
        Ok(())
    }

    /// Set the MAP estimate to the per-parameter median of `samples`, one sample per row
    pub fn set_samples(&mut self, samples: ArrayView2<f64>) -> Result<(), EvaluationError> {
        let invalid = EvaluationError::InvalidSamples {
            expected: self.num_parameters(),
        };
        if samples.ncols() != self.num_parameters()
            || samples.nrows() == 0
            || samples.iter().any(|x| !x.is_finite())
        {
            return Err(invalid);
        }
        let mut samples = samples.mapv(n64);
        let median = samples
            .quantile_axis_mut(Axis(0), n64(0.5), &Midpoint)
            .map_err(|_| invalid)?;
        self.map.set(median.iter().map(|x| x.raw()).collect());
        Ok(())
    }

    pub fn ml_values(&self) -> Option<&[f64]> {
        self.ml.values.as_deref()
    }

    pub fn ml_kwargs(&self) -> Result<Option<&ModelKwargs<f64>>, EvaluationError> {
        self.ml.kwargs(&self.codec)
    }

    pub fn map_values(&self) -> Option<&[f64]> {
        self.map.values.as_deref()
    }

    pub fn map_kwargs(&self) -> Result<Option<&ModelKwargs<f64>>, EvaluationError> {
        self.map.kwargs(&self.codec)
    }

    /// Drop the cached structured views of both estimates
    pub fn invalidate(&mut self) {
        self.ml.kwargs = OnceLock::new();
        self.map.kwargs = OnceLock::new();
    }

    pub fn log_prior<T: Float>(&self, args: &[T]) -> Result<T, EvaluationError> {
        self.prior.ln_prior(args)
    }

    pub fn log_prior_reference(&self, args: &[f64]) -> Result<f64, EvaluationError> {
        self.prior.ln_prior_reference(args)
    }
}
