use crate::error::{ConfigurationError, EvaluationError, LensingError, ValidationError};
use crate::float_trait::Float;
use crate::params::{ModelClass, ParamValue, ParameterCodec};
use crate::prior::declaration::{ModelPriors, PriorDeclaration, PriorKind};
use crate::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};

use itertools::izip;
use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings of the prior evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PriorConfig {
    /// Log-prior penalty for a uniform-prior parameter outside its bounds
    pub bound_penalty: f64,
}

impl PriorConfig {
    pub const DEFAULT_BOUND_PENALTY: f64 = 1e10;
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            bound_penalty: Self::DEFAULT_BOUND_PENALTY,
        }
    }
}

/// Per-slot prior metadata aligned with the flat parameter vector
///
/// Unused entries of `lowers`, `uppers`, `means` and `widths` are NaN.
#[derive(Clone, Debug)]
pub struct PriorEvaluator {
    kinds: Vec<PriorKind>,
    lowers: Array1<f64>,
    uppers: Array1<f64>,
    means: Array1<f64>,
    widths: Array1<f64>,
    // NaN-free copies used by the masked evaluation
    masked_means: Array1<f64>,
    masked_widths: Array1<f64>,
    components: Vec<LnPrior1D>,
    bound_penalty: f64,
}

struct Entry {
    kind: PriorKind,
    lower: f64,
    upper: f64,
    mean: f64,
    width: f64,
}

impl Entry {
    const NONE: Self = Self {
        kind: PriorKind::None,
        lower: f64::NAN,
        upper: f64::NAN,
        mean: f64::NAN,
        width: f64::NAN,
    };

    fn uniform(lower: f64, upper: f64) -> Self {
        Self {
            kind: PriorKind::Uniform,
            lower,
            upper,
            ..Self::NONE
        }
    }

    fn gaussian(mean: f64, width: f64) -> Self {
        Self {
            kind: PriorKind::Gaussian,
            mean,
            width,
            ..Self::NONE
        }
    }
}

fn pixel_bounds(
    name: &str,
    value: &ParamValue<f64>,
    shape: (usize, usize),
) -> Result<Vec<f64>, ValidationError> {
    let size = shape.0 * shape.1;
    match value {
        ParamValue::Scalar(x) => Ok(vec![*x; size]),
        ParamValue::Grid(a) if a.dim() == shape => Ok(a.iter().copied().collect()),
        ParamValue::Axis(a) if a.len() == size => Ok(a.to_vec()),
        _ => Err(ValidationError::BoundsShape {
            name: name.to_owned(),
            expected: shape,
            actual: value.shape(),
        }),
    }
}

impl PriorEvaluator {
    /// Build the metadata, an empty prior list for a class means no priors there
    pub fn new(
        codec: &ParameterCodec,
        priors: &ModelPriors,
        config: &PriorConfig,
    ) -> Result<Self, LensingError> {
        Self::check_declarations(codec, priors)?;

        let mut entries = Vec::with_capacity(codec.num_parameters());
        for slot in codec.slots() {
            let declaration = priors
                .get(slot.class)
                .get(slot.index)
                .and_then(|declarations| declarations.get(slot.name));
            match (declaration, slot.pixel_shape) {
                (None, _) => entries.extend((0..slot.len()).map(|_| Entry::NONE)),
                (Some(PriorDeclaration::Gaussian { .. }), Some(_)) => {
                    return Err(ValidationError::GaussianPriorOnPixels {
                        class: slot.class,
                        index: slot.index,
                    }
                    .into());
                }
                (Some(PriorDeclaration::Gaussian { mean, width }), None) => {
                    entries.push(Entry::gaussian(*mean, *width))
                }
                (Some(PriorDeclaration::Uniform { lower, upper }), Some(shape)) => {
                    let lowers = pixel_bounds(slot.name, lower, shape)?;
                    let uppers = pixel_bounds(slot.name, upper, shape)?;
                    entries.extend(
                        lowers
                            .into_iter()
                            .zip(uppers)
                            .map(|(lower, upper)| Entry::uniform(lower, upper)),
                    );
                }
                (Some(PriorDeclaration::Uniform { lower, upper }), None) => match (lower, upper) {
                    (ParamValue::Scalar(lower), ParamValue::Scalar(upper)) => {
                        entries.push(Entry::uniform(*lower, *upper))
                    }
                    _ => {
                        return Err(ValidationError::NonScalarBounds {
                            name: slot.name.to_owned(),
                        }
                        .into());
                    }
                },
            }
        }
        Ok(Self::from_entries(entries, config.bound_penalty))
    }

    fn check_declarations(
        codec: &ParameterCodec,
        priors: &ModelPriors,
    ) -> Result<(), LensingError> {
        for class in ModelClass::ALL {
            let layouts = codec.layouts().get(class);
            let declared = priors.get(class);
            if !declared.is_empty() && declared.len() != layouts.len() {
                return Err(ConfigurationError::ListLength {
                    what: "priors",
                    class,
                    expected: layouts.len(),
                    actual: declared.len(),
                }
                .into());
            }
            for (index, (layout, declarations)) in layouts.iter().zip(declared).enumerate() {
                for name in declarations.keys() {
                    if !layout.param_names.contains(&name.as_str()) {
                        return Err(ValidationError::UnknownParameter {
                            class,
                            index,
                            name: name.clone(),
                        }
                        .into());
                    }
                    if codec.is_fixed(class, index, name) {
                        log::debug!(
                            "ignoring prior on fixed parameter '{name}' of {class} profile #{index}"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn from_entries(entries: Vec<Entry>, bound_penalty: f64) -> Self {
        let column = |f: fn(&Entry) -> f64| entries.iter().map(f).collect::<Array1<f64>>();
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        let means = column(|e| e.mean);
        let widths = column(|e| e.width);
        let components = entries
            .iter()
            .map(|e| match e.kind {
                PriorKind::None => LnPrior1D::none(),
                PriorKind::Uniform => LnPrior1D::uniform(e.lower, e.upper, bound_penalty),
                PriorKind::Gaussian => LnPrior1D::gaussian(e.mean, e.width),
            })
            .collect();
        Self {
            lowers: column(|e| e.lower),
            uppers: column(|e| e.upper),
            masked_means: means.mapv(|m| if m.is_nan() { 0.0 } else { m }),
            masked_widths: widths.mapv(|w| if w.is_nan() { 1.0 } else { w }),
            means,
            widths,
            kinds,
            components,
            bound_penalty,
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[PriorKind] {
        &self.kinds
    }

    /// Lower and upper bounds, NaN where no uniform prior is set
    pub fn bounds(&self) -> (&Array1<f64>, &Array1<f64>) {
        (&self.lowers, &self.uppers)
    }

    /// Gaussian means and widths, NaN where no Gaussian prior is set
    pub fn gaussians(&self) -> (&Array1<f64>, &Array1<f64>) {
        (&self.means, &self.widths)
    }

    pub fn bound_penalty(&self) -> f64 {
        self.bound_penalty
    }

    fn check_len(&self, actual: usize) -> Result<(), EvaluationError> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(EvaluationError::VectorLength {
                expected: self.len(),
                actual,
            })
        }
    }

    /// Log-prior of the flat vector `args`
    ///
    /// Every slot evaluates both the Gaussian term and the bound indicator; the prior kind only
    /// selects which contribution is kept, so derivative parts flow through every Gaussian slot.
    pub fn ln_prior<T: Float>(&self, args: &[T]) -> Result<T, EvaluationError> {
        self.check_len(args.len())?;
        let penalty = -self.bound_penalty;
        let total = izip!(
            args,
            &self.kinds,
            &self.masked_means,
            &self.masked_widths,
            &self.lowers,
            &self.uppers
        )
        .fold(T::zero(), |total, (&x, kind, &mean, &width, &lower, &upper)| {
            let z = (x - T::lit(mean)) / T::lit(width);
            let gaussian = -T::half() * z * z;
            let v = x.value();
            let outside = !(lower <= v && v <= upper);
            let is_gaussian = *kind == PriorKind::Gaussian;
            let is_uniform = *kind == PriorKind::Uniform;
            let gaussian = if is_gaussian { gaussian } else { T::zero() };
            let bound = if is_uniform && outside { penalty } else { 0.0 };
            total + (gaussian + T::lit(bound))
        });
        Ok(total)
    }

    /// Per-slot evaluation with host-side branching, numerically identical to [`Self::ln_prior`]
    pub fn ln_prior_reference(&self, args: &[f64]) -> Result<f64, EvaluationError> {
        self.check_len(args.len())?;
        Ok(args
            .iter()
            .zip(&self.components)
            .fold(0.0, |total, (&x, prior)| total + prior.ln_prior_1d(x, None)))
    }

    /// Analytic gradient of the log-prior
    pub fn ln_prior_gradient(&self, args: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        self.check_len(args.len())?;
        Ok(args
            .iter()
            .zip(&self.components)
            .map(|(&x, prior)| {
                let mut g = 0.0;
                prior.ln_prior_1d(x, Some(&mut g));
                g
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FixedParameters, ModelSpec, ProfileKwargs};
    use crate::profiles::ProfileRegistry;
    use crate::tests::*;

    use approx::assert_abs_diff_eq;
    use hyperdual::Hyperdual;
    use ndarray::{array, Array2};
    use std::collections::BTreeMap;

    fn declarations(pairs: &[(&str, PriorDeclaration)]) -> BTreeMap<String, PriorDeclaration> {
        pairs
            .iter()
            .map(|(name, prior)| ((*name).to_owned(), prior.clone()))
            .collect()
    }

    fn single_parameter(prior: PriorDeclaration) -> PriorEvaluator {
        let codec = ParameterCodec::new(
            &ModelSpec::from_lists(&[], &["UNIFORM"], &[]),
            &FixedParameters::default(),
            ProfileRegistry::global(),
        )
        .unwrap();
        let priors = ModelPriors::new(vec![], vec![declarations(&[("amp", prior)])], vec![]);
        PriorEvaluator::new(&codec, &priors, &PriorConfig::default()).unwrap()
    }

    #[test]
    fn uniform_penalty() {
        let prior = single_parameter(PriorDeclaration::uniform(0.0, 1.0));
        assert_eq!(prior.ln_prior(&[0.5]), Ok(0.0));
        assert_abs_diff_eq!(prior.ln_prior(&[-1.0]).unwrap(), -1e10);
        assert_abs_diff_eq!(prior.ln_prior(&[2.0]).unwrap(), -1e10);
        assert_eq!(prior.ln_prior_reference(&[2.0]), Ok(-1e10));
    }

    #[test]
    fn gaussian_term() {
        let prior = single_parameter(PriorDeclaration::gaussian(0.0, 1.0));
        assert_abs_diff_eq!(prior.ln_prior(&[2.0]).unwrap(), -2.0);
        assert!(prior.bounds().0[0].is_nan());
        assert_eq!(prior.gaussians().1[0], 1.0);
    }

    fn mixed() -> (ParameterCodec, PriorEvaluator) {
        let spec = ModelSpec::from_lists(&["SHEAR"], &["SERSIC", "PIXELATED"], &[]);
        let mut pixel_fixed = ProfileKwargs::new();
        pixel_fixed.insert("x_coords".into(), array![0.0, 1.0, 2.0].into());
        pixel_fixed.insert("y_coords".into(), array![0.0, 1.0].into());
        let fixed = FixedParameters::new(vec![], vec![ProfileKwargs::new(), pixel_fixed], vec![]);
        let codec = ParameterCodec::new(&spec, &fixed, ProfileRegistry::global()).unwrap();
        let priors = ModelPriors::new(
            vec![declarations(&[
                ("gamma1", PriorDeclaration::gaussian(0.0, 0.05)),
                ("gamma2", PriorDeclaration::gaussian(0.01, 0.1)),
                ("ra_0", PriorDeclaration::uniform(-1.0, 1.0)),
            ])],
            vec![
                declarations(&[
                    ("amp", PriorDeclaration::uniform(0.0, 10.0)),
                    ("n_sersic", PriorDeclaration::gaussian(4.0, 0.5)),
                ]),
                declarations(&[(
                    "image",
                    PriorDeclaration::uniform(0.0, Array2::from_elem((2, 3), 5.0)),
                )]),
            ],
            vec![],
        );
        let evaluator = PriorEvaluator::new(&codec, &priors, &PriorConfig::default()).unwrap();
        (codec, evaluator)
    }

    #[test]
    fn pixel_bounds_are_broadcast() {
        let (codec, prior) = mixed();
        assert_eq!(prior.len(), codec.num_parameters());
        let (lowers, uppers) = prior.bounds();
        let start = codec.num_parameters() - 6;
        assert!(prior.kinds()[start..].iter().all(|k| *k == PriorKind::Uniform));
        assert_eq!(lowers.slice(ndarray::s![start..]).to_vec(), vec![0.0; 6]);
        assert_eq!(uppers.slice(ndarray::s![start..]).to_vec(), vec![5.0; 6]);
        // dec_0 and the Sersic centers have no prior
        assert_eq!(prior.kinds()[3], PriorKind::None);
    }

    #[test]
    fn reference_matches_masked() {
        let (codec, prior) = mixed();
        for seed in 0..20 {
            let args: Vec<f64> = random_vector(codec.num_parameters(), seed)
                .into_iter()
                .map(|x| 8.0 * x)
                .collect();
            assert_eq!(prior.ln_prior(&args), prior.ln_prior_reference(&args));
        }
        let mut args = vec![0.5; codec.num_parameters()];
        args[2] = f64::INFINITY;
        assert_eq!(prior.ln_prior(&args), prior.ln_prior_reference(&args));
    }

    #[test]
    fn dual_gradient_matches_analytic() {
        let (codec, prior) = mixed();
        let args = random_vector(codec.num_parameters(), 42);
        let analytic = prior.ln_prior_gradient(&args).unwrap();
        for i in 0..args.len() {
            let dual: Vec<Hyperdual<f64, 2>> = args
                .iter()
                .enumerate()
                .map(|(j, &x)| {
                    let mut d = Hyperdual::from_real(x);
                    if i == j {
                        d[1] = 1.0;
                    }
                    d
                })
                .collect();
            let value = prior.ln_prior(&dual).unwrap();
            assert_abs_diff_eq!(value[1], analytic[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn configurable_penalty() {
        let codec = ParameterCodec::new(
            &ModelSpec::from_lists(&[], &["UNIFORM"], &[]),
            &FixedParameters::default(),
            ProfileRegistry::global(),
        )
        .unwrap();
        let priors = ModelPriors::new(
            vec![],
            vec![declarations(&[("amp", PriorDeclaration::uniform(0.0, 1.0))])],
            vec![],
        );
        let config = PriorConfig { bound_penalty: 1e3 };
        let prior = PriorEvaluator::new(&codec, &priors, &config).unwrap();
        assert_eq!(prior.ln_prior(&[3.0]), Ok(-1e3));
        assert_eq!(prior.bound_penalty(), 1e3);
    }

    #[test]
    fn gaussian_prior_on_pixels() {
        let spec = ModelSpec::from_lists(&[], &["PIXELATED"], &[]);
        let mut pixel_fixed = ProfileKwargs::new();
        pixel_fixed.insert("x_coords".into(), array![0.0, 1.0].into());
        pixel_fixed.insert("y_coords".into(), array![0.0, 1.0].into());
        let fixed = FixedParameters::new(vec![], vec![pixel_fixed], vec![]);
        let codec = ParameterCodec::new(&spec, &fixed, ProfileRegistry::global()).unwrap();
        let priors = ModelPriors::new(
            vec![],
            vec![declarations(&[("image", PriorDeclaration::gaussian(0.0, 1.0))])],
            vec![],
        );
        assert_eq!(
            PriorEvaluator::new(&codec, &priors, &PriorConfig::default()).unwrap_err(),
            LensingError::from(ValidationError::GaussianPriorOnPixels {
                class: ModelClass::Source,
                index: 0
            })
        );

        let priors = ModelPriors::new(
            vec![],
            vec![declarations(&[(
                "image",
                PriorDeclaration::uniform(0.0, Array2::from_elem((3, 2), 1.0)),
            )])],
            vec![],
        );
        assert!(matches!(
            PriorEvaluator::new(&codec, &priors, &PriorConfig::default()),
            Err(LensingError::Validation(ValidationError::BoundsShape { .. }))
        ));
    }

    #[test]
    fn unknown_and_fixed_parameters() {
        let spec = ModelSpec::from_lists(&["SIS"], &[], &[]);
        let mut fixed_center = ProfileKwargs::new();
        fixed_center.insert("center_x".into(), 0.0.into());
        let fixed = FixedParameters::new(vec![fixed_center], vec![], vec![]);
        let codec = ParameterCodec::new(&spec, &fixed, ProfileRegistry::global()).unwrap();

        let on_fixed = ModelPriors::new(
            vec![declarations(&[("center_x", PriorDeclaration::uniform(-1.0, 1.0))])],
            vec![],
            vec![],
        );
        let prior = PriorEvaluator::new(&codec, &on_fixed, &PriorConfig::default()).unwrap();
        assert!(prior.kinds().iter().all(|k| *k == PriorKind::None));

        let unknown = ModelPriors::new(
            vec![declarations(&[("e1", PriorDeclaration::uniform(-1.0, 1.0))])],
            vec![],
            vec![],
        );
        assert_eq!(
            PriorEvaluator::new(&codec, &unknown, &PriorConfig::default()).unwrap_err(),
            LensingError::from(ValidationError::UnknownParameter {
                class: ModelClass::Lens,
                index: 0,
                name: "e1".into()
            })
        );
    }
}
