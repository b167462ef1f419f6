use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::profiles::ProfileFamily;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value of a single named profile parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue<T> {
    Scalar(T),
    Axis(Array1<T>),
    Grid(Array2<T>),
}

impl<T> ParamValue<T>
where
    T: Clone,
{
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "a scalar",
            Self::Axis(_) => "a 1D array",
            Self::Grid(_) => "a 2D array",
        }
    }

    /// Number of scalar slots the value occupies in a flat vector
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Axis(a) => a.len(),
            Self::Grid(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Scalar(_) => vec![],
            Self::Axis(a) => a.shape().to_vec(),
            Self::Grid(a) => a.shape().to_vec(),
        }
    }

    /// Apply `f` to every element
    pub fn map<U, F>(&self, f: F) -> ParamValue<U>
    where
        F: Fn(T) -> U,
    {
        match self {
            Self::Scalar(x) => ParamValue::Scalar(f(x.clone())),
            Self::Axis(a) => ParamValue::Axis(a.mapv(|x| f(x))),
            Self::Grid(a) => ParamValue::Grid(a.mapv(|x| f(x))),
        }
    }
}

impl<T> From<T> for ParamValue<T> {
    fn from(value: T) -> Self {
        Self::Scalar(value)
    }
}

impl<T> From<Array1<T>> for ParamValue<T> {
    fn from(value: Array1<T>) -> Self {
        Self::Axis(value)
    }
}

impl<T> From<Array2<T>> for ParamValue<T> {
    fn from(value: Array2<T>) -> Self {
        Self::Grid(value)
    }
}

/// Keyword arguments of one profile: parameter name to value
pub type ProfileKwargs<T> = BTreeMap<String, ParamValue<T>>;

/// Typed access to [`ProfileKwargs`]
pub trait KwargsExt<T> {
    fn scalar(&self, name: &str) -> Result<T, EvaluationError>;

    fn scalar_or(&self, name: &str, default: T) -> Result<T, EvaluationError>;

    fn axis(&self, name: &str) -> Result<ArrayView1<'_, T>, EvaluationError>;

    fn grid(&self, name: &str) -> Result<ArrayView2<'_, T>, EvaluationError>;
}

impl<T> KwargsExt<T> for ProfileKwargs<T>
where
    T: Clone,
{
    fn scalar(&self, name: &str) -> Result<T, EvaluationError> {
        match self.get(name) {
            Some(ParamValue::Scalar(x)) => Ok(x.clone()),
            Some(_) => Err(EvaluationError::WrongParameterKind {
                name: name.to_owned(),
                expected: "a scalar",
            }),
            None => Err(EvaluationError::MissingParameter(name.to_owned())),
        }
    }

    fn scalar_or(&self, name: &str, default: T) -> Result<T, EvaluationError> {
        if self.contains_key(name) {
            self.scalar(name)
        } else {
            Ok(default)
        }
    }

    fn axis(&self, name: &str) -> Result<ArrayView1<'_, T>, EvaluationError> {
        match self.get(name) {
            Some(ParamValue::Axis(a)) => Ok(a.view()),
            Some(_) => Err(EvaluationError::WrongParameterKind {
                name: name.to_owned(),
                expected: "a 1D array",
            }),
            None => Err(EvaluationError::MissingParameter(name.to_owned())),
        }
    }

    fn grid(&self, name: &str) -> Result<ArrayView2<'_, T>, EvaluationError> {
        match self.get(name) {
            Some(ParamValue::Grid(a)) => Ok(a.view()),
            Some(_) => Err(EvaluationError::WrongParameterKind {
                name: name.to_owned(),
                expected: "a 2D array",
            }),
            None => Err(EvaluationError::MissingParameter(name.to_owned())),
        }
    }
}

/// Convert plain `f64` keyword arguments into the evaluation scalar type
pub fn kwargs_to_float<T: Float>(kwargs: &ProfileKwargs<f64>) -> ProfileKwargs<T> {
    kwargs
        .iter()
        .map(|(name, value)| (name.clone(), value.map(T::lit)))
        .collect()
}

/// The three model classes a lens image is built from
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    Lens,
    Source,
    LensLight,
}

impl ModelClass {
    /// Traversal order of the flat parameter vector
    pub const ALL: [ModelClass; 3] = [Self::Lens, Self::Source, Self::LensLight];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lens => "lens",
            Self::Source => "source",
            Self::LensLight => "lens_light",
        }
    }

    pub fn family(&self) -> ProfileFamily {
        match self {
            Self::Lens => ProfileFamily::Mass,
            Self::Source | Self::LensLight => ProfileFamily::Light,
        }
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per profile for each of the three model classes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PerClass<V> {
    pub lens: Vec<V>,
    pub source: Vec<V>,
    pub lens_light: Vec<V>,
}

impl<V> Default for PerClass<V> {
    fn default() -> Self {
        Self {
            lens: vec![],
            source: vec![],
            lens_light: vec![],
        }
    }
}

impl<V> PerClass<V> {
    pub fn new(lens: Vec<V>, source: Vec<V>, lens_light: Vec<V>) -> Self {
        Self {
            lens,
            source,
            lens_light,
        }
    }

    pub fn get(&self, class: ModelClass) -> &[V] {
        match class {
            ModelClass::Lens => &self.lens,
            ModelClass::Source => &self.source,
            ModelClass::LensLight => &self.lens_light,
        }
    }

    pub fn get_mut(&mut self, class: ModelClass) -> &mut Vec<V> {
        match class {
            ModelClass::Lens => &mut self.lens,
            ModelClass::Source => &mut self.source,
            ModelClass::LensLight => &mut self.lens_light,
        }
    }

    /// Iterate `(class, profile index, value)` in flat-vector traversal order
    pub fn iter(&self) -> impl Iterator<Item = (ModelClass, usize, &V)> {
        ModelClass::ALL
            .into_iter()
            .flat_map(move |class| self.get(class).iter().enumerate().map(move |(i, v)| (class, i, v)))
    }

    pub fn map<U, F>(&self, mut f: F) -> PerClass<U>
    where
        F: FnMut(&V) -> U,
    {
        PerClass {
            lens: self.lens.iter().map(&mut f).collect(),
            source: self.source.iter().map(&mut f).collect(),
            lens_light: self.lens_light.iter().map(&mut f).collect(),
        }
    }
}

/// Profile identifiers of every model class
pub type ModelSpec = PerClass<String>;

/// Structured parameters: per-profile keyword arguments of every model class
pub type ModelKwargs<T> = PerClass<ProfileKwargs<T>>;

/// Parameters excluded from the flat vector, with their concrete values
pub type FixedParameters = PerClass<ProfileKwargs<f64>>;

impl ModelSpec {
    pub fn from_lists(lens: &[&str], source: &[&str], lens_light: &[&str]) -> Self {
        let own = |list: &[&str]| list.iter().map(|s| (*s).to_owned()).collect();
        Self::new(own(lens), own(source), own(lens_light))
    }

    /// Empty keyword arguments with one entry per profile
    pub fn empty_kwargs<T>(&self) -> PerClass<ProfileKwargs<T>> {
        self.map(|_| ProfileKwargs::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn kwargs_typed_access() {
        let mut kwargs = ProfileKwargs::<f64>::new();
        kwargs.insert("amp".into(), 2.0.into());
        kwargs.insert("x_coords".into(), array![0.0, 1.0].into());

        assert_eq!(kwargs.scalar("amp"), Ok(2.0));
        assert_eq!(kwargs.scalar_or("ra_0", 0.5), Ok(0.5));
        assert_eq!(kwargs.axis("x_coords").unwrap().len(), 2);
        assert_eq!(
            kwargs.scalar("missing"),
            Err(EvaluationError::MissingParameter("missing".into()))
        );
        assert!(matches!(
            kwargs.grid("amp"),
            Err(EvaluationError::WrongParameterKind { .. })
        ));
    }

    #[test]
    fn traversal_order_is_lens_source_lens_light() {
        let spec = ModelSpec::from_lists(&["SIS", "SHEAR"], &["SERSIC"], &["UNIFORM"]);
        let order: Vec<_> = spec.iter().map(|(c, i, name)| (c, i, name.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (ModelClass::Lens, 0, "SIS"),
                (ModelClass::Lens, 1, "SHEAR"),
                (ModelClass::Source, 0, "SERSIC"),
                (ModelClass::LensLight, 0, "UNIFORM"),
            ]
        );
    }

    #[test]
    fn model_spec_serde() {
        let spec: ModelSpec = serde_json::from_str(r#"{"lens": ["SHEAR"], "source": ["UNIFORM"]}"#).unwrap();
        assert_eq!(spec, ModelSpec::from_lists(&["SHEAR"], &["UNIFORM"], &[]));
    }

    #[test]
    fn param_value_serde() {
        let value = ParamValue::Grid(array![[1.0, 2.0], [3.0, 4.0]]);
        let json = serde_json::to_string(&value).unwrap();
        let back: ParamValue<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
        let scalar: ParamValue<f64> = serde_json::from_str("1.5").unwrap();
        assert_eq!(scalar, ParamValue::Scalar(1.5));
    }
}
