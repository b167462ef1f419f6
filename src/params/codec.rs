use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;
use crate::params::value::{
    kwargs_to_float, FixedParameters, KwargsExt, ModelClass, ModelKwargs, ModelSpec, ParamValue,
    PerClass, ProfileKwargs,
};
use crate::profiles::{ProfileRegistry, PIXEL_COORDINATE_PARAMS};

use itertools::Itertools;
use ndarray::Array2;

/// Parameter layout of a single profile
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileLayout {
    pub identifier: String,
    pub param_names: &'static [&'static str],
    pub pixel_param: Option<&'static str>,
    /// Pixel block shape `(num_y, num_x)` of pixelated profiles
    pub pixel_shape: Option<(usize, usize)>,
}

impl ProfileLayout {
    pub fn is_pixelated(&self) -> bool {
        self.pixel_param.is_some()
    }
}

/// Contiguous block of the flat vector holding one free parameter
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub class: ModelClass,
    pub index: usize,
    pub name: &'static str,
    pub offset: usize,
    /// `Some((num_y, num_x))` for a pixel block, `None` for a scalar
    pub pixel_shape: Option<(usize, usize)>,
}

impl Slot {
    pub fn len(&self) -> usize {
        self.pixel_shape.map_or(1, |(ny, nx)| ny * nx)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// Bidirectional mapping between the flat parameter vector and structured keyword arguments
///
/// The layout is fixed at construction from the [`ModelSpec`] and the fixed parameters:
/// profiles are walked lens first, then source, then lens light, in list order, and each profile
/// contributes its free parameters in declaration order. A pixelated profile's block occupies
/// `num_x * num_y` consecutive slots, in row-major `(num_y, num_x)` order.
#[derive(Clone, Debug)]
pub struct ParameterCodec {
    fixed: FixedParameters,
    layouts: PerClass<ProfileLayout>,
    slots: Vec<Slot>,
    num_parameters: usize,
}

fn coordinate_len(kwargs: &ProfileKwargs<f64>, name: &str) -> Option<usize> {
    match kwargs.get(name) {
        Some(ParamValue::Axis(a)) => Some(a.len()),
        _ => None,
    }
}

impl ParameterCodec {
    /// Build the layout, an empty fixed list for a class means that nothing is fixed there
    pub fn new(
        spec: &ModelSpec,
        fixed: &FixedParameters,
        registry: &ProfileRegistry,
    ) -> Result<Self, ConfigurationError> {
        let mut fixed_full = FixedParameters::default();
        for class in ModelClass::ALL {
            let expected = spec.get(class).len();
            let given = fixed.get(class);
            *fixed_full.get_mut(class) = match given.len() {
                0 => vec![ProfileKwargs::new(); expected],
                n if n == expected => given.to_vec(),
                actual => {
                    return Err(ConfigurationError::ListLength {
                        what: "fixed parameters",
                        class,
                        expected,
                        actual,
                    });
                }
            };
        }

        let mut layouts = PerClass::default();
        let mut slots = vec![];
        let mut offset = 0;
        for (class, index, identifier) in spec.iter() {
            let (param_names, pixel_param) = registry.describe(class.family(), identifier)?;
            let fixed_kwargs = &fixed_full.get(class)[index];
            let pixel_shape = match pixel_param {
                Some(_) => Some(Self::pixel_shape(class, index, fixed_kwargs)?),
                None => None,
            };
            for &name in param_names {
                if fixed_kwargs.contains_key(name) {
                    continue;
                }
                let slot = Slot {
                    class,
                    index,
                    name,
                    offset,
                    pixel_shape: if Some(name) == pixel_param {
                        pixel_shape
                    } else {
                        None
                    },
                };
                offset += slot.len();
                slots.push(slot);
            }
            layouts.get_mut(class).push(ProfileLayout {
                identifier: identifier.clone(),
                param_names,
                pixel_param,
                pixel_shape,
            });
        }
        log::debug!(
            "parameter layout: {} free parameters in {} blocks",
            offset,
            slots.len()
        );
        Ok(Self {
            fixed: fixed_full,
            layouts,
            slots,
            num_parameters: offset,
        })
    }

    fn pixel_shape(
        class: ModelClass,
        index: usize,
        fixed: &ProfileKwargs<f64>,
    ) -> Result<(usize, usize), ConfigurationError> {
        let [x_name, y_name] = PIXEL_COORDINATE_PARAMS;
        match (coordinate_len(fixed, x_name), coordinate_len(fixed, y_name)) {
            (Some(nx), Some(ny)) => Ok((ny, nx)),
            (None, None) => Err(ConfigurationError::MissingPixelGeometry { class, index }),
            (None, Some(_)) => Err(ConfigurationError::FreeCoordinateParameter {
                class,
                index,
                name: x_name.to_owned(),
            }),
            (Some(_), None) => Err(ConfigurationError::FreeCoordinateParameter {
                class,
                index,
                name: y_name.to_owned(),
            }),
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }

    /// Free parameter blocks in flat-vector order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn layouts(&self) -> &PerClass<ProfileLayout> {
        &self.layouts
    }

    pub fn fixed(&self) -> &FixedParameters {
        &self.fixed
    }

    pub fn is_fixed(&self, class: ModelClass, index: usize, name: &str) -> bool {
        self.fixed
            .get(class)
            .get(index)
            .is_some_and(|kwargs| kwargs.contains_key(name))
    }

    /// Structured keyword arguments of the flat vector `args`, fixed values copied in
    pub fn decode<T: Float>(&self, args: &[T]) -> Result<ModelKwargs<T>, EvaluationError> {
        if args.len() != self.num_parameters {
            return Err(EvaluationError::VectorLength {
                expected: self.num_parameters,
                actual: args.len(),
            });
        }
        let mut kwargs = self.fixed.map(kwargs_to_float::<T>);
        for slot in &self.slots {
            let block = &args[slot.range()];
            let value = match slot.pixel_shape {
                Some(shape) => ParamValue::Grid(
                    Array2::from_shape_vec(shape, block.to_vec()).map_err(|_| {
                        EvaluationError::Shape {
                            expected: vec![shape.0, shape.1],
                            actual: vec![block.len()],
                        }
                    })?,
                ),
                None => ParamValue::Scalar(block[0]),
            };
            kwargs.get_mut(slot.class)[slot.index].insert(slot.name.to_owned(), value);
        }
        Ok(kwargs)
    }

    /// Flat vector of the free parameters of `kwargs`, the inverse of [`Self::decode`]
    pub fn encode<T: Float>(&self, kwargs: &ModelKwargs<T>) -> Result<Vec<T>, EvaluationError> {
        for class in ModelClass::ALL {
            let expected = self.layouts.get(class).len();
            let actual = kwargs.get(class).len();
            if actual < expected {
                return Err(EvaluationError::KwargsLength { expected, actual });
            }
        }
        let mut args = Vec::with_capacity(self.num_parameters);
        for slot in &self.slots {
            let profile_kwargs = &kwargs.get(slot.class)[slot.index];
            match slot.pixel_shape {
                Some((ny, nx)) => {
                    let block = profile_kwargs.grid(slot.name)?;
                    if block.dim() != (ny, nx) {
                        return Err(EvaluationError::Shape {
                            expected: vec![ny, nx],
                            actual: block.shape().to_vec(),
                        });
                    }
                    args.extend(block.iter().copied());
                }
                None => args.push(profile_kwargs.scalar(slot.name)?),
            }
        }
        Ok(args)
    }

    /// Display labels aligned with the flat vector, pixel blocks expand into `a_<i>`
    pub fn names(&self) -> Vec<String> {
        self.slots
            .iter()
            .flat_map(|slot| match slot.pixel_shape {
                Some(_) => (0..slot.len()).map(|i| format!("a_{i}")).collect_vec(),
                None => vec![slot.name.to_owned()],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    fn pixelated_fixed(nx: usize, ny: usize) -> ProfileKwargs<f64> {
        let mut kwargs = ProfileKwargs::new();
        kwargs.insert("x_coords".into(), Array1::linspace(-1.0, 1.0, nx).into());
        kwargs.insert("y_coords".into(), Array1::linspace(-1.0, 1.0, ny).into());
        kwargs
    }

    fn codec() -> ParameterCodec {
        let spec = ModelSpec::from_lists(&["SIS", "SHEAR"], &["PIXELATED"], &["SERSIC"]);
        let mut fixed = FixedParameters::new(
            vec![ProfileKwargs::new(), ProfileKwargs::new()],
            vec![pixelated_fixed(3, 2)],
            vec![ProfileKwargs::new()],
        );
        fixed.lens[1].insert("ra_0".into(), 0.0.into());
        fixed.lens[1].insert("dec_0".into(), 0.0.into());
        fixed.lens_light[0].insert("n_sersic".into(), 4.0.into());
        ParameterCodec::new(&spec, &fixed, ProfileRegistry::global()).unwrap()
    }

    #[test]
    fn layout_and_names() {
        let codec = codec();
        assert_eq!(codec.num_parameters(), 3 + 2 + 6 + 4);
        let names = codec.names();
        assert_eq!(names.len(), codec.num_parameters());
        assert_eq!(
            names,
            vec![
                "theta_E", "center_x", "center_y", "gamma1", "gamma2", "a_0", "a_1", "a_2", "a_3",
                "a_4", "a_5", "amp", "R_sersic", "center_x", "center_y",
            ]
        );
        assert_eq!(names, codec.names());
    }

    #[test]
    fn decode_encode_round_trip() {
        let codec = codec();
        let args = random_vector(codec.num_parameters(), 0);
        let kwargs = codec.decode(&args).unwrap();
        assert_eq!(
            kwargs.source[0].grid("image").unwrap(),
            Array2::from_shape_vec((2, 3), args[5..11].to_vec()).unwrap()
        );
        assert_eq!(kwargs.lens_light[0].scalar("n_sersic"), Ok(4.0));
        assert_eq!(kwargs.source[0].axis("x_coords").unwrap().len(), 3);
        let encoded = codec.encode(&kwargs).unwrap();
        assert_eq!(encoded, args);
    }

    #[test]
    fn decode_dual_numbers() {
        let codec = codec();
        let args: Vec<hyperdual::Hyperdual<f64, 2>> = random_vector(codec.num_parameters(), 1)
            .into_iter()
            .map(hyperdual::Hyperdual::from_real)
            .collect();
        let kwargs = codec.decode(&args).unwrap();
        assert_abs_diff_eq!(
            kwargs.lens[0].scalar("theta_E").unwrap()[0],
            args[0][0]
        );
    }

    #[test]
    fn wrong_vector_length() {
        assert_eq!(
            codec().decode(&[1.0, 2.0]).unwrap_err(),
            EvaluationError::VectorLength {
                expected: 15,
                actual: 2
            }
        );
    }

    #[test]
    fn empty_model() {
        let codec = ParameterCodec::new(
            &ModelSpec::default(),
            &FixedParameters::default(),
            ProfileRegistry::global(),
        )
        .unwrap();
        assert_eq!(codec.num_parameters(), 0);
        assert!(codec.names().is_empty());
        assert_eq!(codec.encode(&codec.decode::<f64>(&[]).unwrap()).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn pixel_geometry_must_be_fixed() {
        let spec = ModelSpec::from_lists(&[], &["PIXELATED"], &[]);
        let registry = ProfileRegistry::global();
        assert_eq!(
            ParameterCodec::new(&spec, &FixedParameters::default(), registry).unwrap_err(),
            ConfigurationError::MissingPixelGeometry {
                class: ModelClass::Source,
                index: 0
            }
        );

        let mut only_x = ProfileKwargs::new();
        only_x.insert("x_coords".into(), array![0.0, 1.0].into());
        let fixed = FixedParameters::new(vec![], vec![only_x], vec![]);
        assert_eq!(
            ParameterCodec::new(&spec, &fixed, registry).unwrap_err(),
            ConfigurationError::FreeCoordinateParameter {
                class: ModelClass::Source,
                index: 0,
                name: "y_coords".into()
            }
        );
    }

    #[test]
    fn unknown_profile_fails_at_construction() {
        let spec = ModelSpec::from_lists(&["SIE"], &[], &[]);
        assert!(matches!(
            ParameterCodec::new(&spec, &FixedParameters::default(), ProfileRegistry::global()),
            Err(ConfigurationError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn fixed_list_length_mismatch() {
        let spec = ModelSpec::from_lists(&["SIS", "SHEAR"], &[], &[]);
        let fixed = FixedParameters::new(vec![ProfileKwargs::new()], vec![], vec![]);
        assert_eq!(
            ParameterCodec::new(&spec, &fixed, ProfileRegistry::global()).unwrap_err(),
            ConfigurationError::ListLength {
                what: "fixed parameters",
                class: ModelClass::Lens,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn encode_rejects_wrong_block_shape() {
        let codec = codec();
        let mut kwargs = codec.decode(&vec![0.0; codec.num_parameters()]).unwrap();
        kwargs.source[0].insert("image".into(), Array2::<f64>::zeros((3, 2)).into());
        assert!(matches!(
            codec.encode(&kwargs),
            Err(EvaluationError::Shape { .. })
        ));
    }
}
