use crate::error::{ConfigurationError, EvaluationError};
use crate::float_trait::Float;
use crate::grid::{PixelAxes, PixelGridSettings};
use crate::model::composite::Composite;
use crate::model::Selection;
use crate::params::ProfileKwargs;
use crate::profiles::{Hessian, MassProfile, MassProfileTrait, ProfileFamily, ProfileRegistry};

use ndarray::{Array1, ArrayView1};
use std::sync::Arc;

fn check_same_len<T>(x: &ArrayView1<T>, y: &ArrayView1<T>) -> Result<usize, EvaluationError> {
    if x.len() == y.len() {
        Ok(x.len())
    } else {
        Err(EvaluationError::Shape {
            expected: vec![x.len()],
            actual: vec![y.len()],
        })
    }
}

/// Sum of mass profiles acting as a single lens
#[derive(Clone, Debug)]
pub struct MassModel {
    composite: Composite<MassProfile>,
}

impl MassModel {
    /// Mass model of built-in profiles
    pub fn new<S: AsRef<str>>(identifiers: &[S]) -> Result<Self, ConfigurationError> {
        Self::with_registry(identifiers, ProfileRegistry::global(), PixelGridSettings::default())
    }

    pub fn with_registry<S: AsRef<str>>(
        identifiers: &[S],
        registry: &ProfileRegistry,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            composite: Composite::from_identifiers(
                ProfileFamily::Mass,
                identifiers,
                |name| registry.make_mass(name),
                pixel_grid_settings,
            )?,
        })
    }

    pub fn from_profiles(
        profiles: Vec<MassProfile>,
        pixel_grid_settings: PixelGridSettings,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            composite: Composite::from_profiles(ProfileFamily::Mass, profiles, pixel_grid_settings)?,
        })
    }

    pub fn len(&self) -> usize {
        self.composite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn profiles(&self) -> impl Iterator<Item = &MassProfile> {
        self.composite.profiles()
    }

    pub fn has_pixels(&self) -> bool {
        self.composite.pixel_index().is_some()
    }

    pub fn pixelated_index(&self) -> Option<usize> {
        self.composite.pixel_index()
    }

    pub fn pixel_grid_settings(&self) -> &PixelGridSettings {
        self.composite.pixel_grid_settings()
    }

    pub fn pixel_axes(&self) -> Option<&PixelAxes> {
        self.composite.pixel_axes()
    }

    /// Attach the model grid of the pixelated potential
    pub fn set_pixel_grid(&mut self, axes: Arc<PixelAxes>) -> Result<(), ConfigurationError> {
        self.composite.set_pixel_grid(axes)
    }

    /// Lensing potential
    pub fn potential<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<Array1<T>, EvaluationError> {
        let mut potential = Array1::zeros(check_same_len(&x, &y)?);
        for (profile, kwargs) in self.composite.selected(kwargs, selection)? {
            potential += &profile.function(x, y, kwargs)?;
        }
        Ok(potential)
    }

    /// Deflection angles `(alpha_x, alpha_y)`
    pub fn alpha<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        let n = check_same_len(&x, &y)?;
        let mut alpha_x = Array1::zeros(n);
        let mut alpha_y = Array1::zeros(n);
        for (profile, kwargs) in self.composite.selected(kwargs, selection)? {
            let (ax, ay) = profile.derivatives(x, y, kwargs)?;
            alpha_x += &ax;
            alpha_y += &ay;
        }
        Ok((alpha_x, alpha_y))
    }

    pub fn hessian<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<Hessian<T>, EvaluationError> {
        let mut total = Hessian::zeros(check_same_len(&x, &y)?);
        for (profile, kwargs) in self.composite.selected(kwargs, selection)? {
            let h = profile.hessian(x, y, kwargs)?;
            total.f_xx += &h.f_xx;
            total.f_yy += &h.f_yy;
            total.f_xy += &h.f_xy;
        }
        Ok(total)
    }

    /// Convergence, half the trace of the hessian
    pub fn kappa<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<Array1<T>, EvaluationError> {
        Ok(self.hessian(x, y, kwargs, selection)?.kappa())
    }

    /// Source-plane coordinates `(x - alpha_x, y - alpha_y)`
    pub fn ray_shooting<T: Float>(
        &self,
        x: ArrayView1<T>,
        y: ArrayView1<T>,
        kwargs: &[ProfileKwargs<T>],
        selection: &Selection,
    ) -> Result<(Array1<T>, Array1<T>), EvaluationError> {
        let (alpha_x, alpha_y) = self.alpha(x, y, kwargs, selection)?;
        Ok((&x - &alpha_x, &y - &alpha_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn kwargs(pairs: &[(&str, f64)]) -> ProfileKwargs<f64> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).into()))
            .collect()
    }

    #[test]
    fn sum_of_profiles() {
        let model = MassModel::new(&["SIS", "SHEAR"]).unwrap();
        let sis = kwargs(&[("theta_E", 1.0), ("center_x", 0.0), ("center_y", 0.0)]);
        let shear = kwargs(&[("gamma1", 0.1), ("gamma2", 0.0)]);
        let x = array![2.0];
        let y = array![0.0];
        let all = [sis.clone(), shear];
        let (ax, ay) = model.alpha(x.view(), y.view(), &all, &Selection::All).unwrap();
        assert_abs_diff_eq!(ax[0], 1.0 + 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(ay[0], 0.0, epsilon = 1e-12);
        let (ax, _) = model.alpha(x.view(), y.view(), &all, &Selection::Single(0)).unwrap();
        assert_abs_diff_eq!(ax[0], 1.0, epsilon = 1e-12);
        let (xs, _) = model.ray_shooting(x.view(), y.view(), &all, &Selection::All).unwrap();
        assert_abs_diff_eq!(xs[0], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn empty_model_is_identity() {
        let model = MassModel::new::<&str>(&[]).unwrap();
        let x = array![0.3, -1.0, 2.0];
        let y = array![0.1, 0.5, -2.0];
        let (xs, ys) = model.ray_shooting(x.view(), y.view(), &[], &Selection::All).unwrap();
        assert_eq!(xs, x);
        assert_eq!(ys, y);
        assert_eq!(
            model.hessian(x.view(), y.view(), &[], &Selection::All).unwrap(),
            Hessian::zeros(3)
        );
    }

    #[test]
    fn repeated_identifiers_share_instances() {
        let model = MassModel::new(&["SIS", "SIS", "PIXELATED"]).unwrap();
        let profiles: Vec<_> = model.profiles().collect();
        assert!(std::ptr::eq(profiles[0], profiles[1]));
        assert!(!std::ptr::eq(profiles[0], profiles[2]));
        assert_eq!(model.pixelated_index(), Some(2));
        assert!(model.has_pixels());
    }

    #[test]
    fn at_most_one_pixelated() {
        assert_eq!(
            MassModel::new(&["PIXELATED", "SIS", "PIXELATED"]).unwrap_err(),
            ConfigurationError::MultiplePixelatedProfiles {
                family: ProfileFamily::Mass,
                count: 2
            }
        );
    }

    #[test]
    fn pixel_grid_attachment() {
        let mut model = MassModel::new(&["SHEAR", "PIXELATED"]).unwrap();
        let axis = Array1::linspace(-1.0, 1.0, 5);
        model
            .set_pixel_grid(Arc::new(PixelAxes::new(axis.clone(), axis)))
            .unwrap();
        assert_eq!(model.pixel_axes().unwrap().shape(), (5, 5));

        let mut pixels = ProfileKwargs::new();
        pixels.insert("pixels".into(), ParamValue::Grid(Array2::zeros((5, 5))));
        let all = [kwargs(&[("gamma1", 0.0), ("gamma2", 0.0)]), pixels];
        let x = array![0.2];
        let potential = model.potential(x.view(), x.view(), &all, &Selection::All).unwrap();
        assert_eq!(potential[0], 0.0);

        let mut no_pixels = MassModel::new(&["SIS"]).unwrap();
        assert_eq!(
            no_pixels.set_pixel_grid(Arc::new(PixelAxes::new(array![0.0, 1.0], array![0.0, 1.0]))),
            Err(ConfigurationError::NoPixelatedComponent {
                family: ProfileFamily::Mass
            })
        );
    }

    #[test]
    fn too_few_kwargs() {
        let model = MassModel::new(&["SIS", "SHEAR"]).unwrap();
        let x = array![0.0];
        assert_eq!(
            model
                .potential(x.view(), x.view(), &[ProfileKwargs::new()], &Selection::All)
                .unwrap_err(),
            EvaluationError::KwargsLength {
                expected: 2,
                actual: 1
            }
        );
    }
}
