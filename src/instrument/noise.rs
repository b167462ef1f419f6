use crate::float_trait::Float;

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::{Deserialize, Serialize};

/// Noise model of the observed image
pub trait NoiseProvider {
    /// Noise to add to a noiseless `model` image, reproducible for a given `seed`
    fn realisation(
        &self,
        model: ArrayView2<f64>,
        seed: u64,
        add_poisson: bool,
        add_gaussian: bool,
    ) -> Array2<f64>;

    /// Per-pixel variance expected for a model image
    fn variance<T: Float>(&self, model: ArrayView2<T>) -> Array2<T>;

    /// Keep `data` as the observed image
    fn set_data(&mut self, data: Array2<f64>);

    fn data(&self) -> Option<ArrayView2<'_, f64>>;

    /// Fix the noise map to the one expected for the noiseless `model`
    fn compute_noise_map_from_model(&mut self, model: ArrayView2<f64>);
}

/// Gaussian background plus Poisson shot noise
///
/// Without an exposure time the shot-noise term is dropped. Once a noise map is set, the
/// variance of a same-shaped image is the squared map instead of the model-dependent one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Noise {
    pub background_rms: f64,
    pub exposure_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Array2<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    noise_map: Option<Array2<f64>>,
}

impl Noise {
    pub fn new(background_rms: f64, exposure_time: Option<f64>) -> Self {
        Self {
            background_rms,
            exposure_time,
            data: None,
            noise_map: None,
        }
    }

    /// Per-pixel standard deviation replacing the model-dependent variance
    pub fn with_noise_map(mut self, noise_map: Array2<f64>) -> Self {
        self.noise_map = Some(noise_map);
        self
    }

    pub fn noise_map(&self) -> Option<ArrayView2<'_, f64>> {
        self.noise_map.as_ref().map(|map| map.view())
    }

    fn model_variance<T: Float>(&self, model: ArrayView2<T>) -> Array2<T> {
        let background = T::lit(self.background_rms.powi(2));
        match self.exposure_time {
            Some(exposure_time) => {
                let exposure_time = T::lit(exposure_time);
                model.mapv(|m| background + m.max(T::zero()) / exposure_time)
            }
            None => Array2::from_elem(model.dim(), background),
        }
    }
}

impl NoiseProvider for Noise {
    fn realisation(
        &self,
        model: ArrayView2<f64>,
        seed: u64,
        add_poisson: bool,
        add_gaussian: bool,
    ) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut noise = Array2::zeros(model.dim());
        if add_poisson {
            if let Some(exposure_time) = self.exposure_time {
                noise.zip_mut_with(&model, |n, &m| {
                    let counts = m.max(0.0) * exposure_time;
                    // no shot noise where the rate is not a valid Poisson rate
                    if let Ok(poisson) = Poisson::new(counts) {
                        *n += poisson.sample(&mut rng) / exposure_time - m.max(0.0);
                    }
                });
            }
        }
        if add_gaussian {
            noise.mapv_inplace(|n| {
                let z: f64 = StandardNormal.sample(&mut rng);
                n + self.background_rms * z
            });
        }
        noise
    }

    fn variance<T: Float>(&self, model: ArrayView2<T>) -> Array2<T> {
        match &self.noise_map {
            Some(noise_map) if noise_map.dim() == model.dim() => noise_map.mapv(|s| T::lit(s * s)),
            _ => self.model_variance(model),
        }
    }

    fn set_data(&mut self, data: Array2<f64>) {
        self.data = Some(data);
    }

    fn data(&self) -> Option<ArrayView2<'_, f64>> {
        self.data.as_ref().map(|data| data.view())
    }

    fn compute_noise_map_from_model(&mut self, model: ArrayView2<f64>) {
        self.noise_map = Some(self.model_variance(model).mapv(f64::sqrt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn variance_model() {
        let noise = Noise::new(0.5, Some(100.0));
        let model = array![[0.0, -3.0], [10.0, 2.0]];
        assert_abs_diff_eq!(
            noise.variance(model.view()),
            array![[0.25, 0.25], [0.35, 0.27]],
            epsilon = 1e-12
        );
        assert_eq!(
            Noise::new(2.0, None).variance(model.view()),
            Array2::from_elem((2, 2), 4.0)
        );
    }

    #[test]
    fn realisation_is_seeded() {
        let noise = Noise::new(1.0, Some(10.0));
        let model = Array2::from_elem((20, 20), 3.0);
        let a = noise.realisation(model.view(), 18, true, true);
        let b = noise.realisation(model.view(), 18, true, true);
        let c = noise.realisation(model.view(), 19, true, true);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            noise.realisation(model.view(), 18, false, false),
            Array2::<f64>::zeros((20, 20))
        );
    }

    #[test]
    fn invalid_rates_get_no_shot_noise() {
        let noise = Noise::new(1.0, Some(10.0));
        let model = array![[0.0, f64::INFINITY], [-2.0, f64::NAN]];
        let sample = noise.realisation(model.view(), 3, true, false);
        assert_eq!(sample, Array2::<f64>::zeros((2, 2)));
    }

    #[test]
    fn noise_map_from_model() {
        let mut noise = Noise::new(0.5, Some(100.0));
        let truth = array![[0.0, 10.0], [2.0, 75.0]];
        noise.compute_noise_map_from_model(truth.view());
        assert_abs_diff_eq!(
            noise.noise_map().unwrap(),
            array![[0.5, 0.35_f64.sqrt()], [0.27_f64.sqrt(), 1.0]],
            epsilon = 1e-12
        );
        // the map wins over the model for same-shaped images only
        let other = Array2::from_elem((2, 2), 1e4);
        assert_abs_diff_eq!(
            noise.variance(other.view()),
            array![[0.25, 0.35], [0.27, 1.0]],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            noise.variance(Array2::<f64>::zeros((3, 3)).view()),
            Array2::from_elem((3, 3), 0.25),
            epsilon = 1e-12
        );

        assert!(noise.data().is_none());
        noise.set_data(truth.clone());
        assert_eq!(noise.data(), Some(truth.view()));
    }

    #[test]
    fn gaussian_noise_scale() {
        let noise = Noise::new(2.0, None);
        let model = Array2::zeros((100, 100));
        let sample = noise.realisation(model.view(), 0, true, true);
        let std = sample.std(0.0);
        assert!((std - 2.0).abs() < 0.1, "std = {std}");
        assert!(sample.mean().unwrap().abs() < 0.1);
    }
}
