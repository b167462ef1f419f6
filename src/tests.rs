use crate::float_trait::Float;

use rand::prelude::*;
use rand_distr::StandardNormal;

/// Reproducible uniform values in `[-1, 1)`
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

pub fn randvec<T>(rng: &mut StdRng, n: usize) -> Vec<T>
where
    T: Float,
    StandardNormal: Distribution<T>,
{
    (0..n)
        .map(|_| {
            let x: T = rng.sample(StandardNormal);
            x
        })
        .collect()
}

pub fn simeq<T: Float>(a: &[T], b: &[T], eps: T) -> bool {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .all(|(&x, &y)| (x - y).abs() < eps + T::max(x.abs(), y.abs()) * eps)
}

// Some tests validating tests

#[test]
fn random_vector_is_seeded() {
    let a = random_vector(16, 0);
    assert_eq!(a, random_vector(16, 0));
    assert_ne!(a, random_vector(16, 1));
    assert!(a.iter().all(|x| (-1.0..1.0).contains(x)));
}

#[test]
fn simeq_is_relative() {
    let mut rng = StdRng::seed_from_u64(0);
    let a: Vec<f64> = randvec(&mut rng, 32);
    let b: Vec<f64> = a.iter().map(|x| x * (1.0 + 1e-14)).collect();
    assert!(simeq(&a, &b, 1e-12));
    assert!(!simeq(&a, &randvec(&mut rng, 32), 1e-12));
}
