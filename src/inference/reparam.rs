use crate::error::EvaluationError;
use crate::float_trait::Float;
use crate::inference::{Constraint, ConstraintTrait};

use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named site values of a probabilistic program
pub type SiteValues<T> = BTreeMap<String, ArrayD<T>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Deterministic parameter, optimized but without a prior density
    Param,
    /// Random variable drawn from a distribution
    Sample,
}

/// One named site of a traced probabilistic program
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub kind: SiteKind,
    /// Constraint of a parameter or support of a distribution
    pub constraint: Constraint,
    /// Number of rightmost dimensions forming a single event
    pub event_dim: usize,
    /// Full value shape of one draw, batch and event dimensions
    pub shape: Vec<usize>,
    /// Current step of an enclosing sequential loop
    pub scan_index: Option<usize>,
    pub is_observed: bool,
    pub is_discrete: bool,
}

impl Site {
    pub fn param(name: impl Into<String>, constraint: Constraint, event_dim: usize) -> Self {
        Self {
            name: name.into(),
            kind: SiteKind::Param,
            constraint,
            event_dim,
            shape: vec![],
            scan_index: None,
            is_observed: false,
            is_discrete: false,
        }
    }

    pub fn sample(
        name: impl Into<String>,
        support: Constraint,
        event_dim: usize,
        shape: Vec<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SiteKind::Sample,
            constraint: support,
            event_dim,
            shape,
            scan_index: None,
            is_observed: false,
            is_discrete: false,
        }
    }

    pub fn observed(mut self) -> Self {
        self.is_observed = true;
        self
    }

    pub fn discrete(mut self) -> Self {
        self.is_discrete = true;
        self
    }

    pub fn in_scan(mut self, index: usize) -> Self {
        self.scan_index = Some(index);
        self
    }

    /// Whether values of this site live in an unconstrained space during inference
    fn is_transformed(&self) -> bool {
        match self.kind {
            SiteKind::Param => true,
            SiteKind::Sample => !self.is_observed && !self.is_discrete,
        }
    }
}

/// Constrained value substituted for a site
#[derive(Clone, Debug, PartialEq)]
pub struct Reparam<T> {
    pub value: ArrayD<T>,
    /// Log-density factor of sample sites, summed over event dimensions
    pub log_det: Option<ArrayD<T>>,
}

fn sum_rightmost<T: Float>(mut a: ArrayD<T>, n: usize) -> ArrayD<T> {
    for _ in 0..n.min(a.ndim()) {
        a = a.sum_axis(Axis(a.ndim() - 1));
    }
    a
}

/// Constrained value for `site` from unconstrained `params`, `None` if the site is not there
///
/// Parameter sites are only transformed. Sample sites also produce the log-abs-det-Jacobian
/// factor, and inside a scan a value with an extra leading time dimension is sliced at the
/// current index.
pub fn unconstrain_reparam<T: Float>(params: &SiteValues<T>, site: &Site) -> Option<Reparam<T>> {
    let mut p = params.get(&site.name)?.clone();
    let constraint = &site.constraint;
    match site.kind {
        SiteKind::Param => Some(Reparam {
            value: p.mapv(|x| constraint.forward(x)),
            log_det: None,
        }),
        SiteKind::Sample => {
            if let Some(index) = site.scan_index {
                if p.ndim() > site.shape.len() && index < p.len_of(Axis(0)) {
                    p = p.index_axis(Axis(0), index).to_owned();
                }
            }
            if constraint.is_real() {
                return Some(Reparam {
                    value: p,
                    log_det: None,
                });
            }
            let value = p.mapv(|x| constraint.forward(x));
            let log_det = sum_rightmost(p.mapv(|x| constraint.log_abs_det_jacobian(x)), site.event_dim);
            Some(Reparam {
                value,
                log_det: Some(log_det),
            })
        }
    }
}

/// Negative joint log-density at unconstrained `params`
///
/// Every site of `trace` found in `params` is substituted by its constrained value and its
/// Jacobian factor is added; `log_density` evaluates the program on the substituted values.
pub fn potential_energy<T, F>(
    trace: &[Site],
    params: &SiteValues<T>,
    log_density: F,
) -> Result<T, EvaluationError>
where
    T: Float,
    F: FnOnce(&SiteValues<T>) -> Result<T, EvaluationError>,
{
    let mut values = SiteValues::new();
    let mut log_det = T::zero();
    for site in trace {
        if let Some(reparam) = unconstrain_reparam(params, site) {
            if let Some(factor) = reparam.log_det {
                log_det += factor.fold(T::zero(), |acc, &x| acc + x);
            }
            values.insert(site.name.clone(), reparam.value);
        }
    }
    log::trace!("substituted {} of {} sites", values.len(), trace.len());
    Ok(-(log_density(&values)? + log_det))
}

fn transform_values<T: Float>(trace: &[Site], params: &SiteValues<T>, invert: bool) -> SiteValues<T> {
    trace
        .iter()
        .filter(|site| site.is_transformed())
        .filter_map(|site| {
            let value = params.get(&site.name)?;
            let constraint = &site.constraint;
            let transformed = if invert {
                value.mapv(|y| constraint.inverse(y))
            } else {
                value.mapv(|x| constraint.forward(x))
            };
            Some((site.name.clone(), transformed))
        })
        .collect()
}

/// Map unconstrained values of the latent sites into their supports
pub fn constrain<T: Float>(trace: &[Site], params: &SiteValues<T>) -> SiteValues<T> {
    transform_values(trace, params, false)
}

/// Map constrained values of the latent sites to the real line
pub fn unconstrain<T: Float>(trace: &[Site], params: &SiteValues<T>) -> SiteValues<T> {
    transform_values(trace, params, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{arr0, array, ArrayD, IxDyn};

    fn values(pairs: Vec<(&str, ArrayD<f64>)>) -> SiteValues<f64> {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn param_site_has_no_jacobian() {
        let site = Site::param("scale", Constraint::positive(), 0);
        let params = values(vec![("scale", arr0(0.5).into_dyn())]);
        let reparam = unconstrain_reparam(&params, &site).unwrap();
        assert_abs_diff_eq!(reparam.value[IxDyn(&[])], 0.5_f64.exp(), epsilon = 1e-15);
        assert!(reparam.log_det.is_none());
        assert!(unconstrain_reparam(&params, &Site::param("other", Constraint::real(), 0)).is_none());
    }

    #[test]
    fn sample_site_sums_event_dims() {
        let params = values(vec![("w", array![[0.1, -0.2], [0.3, 0.0]].into_dyn())]);
        let batch = Site::sample("w", Constraint::positive(), 0, vec![2, 2]);
        let log_det = unconstrain_reparam(&params, &batch).unwrap().log_det.unwrap();
        assert_eq!(log_det.shape(), &[2, 2]);

        let event = Site::sample("w", Constraint::positive(), 1, vec![2, 2]);
        let reparam = unconstrain_reparam(&params, &event).unwrap();
        let log_det = reparam.log_det.unwrap();
        assert_eq!(log_det.shape(), &[2]);
        // d exp(x) / dx = exp(x), so the log-det of each event is the sum of its entries
        assert_abs_diff_eq!(log_det[[0]], -0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(log_det[[1]], 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(reparam.value[[1, 0]], 0.3_f64.exp(), epsilon = 1e-15);
    }

    #[test]
    fn real_sample_site_is_passed_through() {
        let params = values(vec![("mu", array![1.5, -2.0].into_dyn())]);
        let site = Site::sample("mu", Constraint::real(), 0, vec![2]);
        let reparam = unconstrain_reparam(&params, &site).unwrap();
        assert_eq!(reparam.value, params["mu"]);
        assert!(reparam.log_det.is_none());
    }

    #[test]
    fn scan_slices_time_dimension() {
        let params = values(vec![("z", array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]].into_dyn())]);
        let site = Site::sample("z", Constraint::real(), 0, vec![2]).in_scan(1);
        let reparam = unconstrain_reparam(&params, &site).unwrap();
        assert_eq!(reparam.value, array![2.0, 3.0].into_dyn());

        // no extra dimension, nothing to slice
        let site = Site::sample("z", Constraint::real(), 0, vec![3, 2]).in_scan(1);
        assert_eq!(unconstrain_reparam(&params, &site).unwrap().value.shape(), &[3, 2]);
    }

    #[test]
    fn potential_energy_adds_jacobian() {
        let trace = vec![
            Site::sample("sigma", Constraint::positive(), 0, vec![]),
            Site::param("offset", Constraint::real(), 0),
            Site::sample("data", Constraint::real(), 0, vec![3]).observed(),
        ];
        let params = values(vec![
            ("sigma", arr0(0.2).into_dyn()),
            ("offset", arr0(1.0).into_dyn()),
        ]);
        let energy = potential_energy(&trace, &params, |values| {
            assert!(!values.contains_key("data"));
            let sigma = values["sigma"][IxDyn(&[])];
            let offset = values["offset"][IxDyn(&[])];
            Ok(-sigma + offset)
        })
        .unwrap();
        assert_abs_diff_eq!(energy, -(-0.2_f64.exp() + 1.0 + 0.2), epsilon = 1e-15);
    }

    #[test]
    fn constrain_round_trip_skips_observed_and_discrete() {
        let trace = vec![
            Site::sample("a", Constraint::interval(-1.0, 3.0), 0, vec![2]),
            Site::param("b", Constraint::less_than(1.0), 0),
            Site::sample("k", Constraint::positive(), 0, vec![]).discrete(),
            Site::sample("y", Constraint::real(), 0, vec![]).observed(),
        ];
        let params = values(vec![
            ("a", array![-0.5, 2.0].into_dyn()),
            ("b", arr0(0.0).into_dyn()),
            ("k", arr0(3.0).into_dyn()),
            ("y", arr0(7.0).into_dyn()),
        ]);
        let constrained = constrain(&trace, &params);
        assert_eq!(constrained.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_abs_diff_eq!(constrained["b"][IxDyn(&[])], 0.0, epsilon = 1e-15);
        let back = unconstrain(&trace, &constrained);
        assert_abs_diff_eq!(back["a"], params["a"], epsilon = 1e-12);
        assert_abs_diff_eq!(back["b"], params["b"], epsilon = 1e-12);
    }
}
