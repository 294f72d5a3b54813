/// Demand distribution module
/// Discretized probability mass functions consumed by the solvers, plus a
/// truncated-gamma generator for building them

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, Gamma};
use tracing::warn;

use crate::error::{PolicyError, PolicyResult};

/// Accepted deviation of a PMF total from 1 before a warning is logged
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

const QUANTILE_ITERATIONS: usize = 100;

/// One joint demand realization (demand1, demand2) and its probability
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointDemand {
    pub demand1: f64,
    pub demand2: f64,
    pub probability: f64,
}

/// One single-product demand realization and its probability
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProductDemand {
    pub demand: f64,
    pub probability: f64,
}

/// Marginal demand distribution of one product
#[derive(Clone, Debug, PartialEq)]
pub struct ProductPmf {
    entries: Vec<ProductDemand>,
}

impl ProductPmf {
    /// Build from (demand, probability) pairs
    pub fn new(pairs: Vec<(f64, f64)>) -> PolicyResult<Self> {
        let entries: Vec<ProductDemand> = pairs
            .into_iter()
            .map(|(demand, probability)| ProductDemand { demand, probability })
            .collect();
        for entry in &entries {
            check_entry(entry.demand, entry.probability)?;
        }
        check_total(entries.iter().map(|e| e.probability).sum(), "product")?;
        Ok(ProductPmf { entries })
    }

    pub fn entries(&self) -> &[ProductDemand] {
        &self.entries
    }

    pub fn total_probability(&self) -> f64 {
        self.entries.iter().map(|e| e.probability).sum()
    }

    pub fn mean(&self) -> f64 {
        self.entries.iter().map(|e| e.demand * e.probability).sum()
    }

    /// Discretize a gamma demand (shape = mean / scale).
    ///
    /// Demand `d` gets the mass of `[d - 0.5, d + 0.5)`, with the lower edge
    /// clipped at 0, for every integer `d` in
    /// `[floor(Q(1 - quantile)), floor(Q(quantile))]`. Masses are divided by
    /// `F(upper) - F(lower)`, so the total can sit slightly off 1.
    pub fn truncated_gamma(mean: f64, scale: f64, quantile: f64) -> PolicyResult<Self> {
        if !(mean > 0.0 && scale > 0.0) {
            return Err(PolicyError::Distribution(format!(
                "gamma mean and scale must be positive, got mean={} scale={}",
                mean, scale
            )));
        }
        if !(quantile > 0.5 && quantile < 1.0) {
            return Err(PolicyError::Distribution(format!(
                "truncation quantile must lie in (0.5, 1), got {}",
                quantile
            )));
        }

        let gamma = Gamma::new(mean / scale, 1.0 / scale)
            .map_err(|e| PolicyError::Distribution(e.to_string()))?;

        let lower = gamma_quantile(&gamma, 1.0 - quantile).floor();
        let upper = gamma_quantile(&gamma, quantile).floor();
        let denominator = gamma.cdf(upper) - gamma.cdf(lower);
        if !(denominator > 0.0) {
            return Err(PolicyError::degenerate(format!(
                "no gamma mass between truncation bounds {} and {}",
                lower, upper
            )));
        }

        let pairs = (lower as u64..=upper as u64)
            .map(|d| {
                let d = d as f64;
                let mass = gamma.cdf(d + 0.5) - gamma.cdf((d - 0.5).max(0.0));
                (d, mass / denominator)
            })
            .collect();
        ProductPmf::new(pairs)
    }
}

/// Bisection on the CDF. Converges to well below the integer spacing the
/// truncation bounds are floored to.
fn gamma_quantile(gamma: &Gamma, p: f64) -> f64 {
    let mut high = 1.0;
    while gamma.cdf(high) < p {
        high *= 2.0;
    }
    let mut low = 0.0;
    for _ in 0..QUANTILE_ITERATIONS {
        let mid = 0.5 * (low + high);
        if gamma.cdf(mid) < p {
            low = mid;
        } else {
            high = mid;
        }
    }
    0.5 * (low + high)
}

/// Joint demand distribution of both products
#[derive(Clone, Debug, PartialEq)]
pub struct JointPmf {
    entries: Vec<JointDemand>,
}

impl JointPmf {
    /// Build from (demand1, demand2, probability) triples
    pub fn new(triples: Vec<(f64, f64, f64)>) -> PolicyResult<Self> {
        let entries: Vec<JointDemand> = triples
            .into_iter()
            .map(|(demand1, demand2, probability)| JointDemand {
                demand1,
                demand2,
                probability,
            })
            .collect();
        for entry in &entries {
            check_entry(entry.demand1, entry.probability)?;
            check_entry(entry.demand2, entry.probability)?;
        }
        check_total(entries.iter().map(|e| e.probability).sum(), "joint")?;
        Ok(JointPmf { entries })
    }

    /// Product of two independent marginals, product 1 outer, product 2 inner
    pub fn independent(first: &ProductPmf, second: &ProductPmf) -> Self {
        let entries = first
            .entries()
            .iter()
            .flat_map(|a| {
                second.entries().iter().map(move |b| JointDemand {
                    demand1: a.demand,
                    demand2: b.demand,
                    probability: a.probability * b.probability,
                })
            })
            .collect();
        JointPmf { entries }
    }

    pub fn entries(&self) -> &[JointDemand] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_probability(&self) -> f64 {
        self.entries.iter().map(|e| e.probability).sum()
    }

    /// Marginal distribution of each product, demands ascending
    pub fn marginals(&self) -> [ProductPmf; 2] {
        let mut first: BTreeMap<u64, f64> = BTreeMap::new();
        let mut second: BTreeMap<u64, f64> = BTreeMap::new();
        // non-negative floats order the same as their bit patterns
        for entry in &self.entries {
            *first.entry(entry.demand1.to_bits()).or_insert(0.0) += entry.probability;
            *second.entry(entry.demand2.to_bits()).or_insert(0.0) += entry.probability;
        }
        let collect = |map: BTreeMap<u64, f64>| ProductPmf {
            entries: map
                .into_iter()
                .map(|(bits, probability)| ProductDemand {
                    demand: f64::from_bits(bits),
                    probability,
                })
                .collect(),
        };
        [collect(first), collect(second)]
    }
}

fn check_entry(demand: f64, probability: f64) -> PolicyResult<()> {
    if !demand.is_finite() || demand < 0.0 {
        return Err(PolicyError::degenerate(format!(
            "demand must be a non-negative number, got {}",
            demand
        )));
    }
    if !probability.is_finite() || probability < 0.0 {
        return Err(PolicyError::degenerate(format!(
            "probability must be a non-negative number, got {}",
            probability
        )));
    }
    Ok(())
}

fn check_total(total: f64, kind: &str) -> PolicyResult<()> {
    if !(total > 0.0) {
        return Err(PolicyError::degenerate(format!(
            "{} PMF has total probability {}",
            kind, total
        )));
    }
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        warn!(kind = kind, total = total, "PMF total deviates from 1; using it as given");
    }
    Ok(())
}
