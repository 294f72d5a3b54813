/// Problem configuration
/// Loaded from JSON; the default reproduces the canonical two-product demonstration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::demand::{JointPmf, ProductPmf};
use crate::dynamics::TwoProduct;
use crate::error::{PolicyError, PolicyResult};
use crate::models::{JointState, ProblemParams, ProductParams};

/// Economics and demand of one product.
/// Demand is gamma with shape `mean_demand / demand_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    pub price: f64,
    pub unit_cost: f64,
    pub salvage: f64,
    pub mean_demand: f64,
    pub demand_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialStateConfig {
    pub inventory1: f64,
    pub inventory2: f64,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemConfig {
    pub horizon: u32,
    pub capacity: u32,
    pub max_inventory: f64,
    #[serde(default)]
    pub interest_rate: f64,
    pub products: [ProductConfig; 2],
    pub initial_state: InitialStateConfig,
    /// Demand tails beyond this quantile (and below its complement) are dropped
    #[serde(default = "default_truncated_quantile")]
    pub truncated_quantile: f64,
    /// Seed of the Monte Carlo evaluation
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_monte_carlo_runs")]
    pub monte_carlo_runs: usize,
}

fn default_truncated_quantile() -> f64 {
    0.9999
}

fn default_monte_carlo_runs() -> usize {
    1_000
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig {
            horizon: 1,
            capacity: 30,
            max_inventory: 100.0,
            interest_rate: 0.0,
            products: [
                ProductConfig {
                    price: 1.2,
                    unit_cost: 1.0,
                    salvage: 0.5,
                    mean_demand: 10.0,
                    demand_scale: 1.0 / 2.5,
                },
                ProductConfig {
                    price: 2.0,
                    unit_cost: 1.5,
                    salvage: 0.75,
                    mean_demand: 5.0,
                    demand_scale: 1.0 / 1.25,
                },
            ],
            initial_state: InitialStateConfig {
                inventory1: 0.0,
                inventory2: 0.0,
                cash: 10.0,
            },
            truncated_quantile: default_truncated_quantile(),
            seed: 0,
            monte_carlo_runs: default_monte_carlo_runs(),
        }
    }
}

impl ProblemConfig {
    /// Read and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> PolicyResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        info!(path = %path.as_ref().display(), "loading configuration");
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> PolicyResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PolicyResult<()> {
        self.params().validate()?;
        self.initial_state().validate(self.horizon)?;
        if !(self.truncated_quantile > 0.5 && self.truncated_quantile < 1.0) {
            return Err(PolicyError::config(format!(
                "truncated quantile must lie in (0.5, 1), got {}",
                self.truncated_quantile
            )));
        }
        for product in &self.products {
            if !(product.mean_demand > 0.0 && product.demand_scale > 0.0) {
                return Err(PolicyError::config(format!(
                    "demand mean and scale must be positive, got {} and {}",
                    product.mean_demand, product.demand_scale
                )));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> ProblemParams {
        let product = |p: &ProductConfig| ProductParams {
            price: p.price,
            unit_cost: p.unit_cost,
            salvage: p.salvage,
        };
        ProblemParams {
            horizon: self.horizon,
            capacity: self.capacity,
            max_inventory: self.max_inventory,
            interest_rate: self.interest_rate,
            products: [product(&self.products[0]), product(&self.products[1])],
        }
    }

    pub fn initial_state(&self) -> JointState {
        JointState::new(
            1,
            self.initial_state.inventory1,
            self.initial_state.inventory2,
            self.initial_state.cash,
        )
    }

    /// Discretized demand of both products
    pub fn demand_pmfs(&self) -> PolicyResult<[ProductPmf; 2]> {
        let build = |p: &ProductConfig| {
            ProductPmf::truncated_gamma(p.mean_demand, p.demand_scale, self.truncated_quantile)
        };
        Ok([build(&self.products[0])?, build(&self.products[1])?])
    }

    /// Problem with the independent joint PMF and both marginals set
    pub fn build_problem(&self) -> PolicyResult<TwoProduct> {
        self.validate()?;
        let [first, second] = self.demand_pmfs()?;
        let joint = JointPmf::independent(&first, &second);
        info!(
            demand_points = joint.len(),
            first_points = first.entries().len(),
            second_points = second.entries().len(),
            "demand discretized"
        );
        Ok(TwoProduct::new(self.params(), joint)?.with_product_pmfs(first, second))
    }
}
