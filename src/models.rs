use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::{PolicyError, PolicyResult};

/// One of the two stocked products
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Product {
    First,
    Second,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::First, Product::Second];

    /// Zero-based position in per-product arrays
    pub fn index(self) -> usize {
        match self {
            Product::First => 0,
            Product::Second => 1,
        }
    }
}

/// Per-product economics
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProductParams {
    pub price: f64,
    pub unit_cost: f64,
    pub salvage: f64,
}

/// Problem parameters shared by every solver
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemParams {
    /// Number of periods T
    pub horizon: u32,
    /// Order quantities and relaxation levels range over 0..capacity
    pub capacity: u32,
    /// Ending inventory is clipped to this level
    pub max_inventory: f64,
    pub interest_rate: f64,
    pub products: [ProductParams; 2],
}

impl ProblemParams {
    pub fn product(&self, product: Product) -> &ProductParams {
        &self.products[product.index()]
    }

    pub fn validate(&self) -> PolicyResult<()> {
        if self.horizon < 1 {
            return Err(PolicyError::config("horizon must be at least 1"));
        }
        if self.capacity < 1 {
            return Err(PolicyError::config("capacity must be at least 1"));
        }
        if !self.max_inventory.is_finite() || self.max_inventory < 0.0 {
            return Err(PolicyError::config(format!(
                "max inventory must be a non-negative number, got {}",
                self.max_inventory
            )));
        }
        if !self.interest_rate.is_finite() {
            return Err(PolicyError::config("interest rate must be finite"));
        }
        for product in Product::ALL {
            let p = self.product(product);
            if !(p.price.is_finite() && p.unit_cost.is_finite() && p.salvage.is_finite()) {
                return Err(PolicyError::config(format!(
                    "{:?} product has a non-finite price, cost or salvage value",
                    product
                )));
            }
            if p.unit_cost <= 0.0 {
                return Err(PolicyError::config(format!(
                    "{:?} product unit cost must be positive, got {}",
                    product, p.unit_cost
                )));
            }
        }
        Ok(())
    }
}

/// Start-of-period state of the coupled problem, before ordering.
///
/// Used as a memoization key, so equality is exact floating-point equality
/// on (period, inventory1, inventory2, cash) with no tolerance. Negative zero
/// is folded into positive zero on construction so that `Eq`, `Hash` and
/// `Ord` agree. Values are expected to be finite.
#[derive(Clone, Copy, Debug)]
pub struct JointState {
    period: u32,
    inventory1: f64,
    inventory2: f64,
    cash: f64,
}

impl JointState {
    pub fn new(period: u32, inventory1: f64, inventory2: f64, cash: f64) -> Self {
        debug_assert!(!inventory1.is_nan() && !inventory2.is_nan() && !cash.is_nan());
        JointState {
            period,
            inventory1: inventory1 + 0.0,
            inventory2: inventory2 + 0.0,
            cash: cash + 0.0,
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn inventory1(&self) -> f64 {
        self.inventory1
    }

    pub fn inventory2(&self) -> f64 {
        self.inventory2
    }

    pub fn inventory(&self, product: Product) -> f64 {
        match product {
            Product::First => self.inventory1,
            Product::Second => self.inventory2,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Checks the state is usable as the root of a solve
    pub fn validate(&self, horizon: u32) -> PolicyResult<()> {
        if self.period < 1 || self.period > horizon {
            return Err(PolicyError::PeriodOutOfRange {
                period: self.period,
                horizon,
            });
        }
        if !(self.inventory1.is_finite() && self.inventory2.is_finite()) {
            return Err(PolicyError::config("initial inventory must be finite"));
        }
        if self.inventory1 < 0.0 || self.inventory2 < 0.0 {
            return Err(PolicyError::config("initial inventory must be non-negative"));
        }
        if !self.cash.is_finite() {
            return Err(PolicyError::config("initial cash must be finite"));
        }
        Ok(())
    }
}

impl PartialEq for JointState {
    fn eq(&self, other: &Self) -> bool {
        self.period == other.period
            && self.inventory1 == other.inventory1
            && self.inventory2 == other.inventory2
            && self.cash == other.cash
    }
}

impl Eq for JointState {}

impl Hash for JointState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.period.hash(state);
        self.inventory1.to_bits().hash(state);
        self.inventory2.to_bits().hash(state);
        self.cash.to_bits().hash(state);
    }
}

impl Ord for JointState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.period
            .cmp(&other.period)
            .then_with(|| self.inventory1.total_cmp(&other.inventory1))
            .then_with(|| self.inventory2.total_cmp(&other.inventory2))
            .then_with(|| self.cash.total_cmp(&other.cash))
    }
}

impl PartialOrd for JointState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-product state of the relaxation: (period, inventory level, product).
///
/// Equality and hashing look at (period, inventory) only and ignore
/// `product`. Two states of different products at the same level compare
/// equal, so a `SingleState` must only ever key a table that is already
/// split per product (as the relaxation tables are).
#[derive(Clone, Copy, Debug)]
pub struct SingleState {
    pub period: u32,
    pub inventory: u32,
    pub product: Product,
}

impl SingleState {
    pub fn new(period: u32, inventory: u32, product: Product) -> Self {
        SingleState {
            period,
            inventory,
            product,
        }
    }
}

impl PartialEq for SingleState {
    fn eq(&self, other: &Self) -> bool {
        self.period == other.period && self.inventory == other.inventory
    }
}

impl Eq for SingleState {}

impl Hash for SingleState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.period.hash(state);
        self.inventory.hash(state);
    }
}

impl Ord for SingleState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.period
            .cmp(&other.period)
            .then_with(|| self.inventory.cmp(&other.inventory))
    }
}

impl PartialOrd for SingleState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order quantities for both products
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action {
    pub order1: f64,
    pub order2: f64,
}

impl Action {
    pub const NONE: Action = Action {
        order1: 0.0,
        order2: 0.0,
    };

    pub fn new(order1: f64, order2: f64) -> Self {
        Action { order1, order2 }
    }

    pub fn quantity(&self, product: Product) -> f64 {
        match product {
            Product::First => self.order1,
            Product::Second => self.order2,
        }
    }
}

/// Exact solve output: expected terminal cash and the optimal first-period orders
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveResult {
    pub expected_cash: f64,
    pub order1: f64,
    pub order2: f64,
}

impl SolveResult {
    pub fn as_triple(&self) -> (f64, f64, f64) {
        (self.expected_cash, self.order1, self.order2)
    }
}

/// One period of a simulated trajectory
#[derive(Clone, Debug)]
pub struct PeriodResult {
    pub period: u32,
    pub inventory_start: [f64; 2],
    pub cash_start: f64,
    pub order: Action,
    pub demand: [f64; 2],
    pub units_sold: [f64; 2],
    pub inventory_end: [f64; 2],
    pub period_value: f64,
    pub cash_end: f64,
}

/// Monte Carlo statistics for one policy
#[derive(Debug, Clone)]
pub struct MonteCarloStats {
    pub policy: String,
    pub num_simulations: usize,
    pub mean_cash: f64,
    pub std_dev_cash: f64,
    pub min_cash: f64,
    pub max_cash: f64,
    pub percentile_10: f64,
    pub percentile_25: f64,
    pub percentile_50: f64, // Median
    pub percentile_75: f64,
    pub percentile_90: f64,
}
