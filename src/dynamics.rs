/// Transition and reward primitives of the two-product cash-constrained problem
/// Every solver is built on these three pure functions

use tracing::debug;

use crate::demand::{JointDemand, JointPmf, ProductPmf};
use crate::error::{PolicyError, PolicyResult};
use crate::models::{Action, JointState, ProblemParams, Product};

/// Slack on the affordability test `cost1*q1 + cost2*q2 < cash + 0.1`.
///
/// Part of the feasibility contract: orders whose cost exceeds the cash
/// balance by less than this amount are still feasible.
pub const AFFORDABILITY_TOLERANCE: f64 = 0.1;

/// Problem definition: parameters, joint demand and (for the relaxation)
/// per-product marginal demand
#[derive(Clone, Debug)]
pub struct TwoProduct {
    params: ProblemParams,
    pmf: JointPmf,
    product_pmfs: Option<[ProductPmf; 2]>,
}

impl TwoProduct {
    pub fn new(params: ProblemParams, pmf: JointPmf) -> PolicyResult<Self> {
        params.validate()?;
        if pmf.is_empty() || !(pmf.total_probability() > 0.0) {
            return Err(PolicyError::degenerate("joint PMF carries no probability mass"));
        }
        debug!(
            horizon = params.horizon,
            capacity = params.capacity,
            demand_points = pmf.len(),
            "problem created"
        );
        Ok(TwoProduct {
            params,
            pmf,
            product_pmfs: None,
        })
    }

    /// Supply the per-product demand used by the relaxation
    pub fn set_product_pmfs(&mut self, first: ProductPmf, second: ProductPmf) {
        self.product_pmfs = Some([first, second]);
    }

    /// Builder-style variant of [`TwoProduct::set_product_pmfs`]
    pub fn with_product_pmfs(mut self, first: ProductPmf, second: ProductPmf) -> Self {
        self.set_product_pmfs(first, second);
        self
    }

    pub fn params(&self) -> &ProblemParams {
        &self.params
    }

    pub fn horizon(&self) -> u32 {
        self.params.horizon
    }

    pub fn capacity(&self) -> u32 {
        self.params.capacity
    }

    pub fn pmf(&self) -> &JointPmf {
        &self.pmf
    }

    pub fn product_pmf(&self, product: Product) -> PolicyResult<&ProductPmf> {
        self.product_pmfs
            .as_ref()
            .map(|pmfs| &pmfs[product.index()])
            .ok_or(PolicyError::MissingProductPmfs)
    }

    pub fn ordering_cost(&self, action: &Action) -> f64 {
        self.params.products[0].unit_cost * action.order1
            + self.params.products[1].unit_cost * action.order2
    }

    /// Every integer order pair in `0..capacity` whose cost is within cash
    /// plus [`AFFORDABILITY_TOLERANCE`]. Order is `q1` ascending, then `q2`
    /// ascending; `(0, 0)` is always first.
    pub fn feasible_actions(&self, state: &JointState) -> Vec<Action> {
        let capacity = self.params.capacity;
        let cost1 = self.params.products[0].unit_cost;
        let cost2 = self.params.products[1].unit_cost;
        let budget = state.cash() + AFFORDABILITY_TOLERANCE;

        let mut actions = Vec::with_capacity((capacity as usize) * (capacity as usize));
        for q1 in 0..capacity {
            for q2 in 0..capacity {
                if cost1 * (q1 as f64) + cost2 * (q2 as f64) < budget {
                    actions.push(Action::new(q1 as f64, q2 as f64));
                }
            }
        }
        actions
    }

    /// Post-demand inventory `max(inventory + order - demand, 0)`, capped at max inventory
    pub fn ending_inventory(&self, state: &JointState, action: &Action, demand: &JointDemand) -> [f64; 2] {
        let max_inventory = self.params.max_inventory;
        let end1 = (state.inventory1() + action.order1 - demand.demand1).max(0.0);
        let end2 = (state.inventory2() + action.order2 - demand.demand2).max(0.0);
        [end1.min(max_inventory), end2.min(max_inventory)]
    }

    /// Next start-of-period state: ending inventories and cash plus the period's value
    pub fn state_transition(&self, state: &JointState, action: &Action, demand: &JointDemand) -> JointState {
        let [end1, end2] = self.ending_inventory(state, action, demand);
        let next_cash = state.cash() + self.immediate_value(state, action, demand);
        JointState::new(state.period() + 1, end1, end2, next_cash)
    }

    /// Net cash generated in one period: sales revenue, salvage in the last
    /// period only, minus ordering cost, plus interest on cash left after ordering
    pub fn immediate_value(&self, state: &JointState, action: &Action, demand: &JointDemand) -> f64 {
        let [end1, end2] = self.ending_inventory(state, action, demand);
        let [first, second] = &self.params.products;

        let revenue1 = first.price * (state.inventory1() + action.order1 - end1);
        let revenue2 = second.price * (state.inventory2() + action.order2 - end2);
        let ordering_cost = self.ordering_cost(action);
        let salvage_value = if state.period() == self.params.horizon {
            first.salvage * end1 + second.salvage * end2
        } else {
            0.0
        };
        let interest = self.params.interest_rate * (state.cash() - ordering_cost);

        revenue1 + revenue2 + salvage_value + interest - ordering_cost
    }
}
