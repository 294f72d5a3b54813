/// Forward simulation of a replenishment policy over the horizon
/// Demand is sampled from the joint PMF, one realization per period

use rand::Rng;
use rand_distr::{Distribution, WeightedAliasIndex};

use crate::demand::{JointDemand, JointPmf};
use crate::dynamics::{TwoProduct, AFFORDABILITY_TOLERANCE};
use crate::error::{PolicyError, PolicyResult};
use crate::exact::ExactSolver;
use crate::models::{Action, JointState, PeriodResult, Product};
use crate::relaxation::RelaxationTables;

/// Ordering rule applied at the start of each period
pub trait Policy {
    fn order(&mut self, state: &JointState) -> Action;

    fn name(&self) -> &str;
}

/// Replays the argmax actions recorded by an exact solve.
/// States the solve never reached get no order.
pub struct ExactPolicy<'a> {
    solver: &'a ExactSolver<'a>,
}

impl<'a> ExactPolicy<'a> {
    pub fn new(solver: &'a ExactSolver<'a>) -> Self {
        ExactPolicy { solver }
    }
}

impl Policy for ExactPolicy<'_> {
    fn order(&mut self, state: &JointState) -> Action {
        self.solver.action(state).unwrap_or(Action::NONE)
    }

    fn name(&self) -> &str {
        "exact"
    }
}

/// Base-stock rule on the relaxation targets. When cash cannot close both
/// gaps, product 1 is filled first and product 2 gets what is left, in
/// whole units.
pub struct TargetPolicy<'a> {
    problem: &'a TwoProduct,
    tables: &'a RelaxationTables,
}

impl<'a> TargetPolicy<'a> {
    pub fn new(problem: &'a TwoProduct, tables: &'a RelaxationTables) -> Self {
        TargetPolicy { problem, tables }
    }
}

impl Policy for TargetPolicy<'_> {
    fn order(&mut self, state: &JointState) -> Action {
        let params = self.problem.params();
        let costs = [params.products[0].unit_cost, params.products[1].unit_cost];
        let mut remaining = [0.0; 2];
        for product in Product::ALL {
            let target = self.tables.target(product, state.period()) as f64;
            remaining[product.index()] = (target - state.inventory(product)).max(0.0).floor();
        }

        let budget = state.cash() + AFFORDABILITY_TOLERANCE;
        let mut spent = 0.0;
        let mut order = [0.0; 2];
        for product in Product::ALL {
            let k = product.index();
            while remaining[k] >= 1.0 && spent + costs[k] < budget {
                order[k] += 1.0;
                remaining[k] -= 1.0;
                spent += costs[k];
            }
        }
        Action::new(order[0], order[1])
    }

    fn name(&self) -> &str {
        "order-up-to targets"
    }
}

/// Draws joint demand realizations in proportion to their probability
pub struct DemandSampler<'a> {
    pmf: &'a JointPmf,
    index: WeightedAliasIndex<f64>,
}

impl<'a> DemandSampler<'a> {
    pub fn new(pmf: &'a JointPmf) -> PolicyResult<Self> {
        let weights = pmf.entries().iter().map(|e| e.probability).collect();
        let index = WeightedAliasIndex::new(weights)
            .map_err(|e| PolicyError::Distribution(e.to_string()))?;
        Ok(DemandSampler { pmf, index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &JointDemand {
        &self.pmf.entries()[self.index.sample(rng)]
    }
}

/// Run one trajectory from `initial` to the end of the horizon.
/// Returns the per-period results and the terminal cash.
pub fn simulate_path<P: Policy + ?Sized, R: Rng + ?Sized>(
    problem: &TwoProduct,
    policy: &mut P,
    sampler: &DemandSampler,
    initial: &JointState,
    rng: &mut R,
) -> (Vec<PeriodResult>, f64) {
    let mut state = *initial;
    let mut period_results = Vec::with_capacity(problem.horizon() as usize);

    while state.period() <= problem.horizon() {
        let action = policy.order(&state);
        let demand = sampler.sample(rng);
        let inventory_end = problem.ending_inventory(&state, &action, demand);
        let period_value = problem.immediate_value(&state, &action, demand);
        let next = problem.state_transition(&state, &action, demand);

        period_results.push(PeriodResult {
            period: state.period(),
            inventory_start: [state.inventory1(), state.inventory2()],
            cash_start: state.cash(),
            order: action,
            demand: [demand.demand1, demand.demand2],
            units_sold: [
                state.inventory1() + action.order1 - inventory_end[0],
                state.inventory2() + action.order2 - inventory_end[1],
            ],
            inventory_end,
            period_value,
            cash_end: next.cash(),
        });
        state = next;
    }

    (period_results, state.cash())
}
