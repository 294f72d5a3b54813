/// Exact solver: top-down memoized backward induction over the joint state
///
/// Only states reachable from the root are visited. Recursion depth is
/// bounded by the number of remaining periods, but the work per period grows
/// with capacity² × |joint PMF| and the cash dimension rarely lets states
/// collapse, so large capacities or horizons are expensive.

use std::collections::HashMap;

use tracing::info;

use crate::dynamics::TwoProduct;
use crate::error::PolicyResult;
use crate::models::{Action, JointState, SolveResult};

/// Value-to-go memo keyed by exact state
pub type ValueTable = HashMap<JointState, f64>;

pub struct ExactSolver<'a> {
    problem: &'a TwoProduct,
    values: ValueTable,
    actions: HashMap<JointState, Action>,
}

impl<'a> ExactSolver<'a> {
    pub fn new(problem: &'a TwoProduct) -> Self {
        ExactSolver {
            problem,
            values: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    /// Expected terminal cash from `state` and the optimal orders there
    pub fn solve(&mut self, state: &JointState) -> PolicyResult<SolveResult> {
        state.validate(self.problem.horizon())?;
        info!(
            period = state.period(),
            horizon = self.problem.horizon(),
            cash = state.cash(),
            "exact solve started"
        );

        let value = self.recursion(state);
        let action = self.actions.get(state).copied().unwrap_or(Action::NONE);

        info!(
            states = self.values.len(),
            expected_cash = value + state.cash(),
            "exact solve finished"
        );
        Ok(SolveResult {
            expected_cash: value + state.cash(),
            order1: action.order1,
            order2: action.order2,
        })
    }

    /// Optimal value-to-go of `state`; records value and argmax action.
    /// Ties keep the first action in enumeration order.
    pub fn recursion(&mut self, state: &JointState) -> f64 {
        let problem = self.problem;
        let last_period = state.period() >= problem.horizon();

        let mut best_action = Action::NONE;
        let mut best_value = f64::MIN;
        for action in problem.feasible_actions(state) {
            let mut this_value = 0.0;
            for demand in problem.pmf().entries() {
                this_value += demand.probability * problem.immediate_value(state, &action, demand);
                if !last_period {
                    let next = problem.state_transition(state, &action, demand);
                    let next_value = match self.values.get(&next) {
                        Some(&cached) => cached,
                        None => self.recursion(&next),
                    };
                    this_value += demand.probability * next_value;
                }
            }
            if this_value > best_value {
                best_value = this_value;
                best_action = action;
            }
        }

        self.values.insert(*state, best_value);
        self.actions.insert(*state, best_action);
        best_value
    }

    pub fn value(&self, state: &JointState) -> Option<f64> {
        self.values.get(state).copied()
    }

    pub fn action(&self, state: &JointState) -> Option<Action> {
        self.actions.get(state).copied()
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn cache_len(&self) -> usize {
        self.values.len()
    }
}
