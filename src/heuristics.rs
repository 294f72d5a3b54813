/// Cheaper approximate policies built on the same primitives

use std::collections::HashMap;

use tracing::debug;

use crate::dynamics::TwoProduct;
use crate::error::PolicyResult;
use crate::exact::ValueTable;
use crate::models::{Action, JointState};
use crate::relaxation::RelaxationTables;

/// Expected terminal cash read straight off the first-stage relaxation
/// tables: the best cash-exhausting split plus the cash and stock already
/// held, grown over the full horizon. No recursion.
///
/// Returns `None` when product 1 already holds more than the grid covers.
pub fn heuristic1(problem: &TwoProduct, tables: &RelaxationTables, state: &JointState) -> Option<f64> {
    let params = problem.params();
    let split = tables.best_split(problem, state, 0)?;
    let held = state.cash()
        + params.products[0].unit_cost * state.inventory1()
        + params.products[1].unit_cost * state.inventory2();
    let addition = held * (1.0 + params.interest_rate).powi(problem.horizon() as i32);
    debug!(level1 = split.level1, level2 = split.level2, "heuristic1 split");
    Some(split.value + addition)
}

/// Myopic policy: in each state pick the action with the best one-step
/// value, where the continuation is only counted for successor states
/// already present in a reference table (typically the exact solver's).
///
/// After choosing, the solver still recurses along the chosen action and
/// stores `best + continuation` for the state, yet `heuristic2` returns only
/// `best`. Stored and returned values therefore differ in every period
/// before the last. Callers comparing policies should use the returned value.
pub struct MyopicSolver<'a> {
    problem: &'a TwoProduct,
    reference: Option<&'a ValueTable>,
    values: ValueTable,
}

impl<'a> MyopicSolver<'a> {
    pub fn new(problem: &'a TwoProduct) -> Self {
        MyopicSolver {
            problem,
            reference: None,
            values: HashMap::new(),
        }
    }

    /// Consult `reference` for continuation values while choosing actions
    pub fn with_reference(problem: &'a TwoProduct, reference: &'a ValueTable) -> Self {
        MyopicSolver {
            problem,
            reference: Some(reference),
            values: HashMap::new(),
        }
    }

    pub fn expected_cash(&mut self, state: &JointState) -> PolicyResult<f64> {
        state.validate(self.problem.horizon())?;
        Ok(self.heuristic2(state) + state.cash())
    }

    pub fn heuristic2(&mut self, state: &JointState) -> f64 {
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
                    if let Some(cached) = self.reference.and_then(|table| table.get(&next)) {
                        this_value += demand.probability * cached;
                    }
                }
            }
            if this_value > best_value {
                best_value = this_value;
                best_action = action;
            }
        }

        let mut continuation = 0.0;
        if !last_period {
            for demand in problem.pmf().entries() {
                continuation += demand.probability * problem.immediate_value(state, &best_action, demand);
                let next = problem.state_transition(state, &best_action, demand);
                let next_value = match self.values.get(&next) {
                    Some(&cached) => cached,
                    None => self.heuristic2(&next),
                };
                continuation += demand.probability * next_value;
            }
        }

        self.values.insert(*state, best_value + continuation);
        best_value
    }

    /// Value stored for `state`, which includes the continuation term
    pub fn stored(&self, state: &JointState) -> Option<f64> {
        self.values.get(state).copied()
    }

    pub fn cache_len(&self) -> usize {
        self.values.len()
    }
}
