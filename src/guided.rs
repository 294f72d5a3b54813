/// Bound-guided joint recursion
///
/// Uses the relaxation targets a* to replace the full action search with a
/// closed-form order in most states. Values produced here approximate the
/// exact value-to-go; they coincide with it only in special cases (e.g. both
/// products already at target with zero interest).

use std::collections::HashMap;

use tracing::debug;

use crate::dynamics::TwoProduct;
use crate::error::PolicyResult;
use crate::exact::ValueTable;
use crate::models::{Action, JointState, Product};
use crate::relaxation::RelaxationTables;

/// Inventory counts as below target when it is more than this under it
pub const TARGET_TOLERANCE: f64 = 0.1;

/// Position of the inventories relative to the current targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    /// Both products at or above target
    BothAtTarget,
    /// Product 1 at or above target, product 2 below
    SecondBelow,
    /// Product 2 at or above target, product 1 below
    FirstBelow,
    BothBelow,
}

impl Regime {
    pub fn classify(state: &JointState, target1: f64, target2: f64) -> Regime {
        let first_below = state.inventory1() < target1 - TARGET_TOLERANCE;
        let second_below = state.inventory2() < target2 - TARGET_TOLERANCE;
        match (first_below, second_below) {
            (false, false) => Regime::BothAtTarget,
            (false, true) => Regime::SecondBelow,
            (true, false) => Regime::FirstBelow,
            (true, true) => Regime::BothBelow,
        }
    }
}

/// How a state's value is obtained
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// Take this order and evaluate its true expectation
    Order(Action),
    /// Score the cash-exhausting cut with relaxation values, no recursion
    RelaxationCut,
    /// Exhaustive search over feasible actions
    FullSearch,
}

/// The two guided policies. They share the regime logic but differ when
/// both products are below target and cash cannot reach both targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuidedVariant {
    /// Uses the cut only before the last period and only when next period's
    /// targets are affordable, adds the financing correction to the cut
    /// value, otherwise searches every feasible action
    Theorem2,
    /// Always uses the cut and reports the bare relaxation value
    Heuristic12,
}

pub struct GuidedSolver<'a> {
    problem: &'a TwoProduct,
    tables: &'a RelaxationTables,
    variant: GuidedVariant,
    values: ValueTable,
}

impl<'a> GuidedSolver<'a> {
    pub fn new(problem: &'a TwoProduct, tables: &'a RelaxationTables, variant: GuidedVariant) -> Self {
        GuidedSolver {
            problem,
            tables,
            variant,
            values: HashMap::new(),
        }
    }

    /// Guided recursion with the financing-corrected cut and full-search fallback
    pub fn theorem2(problem: &'a TwoProduct, tables: &'a RelaxationTables) -> Self {
        Self::new(problem, tables, GuidedVariant::Theorem2)
    }

    /// Guided recursion that always cuts and omits the correction term
    pub fn heuristic1_2(problem: &'a TwoProduct, tables: &'a RelaxationTables) -> Self {
        Self::new(problem, tables, GuidedVariant::Heuristic12)
    }

    pub fn variant(&self) -> GuidedVariant {
        self.variant
    }

    /// Approximate expected terminal cash from `state`
    pub fn expected_cash(&mut self, state: &JointState) -> PolicyResult<f64> {
        state.validate(self.problem.horizon())?;
        debug!(variant = ?self.variant, decision = ?self.plan(state), "guided solve started");
        Ok(self.recursion(state) + state.cash())
    }

    /// Classify `state` and pick how its value is obtained
    pub fn plan(&self, state: &JointState) -> Decision {
        let period = state.period();
        let params = self.problem.params();
        let cost1 = params.products[0].unit_cost;
        let cost2 = params.products[1].unit_cost;
        let target1 = self.tables.target(Product::First, period) as f64;
        let target2 = self.tables.target(Product::Second, period) as f64;
        let (inventory1, inventory2, cash) = (state.inventory1(), state.inventory2(), state.cash());

        match Regime::classify(state, target1, target2) {
            Regime::BothAtTarget => Decision::Order(Action::NONE),
            Regime::SecondBelow => {
                let level = target2.min(cash / cost2 + inventory2);
                Decision::Order(Action::new(0.0, (level - inventory2).max(0.0)))
            }
            Regime::FirstBelow => {
                let level = target1.min(cash / cost1 + inventory1);
                Decision::Order(Action::new((level - inventory1).max(0.0), 0.0))
            }
            Regime::BothBelow => {
                let needed = cost1 * (target1 - inventory1) + cost2 * (target2 - inventory2);
                if cash > needed {
                    return Decision::Order(Action::new(target1 - inventory1, target2 - inventory2));
                }
                match self.variant {
                    GuidedVariant::Heuristic12 => Decision::RelaxationCut,
                    GuidedVariant::Theorem2 => {
                        if period < self.problem.horizon() {
                            let next1 = self.tables.target(Product::First, period + 1) as f64;
                            let next2 = self.tables.target(Product::Second, period + 1) as f64;
                            if cash > cost1 * (next1 - inventory1) + cost2 * (next2 - inventory2) {
                                return Decision::RelaxationCut;
                            }
                        }
                        Decision::FullSearch
                    }
                }
            }
        }
    }

    /// Guided value-to-go of `state`, cached in this solver's own table
    pub fn recursion(&mut self, state: &JointState) -> f64 {
        let value = match self.plan(state) {
            Decision::Order(action) => self.action_value(state, &action),
            Decision::RelaxationCut => match self.cut_value(state) {
                Some(value) => value,
                None => self.full_search(state),
            },
            Decision::FullSearch => self.full_search(state),
        };
        self.values.insert(*state, value);
        value
    }

    /// True one-step expectation of `action`, continuing with this policy
    fn action_value(&mut self, state: &JointState, action: &Action) -> f64 {
        let problem = self.problem;
        let last_period = state.period() >= problem.horizon();

        let mut this_value = 0.0;
        for demand in problem.pmf().entries() {
            this_value += demand.probability * problem.immediate_value(state, action, demand);
            if !last_period {
                let next = problem.state_transition(state, action, demand);
                let next_value = match self.values.get(&next) {
                    Some(&cached) => cached,
                    None => self.recursion(&next),
                };
                this_value += demand.probability * next_value;
            }
        }
        this_value
    }

    fn full_search(&mut self, state: &JointState) -> f64 {
        let mut best_value = f64::MIN;
        for action in self.problem.feasible_actions(state) {
            let this_value = self.action_value(state, &action);
            if this_value > best_value {
                best_value = this_value;
            }
        }
        best_value
    }

    fn cut_value(&self, state: &JointState) -> Option<f64> {
        let stage = state.period() as usize - 1;
        let split = self.tables.best_split(self.problem, state, stage)?;
        match self.variant {
            GuidedVariant::Heuristic12 => Some(split.value),
            GuidedVariant::Theorem2 => Some(split.value + self.financing_correction(state, stage)),
        }
    }

    /// Converts a relaxation value into value-to-go: the cash and stock
    /// already held, grown at the interest rate over the remaining periods,
    /// less the current cash
    fn financing_correction(&self, state: &JointState, stage: usize) -> f64 {
        let params = self.problem.params();
        let held = state.cash()
            + params.products[0].unit_cost * state.inventory1()
            + params.products[1].unit_cost * state.inventory2();
        let remaining = self.problem.horizon() as i32 - stage as i32;
        held * (1.0 + params.interest_rate).powi(remaining) - state.cash()
    }

    pub fn value(&self, state: &JointState) -> Option<f64> {
        self.values.get(state).copied()
    }

    pub fn cache_len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::tests::{demo_problem, small_problem};
    use crate::exact::ExactSolver;
    use crate::relaxation::get_a_stars;

    #[test]
    fn test_regime_classification() {
        let at = |i1: f64, i2: f64| Regime::classify(&JointState::new(1, i1, i2, 0.0), 3.0, 2.0);
        assert_eq!(at(3.0, 2.0), Regime::BothAtTarget);
        assert_eq!(at(2.95, 5.0), Regime::BothAtTarget);
        assert_eq!(at(4.0, 1.0), Regime::SecondBelow);
        assert_eq!(at(1.0, 2.0), Regime::FirstBelow);
        assert_eq!(at(0.0, 0.0), Regime::BothBelow);
    }

    // small problem targets: period 1 -> (3, 2), period 2 -> (1, 0)

    #[test]
    fn test_plan_orders_up_to_targets() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let solver = GuidedSolver::theorem2(&problem, &tables);

        assert_eq!(
            solver.plan(&JointState::new(1, 3.0, 4.0, 10.0)),
            Decision::Order(Action::NONE)
        );
        assert_eq!(
            solver.plan(&JointState::new(1, 0.0, 0.0, 10.0)),
            Decision::Order(Action::new(3.0, 2.0))
        );
        // product 2 below, cash buys only part of the gap
        assert_eq!(
            solver.plan(&JointState::new(1, 3.0, 0.0, 1.5)),
            Decision::Order(Action::new(0.0, 1.0))
        );
        // product 1 below, cash covers the gap
        assert_eq!(
            solver.plan(&JointState::new(1, 1.0, 2.0, 10.0)),
            Decision::Order(Action::new(2.0, 0.0))
        );
    }

    #[test]
    fn test_plan_cash_short_of_both_targets() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let theorem2 = GuidedSolver::theorem2(&problem, &tables);
        let heuristic = GuidedSolver::heuristic1_2(&problem, &tables);

        // next-period targets cost 1.0
        let affordable_next = JointState::new(1, 0.0, 0.0, 2.0);
        let short_next = JointState::new(1, 0.0, 0.0, 0.5);
        assert_eq!(theorem2.plan(&affordable_next), Decision::RelaxationCut);
        assert_eq!(theorem2.plan(&short_next), Decision::FullSearch);
        assert_eq!(heuristic.plan(&affordable_next), Decision::RelaxationCut);
        assert_eq!(heuristic.plan(&short_next), Decision::RelaxationCut);
    }

    #[test]
    fn test_theorem2_never_cuts_in_last_period() {
        // single period, targets (10, 4)
        let problem = demo_problem();
        let tables = get_a_stars(&problem).unwrap();
        let state = JointState::new(1, 0.0, 0.0, 0.5);
        assert_eq!(GuidedSolver::theorem2(&problem, &tables).plan(&state), Decision::FullSearch);
        assert_eq!(
            GuidedSolver::heuristic1_2(&problem, &tables).plan(&state),
            Decision::RelaxationCut
        );
    }

    #[test]
    fn test_matches_exact_when_stock_is_above_target() {
        let problem = small_problem(1);
        let tables = get_a_stars(&problem).unwrap();
        let root = JointState::new(1, 5.0, 5.0, 2.0);

        let exact = ExactSolver::new(&problem).solve(&root).unwrap().expected_cash;
        let guided = GuidedSolver::theorem2(&problem, &tables).expected_cash(&root).unwrap();
        assert!((exact - 10.9).abs() < 1e-9);
        assert!((guided - exact).abs() < 1e-9);
    }

    #[test]
    fn test_two_period_values() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let root = JointState::new(1, 0.0, 0.0, 4.0);

        let mut theorem2 = GuidedSolver::theorem2(&problem, &tables);
        let mut heuristic = GuidedSolver::heuristic1_2(&problem, &tables);
        assert!((theorem2.expected_cash(&root).unwrap() - 4.775).abs() < 1e-9);
        assert!((heuristic.expected_cash(&root).unwrap() - 4.775).abs() < 1e-9);
        // both gaps cost 6 and cash 4 reaches period-2 targets, so the root is cut
        assert_eq!(theorem2.plan(&root), Decision::RelaxationCut);
        assert!(theorem2.value(&root).is_some());
        assert_eq!(theorem2.cache_len(), 1);
    }

    #[test]
    fn test_affordable_targets_recurse_into_next_period() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let root = JointState::new(1, 0.0, 0.0, 8.0);

        let mut theorem2 = GuidedSolver::theorem2(&problem, &tables);
        assert_eq!(theorem2.plan(&root), Decision::Order(Action::new(3.0, 2.0)));
        let exact = ExactSolver::new(&problem).solve(&root).unwrap().expected_cash;
        assert!((theorem2.expected_cash(&root).unwrap() - exact).abs() < 1e-9);
        assert!((exact - 8.9).abs() < 1e-9);
        // root plus one state per demand pair
        assert_eq!(theorem2.cache_len(), 5);
    }

    #[test]
    fn test_variants_diverge_on_short_cash() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let root = JointState::new(1, 0.0, 0.0, 0.5);

        let exact = ExactSolver::new(&problem).solve(&root).unwrap().expected_cash;
        let theorem2 = GuidedSolver::theorem2(&problem, &tables).expected_cash(&root).unwrap();
        let heuristic = GuidedSolver::heuristic1_2(&problem, &tables).expected_cash(&root).unwrap();

        assert!((exact - 0.5).abs() < 1e-9);
        // fractional order-up-to quantities in period 2
        assert!((theorem2 - 0.6).abs() < 1e-9);
        // bare relaxation value of the cut
        assert!((heuristic - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_tables_are_not_shared_between_variants() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        let root = JointState::new(1, 0.0, 0.0, 0.5);

        let mut theorem2 = GuidedSolver::theorem2(&problem, &tables);
        let mut heuristic = GuidedSolver::heuristic1_2(&problem, &tables);
        theorem2.recursion(&root);
        heuristic.recursion(&root);
        assert_ne!(theorem2.value(&root), heuristic.value(&root));
        assert_eq!(heuristic.cache_len(), 1);
    }
}
