/// Single-product relaxation ("a-star" decomposition)
///
/// Dropping the shared cash constraint splits the problem into two
/// independent finite-horizon newsvendor recursions over an integer
/// inventory grid `0..capacity`. Each is solved backward in `O(T * capacity * |PMF|)`
/// and yields per-period order-up-to targets a* and a value table that the
/// guided solver and the heuristics use as a proxy for the coupled value.

use tracing::debug;

use crate::dynamics::TwoProduct;
use crate::error::PolicyResult;
use crate::models::{JointState, Product, SingleState};

/// Best allocation found along the cash-exhausting cut
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Split {
    pub level1: usize,
    pub level2: usize,
    pub value: f64,
}

/// Value and target tables of both single-product recursions.
///
/// Stages are zero-based (`stage = period - 1`); stage `T` is the terminal
/// boundary `(salvage - cost) * level` with a target of 0.
#[derive(Clone, Debug)]
pub struct RelaxationTables {
    horizon: u32,
    capacity: u32,
    values: [Vec<Vec<f64>>; 2],
    targets: [Vec<usize>; 2],
}

/// Run both single-product recursions backward from the terminal boundary
pub fn get_a_stars(problem: &TwoProduct) -> PolicyResult<RelaxationTables> {
    // fail before allocating if the marginals are missing
    for product in Product::ALL {
        problem.product_pmf(product)?;
    }

    let horizon = problem.horizon();
    let capacity = problem.capacity() as usize;
    let stages = horizon as usize + 1;
    let mut tables = RelaxationTables {
        horizon,
        capacity: problem.capacity(),
        values: [vec![vec![0.0; capacity]; stages], vec![vec![0.0; capacity]; stages]],
        targets: [vec![0; stages], vec![0; stages]],
    };

    for product in Product::ALL {
        let params = problem.params().product(product);
        let k = product.index();
        for level in 0..capacity {
            tables.values[k][horizon as usize][level] = (params.salvage - params.unit_cost) * level as f64;
        }
    }

    for t in (0..horizon as usize).rev() {
        for product in Product::ALL {
            tables.compute_stage(problem, t, product)?;
        }
        debug!(
            stage = t,
            target1 = tables.targets[0][t],
            target2 = tables.targets[1][t],
            "relaxation stage solved"
        );
    }
    Ok(tables)
}

impl RelaxationTables {
    /// Fill stage `t` of one product from stage `t + 1`.
    ///
    /// Level `i` is the post-order inventory. Leftover stock carried into
    /// `t + 1` is floored at that stage's own target, the structural
    /// assumption of the decomposition.
    pub fn compute_stage(&mut self, problem: &TwoProduct, t: usize, product: Product) -> PolicyResult<()> {
        let pmf = problem.product_pmf(product)?;
        let params = problem.params().product(product);
        let rate = problem.params().interest_rate;
        let growth = (1.0 + rate).powi(self.horizon as i32 - t as i32);
        let k = product.index();
        let next_target = self.targets[k][t + 1] as f64;

        let mut best_value = f64::MIN;
        for i in 0..self.capacity as usize {
            let level = i as f64;
            let mut this_value = 0.0;
            for entry in pmf.entries() {
                let mut period_value = (params.price - params.unit_cost) * level.min(entry.demand);
                period_value -= rate * params.unit_cost * level;
                period_value *= growth;
                let next_level = next_target.max((level - entry.demand).max(0.0)) as usize;
                period_value += self.values[k][t + 1][next_level];
                this_value += entry.probability * period_value;
            }
            self.values[k][t][i] = this_value;
            if this_value > best_value {
                best_value = this_value;
                self.targets[k][t] = i;
            }
        }
        Ok(())
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    /// Order-up-to target of `product` in 1-based `period`
    pub fn target(&self, product: Product, period: u32) -> usize {
        self.targets[product.index()][period as usize - 1]
    }

    /// Targets for periods `1..=T`, indexed from zero
    pub fn targets(&self, product: Product) -> &[usize] {
        &self.targets[product.index()][..self.horizon as usize]
    }

    pub fn value(&self, product: Product, stage: usize, level: usize) -> f64 {
        self.values[product.index()][stage][level]
    }

    /// Relaxation value of a single-product state (period is 1-based,
    /// `T + 1` addresses the terminal boundary)
    pub fn value_at(&self, state: &SingleState) -> Option<f64> {
        let stage = (state.period as usize).checked_sub(1)?;
        self.values[state.product.index()]
            .get(stage)?
            .get(state.inventory as usize)
            .copied()
    }

    /// Search the cut that spends all cash: product 1 is raised to each
    /// level `y1` from its current inventory upward while the cash covers
    /// it, product 2 gets whatever the remaining cash buys. Product 2 never
    /// drops below its stock on hand and is capped at the top of the grid.
    pub fn best_split(&self, problem: &TwoProduct, state: &JointState, stage: usize) -> Option<Split> {
        let cost1 = problem.params().products[0].unit_cost;
        let cost2 = problem.params().products[1].unit_cost;
        let top = self.capacity as usize - 1;
        let floor2 = state.inventory2().floor();

        let mut best: Option<Split> = None;
        let start = state.inventory1().ceil().max(0.0) as usize;
        for y1 in start..self.capacity as usize {
            let remaining = state.cash() - cost1 * (y1 as f64 - state.inventory1());
            if remaining < 0.0 {
                break;
            }
            let y2 = (state.inventory2() + remaining / cost2).floor().max(floor2);
            let y2 = (y2 as usize).min(top);
            let value = self.values[0][stage][y1] + self.values[1][stage][y2];
            if best.map_or(true, |b| value > b.value) {
                best = Some(Split {
                    level1: y1,
                    level2: y2,
                    value,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::JointPmf;
    use crate::dynamics::tests::{demo_params, demo_problem, lopsided_problem, small_problem};
    use crate::error::PolicyError;
    use crate::exact::ExactSolver;

    #[test]
    fn test_requires_product_pmfs() {
        let joint = JointPmf::new(vec![(1.0, 1.0, 1.0)]).unwrap();
        let problem = TwoProduct::new(demo_params(2, 5), joint).unwrap();
        assert!(matches!(get_a_stars(&problem), Err(PolicyError::MissingProductPmfs)));
    }

    #[test]
    fn test_terminal_boundary() {
        let problem = small_problem(2);
        let tables = get_a_stars(&problem).unwrap();
        for level in 0..6 {
            assert!((tables.value(Product::First, 2, level) - (-0.5 * level as f64)).abs() < 1e-12);
            assert!((tables.value(Product::Second, 2, level) - (-0.75 * level as f64)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_targets_two_periods() {
        let tables = get_a_stars(&small_problem(2)).unwrap();
        assert_eq!(tables.targets(Product::First), &[3, 1]);
        assert_eq!(tables.targets(Product::Second), &[2, 0]);
        assert_eq!(tables.target(Product::First, 2), 1);
    }

    #[test]
    fn test_single_period_newsvendor_values() {
        let tables = get_a_stars(&demo_problem()).unwrap();
        assert_eq!(tables.target(Product::First, 1), 10);
        assert_eq!(tables.target(Product::Second, 1), 4);
        // E[(1.2-1.0) min(10, D) + (0.5-1.0)(10-D)+] with D in {8,10,12}
        assert!((tables.value(Product::First, 0, 10) - 1.65).abs() < 1e-12);
        assert!((tables.value(Product::Second, 0, 4) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_value_at_single_state() {
        let tables = get_a_stars(&demo_problem()).unwrap();
        let state = SingleState::new(1, 10, Product::First);
        assert_eq!(tables.value_at(&state), Some(tables.value(Product::First, 0, 10)));
        assert_eq!(tables.value_at(&SingleState::new(1, 30, Product::First)), None);
        assert_eq!(tables.value_at(&SingleState::new(0, 1, Product::First)), None);
        // the terminal boundary is addressable as period T + 1
        assert_eq!(tables.value_at(&SingleState::new(2, 2, Product::Second)), Some(-1.5));
    }

    #[test]
    fn test_decomposition_exact_with_unlimited_cash() {
        let problem = demo_problem();
        let tables = get_a_stars(&problem).unwrap();
        let relaxed = tables.value(Product::First, 0, tables.target(Product::First, 1))
            + tables.value(Product::Second, 0, tables.target(Product::Second, 1));

        let root = JointState::new(1, 0.0, 0.0, 1_000.0);
        let result = ExactSolver::new(&problem).solve(&root).unwrap();
        assert!((result.expected_cash - root.cash() - relaxed).abs() < 1e-9);
        assert_eq!((result.order1, result.order2), (10.0, 4.0));
    }

    #[test]
    fn test_best_split_spends_all_cash() {
        let problem = demo_problem();
        let tables = get_a_stars(&problem).unwrap();
        let split = tables
            .best_split(&problem, &JointState::new(1, 0.0, 0.0, 10.0), 0)
            .unwrap();
        assert!(split.level1 as f64 + 1.5 * split.level2 as f64 <= 10.0 + 1e-9);
        assert!((split.value - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_best_split_never_sells_back_stock() {
        let problem = lopsided_problem();
        let tables = get_a_stars(&problem).unwrap();
        // one unit of cash; trading product 2 stock for product 1 would score higher
        let state = JointState::new(1, 0.0, 3.0, 1.0);
        let split = tables.best_split(&problem, &state, 0).unwrap();
        assert_eq!((split.level1, split.level2), (1, 3));
        assert!((split.value - 1.3).abs() < 1e-9);
        assert!(1.0 * split.level1 as f64 + 1.5 * (split.level2 as f64 - 3.0) <= state.cash());
    }

    #[test]
    fn test_best_split_empty_when_stock_above_grid() {
        let problem = small_problem(1);
        let tables = get_a_stars(&problem).unwrap();
        assert!(tables.best_split(&problem, &JointState::new(1, 7.0, 0.0, 5.0), 0).is_none());
    }
}
