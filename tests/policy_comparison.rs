//! Cross-checks between the exact solver, the relaxation and the approximate policies

use cash_inventory_dp::config::ProblemConfig;
use cash_inventory_dp::logging;
use cash_inventory_dp::monte_carlo::run_monte_carlo;
use cash_inventory_dp::simulation::{ExactPolicy, TargetPolicy};
use cash_inventory_dp::{
    get_a_stars, heuristic1, ExactSolver, GuidedSolver, JointPmf, JointState, MyopicSolver,
    ProblemParams, Product, ProductParams, ProductPmf, TwoProduct,
};

fn params(horizon: u32, capacity: u32) -> ProblemParams {
    ProblemParams {
        horizon,
        capacity,
        max_inventory: 100.0,
        interest_rate: 0.0,
        products: [
            ProductParams { price: 1.2, unit_cost: 1.0, salvage: 0.5 },
            ProductParams { price: 2.0, unit_cost: 1.5, salvage: 0.75 },
        ],
    }
}

fn problem(horizon: u32, capacity: u32, first: Vec<(f64, f64)>, second: Vec<(f64, f64)>) -> TwoProduct {
    let first = ProductPmf::new(first).unwrap();
    let second = ProductPmf::new(second).unwrap();
    let joint = JointPmf::independent(&first, &second);
    TwoProduct::new(params(horizon, capacity), joint)
        .unwrap()
        .with_product_pmfs(first, second)
}

fn demonstration() -> TwoProduct {
    problem(1, 30, vec![(8.0, 0.25), (10.0, 0.5), (12.0, 0.25)], vec![(4.0, 0.5), (6.0, 0.5)])
}

fn two_period() -> TwoProduct {
    problem(2, 6, vec![(1.0, 0.5), (3.0, 0.5)], vec![(0.0, 0.5), (2.0, 0.5)])
}

#[test]
fn demonstration_golden_triple() {
    logging::init_test();
    let problem = demonstration();
    let result = ExactSolver::new(&problem)
        .solve(&JointState::new(1, 0.0, 0.0, 10.0))
        .unwrap();
    let (cash, q1, q2) = result.as_triple();
    assert!((cash - 12.8).abs() < 1e-9);
    assert_eq!((q1, q2), (4.0, 4.0));
}

#[test]
fn canonical_configuration_golden_triple() {
    let config = ProblemConfig::default();
    let problem = config.build_problem().unwrap();
    let (cash, q1, q2) = ExactSolver::new(&problem)
        .solve(&config.initial_state())
        .unwrap()
        .as_triple();
    assert!((cash - 12.39042526417951).abs() < 1e-8);
    assert_eq!((q1, q2), (5.0, 3.0));
}

#[test]
fn decomposition_is_exact_without_cash_pressure() {
    for horizon in [1, 2] {
        let problem = problem(horizon, 6, vec![(1.0, 0.5), (3.0, 0.5)], vec![(0.0, 0.5), (2.0, 0.5)]);
        let tables = get_a_stars(&problem).unwrap();
        let relaxed = tables.value(Product::First, 0, tables.target(Product::First, 1))
            + tables.value(Product::Second, 0, tables.target(Product::Second, 1));

        let root = JointState::new(1, 0.0, 0.0, 1_000.0);
        let exact = ExactSolver::new(&problem).solve(&root).unwrap();
        assert!(
            (exact.expected_cash - root.cash() - relaxed).abs() < 1e-9,
            "horizon {}: exact {} vs relaxed {}",
            horizon,
            exact.expected_cash - root.cash(),
            relaxed
        );
    }
}

#[test]
fn every_policy_reports_a_finite_value() {
    let problem = two_period();
    let tables = get_a_stars(&problem).unwrap();
    let root = JointState::new(1, 0.0, 0.0, 3.0);

    let exact = ExactSolver::new(&problem).solve(&root).unwrap().expected_cash;
    let values = [
        GuidedSolver::theorem2(&problem, &tables).expected_cash(&root).unwrap(),
        GuidedSolver::heuristic1_2(&problem, &tables).expected_cash(&root).unwrap(),
        heuristic1(&problem, &tables, &root).unwrap(),
        MyopicSolver::new(&problem).expected_cash(&root).unwrap(),
    ];
    assert!((exact - 3.5875).abs() < 1e-9);
    for value in values {
        assert!(value.is_finite());
        // nobody ends with less than the cash they could simply keep
        assert!(value >= root.cash() - 1e-9);
    }
}

#[test]
fn myopic_policy_never_beats_the_optimum() {
    let problem = two_period();
    for cash in [1.0, 2.0, 4.0, 6.0] {
        let root = JointState::new(1, 0.0, 0.0, cash);
        let exact = ExactSolver::new(&problem).solve(&root).unwrap().expected_cash;
        let myopic = MyopicSolver::new(&problem).expected_cash(&root).unwrap();
        assert!(myopic <= exact + 1e-9, "cash {}: {} > {}", cash, myopic, exact);
    }
}

#[test]
fn exact_policy_outperforms_target_policy_in_simulation() {
    let problem = two_period();
    let tables = get_a_stars(&problem).unwrap();
    let root = JointState::new(1, 0.0, 0.0, 3.0);
    let mut exact = ExactSolver::new(&problem);
    let optimum = exact.solve(&root).unwrap().expected_cash;

    let exact_stats = run_monte_carlo(&problem, &mut ExactPolicy::new(&exact), &root, 20_000, 5).unwrap();
    let target_stats =
        run_monte_carlo(&problem, &mut TargetPolicy::new(&problem, &tables), &root, 20_000, 5).unwrap();

    assert!((exact_stats.mean_cash - optimum).abs() < 0.05);
    assert!(target_stats.mean_cash <= optimum + 0.05);
}
