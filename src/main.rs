use std::process::ExitCode;
use std::time::Instant;

use tracing::error;

use cash_inventory_dp::config::ProblemConfig;
use cash_inventory_dp::exact::ExactSolver;
use cash_inventory_dp::guided::GuidedSolver;
use cash_inventory_dp::heuristics::{heuristic1, MyopicSolver};
use cash_inventory_dp::logging;
use cash_inventory_dp::monte_carlo::run_monte_carlo;
use cash_inventory_dp::relaxation::get_a_stars;
use cash_inventory_dp::reporting::{
    display_approximations, display_exact_result, display_header, display_monte_carlo, display_targets,
};
use cash_inventory_dp::simulation::{ExactPolicy, TargetPolicy};
use cash_inventory_dp::PolicyResult;

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> PolicyResult<()> {
    // Optional first argument: path to a JSON configuration
    let config = match std::env::args().nth(1) {
        Some(path) => ProblemConfig::load(path)?,
        None => ProblemConfig::default(),
    };
    display_header(&config);

    let problem = config.build_problem()?;
    let initial = config.initial_state();

    let start_time = Instant::now();
    let mut exact = ExactSolver::new(&problem);
    let result = exact.solve(&initial)?;
    display_exact_result(&result, start_time.elapsed(), exact.cache_len());

    let tables = get_a_stars(&problem)?;
    display_targets(&tables);

    let theorem2 = GuidedSolver::theorem2(&problem, &tables).expected_cash(&initial)?;
    let heuristic1_2 = GuidedSolver::heuristic1_2(&problem, &tables).expected_cash(&initial)?;
    let myopic = MyopicSolver::new(&problem).expected_cash(&initial)?;
    display_approximations(
        result.expected_cash,
        &[
            ("recursion2", Some(theorem2)),
            ("heuristic1", heuristic1(&problem, &tables, &initial)),
            ("heuristic1_2", Some(heuristic1_2)),
            ("heuristic2", Some(myopic)),
        ],
    );

    let stats = run_monte_carlo(
        &problem,
        &mut ExactPolicy::new(&exact),
        &initial,
        config.monte_carlo_runs,
        config.seed,
    )?;
    display_monte_carlo(&stats);

    let stats = run_monte_carlo(
        &problem,
        &mut TargetPolicy::new(&problem, &tables),
        &initial,
        config.monte_carlo_runs,
        config.seed,
    )?;
    display_monte_carlo(&stats);

    Ok(())
}
