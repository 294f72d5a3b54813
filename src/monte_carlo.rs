/// Monte Carlo evaluation of a policy and summary statistics

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::dynamics::TwoProduct;
use crate::error::{PolicyError, PolicyResult};
use crate::models::{JointState, MonteCarloStats};
use crate::simulation::{simulate_path, DemandSampler, Policy};

/// Simulate `policy` from `initial` many times and summarise terminal cash.
/// The same seed reproduces the same statistics.
pub fn run_monte_carlo<P: Policy + ?Sized>(
    problem: &TwoProduct,
    policy: &mut P,
    initial: &JointState,
    num_simulations: usize,
    seed: u64,
) -> PolicyResult<MonteCarloStats> {
    if num_simulations == 0 {
        return Err(PolicyError::config("Monte Carlo needs at least one simulation"));
    }
    initial.validate(problem.horizon())?;

    let sampler = DemandSampler::new(problem.pmf())?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut final_cash = Vec::with_capacity(num_simulations);

    for _ in 0..num_simulations {
        let (_, cash) = simulate_path(problem, policy, &sampler, initial, &mut rng);
        final_cash.push(cash);
    }

    final_cash.sort_by(|a, b| a.total_cmp(b));

    let mean_cash = final_cash.iter().sum::<f64>() / final_cash.len() as f64;
    let variance = final_cash
        .iter()
        .map(|c| (c - mean_cash).powi(2))
        .sum::<f64>()
        / final_cash.len() as f64;
    let std_dev_cash = variance.sqrt();

    let min_cash = final_cash.first().copied().unwrap_or(0.0);
    let max_cash = final_cash.last().copied().unwrap_or(0.0);

    let percentile = |p: f64| {
        let index = ((p / 100.0) * (final_cash.len() as f64 - 1.0)).round() as usize;
        final_cash[index.min(final_cash.len() - 1)]
    };

    info!(
        policy = policy.name(),
        num_simulations = num_simulations,
        mean_cash = mean_cash,
        std_dev_cash = std_dev_cash,
        "Monte Carlo evaluation finished"
    );

    Ok(MonteCarloStats {
        policy: policy.name().to_string(),
        num_simulations,
        mean_cash,
        std_dev_cash,
        min_cash,
        max_cash,
        percentile_10: percentile(10.0),
        percentile_25: percentile(25.0),
        percentile_50: percentile(50.0),
        percentile_75: percentile(75.0),
        percentile_90: percentile(90.0),
    })
}
