/// Console output of the demonstration driver

use std::time::Duration;

use crate::config::ProblemConfig;
use crate::models::{MonteCarloStats, Product, SolveResult};
use crate::relaxation::RelaxationTables;

pub fn display_header(config: &ProblemConfig) {
    println!("╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║            CASH-CONSTRAINED TWO-PRODUCT REPLENISHMENT                        ║");
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");

    println!(
        "Horizon: {} periods | Capacity: {} | Max inventory: {} | Interest: {:.2}%",
        config.horizon,
        config.capacity,
        config.max_inventory,
        config.interest_rate * 100.0
    );
    for (i, product) in config.products.iter().enumerate() {
        println!(
            "  Product {}: Price={:.2}, Cost={:.2}, Salvage={:.2}, Demand mean={:.1} (scale {:.2})",
            i + 1,
            product.price,
            product.unit_cost,
            product.salvage,
            product.mean_demand,
            product.demand_scale
        );
    }
    println!(
        "Initial state: I1={}, I2={}, cash={:.2}\n",
        config.initial_state.inventory1, config.initial_state.inventory2, config.initial_state.cash
    );
}

pub fn display_exact_result(result: &SolveResult, elapsed: Duration, states: usize) {
    println!("=== Exact dynamic program ===");
    println!("  running time is {:.3?} ({} states)", elapsed, states);
    println!("  optimal cash balance is {:.6}", result.expected_cash);
    println!("  optimal q1 at period 1 is: {}", result.order1);
    println!("  optimal q2 at period 1 is: {}", result.order2);
}

pub fn display_targets(tables: &RelaxationTables) {
    println!("\n=== Order-up-to targets (relaxation) ===");
    for product in Product::ALL {
        let targets: Vec<String> = tables.targets(product).iter().map(|t| t.to_string()).collect();
        println!("  Product {}: [{}]", product.index() + 1, targets.join(", "));
    }
}

/// One line per approximate policy: expected cash and gap to the exact value
pub fn display_approximations(exact: f64, rows: &[(&str, Option<f64>)]) {
    println!("\n=== Approximate policies ===");
    for (name, value) in rows {
        match value {
            Some(value) => println!(
                "  {:<14} expected cash {:>12.6} | gap to exact {:>+10.6}",
                name,
                value,
                value - exact
            ),
            None => println!("  {:<14} not applicable from this state", name),
        }
    }
}

pub fn display_monte_carlo(stats: &MonteCarloStats) {
    println!("\n=== Monte Carlo: {} policy ({} runs) ===", stats.policy, stats.num_simulations);
    println!(
        "  Mean: {:.4} ± {:.4} | Median: {:.4} | Range: [{:.4}, {:.4}]",
        stats.mean_cash, stats.std_dev_cash, stats.percentile_50, stats.min_cash, stats.max_cash
    );
    println!(
        "  10th-90th Percentile: [{:.4}, {:.4}] | 25th-75th: [{:.4}, {:.4}]",
        stats.percentile_10, stats.percentile_90, stats.percentile_25, stats.percentile_75
    );
}
