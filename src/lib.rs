//! Replenishment policies for a cash-constrained retailer stocking two
//! products over a finite horizon under discrete stochastic demand.
//!
//! The retailer orders both products at the start of each period from the
//! cash it holds, sells against demand, and carries leftover stock and cash
//! forward; leftover stock is salvaged after the last period. The objective
//! is expected terminal cash.
//!
//! Solvers, all on the primitives in [`dynamics`]:
//! - [`exact::ExactSolver`]: memoized backward induction, optimal.
//! - [`relaxation::get_a_stars`]: single-product decomposition ignoring the
//!   cash coupling, yielding order-up-to targets and value tables.
//! - [`guided::GuidedSolver`]: joint recursion guided by the targets, in the
//!   `theorem2` and `heuristic1_2` variants.
//! - [`heuristics::heuristic1`] and [`heuristics::MyopicSolver`]: cheaper
//!   approximations.
//!
//! Every solver owns its memo table; tables are never shared between policies.

pub mod config;
pub mod demand;
pub mod dynamics;
pub mod error;
pub mod exact;
pub mod guided;
pub mod heuristics;
pub mod logging;
pub mod models;
pub mod monte_carlo;
pub mod relaxation;
pub mod reporting;
pub mod simulation;

pub use demand::{JointDemand, JointPmf, ProductDemand, ProductPmf};
pub use dynamics::{TwoProduct, AFFORDABILITY_TOLERANCE};
pub use error::{PolicyError, PolicyResult};
pub use exact::ExactSolver;
pub use guided::{Decision, GuidedSolver, GuidedVariant, Regime};
pub use heuristics::{heuristic1, MyopicSolver};
pub use models::{Action, JointState, ProblemParams, Product, ProductParams, SingleState, SolveResult};
pub use relaxation::{get_a_stars, RelaxationTables};
