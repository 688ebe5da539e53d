//! Post-draft improvement.
//!
//! Bounded local search over the drafted allocation. Seats per course and
//! the per-student budget are preserved by every move, and every logged
//! event carries the exact change in global welfare it caused.

mod add_drop;
mod runner;
mod swap;
mod types;

pub use runner::PostPhaseOptimizer;
pub use swap::{best_swap, swap_delta, SwapMove};
pub use types::{PostAction, PostEvent};
