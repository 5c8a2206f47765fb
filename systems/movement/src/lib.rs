#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement planner that answers reachability and path queries.
//!
//! The planner borrows the battlefield [`Grid`](ridgeline_core::Grid)
//! immutably. It never mutates occupancy or unit positions; the world commits
//! whichever proposal the host accepts.

mod reach;
mod search;

pub use reach::{reachable, MovementProfile, ReachableCell, ReachableSet};
pub use search::{
    edge_cost, find_path, find_path_bounded, heuristic, Path, PlannerLimits, SearchAborted,
};
