use std::collections::{HashMap, HashSet};

use ridgeline_core::{CellCoord, Grid};
use thiserror::Error;

/// Ordered sequence of cells from a start to a goal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    cells: Vec<CellCoord>,
    total_cost: f64,
}

impl Path {
    /// Path that reaches nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: Vec::new(),
            total_cost: 0.0,
        }
    }

    /// Cells visited in order, start and goal inclusive.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Sum of edge costs along the path.
    #[must_use]
    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Reports whether the search found no route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Final cell of the path.
    #[must_use]
    pub fn destination(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Consumes the path and returns its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Caps applied to the bounded path search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlannerLimits {
    /// Number of node expansions after which the search gives up.
    pub max_expansions: usize,
}

impl Default for PlannerLimits {
    fn default() -> Self {
        Self {
            max_expansions: 4_096,
        }
    }
}

/// Reported when a bounded search exceeds its expansion budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("path search aborted after {expansions} expansions")]
pub struct SearchAborted {
    /// Nodes expanded before the search stopped.
    pub expansions: usize,
}

/// Estimated remaining cost between two cells.
///
/// Vertical distance is weighted by 1.5, which overestimates descents; the
/// search is approximate rather than optimal.
#[must_use]
pub fn heuristic(from: CellCoord, to: CellCoord) -> f64 {
    f64::from(from.horizontal_distance(to)) + 1.5 * f64::from(from.vertical_distance(to))
}

/// Cost of stepping from one cell onto an adjacent cell.
///
/// Climbing adds the full rise, descending adds half the drop.
#[must_use]
pub fn edge_cost(from: CellCoord, to: CellCoord) -> f64 {
    let delta = from.height_delta(to) as f64;
    if delta > 0.0 {
        1.0 + delta
    } else {
        1.0 + delta.abs() / 2.0
    }
}

/// A* search from `start` to `goal`, returning an empty path when none exists.
///
/// Cells held by a unit other than the goal cell's occupant are impassable.
#[must_use]
pub fn find_path(grid: &Grid, start: CellCoord, goal: CellCoord) -> Path {
    search(grid, start, goal, None).unwrap_or_default()
}

/// A* search that gives up once more than `limits.max_expansions` nodes have
/// been expanded.
pub fn find_path_bounded(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    limits: PlannerLimits,
) -> Result<Path, SearchAborted> {
    search(grid, start, goal, Some(limits.max_expansions))
}

fn search(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    max_expansions: Option<usize>,
) -> Result<Path, SearchAborted> {
    if grid.cell(start).is_none() {
        return Ok(Path::empty());
    }
    if start == goal {
        return Ok(Path {
            cells: vec![start],
            total_cost: 0.0,
        });
    }
    let Some(goal_cell) = grid.cell(goal) else {
        return Ok(Path::empty());
    };
    let goal_occupant = goal_cell.occupant();

    let mut open = vec![start];
    let mut closed = HashSet::new();
    let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
    let mut g_score = HashMap::from([(start, 0.0_f64)]);
    let mut f_score = HashMap::from([(start, heuristic(start, goal))]);
    let mut expansions = 0_usize;

    while let Some(position) = lowest_score(&open, &f_score) {
        let current = open.remove(position);
        if current == goal {
            let total_cost = g_score.get(&current).copied().unwrap_or_default();
            tracing::debug!(?start, ?goal, expansions, total_cost, "path.found");
            return Ok(Path {
                cells: reconstruct(&came_from, current),
                total_cost,
            });
        }

        expansions += 1;
        if max_expansions.is_some_and(|limit| expansions > limit) {
            tracing::debug!(?start, ?goal, expansions, "path.aborted");
            return Err(SearchAborted { expansions });
        }
        let _ = closed.insert(current);

        let current_g = g_score.get(&current).copied().unwrap_or(f64::INFINITY);
        for neighbor in grid.neighbors_of(current) {
            let coord = neighbor.coord();
            if closed.contains(&coord) {
                continue;
            }
            if neighbor.occupant().is_some() && neighbor.occupant() != goal_occupant {
                continue;
            }

            let tentative = current_g + edge_cost(current, coord);
            if open.contains(&coord) {
                let known = g_score.get(&coord).copied().unwrap_or(f64::INFINITY);
                if tentative >= known {
                    continue;
                }
            } else {
                open.push(coord);
            }

            let _ = came_from.insert(coord, current);
            let _ = g_score.insert(coord, tentative);
            let _ = f_score.insert(coord, tentative + heuristic(coord, goal));
        }
    }

    tracing::debug!(?start, ?goal, expansions, "path.exhausted");
    Ok(Path::empty())
}

/// Index of the first open entry with the minimal score.
fn lowest_score(open: &[CellCoord], f_score: &HashMap<CellCoord, f64>) -> Option<usize> {
    let score = |coord: &CellCoord| f_score.get(coord).copied().unwrap_or(f64::INFINITY);
    let mut best: Option<(usize, f64)> = None;
    for (index, coord) in open.iter().enumerate() {
        let candidate = score(coord);
        match best {
            Some((_, lowest)) if candidate >= lowest => {}
            _ => best = Some((index, candidate)),
        }
    }
    best.map(|(index, _)| index)
}

fn reconstruct(came_from: &HashMap<CellCoord, CellCoord>, goal: CellCoord) -> Vec<CellCoord> {
    let mut cells = vec![goal];
    let mut cursor = goal;
    while let Some(previous) = came_from.get(&cursor) {
        cells.push(*previous);
        cursor = *previous;
    }
    cells.reverse();
    cells
}
