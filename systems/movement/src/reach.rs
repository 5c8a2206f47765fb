use std::collections::{HashSet, VecDeque};

use ridgeline_core::{CellCoord, Grid, StatBlock, UnitId};

/// Movement budget a unit brings to a reachability query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MovementProfile {
    /// Maximum number of cell-to-cell steps.
    pub movement_range: u32,
    /// Upward height budget, also the ceiling on height change from the start.
    pub jump_range: u32,
}

impl MovementProfile {
    /// Creates a new movement profile.
    #[must_use]
    pub const fn new(movement_range: u32, jump_range: u32) -> Self {
        Self {
            movement_range,
            jump_range,
        }
    }

    /// Profile derived from a unit's stat block.
    #[must_use]
    pub const fn from_stats(stats: &StatBlock) -> Self {
        Self::new(stats.movement, stats.jump)
    }
}

/// Cell in a reachable set together with the costs it was first reached at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReachableCell {
    coord: CellCoord,
    movement_cost: u32,
    jump_cost: u32,
}

impl ReachableCell {
    /// Lattice coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Steps taken to first reach the cell.
    #[must_use]
    pub const fn movement_cost(&self) -> u32 {
        self.movement_cost
    }

    /// Accumulated upward height spent to first reach the cell.
    #[must_use]
    pub const fn jump_cost(&self) -> u32 {
        self.jump_cost
    }
}

/// Cells a unit may end its move on, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachableSet {
    origin: Option<CellCoord>,
    cells: Vec<ReachableCell>,
    members: HashSet<CellCoord>,
}

impl ReachableSet {
    /// Cell the search started from, if it existed.
    #[must_use]
    pub const fn origin(&self) -> Option<CellCoord> {
        self.origin
    }

    /// Reached cells in the order they were discovered.
    #[must_use]
    pub fn cells(&self) -> &[ReachableCell] {
        &self.cells
    }

    /// Coordinates of the reached cells in discovery order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().map(ReachableCell::coord)
    }

    /// Reports whether the coordinate belongs to the set.
    #[must_use]
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.members.contains(&coord)
    }

    /// Costs recorded for the coordinate, if reached.
    #[must_use]
    pub fn get(&self, coord: CellCoord) -> Option<&ReachableCell> {
        if !self.contains(coord) {
            return None;
        }
        self.cells.iter().find(|cell| cell.coord == coord)
    }

    /// Number of reached cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether nothing was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn push(&mut self, cell: ReachableCell) -> bool {
        if !self.members.insert(cell.coord) {
            return false;
        }
        self.cells.push(cell);
        true
    }
}

/// Breadth-first flood fill of the cells `mover` may end its move on.
///
/// States are expanded in FIFO order and the first arrival at a coordinate
/// wins, so recorded costs are not guaranteed to be minimal. A neighbour is
/// accepted when it is traversable, free or held by `mover`, within the step
/// budget, within the accumulated upward budget, and no further than
/// `jump_range` levels from the start height. A missing start yields an empty
/// set.
#[must_use]
pub fn reachable(
    grid: &Grid,
    mover: UnitId,
    start: CellCoord,
    profile: MovementProfile,
) -> ReachableSet {
    let mut set = ReachableSet::default();
    if grid.cell(start).is_none() {
        tracing::debug!(?start, "reach.missing_start");
        return set;
    }

    set.origin = Some(start);
    let origin = ReachableCell {
        coord: start,
        movement_cost: 0,
        jump_cost: 0,
    };
    let _ = set.push(origin);

    let mut queue = VecDeque::from([origin]);
    while let Some(current) = queue.pop_front() {
        let movement_cost = current.movement_cost.saturating_add(1);
        if movement_cost > profile.movement_range {
            continue;
        }

        for neighbor in grid.neighbors_of(current.coord) {
            let coord = neighbor.coord();
            if set.contains(coord) || !neighbor.is_free_for(mover) {
                continue;
            }

            let rise = current.coord.height_delta(coord).max(0);
            let climb = u32::try_from(rise).unwrap_or(u32::MAX);
            let jump_cost = current.jump_cost.saturating_add(climb);
            if jump_cost > profile.jump_range {
                continue;
            }
            if start.vertical_distance(coord) > profile.jump_range {
                continue;
            }

            let next = ReachableCell {
                coord,
                movement_cost,
                jump_cost,
            };
            if set.push(next) {
                queue.push_back(next);
            }
        }
    }

    tracing::debug!(
        unit = mover.get(),
        ?start,
        cells = set.len(),
        "reach.computed"
    );
    set
}
