//! Voxel cell lattice and the spatial index used by every system.

use std::collections::{hash_map::Entry, HashMap};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{BattlefieldConfig, CellCoord, GridError, UnitId};

/// Per-axis tolerance applied when matching world positions against cells.
pub const FIND_TOLERANCE: f32 = 0.1;

/// Offsets considered adjacent to a cell.
///
/// Eight horizontal moves (orthogonal and diagonal), straight up and down, and
/// the eight orthogonal moves combined with a single step of height.
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 18] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 0, 1),
    (0, 0, -1),
    (1, 0, 1),
    (1, 0, -1),
    (-1, 0, 1),
    (-1, 0, -1),
    (0, 1, 0),
    (0, -1, 0),
    (1, 1, 0),
    (-1, 1, 0),
    (0, 1, 1),
    (0, 1, -1),
    (1, -1, 0),
    (-1, -1, 0),
    (0, -1, 1),
    (0, -1, -1),
];

/// Surface material tag attached to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Low-lying ground.
    Water,
    /// Open ground.
    Grass,
    /// Wooded ground.
    Forest,
    /// High ground.
    Mountain,
}

/// A single voxel of the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    coord: CellCoord,
    traversable: bool,
    terrain: TerrainKind,
    occupant: Option<UnitId>,
}

impl Cell {
    /// Creates an unoccupied cell.
    #[must_use]
    pub const fn new(coord: CellCoord, traversable: bool, terrain: TerrainKind) -> Self {
        Self {
            coord,
            traversable,
            terrain,
            occupant: None,
        }
    }

    /// Lattice coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Reports whether units may stand on or pass through the cell.
    #[must_use]
    pub const fn traversable(&self) -> bool {
        self.traversable
    }

    /// Surface material of the cell.
    #[must_use]
    pub const fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Unit currently standing on the cell, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// Reports whether the cell is free, or held by the provided unit.
    #[must_use]
    pub fn is_free_for(&self, unit: UnitId) -> bool {
        self.occupant.map_or(true, |occupant| occupant == unit)
    }
}

/// Solid vertical stack of cells used to assemble a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    /// Position along the x axis.
    pub x: i32,
    /// Position along the z axis.
    pub z: i32,
    /// Height of the lowest cell.
    pub base: i32,
    /// Number of cells stacked from `base` upwards; zero emits nothing.
    pub height: u32,
    /// Material applied to every cell of the stack.
    pub terrain: TerrainKind,
}

/// Battlefield lattice with a coordinate index and per-cell occupancy.
///
/// The cell list is immutable once built; only occupants change afterwards.
#[derive(Clone, Debug)]
pub struct Grid {
    config: BattlefieldConfig,
    seed: u64,
    cells: Vec<Cell>,
    index: HashMap<CellCoord, usize>,
    tops: HashMap<(i32, i32), usize>,
}

impl Grid {
    /// Builds a grid from an explicit cell list.
    ///
    /// Fails when two cells share a coordinate or when a column exposes more
    /// than one traversable cell.
    pub fn from_cells(
        config: BattlefieldConfig,
        seed: u64,
        cells: Vec<Cell>,
    ) -> Result<Self, GridError> {
        let mut index = HashMap::with_capacity(cells.len());
        let mut tops = HashMap::new();

        for (position, cell) in cells.iter().enumerate() {
            let coord = cell.coord();
            match index.entry(coord) {
                Entry::Occupied(_) => return Err(GridError::DuplicateCell(coord)),
                Entry::Vacant(slot) => {
                    let _ = slot.insert(position);
                }
            }

            if cell.traversable() {
                match tops.entry((coord.x(), coord.z())) {
                    Entry::Occupied(_) => {
                        return Err(GridError::MultipleTraversable {
                            x: coord.x(),
                            z: coord.z(),
                        })
                    }
                    Entry::Vacant(slot) => {
                        let _ = slot.insert(position);
                    }
                }
            }
        }

        Ok(Self {
            config,
            seed,
            cells,
            index,
            tops,
        })
    }

    /// Builds a grid from solid columns whose top cell is traversable.
    pub fn from_columns<I>(
        config: BattlefieldConfig,
        seed: u64,
        columns: I,
    ) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = Column>,
    {
        let mut cells = Vec::new();
        for column in columns {
            let Ok(height) = i32::try_from(column.height) else {
                continue;
            };
            for level in 0..height {
                let y = column.base.saturating_add(level);
                cells.push(Cell::new(
                    CellCoord::new(column.x, y, column.z),
                    level == height - 1,
                    column.terrain,
                ));
            }
        }
        Self::from_cells(config, seed, cells)
    }

    /// Configuration the grid was generated from.
    #[must_use]
    pub const fn config(&self) -> &BattlefieldConfig {
        &self.config
    }

    /// Seed that reproduces the grid.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// All cells in generation order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over the cells units may stand on.
    pub fn traversable_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.traversable())
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the grid holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Exact lattice lookup.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.index
            .get(&coord)
            .and_then(|&position| self.cells.get(position))
    }

    /// Finds the cell whose centre lies within [`FIND_TOLERANCE`] of `position` on every axis.
    #[must_use]
    pub fn find_cell(&self, position: Vec3) -> Option<&Cell> {
        let coord = CellCoord::new(
            position.x.round() as i32,
            position.y.round() as i32,
            position.z.round() as i32,
        );
        let centre = coord.to_world();
        let matches = (position - centre)
            .abs()
            .to_array()
            .iter()
            .all(|delta| *delta < FIND_TOLERANCE);
        if !matches {
            return None;
        }
        self.cell(coord)
    }

    /// Traversable cell on top of the `(x, z)` column, if the column exists.
    #[must_use]
    pub fn column_top(&self, x: i32, z: i32) -> Option<&Cell> {
        self.tops
            .get(&(x, z))
            .and_then(|&position| self.cells.get(position))
    }

    /// Traversable cells adjacent to `coord` under the 18-direction rule.
    ///
    /// Candidates outside the grid or below a column top are skipped.
    pub fn neighbors_of(&self, coord: CellCoord) -> impl Iterator<Item = &Cell> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy, dz)| coord.offset(dx, dy, dz))
            .filter_map(|candidate| self.cell(candidate))
            .filter(|cell| cell.traversable())
    }

    /// Reports whether `b` is one of the 18 direction vectors away from `a`.
    #[must_use]
    pub fn is_adjacent(a: CellCoord, b: CellCoord) -> bool {
        NEIGHBOR_OFFSETS
            .iter()
            .any(|&(dx, dy, dz)| a.offset(dx, dy, dz) == Some(b))
    }

    /// Replaces the occupant of a cell, returning `false` when the cell does not exist.
    pub fn set_occupant(&mut self, coord: CellCoord, occupant: Option<UnitId>) -> bool {
        let Some(&position) = self.index.get(&coord) else {
            return false;
        };
        match self.cells.get_mut(position) {
            Some(cell) => {
                cell.occupant = occupant;
                true
            }
            None => false,
        }
    }

    /// Iterator over every occupied cell.
    pub fn occupied_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.occupant().is_some())
    }
}
