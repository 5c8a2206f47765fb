#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ridgeline tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that observers
//! receive through the [`EventBus`]. Systems borrow the [`Grid`] immutably and
//! respond with proposals; only the world commits them.

mod bus;
mod catalog;
mod grid;
mod stats;

pub use bus::{Delivery, EventBus, SubscriptionId};
pub use catalog::{
    Affinity, AbilityTemplate, Catalog, CatalogDocument, CostKind, TargetKind, UnitTemplate,
};
pub use grid::{Cell, Column, Grid, TerrainKind, FIND_TOLERANCE, NEIGHBOR_OFFSETS};
pub use stats::{Faction, Phase, StatBlock, UnitKind, UnitState};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Generates a fresh battlefield, replacing any previous grid and units.
    GenerateTerrain {
        /// Dimensions and noise scale of the battlefield.
        config: BattlefieldConfig,
        /// Seed for the noise source; a random seed is drawn when absent.
        seed: Option<u64>,
    },
    /// Registers a new player that takes part in the turn rotation.
    RegisterPlayer {
        /// Display name shown by presentation layers.
        name: String,
        /// Side the player fights for.
        faction: Faction,
    },
    /// Requests that a unit be created for a player on the battlefield.
    SpawnUnit {
        /// Player that will own the unit.
        player: PlayerId,
        /// Template or explicit stat block describing the unit.
        blueprint: UnitBlueprint,
        /// World-space position snapped to the nearest standable cell.
        position: Vec3,
    },
    /// Starts the turn of the provided player in the movement phase.
    StartTurn {
        /// Player whose turn begins.
        player: PlayerId,
    },
    /// Ends the active turn and hands control to the next registered player.
    EndTurn,
    /// Updates the informational phase of the active turn.
    SetPhase {
        /// Phase that should become active.
        phase: Phase,
    },
    /// Selects a unit, or clears the selection when `None`.
    SelectUnit {
        /// Unit to select.
        unit: Option<UnitId>,
    },
    /// Selects an ability of the selected unit, or clears it when `None`.
    SelectAbility {
        /// Ability to select.
        ability: Option<AbilityId>,
    },
    /// Requests a path for the selected unit towards a reachable cell.
    RequestPath {
        /// Unit that should travel.
        unit: UnitId,
        /// Destination cell, which must belong to the last reachable set.
        target: CellCoord,
    },
    /// Commits the selected unit along the most recently found path.
    ExecutePath,
    /// Moves a unit onto a cell from its last computed reachable set.
    CommitMove {
        /// Unit that should move.
        unit: UnitId,
        /// Destination cell.
        target: CellCoord,
    },
    /// Adjusts a unit's hit points, marking it defeated when they reach zero.
    ChangeHp {
        /// Unit whose hit points change.
        unit: UnitId,
        /// Signed amount added to the current hit points.
        delta: i32,
    },
}

/// Describes how a spawned unit obtains its name, kind and stats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitBlueprint {
    /// Instantiates a unit template from the reference catalog.
    Template {
        /// Identifier of the unit template.
        template: String,
        /// Optional name overriding the template's display name.
        name: Option<String>,
    },
    /// Creates a unit from an explicit stat block.
    Custom {
        /// Display name of the unit.
        name: String,
        /// Kind of unit being created.
        kind: UnitKind,
        /// Stats assigned to the unit.
        stats: StatBlock,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Event {
    /// Confirms that a new battlefield grid replaced the previous one.
    TerrainGenerated {
        /// Configuration the grid was generated from.
        config: BattlefieldConfig,
        /// Seed that reproduces the grid.
        seed: u64,
        /// Number of cells emitted by the generator.
        cells: usize,
    },
    /// Reports that a terrain generation request was rejected.
    TerrainRejected {
        /// Specific reason the configuration was refused.
        reason: ConfigError,
    },
    /// Confirms that a player joined the turn rotation.
    PlayerRegistered {
        /// Identifier allocated to the player.
        player: PlayerId,
        /// Side the player fights for.
        faction: Faction,
    },
    /// Confirms that a unit was placed onto the battlefield.
    UnitCreated {
        /// Identifier allocated to the unit.
        unit: UnitId,
        /// Player owning the unit.
        player: PlayerId,
        /// Cell the unit occupies after spawning.
        cell: CellCoord,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Player named in the request.
        player: PlayerId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Announces that a unit became the active selection.
    UnitSelected {
        /// Selected unit.
        unit: UnitId,
    },
    /// Announces that the active selection was cleared.
    UnitDeselected,
    /// Announces that the selected unit's ability selection changed.
    AbilitySelected {
        /// Unit owning the ability.
        unit: UnitId,
        /// Ability that became active, or `None` when cleared.
        ability: Option<AbilityId>,
    },
    /// Publishes the reachable set computed for a selected unit.
    ReachableCellsCalculated {
        /// Unit the set was computed for.
        unit: UnitId,
        /// Cells the unit may end its move on, in discovery order.
        cells: Vec<CellCoord>,
    },
    /// Publishes a path found towards a reachable cell.
    PathFound {
        /// Unit that would travel the path.
        unit: UnitId,
        /// Ordered cells from the unit's cell to the destination.
        path: Vec<CellCoord>,
        /// Accumulated edge cost of the path.
        cost: f64,
    },
    /// Confirms that a stored path was committed.
    PathExecuted {
        /// Unit that travelled the path.
        unit: UnitId,
    },
    /// Confirms that a unit moved between two cells.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Cell the unit stood on before the move.
        from: CellCoord,
        /// Cell the unit stands on after the move.
        to: CellCoord,
    },
    /// Reports that a move commit was rejected without mutating state.
    MoveRejected {
        /// Unit named in the request.
        unit: UnitId,
        /// Destination named in the request.
        target: CellCoord,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// Confirms that a unit's hit points changed.
    UnitHpChanged {
        /// Unit whose hit points changed.
        unit: UnitId,
        /// Hit points after the change.
        hp: u32,
    },
    /// Announces that a unit's hit points reached zero.
    UnitDefeated {
        /// Unit that was defeated.
        unit: UnitId,
        /// Cell the unit vacated.
        cell: CellCoord,
    },
    /// Announces that the active turn entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Announces that a player's turn began.
    TurnStarted {
        /// Player whose turn began.
        player: PlayerId,
    },
    /// Announces that a player's turn ended.
    TurnEnded {
        /// Player whose turn ended.
        player: PlayerId,
    },
}

impl Event {
    /// Kind of the event, used to route it to subscribers.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TerrainGenerated { .. } => EventKind::TerrainGenerated,
            Self::TerrainRejected { .. } => EventKind::TerrainRejected,
            Self::PlayerRegistered { .. } => EventKind::PlayerRegistered,
            Self::UnitCreated { .. } => EventKind::UnitCreated,
            Self::SpawnRejected { .. } => EventKind::SpawnRejected,
            Self::UnitSelected { .. } => EventKind::UnitSelected,
            Self::UnitDeselected => EventKind::UnitDeselected,
            Self::AbilitySelected { .. } => EventKind::AbilitySelected,
            Self::ReachableCellsCalculated { .. } => EventKind::ReachableCellsCalculated,
            Self::PathFound { .. } => EventKind::PathFound,
            Self::PathExecuted { .. } => EventKind::PathExecuted,
            Self::UnitMoved { .. } => EventKind::UnitMoved,
            Self::MoveRejected { .. } => EventKind::MoveRejected,
            Self::UnitHpChanged { .. } => EventKind::UnitHpChanged,
            Self::UnitDefeated { .. } => EventKind::UnitDefeated,
            Self::PhaseChanged { .. } => EventKind::PhaseChanged,
            Self::TurnStarted { .. } => EventKind::TurnStarted,
            Self::TurnEnded { .. } => EventKind::TurnEnded,
        }
    }
}

/// Payload-free discriminant of [`Event`] used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Matches [`Event::TerrainGenerated`].
    TerrainGenerated,
    /// Matches [`Event::TerrainRejected`].
    TerrainRejected,
    /// Matches [`Event::PlayerRegistered`].
    PlayerRegistered,
    /// Matches [`Event::UnitCreated`].
    UnitCreated,
    /// Matches [`Event::SpawnRejected`].
    SpawnRejected,
    /// Matches [`Event::UnitSelected`].
    UnitSelected,
    /// Matches [`Event::UnitDeselected`].
    UnitDeselected,
    /// Matches [`Event::AbilitySelected`].
    AbilitySelected,
    /// Matches [`Event::ReachableCellsCalculated`].
    ReachableCellsCalculated,
    /// Matches [`Event::PathFound`].
    PathFound,
    /// Matches [`Event::PathExecuted`].
    PathExecuted,
    /// Matches [`Event::UnitMoved`].
    UnitMoved,
    /// Matches [`Event::MoveRejected`].
    MoveRejected,
    /// Matches [`Event::UnitHpChanged`].
    UnitHpChanged,
    /// Matches [`Event::UnitDefeated`].
    UnitDefeated,
    /// Matches [`Event::PhaseChanged`].
    PhaseChanged,
    /// Matches [`Event::TurnStarted`].
    TurnStarted,
    /// Matches [`Event::TurnEnded`].
    TurnEnded,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an ability template in the reference catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(String);

impl AbilityId {
    /// Creates an ability identifier from its textual key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Textual key of the ability.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Location of a single voxel expressed as integer lattice coordinates.
///
/// The lattice is already offset so the battlefield is centred on the origin;
/// `y` is the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl CellCoord {
    /// Creates a new lattice coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position along the horizontal x axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Height of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position along the horizontal z axis.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Returns the coordinate displaced by the provided offsets, if representable.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// Signed height change when stepping from `self` onto `other`.
    #[must_use]
    pub fn height_delta(self, other: CellCoord) -> i64 {
        i64::from(other.y) - i64::from(self.y)
    }

    /// Manhattan distance across the horizontal plane, ignoring height.
    #[must_use]
    pub fn horizontal_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Absolute height difference between two coordinates.
    #[must_use]
    pub fn vertical_distance(self, other: CellCoord) -> u32 {
        self.y.abs_diff(other.y)
    }

    /// World-space position of the cell centre.
    #[must_use]
    pub fn to_world(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Dimensions and noise scale of a generated battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattlefieldConfig {
    /// Number of columns along the x axis.
    pub width: u32,
    /// Tallest stack a column may reach.
    pub max_height: u32,
    /// Number of columns along the z axis.
    pub depth: u32,
    /// Spatial scale of the noise field; larger values produce smoother terrain.
    pub noise_scale: f32,
}

impl BattlefieldConfig {
    /// Creates a new battlefield configuration.
    #[must_use]
    pub const fn new(width: u32, max_height: u32, depth: u32, noise_scale: f32) -> Self {
        Self {
            width,
            max_height,
            depth,
            noise_scale,
        }
    }

    /// Checks that every dimension is positive and the noise scale is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.max_height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if [self.width, self.depth, self.max_height]
            .into_iter()
            .any(|extent| i32::try_from(extent).is_err())
        {
            return Err(ConfigError::DimensionTooLarge);
        }
        if !self.noise_scale.is_finite() || self.noise_scale <= 0.0 {
            return Err(ConfigError::InvalidNoiseScale);
        }
        Ok(())
    }
}

impl Default for BattlefieldConfig {
    fn default() -> Self {
        Self::new(20, 10, 20, 30.0)
    }
}

/// Reasons a battlefield configuration may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ConfigError {
    /// The battlefield has no columns along the x axis.
    #[error("battlefield width must be positive")]
    ZeroWidth,
    /// The battlefield has no columns along the z axis.
    #[error("battlefield depth must be positive")]
    ZeroDepth,
    /// Columns would have no cells.
    #[error("battlefield max height must be positive")]
    ZeroHeight,
    /// A dimension does not fit the signed lattice coordinate range.
    #[error("battlefield dimension exceeds the lattice range")]
    DimensionTooLarge,
    /// The noise scale is zero, negative, or not a finite number.
    #[error("noise scale must be a positive finite number")]
    InvalidNoiseScale,
}

/// Reasons a hand-built grid may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridError {
    /// Two cells share the same lattice coordinate.
    #[error("duplicate cell at {0:?}")]
    DuplicateCell(CellCoord),
    /// A column exposes more than one traversable cell.
    #[error("column ({x}, {z}) has more than one traversable cell")]
    MultipleTraversable {
        /// Column position along the x axis.
        x: i32,
        /// Column position along the z axis.
        z: i32,
    },
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// No player with the provided identifier exists.
    #[error("unknown player")]
    UnknownPlayer,
    /// The catalog holds no unit template with the provided identifier.
    #[error("unknown unit template `{0}`")]
    UnknownTemplate(String),
    /// No battlefield has been generated yet.
    #[error("no terrain has been generated")]
    NoTerrain,
    /// The requested position does not match a traversable cell.
    #[error("position does not match a standable cell")]
    NoStandableCell,
    /// The requested cell already holds another unit.
    #[error("cell is occupied by unit {}", .0.get())]
    CellOccupied(UnitId),
}

/// Reasons a move commit may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum MoveError {
    /// No unit with the provided identifier exists.
    #[error("unknown unit")]
    UnknownUnit,
    /// The unit has been defeated and can no longer move.
    #[error("unit is defeated")]
    UnitDefeated,
    /// The target is not part of the unit's last computed reachable set.
    #[error("target is not in the last reachable set")]
    NotReachable,
}

/// Failure reported by an event handler.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a handler error carrying the provided message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Reasons a reference catalog may be refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two ability templates share an identifier.
    #[error("duplicate ability `{0}`")]
    DuplicateAbility(String),
    /// Two unit templates share an identifier.
    #[error("duplicate unit template `{0}`")]
    DuplicateTemplate(String),
    /// A unit template lists an ability the catalog does not define.
    #[error("unit template `{template}` references unknown ability `{ability}`")]
    UnknownAbility {
        /// Unit template carrying the reference.
        template: String,
        /// Missing ability identifier.
        ability: String,
    },
}
