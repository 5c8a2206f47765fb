//! Scripted battles loaded from TOML files.
//!
//! A scenario names the battlefield, the players, the initial spawns and a
//! script of actions. Players and units are referenced by their numeric ids,
//! which the world hands out from zero in registration and successful spawn
//! order. Cells are referenced by `(x, z)` column and resolve to the column's
//! top.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use ridgeline_core::{
    AbilityId, BattlefieldConfig, Catalog, CatalogDocument, CellCoord, Command, Event, Faction,
    Phase, PlayerId, UnitBlueprint, UnitId, UnitKind,
};
use ridgeline_world::{query, Session, World};
use serde::Deserialize;

/// Parsed scenario file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    battlefield: BattlefieldConfig,
    seed: Option<u64>,
    #[serde(default)]
    players: Vec<PlayerEntry>,
    #[serde(default)]
    spawns: Vec<SpawnEntry>,
    #[serde(default)]
    script: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerEntry {
    name: String,
    faction: Faction,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnEntry {
    player: u32,
    template: Option<String>,
    kind: Option<UnitKind>,
    name: Option<String>,
    movement: Option<u32>,
    jump: Option<u32>,
    x: i32,
    z: i32,
}

impl SpawnEntry {
    /// Template spawns use the catalog; otherwise the kind's base stats with
    /// optional movement overrides.
    fn blueprint(&self) -> Result<UnitBlueprint> {
        if let Some(template) = &self.template {
            return Ok(UnitBlueprint::Template {
                template: template.clone(),
                name: self.name.clone(),
            });
        }
        let Some(kind) = self.kind else {
            bail!(
                "spawn at column ({}, {}) names neither a template nor a kind",
                self.x,
                self.z
            );
        };
        let mut stats = kind.base_stats();
        stats.movement = self.movement.unwrap_or(stats.movement);
        stats.jump = self.jump.unwrap_or(stats.jump);
        Ok(UnitBlueprint::Custom {
            name: self.name.clone().unwrap_or_else(|| kind.label().to_owned()),
            kind,
            stats,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    StartTurn { player: u32 },
    EndTurn,
    SetPhase { phase: Phase },
    Select { unit: u32 },
    Deselect,
    SelectAbility { ability: Option<String> },
    RequestPath { unit: u32, x: i32, z: i32 },
    ExecutePath,
    Move { unit: u32, x: i32, z: i32 },
    ChangeHp { unit: u32, delta: i32 },
}

impl Step {
    fn command(&self, world: &World) -> Command {
        match self {
            Self::StartTurn { player } => Command::StartTurn {
                player: PlayerId::new(*player),
            },
            Self::EndTurn => Command::EndTurn,
            Self::SetPhase { phase } => Command::SetPhase { phase: *phase },
            Self::Select { unit } => Command::SelectUnit {
                unit: Some(UnitId::new(*unit)),
            },
            Self::Deselect => Command::SelectUnit { unit: None },
            Self::SelectAbility { ability } => Command::SelectAbility {
                ability: ability.as_deref().map(AbilityId::new),
            },
            Self::RequestPath { unit, x, z } => Command::RequestPath {
                unit: UnitId::new(*unit),
                target: column_cell(world, *x, *z),
            },
            Self::ExecutePath => Command::ExecutePath,
            Self::Move { unit, x, z } => Command::CommitMove {
                unit: UnitId::new(*unit),
                target: column_cell(world, *x, *z),
            },
            Self::ChangeHp { unit, delta } => Command::ChangeHp {
                unit: UnitId::new(*unit),
                delta: *delta,
            },
        }
    }
}

impl Scenario {
    /// Parses a scenario from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse scenario")
    }

    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Plays the scenario against a fresh session and returns every event in
    /// emission order.
    pub(crate) fn run(&self, catalog: Catalog) -> Result<Vec<Event>> {
        let mut session = Session::with_catalog(catalog);
        let mut events = session.execute(Command::GenerateTerrain {
            config: self.battlefield,
            seed: self.seed,
        });
        if let Some(Event::TerrainRejected { reason }) = events.first() {
            bail!("battlefield rejected: {reason}");
        }

        for player in &self.players {
            events.extend(session.execute(Command::RegisterPlayer {
                name: player.name.clone(),
                faction: player.faction,
            }));
        }
        for spawn in &self.spawns {
            let position = column_position(session.world(), spawn.x, spawn.z);
            events.extend(session.execute(Command::SpawnUnit {
                player: PlayerId::new(spawn.player),
                blueprint: spawn.blueprint()?,
                position,
            }));
        }
        for step in &self.script {
            let command = step.command(session.world());
            events.extend(session.execute(command));
        }

        tracing::info!(
            steps = self.script.len(),
            events = events.len(),
            "scenario.finished"
        );
        Ok(events)
    }
}

/// Reads a catalog file and validates its cross references.
pub(crate) fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let document: CatalogDocument = toml::from_str(&text)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    Catalog::new(document).with_context(|| format!("invalid catalog {}", path.display()))
}

/// Top cell of the `(x, z)` column, or a cell at height zero the world will
/// refuse when the column does not exist.
fn column_cell(world: &World, x: i32, z: i32) -> CellCoord {
    match query::grid(world).and_then(|grid| grid.column_top(x, z)) {
        Some(top) => top.coord(),
        None => {
            tracing::warn!(x, z, "scenario.missing_column");
            CellCoord::new(x, 0, z)
        }
    }
}

/// Position accepted by spawn requests for the `(x, z)` column.
pub(crate) fn column_position(world: &World, x: i32, z: i32) -> Vec3 {
    column_cell(world, x, z).to_world()
}
