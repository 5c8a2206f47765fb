#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for Ridgeline.
//!
//! The world owns the battlefield grid, the unit and player roster, and the
//! turn state machine. Hosts mutate it exclusively through [`apply`], which
//! appends the resulting [`Event`] values to the caller's buffer, and read it
//! through the free functions in [`query`]. [`Session`] couples a world with
//! an [`EventBus`](ridgeline_core::EventBus) for hosts that prefer callbacks.

mod entities;
mod session;
mod turn;

pub use entities::{Player, Unit};
pub use session::Session;
pub use turn::TurnState;

use entities::{Roster, UnitDraft};
use glam::Vec3;
use ridgeline_core::{
    AbilityId, BattlefieldConfig, Catalog, CellCoord, Command, Event, Grid, MoveError, PlayerId,
    SpawnError, UnitBlueprint, UnitId, UnitState,
};
use ridgeline_system_movement::{find_path, reachable};

/// Represents the authoritative state of a single battle.
#[derive(Debug)]
pub struct World {
    grid: Option<Grid>,
    roster: Roster,
    turn: TurnState,
    catalog: Catalog,
}

impl World {
    /// Creates an empty world that spawns units from the built-in catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    /// Creates an empty world that spawns units from the provided catalog.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            grid: None,
            roster: Roster::default(),
            turn: TurnState::default(),
            catalog,
        }
    }

    fn regenerate(&mut self, config: BattlefieldConfig, seed: u64, out_events: &mut Vec<Event>) {
        let grid = match ridgeline_system_terrain::generate(config, seed) {
            Ok(grid) => grid,
            Err(reason) => {
                tracing::warn!(%reason, "world.terrain_rejected");
                out_events.push(Event::TerrainRejected { reason });
                return;
            }
        };

        let cells = grid.len();
        self.grid = Some(grid);
        self.roster.clear_units();
        let _ = self.turn.clear_selection();
        out_events.push(Event::TerrainGenerated {
            config,
            seed,
            cells,
        });
    }

    fn spawn_unit(
        &mut self,
        player: PlayerId,
        blueprint: UnitBlueprint,
        position: Vec3,
    ) -> Result<(UnitId, CellCoord), SpawnError> {
        if !self.roster.contains_player(player) {
            return Err(SpawnError::UnknownPlayer);
        }

        let (name, kind, template, stats, abilities) = match blueprint {
            UnitBlueprint::Template { template, name } => {
                let Some(entry) = self.catalog.unit_template(&template) else {
                    return Err(SpawnError::UnknownTemplate(template));
                };
                (
                    name.unwrap_or_else(|| entry.name.clone()),
                    entry.kind,
                    Some(template),
                    entry.kind.base_stats(),
                    entry.abilities.clone(),
                )
            }
            UnitBlueprint::Custom { name, kind, stats } => (name, kind, None, stats, Vec::new()),
        };

        let grid = self.grid.as_mut().ok_or(SpawnError::NoTerrain)?;
        let cell = grid
            .find_cell(position)
            .filter(|cell| cell.traversable())
            .ok_or(SpawnError::NoStandableCell)?;
        if let Some(occupant) = cell.occupant() {
            return Err(SpawnError::CellOccupied(occupant));
        }
        let coord = cell.coord();

        let unit = self
            .roster
            .add_unit(UnitDraft {
                player,
                name,
                kind,
                template,
                position: coord,
                stats,
                abilities,
            })
            .ok_or(SpawnError::UnknownPlayer)?;
        let placed = grid.set_occupant(coord, Some(unit));
        debug_assert!(placed, "spawn cell vanished from the grid");
        Ok((unit, coord))
    }

    fn select_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let Some(grid) = self.grid.as_ref() else {
            tracing::debug!(unit = unit.get(), "world.select_without_terrain");
            return;
        };
        let Some(selected) = self.roster.unit(unit).filter(|candidate| !candidate.is_defeated())
        else {
            tracing::debug!(unit = unit.get(), "world.select_unknown_unit");
            return;
        };

        let set = reachable(grid, unit, selected.position(), selected.movement_profile());
        let cells = set.coords().collect();
        let previous = self.turn.select(unit, set);
        self.settle_unit(previous);
        out_events.push(Event::ReachableCellsCalculated { unit, cells });
        out_events.push(Event::UnitSelected { unit });
    }

    fn deselect(&mut self, out_events: &mut Vec<Event>) {
        let previous = self.turn.clear_selection();
        self.settle_unit(previous);
        out_events.push(Event::UnitDeselected);
    }

    fn select_ability(
        &mut self,
        ability: Option<AbilityId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(unit) = self.turn.selected_unit() else {
            tracing::debug!("world.ability_without_selection");
            return;
        };
        let Some(owner) = self.roster.unit_mut(unit) else {
            return;
        };

        let state = match &ability {
            Some(id) if owner.knows(id) => UnitState::Acting,
            Some(id) => {
                tracing::debug!(unit = unit.get(), ability = id.as_str(), "world.unknown_ability");
                return;
            }
            None => UnitState::Idle,
        };
        owner.set_state(state);
        self.turn.set_ability(ability.clone());
        out_events.push(Event::AbilitySelected { unit, ability });
    }

    fn request_path(&mut self, unit: UnitId, target: CellCoord, out_events: &mut Vec<Event>) {
        if self.turn.selected_unit() != Some(unit) || !self.turn.can_reach(unit, target) {
            tracing::debug!(unit = unit.get(), ?target, "world.path_target_not_reachable");
            return;
        }
        let (Some(grid), Some(mover)) = (self.grid.as_ref(), self.roster.unit(unit)) else {
            return;
        };

        let path = find_path(grid, mover.position(), target);
        if path.is_empty() {
            self.turn.clear_path();
            return;
        }
        out_events.push(Event::PathFound {
            unit,
            path: path.cells().to_vec(),
            cost: path.total_cost(),
        });
        self.turn.store_path(unit, path);
    }

    fn execute_path(&mut self, out_events: &mut Vec<Event>) {
        let Some(unit) = self.turn.selected_unit() else {
            return;
        };
        let destination = match self.turn.path() {
            Some((owner, path)) if owner == unit && path.len() >= 2 => path.destination(),
            _ => None,
        };
        let Some(target) = destination else {
            tracing::debug!(unit = unit.get(), "world.no_path_to_execute");
            return;
        };

        let resting = self.begin_travel(unit);
        let moved = self.commit_move(unit, target, out_events);
        self.end_travel(unit, resting);
        if moved {
            out_events.push(Event::PathExecuted { unit });
        }
    }

    /// Marks `unit` as moving and returns the state it travels from.
    fn begin_travel(&mut self, unit: UnitId) -> Option<UnitState> {
        let traveller = self.roster.unit_mut(unit)?;
        let resting = traveller.state();
        traveller.set_state(UnitState::Moving);
        Some(resting)
    }

    /// Returns a travelling unit to the state it held before the move.
    fn end_travel(&mut self, unit: UnitId, resting: Option<UnitState>) {
        if let (Some(traveller), Some(state)) = (self.roster.unit_mut(unit), resting) {
            if traveller.state() == UnitState::Moving {
                traveller.set_state(state);
            }
        }
    }

    /// Moves `unit` onto `target`, emitting either `UnitMoved` or `MoveRejected`.
    fn commit_move(
        &mut self,
        unit: UnitId,
        target: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> bool {
        match self.try_commit_move(unit, target) {
            Ok(from) => {
                out_events.push(Event::UnitMoved {
                    unit,
                    from,
                    to: target,
                });
                true
            }
            Err(reason) => {
                tracing::warn!(unit = unit.get(), ?target, %reason, "world.move_rejected");
                out_events.push(Event::MoveRejected {
                    unit,
                    target,
                    reason,
                });
                false
            }
        }
    }

    fn try_commit_move(&mut self, unit: UnitId, target: CellCoord) -> Result<CellCoord, MoveError> {
        let mover = self.roster.unit(unit).ok_or(MoveError::UnknownUnit)?;
        if mover.is_defeated() {
            return Err(MoveError::UnitDefeated);
        }
        if !self.turn.can_reach(unit, target) {
            return Err(MoveError::NotReachable);
        }
        let grid = self.grid.as_mut().ok_or(MoveError::NotReachable)?;
        if !grid.cell(target).is_some_and(|cell| cell.is_free_for(unit)) {
            return Err(MoveError::NotReachable);
        }

        let from = mover.position();
        let _ = grid.set_occupant(from, None);
        let _ = grid.set_occupant(target, Some(unit));
        if let Some(mover) = self.roster.unit_mut(unit) {
            mover.relocate(target);
        }
        self.turn.clear_plans();
        debug_assert!(
            query::occupancy_violations(self).is_empty(),
            "occupancy diverged after moving unit {}",
            unit.get()
        );
        Ok(from)
    }

    fn change_hp(&mut self, unit: UnitId, delta: i32, out_events: &mut Vec<Event>) {
        let Some(target) = self
            .roster
            .unit_mut(unit)
            .filter(|candidate| !candidate.is_defeated())
        else {
            tracing::debug!(unit = unit.get(), "world.hp_change_ignored");
            return;
        };

        let hp = target.adjust_hp(delta);
        out_events.push(Event::UnitHpChanged { unit, hp });
        if hp > 0 {
            return;
        }

        target.set_state(UnitState::Defeated);
        let cell = target.position();
        if let Some(grid) = self.grid.as_mut() {
            let _ = grid.set_occupant(cell, None);
        }
        if self.turn.selected_unit() == Some(unit) {
            let _ = self.turn.clear_selection();
        }
        tracing::info!(unit = unit.get(), ?cell, "world.unit_defeated");
        out_events.push(Event::UnitDefeated { unit, cell });
        debug_assert!(query::occupancy_violations(self).is_empty());
    }

    fn start_turn(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        let previous = self.turn.begin(player);
        self.settle_unit(previous);
        tracing::info!(player = player.get(), "world.turn_started");
        out_events.push(Event::TurnStarted { player });
    }

    /// Returns a previously selected unit to idle once its selection ends.
    fn settle_unit(&mut self, previous: Option<UnitId>) {
        let Some(unit) = previous.and_then(|id| self.roster.unit_mut(id)) else {
            return;
        };
        if unit.state() == UnitState::Acting {
            unit.set_state(UnitState::Idle);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, appending resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateTerrain { config, seed } => {
            let seed = seed.unwrap_or_else(rand::random);
            world.regenerate(config, seed, out_events);
        }
        Command::RegisterPlayer { name, faction } => {
            let player = world.roster.register_player(name, faction);
            out_events.push(Event::PlayerRegistered { player, faction });
        }
        Command::SpawnUnit {
            player,
            blueprint,
            position,
        } => match world.spawn_unit(player, blueprint, position) {
            Ok((unit, cell)) => {
                tracing::debug!(
                    unit = unit.get(),
                    player = player.get(),
                    ?cell,
                    "world.unit_created"
                );
                out_events.push(Event::UnitCreated { unit, player, cell });
            }
            Err(reason) => {
                tracing::warn!(player = player.get(), %reason, "world.spawn_rejected");
                out_events.push(Event::SpawnRejected { player, reason });
            }
        },
        Command::StartTurn { player } => {
            if world.roster.contains_player(player) {
                world.start_turn(player, out_events);
            } else {
                tracing::debug!(player = player.get(), "world.start_turn_unknown_player");
            }
        }
        Command::EndTurn => {
            let current = world.turn.current_player();
            let Some(next) = world.roster.next_player(current) else {
                tracing::debug!("world.end_turn_without_players");
                return;
            };
            if let Some(player) = current {
                out_events.push(Event::TurnEnded { player });
            }
            world.start_turn(next, out_events);
        }
        Command::SetPhase { phase } => {
            if world.turn.current_player().is_none() {
                tracing::debug!(?phase, "world.phase_without_turn");
                return;
            }
            world.turn.set_phase(phase);
            out_events.push(Event::PhaseChanged { phase });
        }
        Command::SelectUnit { unit: Some(unit) } => world.select_unit(unit, out_events),
        Command::SelectUnit { unit: None } => world.deselect(out_events),
        Command::SelectAbility { ability } => world.select_ability(ability, out_events),
        Command::RequestPath { unit, target } => world.request_path(unit, target, out_events),
        Command::ExecutePath => world.execute_path(out_events),
        Command::CommitMove { unit, target } => {
            let _ = world.commit_move(unit, target, out_events);
        }
        Command::ChangeHp { unit, delta } => world.change_hp(unit, delta, out_events),
    }
}

/// Breach of the rule that units and cells agree on who stands where.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyViolation {
    /// A non-defeated unit's cell does not name it as occupant.
    UnitNotOnCell {
        /// Unit whose position disagrees with the grid.
        unit: UnitId,
        /// Position recorded on the unit.
        cell: CellCoord,
    },
    /// A cell names an occupant that is missing, defeated, or elsewhere.
    StrayOccupant {
        /// Cell carrying the stale occupant.
        cell: CellCoord,
        /// Occupant recorded on the cell.
        occupant: UnitId,
    },
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use ridgeline_core::{
        AbilityId, AbilityTemplate, Catalog, CellCoord, Grid, Phase, PlayerId, UnitId,
    };
    use ridgeline_system_movement::{Path, ReachableSet};

    use super::{OccupancyViolation, Player, TurnState, Unit, World};

    /// Battlefield grid, once terrain has been generated.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        world.grid.as_ref()
    }

    /// Reference catalog used for spawning.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.catalog
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.roster.unit(id)
    }

    /// Every unit ordered by identifier, defeated ones included.
    pub fn units(world: &World) -> impl Iterator<Item = &Unit> {
        world.roster.units()
    }

    /// Unit standing on the provided cell.
    #[must_use]
    pub fn unit_at(world: &World, cell: CellCoord) -> Option<&Unit> {
        let occupant = world.grid.as_ref()?.cell(cell)?.occupant()?;
        world.roster.unit(occupant)
    }

    /// Looks up a player by identifier.
    #[must_use]
    pub fn player(world: &World, id: PlayerId) -> Option<&Player> {
        world.roster.player(id)
    }

    /// Players in registration order.
    pub fn players(world: &World) -> impl Iterator<Item = &Player> {
        world.roster.players()
    }

    /// Full turn and selection state.
    #[must_use]
    pub fn turn(world: &World) -> &TurnState {
        &world.turn
    }

    /// Player whose turn is active.
    #[must_use]
    pub fn current_player(world: &World) -> Option<PlayerId> {
        world.turn.current_player()
    }

    /// Informational phase of the active turn.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.turn.phase()
    }

    /// Currently selected unit.
    #[must_use]
    pub fn selected_unit(world: &World) -> Option<UnitId> {
        world.turn.selected_unit()
    }

    /// Currently selected ability.
    #[must_use]
    pub fn selected_ability(world: &World) -> Option<&AbilityId> {
        world.turn.selected_ability()
    }

    /// Last computed reachable set.
    #[must_use]
    pub fn reachable_cells(world: &World) -> Option<&ReachableSet> {
        world.turn.reachable().map(|(_, set)| set)
    }

    /// Last found path.
    #[must_use]
    pub fn current_path(world: &World) -> Option<&Path> {
        world.turn.path().map(|(_, path)| path)
    }

    /// Ability templates known by a unit, resolved through the catalog.
    #[must_use]
    pub fn unit_abilities(world: &World, id: UnitId) -> Vec<&AbilityTemplate> {
        world
            .roster
            .unit(id)
            .map(|unit| {
                unit.abilities()
                    .iter()
                    .filter_map(|ability| world.catalog.ability(ability))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lists every disagreement between unit positions and cell occupants.
    #[must_use]
    pub fn occupancy_violations(world: &World) -> Vec<OccupancyViolation> {
        let mut violations = Vec::new();
        let Some(grid) = world.grid.as_ref() else {
            return violations;
        };

        for unit in world.roster.units().filter(|unit| !unit.is_defeated()) {
            let on_cell = grid
                .cell(unit.position())
                .and_then(|cell| cell.occupant())
                == Some(unit.id());
            if !on_cell {
                violations.push(OccupancyViolation::UnitNotOnCell {
                    unit: unit.id(),
                    cell: unit.position(),
                });
            }
        }

        for cell in grid.occupied_cells() {
            let Some(occupant) = cell.occupant() else {
                continue;
            };
            let consistent = world.roster.unit(occupant).is_some_and(|unit| {
                !unit.is_defeated() && unit.position() == cell.coord()
            });
            if !consistent {
                violations.push(OccupancyViolation::StrayOccupant {
                    cell: cell.coord(),
                    occupant,
                });
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use ridgeline_core::{ConfigError, Faction, UnitKind};

    use super::*;

    fn battlefield(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::GenerateTerrain {
                config: BattlefieldConfig::new(6, 3, 6, 8.0),
                seed: Some(11),
            },
            &mut events,
        );
        events
    }

    fn column_position(world: &World, x: i32, z: i32) -> Vec3 {
        query::grid(world)
            .and_then(|grid| grid.column_top(x, z))
            .map(|cell| cell.coord().to_world())
            .expect("column exists")
    }

    #[test]
    fn unseeded_generation_reports_the_drawn_seed() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::GenerateTerrain {
                config: BattlefieldConfig::new(4, 2, 4, 5.0),
                seed: None,
            },
            &mut events,
        );

        let Some(Event::TerrainGenerated { seed, .. }) = events.first() else {
            panic!("expected TerrainGenerated, got {events:?}");
        };
        assert_eq!(query::grid(&world).map(Grid::seed), Some(*seed));
    }

    #[test]
    fn rejected_terrain_keeps_previous_grid() {
        let mut world = World::new();
        let _ = battlefield(&mut world);
        let cells = query::grid(&world).map(Grid::len);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::GenerateTerrain {
                config: BattlefieldConfig::new(0, 3, 6, 8.0),
                seed: Some(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TerrainRejected {
                reason: ConfigError::ZeroWidth
            }]
        );
        assert_eq!(query::grid(&world).map(Grid::len), cells);
    }

    #[test]
    fn spawn_rejections_leave_world_untouched() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterPlayer {
                name: "Ada".to_owned(),
                faction: Faction::Player,
            },
            &mut events,
        );
        let player = PlayerId::new(0);

        events.clear();
        apply(
            &mut world,
            Command::SpawnUnit {
                player,
                blueprint: UnitBlueprint::Template {
                    template: "warrior".to_owned(),
                    name: None,
                },
                position: Vec3::ZERO,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                player,
                reason: SpawnError::NoTerrain
            }]
        );

        let _ = battlefield(&mut world);
        events.clear();
        let position = column_position(&world, 0, 0);
        apply(
            &mut world,
            Command::SpawnUnit {
                player,
                blueprint: UnitBlueprint::Template {
                    template: "paladin".to_owned(),
                    name: None,
                },
                position,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                player,
                reason: SpawnError::UnknownTemplate("paladin".to_owned())
            }]
        );
        assert_eq!(query::units(&world).count(), 0);
    }

    #[test]
    fn travelling_units_are_moving_until_they_land() {
        let mut world = World::new();
        let _ = battlefield(&mut world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterPlayer {
                name: "Ada".to_owned(),
                faction: Faction::Player,
            },
            &mut events,
        );
        let position = column_position(&world, 0, 0);
        apply(
            &mut world,
            Command::SpawnUnit {
                player: PlayerId::new(0),
                blueprint: UnitBlueprint::Custom {
                    name: "Kit".to_owned(),
                    kind: UnitKind::Rogue,
                    stats: UnitKind::Rogue.base_stats(),
                },
                position,
            },
            &mut events,
        );
        let unit = UnitId::new(0);

        let resting = world.begin_travel(unit);
        assert_eq!(resting, Some(UnitState::Idle));
        assert_eq!(
            query::unit(&world, unit).map(Unit::state),
            Some(UnitState::Moving)
        );

        world.end_travel(unit, resting);
        assert_eq!(
            query::unit(&world, unit).map(Unit::state),
            Some(UnitState::Idle)
        );
        assert_eq!(world.begin_travel(UnitId::new(9)), None);
    }

    #[test]
    fn defeat_vacates_the_cell_and_clears_selection() {
        let mut world = World::new();
        let _ = battlefield(&mut world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterPlayer {
                name: "Ada".to_owned(),
                faction: Faction::Player,
            },
            &mut events,
        );
        let stats = UnitKind::Mage.base_stats();
        let position = column_position(&world, 1, 1);
        apply(
            &mut world,
            Command::SpawnUnit {
                player: PlayerId::new(0),
                blueprint: UnitBlueprint::Custom {
                    name: "Iris".to_owned(),
                    kind: UnitKind::Mage,
                    stats,
                },
                position,
            },
            &mut events,
        );
        let unit = UnitId::new(0);
        let cell = query::unit(&world, unit).map(Unit::position).expect("spawned");
        apply(&mut world, Command::SelectUnit { unit: Some(unit) }, &mut events);

        events.clear();
        let overkill = i32::try_from(stats.max_hp).expect("fits") + 5;
        apply(&mut world, Command::ChangeHp { unit, delta: -overkill }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::UnitHpChanged { unit, hp: 0 },
                Event::UnitDefeated { unit, cell }
            ]
        );
        assert_eq!(query::selected_unit(&world), None);
        assert!(query::unit_at(&world, cell).is_none());
        assert!(query::occupancy_violations(&world).is_empty());
        assert_eq!(
            query::player(&world, PlayerId::new(0)).map(Player::units),
            Some(&[unit][..])
        );
    }
}
