use glam::Vec3;
use ridgeline_core::{
    AbilityId, BattlefieldConfig, CellCoord, Command, Event, Faction, MoveError, Phase, PlayerId,
    SpawnError, StatBlock, UnitBlueprint, UnitId, UnitKind, UnitState,
};
use ridgeline_world::{self as world, query, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

/// Flat battlefield of `size` × `size` columns at height zero.
fn flat_world(size: u32) -> World {
    let mut world = World::new();
    let _ = run(
        &mut world,
        Command::GenerateTerrain {
            config: BattlefieldConfig::new(size, 1, size, 10.0),
            seed: Some(3),
        },
    );
    world
}

fn register(world: &mut World, name: &str) -> PlayerId {
    let events = run(
        world,
        Command::RegisterPlayer {
            name: name.to_owned(),
            faction: Faction::Player,
        },
    );
    match events.as_slice() {
        [Event::PlayerRegistered { player, .. }] => *player,
        other => panic!("unexpected events {other:?}"),
    }
}

fn spawn(world: &mut World, player: PlayerId, at: CellCoord, movement: u32, jump: u32) -> UnitId {
    let stats = StatBlock {
        movement,
        jump,
        ..UnitKind::Warrior.base_stats()
    };
    let events = run(
        world,
        Command::SpawnUnit {
            player,
            blueprint: UnitBlueprint::Custom {
                name: "Probe".to_owned(),
                kind: UnitKind::Warrior,
                stats,
            },
            position: at.to_world(),
        },
    );
    match events.as_slice() {
        [Event::UnitCreated { unit, cell, .. }] => {
            assert_eq!(*cell, at);
            *unit
        }
        other => panic!("unexpected events {other:?}"),
    }
}

fn origin() -> CellCoord {
    CellCoord::new(0, 0, 0)
}

#[test]
fn single_step_unit_reaches_the_full_neighbourhood() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);

    let events = run(&mut world, Command::SelectUnit { unit: Some(unit) });

    let [Event::ReachableCellsCalculated { unit: reached_for, cells }, Event::UnitSelected { unit: selected }] =
        events.as_slice()
    else {
        panic!("unexpected events {events:?}");
    };
    assert_eq!(*reached_for, unit);
    assert_eq!(*selected, unit);
    assert_eq!(cells.len(), 9);
    assert_eq!(cells[0], origin());
    assert_eq!(query::selected_unit(&world), Some(unit));
}

#[test]
fn commit_moves_occupancy_in_one_step() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 2, 0);
    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });

    let target = CellCoord::new(1, 0, 1);
    let events = run(&mut world, Command::CommitMove { unit, target });

    assert_eq!(
        events,
        vec![Event::UnitMoved {
            unit,
            from: origin(),
            to: target
        }]
    );
    let grid = query::grid(&world).expect("terrain generated");
    assert_eq!(grid.cell(origin()).and_then(|cell| cell.occupant()), None);
    assert_eq!(grid.cell(target).and_then(|cell| cell.occupant()), Some(unit));
    assert_eq!(query::unit(&world, unit).map(|unit| unit.position()), Some(target));
    assert_eq!(query::selected_unit(&world), Some(unit));
    assert!(query::reachable_cells(&world).is_none());
    assert!(query::occupancy_violations(&world).is_empty());
}

#[test]
fn illegal_commits_are_rejected_without_mutation() {
    let mut world = flat_world(5);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);

    let far = CellCoord::new(2, 0, 2);
    let events = run(&mut world, Command::CommitMove { unit, target: far });
    assert_eq!(
        events,
        vec![Event::MoveRejected {
            unit,
            target: far,
            reason: MoveError::NotReachable
        }]
    );

    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });
    let events = run(&mut world, Command::CommitMove { unit, target: far });
    assert_eq!(
        events,
        vec![Event::MoveRejected {
            unit,
            target: far,
            reason: MoveError::NotReachable
        }]
    );

    let ghost = UnitId::new(99);
    let events = run(
        &mut world,
        Command::CommitMove {
            unit: ghost,
            target: far,
        },
    );
    assert_eq!(
        events,
        vec![Event::MoveRejected {
            unit: ghost,
            target: far,
            reason: MoveError::UnknownUnit
        }]
    );

    assert_eq!(query::unit(&world, unit).map(|unit| unit.position()), Some(origin()));
    assert!(query::occupancy_violations(&world).is_empty());
}

#[test]
fn requested_path_can_be_executed() {
    let mut world = flat_world(5);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 3, 0);
    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });

    let target = CellCoord::new(2, 0, 2);
    let events = run(&mut world, Command::RequestPath { unit, target });
    let [Event::PathFound { path, cost, .. }] = events.as_slice() else {
        panic!("unexpected events {events:?}");
    };
    assert_eq!(path.first(), Some(&origin()));
    assert_eq!(path.last(), Some(&target));
    assert_eq!(*cost, 2.0);

    let events = run(&mut world, Command::ExecutePath);
    assert_eq!(
        events,
        vec![
            Event::UnitMoved {
                unit,
                from: origin(),
                to: target
            },
            Event::PathExecuted { unit }
        ]
    );
    assert!(query::current_path(&world).is_none());
    assert_eq!(
        query::unit(&world, unit).map(|moved| moved.state()),
        Some(UnitState::Idle)
    );

    let events = run(&mut world, Command::ExecutePath);
    assert!(events.is_empty(), "stale paths must not replay");
}

#[test]
fn path_requests_outside_the_reachable_set_are_ignored() {
    let mut world = flat_world(7);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);
    let other = spawn(&mut world, player, CellCoord::new(-2, 0, 0), 1, 0);

    let events = run(
        &mut world,
        Command::RequestPath {
            unit,
            target: CellCoord::new(1, 0, 0),
        },
    );
    assert!(events.is_empty(), "no selection yet");

    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });
    let events = run(
        &mut world,
        Command::RequestPath {
            unit,
            target: CellCoord::new(3, 0, 0),
        },
    );
    assert!(events.is_empty());

    let events = run(
        &mut world,
        Command::RequestPath {
            unit: other,
            target: CellCoord::new(-1, 0, 0),
        },
    );
    assert!(events.is_empty(), "only the selected unit may request paths");
}

#[test]
fn zero_jump_units_cannot_path_one_level_up_two_columns_away() {
    let mut world = World::new();
    let _ = run(
        &mut world,
        Command::GenerateTerrain {
            config: BattlefieldConfig::new(16, 8, 16, 4.0),
            seed: Some(515),
        },
    );
    let grid = query::grid(&world).expect("terrain generated");
    let (start, target) = grid
        .traversable_cells()
        .map(|cell| cell.coord())
        .find_map(|start| {
            let target = grid.column_top(start.x() + 2, start.z())?.coord();
            (target.y() == start.y() + 1).then_some((start, target))
        })
        .expect("seed 515 has a one-level rise two columns away");
    assert_eq!(start.horizontal_distance(target), 2);

    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, start, 6, 0);
    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });
    let reachable = query::reachable_cells(&world).expect("selection computed reachable set");
    assert!(reachable.coords().all(|cell| cell.y() == start.y()));

    let events = run(&mut world, Command::RequestPath { unit, target });
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::PathFound { .. })),
        "{target:?} sits one level above {start:?}"
    );
    assert!(query::current_path(&world).is_none());
}

#[test]
fn set_phase_without_an_active_turn_is_ignored() {
    let mut world = flat_world(3);
    assert!(run(&mut world, Command::SetPhase { phase: Phase::Action }).is_empty());
    assert_eq!(query::phase(&world), Phase::Movement);

    let player = register(&mut world, "Ada");
    let _ = run(&mut world, Command::StartTurn { player });
    let events = run(&mut world, Command::SetPhase { phase: Phase::Action });
    assert_eq!(events, vec![Event::PhaseChanged { phase: Phase::Action }]);
    assert_eq!(query::phase(&world), Phase::Action);
}

#[test]
fn end_turn_rotates_in_registration_order() {
    let mut world = flat_world(3);
    assert!(run(&mut world, Command::EndTurn).is_empty());

    let first = register(&mut world, "Ada");
    let second = register(&mut world, "Bo");

    assert_eq!(
        run(&mut world, Command::EndTurn),
        vec![Event::TurnStarted { player: first }]
    );
    assert_eq!(
        run(&mut world, Command::EndTurn),
        vec![
            Event::TurnEnded { player: first },
            Event::TurnStarted { player: second }
        ]
    );
    assert_eq!(
        run(&mut world, Command::EndTurn),
        vec![
            Event::TurnEnded { player: second },
            Event::TurnStarted { player: first }
        ]
    );
    assert_eq!(query::current_player(&world), Some(first));
}

#[test]
fn starting_a_turn_resets_phase_and_selection() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);
    let _ = run(&mut world, Command::StartTurn { player });
    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });
    assert_eq!(
        run(&mut world, Command::SetPhase { phase: Phase::Action }),
        vec![Event::PhaseChanged { phase: Phase::Action }]
    );

    assert!(run(&mut world, Command::StartTurn { player: PlayerId::new(42) }).is_empty());
    assert_eq!(
        run(&mut world, Command::StartTurn { player }),
        vec![Event::TurnStarted { player }]
    );
    assert_eq!(query::phase(&world), Phase::Movement);
    assert_eq!(query::selected_unit(&world), None);
    assert!(query::reachable_cells(&world).is_none());
}

#[test]
fn ability_selection_tracks_unit_state() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let events = run(
        &mut world,
        Command::SpawnUnit {
            player,
            blueprint: UnitBlueprint::Template {
                template: "mage".to_owned(),
                name: Some("Iris".to_owned()),
            },
            position: Vec3::new(0.05, 0.0, -0.05),
        },
    );
    let [Event::UnitCreated { unit, .. }] = events.as_slice() else {
        panic!("unexpected events {events:?}");
    };
    let unit = *unit;
    assert_eq!(query::unit(&world, unit).map(|unit| unit.name()), Some("Iris"));

    let fireball = AbilityId::new("fireball");
    assert!(run(
        &mut world,
        Command::SelectAbility {
            ability: Some(fireball.clone())
        }
    )
    .is_empty());

    let _ = run(&mut world, Command::SelectUnit { unit: Some(unit) });
    assert!(run(
        &mut world,
        Command::SelectAbility {
            ability: Some(AbilityId::new("backstab"))
        }
    )
    .is_empty());

    assert_eq!(
        run(
            &mut world,
            Command::SelectAbility {
                ability: Some(fireball.clone())
            }
        ),
        vec![Event::AbilitySelected {
            unit,
            ability: Some(fireball.clone())
        }]
    );
    assert_eq!(query::selected_ability(&world), Some(&fireball));
    assert_eq!(query::unit(&world, unit).map(|unit| unit.state()), Some(UnitState::Acting));

    let _ = run(&mut world, Command::SelectUnit { unit: None });
    assert_eq!(query::selected_ability(&world), None);
    assert_eq!(query::unit(&world, unit).map(|unit| unit.state()), Some(UnitState::Idle));
    let names: Vec<_> = query::unit_abilities(&world, unit)
        .into_iter()
        .map(|ability| ability.id.as_str())
        .collect();
    assert!(names.contains(&"fireball"));
}

#[test]
fn spawning_onto_an_occupied_or_missing_cell_is_rejected() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);

    let blueprint = UnitBlueprint::Template {
        template: "archer".to_owned(),
        name: None,
    };
    assert_eq!(
        run(
            &mut world,
            Command::SpawnUnit {
                player,
                blueprint: blueprint.clone(),
                position: Vec3::ZERO,
            }
        ),
        vec![Event::SpawnRejected {
            player,
            reason: SpawnError::CellOccupied(unit)
        }]
    );
    assert_eq!(
        run(
            &mut world,
            Command::SpawnUnit {
                player,
                blueprint: blueprint.clone(),
                position: Vec3::new(0.5, 0.0, 0.0),
            }
        ),
        vec![Event::SpawnRejected {
            player,
            reason: SpawnError::NoStandableCell
        }]
    );
    assert_eq!(
        run(
            &mut world,
            Command::SpawnUnit {
                player: PlayerId::new(7),
                blueprint,
                position: Vec3::new(1.0, 0.0, 0.0),
            }
        ),
        vec![Event::SpawnRejected {
            player: PlayerId::new(7),
            reason: SpawnError::UnknownPlayer
        }]
    );
}

#[test]
fn defeated_units_can_neither_be_selected_nor_moved() {
    let mut world = flat_world(3);
    let player = register(&mut world, "Ada");
    let unit = spawn(&mut world, player, origin(), 1, 0);
    let _ = run(&mut world, Command::ChangeHp { unit, delta: -10_000 });

    assert!(run(&mut world, Command::SelectUnit { unit: Some(unit) }).is_empty());
    assert_eq!(
        run(
            &mut world,
            Command::CommitMove {
                unit,
                target: origin()
            }
        ),
        vec![Event::MoveRejected {
            unit,
            target: origin(),
            reason: MoveError::UnitDefeated
        }]
    );
    let other = spawn(&mut world, player, origin(), 1, 0);
    assert_ne!(other, unit);
    assert!(query::occupancy_violations(&world).is_empty());
}
