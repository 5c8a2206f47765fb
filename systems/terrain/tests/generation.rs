use std::collections::HashMap;

use ridgeline_core::{BattlefieldConfig, ConfigError};
use ridgeline_system_terrain::{generate, generate_with, NoiseTuning, SimplexNoise};

fn config() -> BattlefieldConfig {
    BattlefieldConfig::new(12, 8, 9, 6.0)
}

#[test]
fn every_column_has_exactly_one_traversable_top() {
    let grid = generate(config(), 42).expect("valid configuration");

    let mut tops: HashMap<(i32, i32), Vec<i32>> = HashMap::new();
    let mut heights: HashMap<(i32, i32), i32> = HashMap::new();
    for cell in grid.cells() {
        let key = (cell.coord().x(), cell.coord().z());
        let highest = heights.entry(key).or_insert(i32::MIN);
        *highest = (*highest).max(cell.coord().y());
        if cell.traversable() {
            tops.entry(key).or_default().push(cell.coord().y());
        }
    }

    assert_eq!(tops.len(), 12 * 9);
    for (column, levels) in &tops {
        assert_eq!(levels.len(), 1, "column {column:?} has {levels:?}");
        assert_eq!(Some(&levels[0]), heights.get(column));
    }
}

#[test]
fn columns_are_centred_and_bounded() {
    let grid = generate(config(), 7).expect("valid configuration");
    for cell in grid.cells() {
        let coord = cell.coord();
        assert!((-6..6).contains(&coord.x()));
        assert!((-4..5).contains(&coord.z()));
        // Base -4 plus at most floor(1.4375 * 8) = 11 levels.
        assert!((-4..7).contains(&coord.y()), "cell {coord:?} escapes height range");
    }
}

#[test]
fn same_seed_reproduces_the_same_cells() {
    let first = generate(config(), 1234).expect("valid configuration");
    let second = generate(config(), 1234).expect("valid configuration");
    assert_eq!(first.cells(), second.cells());
    assert_eq!(first.seed(), 1234);
}

#[test]
fn explicit_noise_source_matches_seeded_entry_point() {
    let noise = SimplexNoise::new(99);
    let explicit =
        generate_with(config(), NoiseTuning::default(), 99, &noise).expect("valid configuration");
    let seeded = generate(config(), 99).expect("valid configuration");
    assert_eq!(explicit.cells(), seeded.cells());
}

#[test]
fn invalid_configuration_is_refused_before_sampling() {
    let result = generate(BattlefieldConfig::new(0, 8, 9, 6.0), 1);
    assert_eq!(result.err(), Some(ConfigError::ZeroWidth));

    let result = generate(BattlefieldConfig::new(4, 8, 4, 0.0), 1);
    assert_eq!(result.err(), Some(ConfigError::InvalidNoiseScale));
}
