#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure terrain generator that turns seeded coherent noise into a voxel grid.
//!
//! Each `(x, z)` column samples layered simplex noise, converts the
//! normalised value into a stack height, and emits one cell per level with
//! only the topmost cell marked traversable. Coordinates are offset so the
//! battlefield is centred on the origin.

mod noise;

pub use noise::{NoiseSource, SimplexNoise};

use ridgeline_core::{BattlefieldConfig, Column, ConfigError, Grid, GridError, TerrainKind};

/// Octave layering parameters applied on top of the base noise field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseTuning {
    /// Number of layered samples per column.
    pub octaves: u32,
    /// Amplitude multiplier applied after each octave.
    pub persistence: f64,
    /// Frequency multiplier applied after each octave.
    pub lacunarity: f64,
}

impl Default for NoiseTuning {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Generates a battlefield from the built-in simplex noise seeded with `seed`.
pub fn generate(config: BattlefieldConfig, seed: u64) -> Result<Grid, ConfigError> {
    let noise = SimplexNoise::new(seed);
    generate_with(config, NoiseTuning::default(), seed, &noise)
}

/// Generates a battlefield from an arbitrary noise source.
///
/// `seed` is recorded on the grid so callers can reproduce it; the noise
/// source itself is expected to already be seeded.
pub fn generate_with<N>(
    config: BattlefieldConfig,
    tuning: NoiseTuning,
    seed: u64,
    noise: &N,
) -> Result<Grid, ConfigError>
where
    N: NoiseSource + ?Sized,
{
    config.validate()?;

    let width = lattice_extent(config.width)?;
    let depth = lattice_extent(config.depth)?;
    let max_height = lattice_extent(config.max_height)?;
    let scale = f64::from(config.noise_scale);

    let mut columns = Vec::new();
    columns
        .try_reserve(column_capacity(&config)?)
        .map_err(|_| ConfigError::DimensionTooLarge)?;
    for x in 0..width {
        for z in 0..depth {
            let value = layered_sample(noise, &tuning, f64::from(x), f64::from(z), scale);
            columns.push(Column {
                x: x - width / 2,
                z: z - depth / 2,
                base: -(max_height / 2),
                height: stack_height(value, config.max_height),
                terrain: terrain_for(value),
            });
        }
    }

    // Columns never overlap, so a conflict means the extents overflowed.
    let grid = Grid::from_columns(config, seed, columns)
        .map_err(|_: GridError| ConfigError::DimensionTooLarge)?;

    tracing::info!(
        width = config.width,
        depth = config.depth,
        max_height = config.max_height,
        seed,
        cells = grid.len(),
        "terrain.generated"
    );
    Ok(grid)
}

/// Sums the configured octaves at `(x, z)` and normalises the result with
/// `(sum + 1) / 2`.
#[must_use]
pub fn layered_sample<N>(noise: &N, tuning: &NoiseTuning, x: f64, z: f64, scale: f64) -> f64
where
    N: NoiseSource + ?Sized,
{
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut sum = 0.0;
    for _ in 0..tuning.octaves {
        sum += amplitude * noise.sample(x * frequency / scale, z * frequency / scale);
        amplitude *= tuning.persistence;
        frequency *= tuning.lacunarity;
    }
    (sum + 1.0) / 2.0
}

/// Converts a normalised noise value into a column height of at least one.
///
/// Layered noise may normalise above 1.0, so peaks can stack higher than
/// `max_height`.
#[must_use]
pub fn stack_height(value: f64, max_height: u32) -> u32 {
    let scaled = (value * f64::from(max_height)).floor();
    if !scaled.is_finite() || scaled < 1.0 {
        return 1;
    }
    scaled as u32
}

/// Terrain tag for a normalised noise value.
#[must_use]
pub fn terrain_for(value: f64) -> TerrainKind {
    if value < 0.3 {
        TerrainKind::Water
    } else if value < 0.6 {
        TerrainKind::Grass
    } else if value < 0.8 {
        TerrainKind::Forest
    } else {
        TerrainKind::Mountain
    }
}

fn lattice_extent(extent: u32) -> Result<i32, ConfigError> {
    i32::try_from(extent).map_err(|_| ConfigError::DimensionTooLarge)
}

fn column_capacity(config: &BattlefieldConfig) -> Result<usize, ConfigError> {
    let columns = u64::from(config.width) * u64::from(config.depth);
    usize::try_from(columns).map_err(|_| ConfigError::DimensionTooLarge)
}
