#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host for the Ridgeline battle engine.
//!
//! Prints generated battlefields, reachable sets and planned routes as text,
//! and plays scripted scenarios while echoing every emitted event.

mod render;
mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ridgeline_core::{
    BattlefieldConfig, Catalog, CellCoord, Command, Event, Faction, Grid, PlayerId, UnitBlueprint,
    UnitKind,
};
use ridgeline_system_movement::{find_path, find_path_bounded, PlannerLimits};
use ridgeline_world::{apply, query, World};
use tracing_subscriber::EnvFilter;

use render::{Layer, Overlay};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "ridgeline", about = "Turn-based voxel battlefield tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the height map of a generated battlefield.
    Map {
        #[command(flatten)]
        battlefield: BattlefieldArgs,
        /// Show terrain tags instead of heights.
        #[arg(long)]
        terrain: bool,
    },
    /// Place a probe unit on a column and print the cells it can reach.
    Reach {
        #[command(flatten)]
        battlefield: BattlefieldArgs,
        #[arg(long, allow_negative_numbers = true)]
        x: i32,
        #[arg(long, allow_negative_numbers = true)]
        z: i32,
        /// Steps the probe may take.
        #[arg(long, default_value_t = 4)]
        movement: u32,
        /// Height the probe may climb.
        #[arg(long, default_value_t = 1)]
        jump: u32,
    },
    /// Print the planned route between two columns and its cost.
    Path {
        #[command(flatten)]
        battlefield: BattlefieldArgs,
        /// Start column as `X,Z`.
        #[arg(long, value_parser = parse_column, allow_hyphen_values = true)]
        from: (i32, i32),
        /// Goal column as `X,Z`.
        #[arg(long, value_parser = parse_column, allow_hyphen_values = true)]
        to: (i32, i32),
        /// Give up after expanding this many cells.
        #[arg(long)]
        max_expansions: Option<usize>,
    },
    /// Run a TOML scenario and print every event.
    Scenario {
        file: PathBuf,
        /// TOML catalog replacing the built-in abilities and unit templates.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct BattlefieldArgs {
    #[arg(long, default_value_t = 20)]
    width: u32,
    #[arg(long, default_value_t = 20)]
    depth: u32,
    #[arg(long, default_value_t = 10)]
    max_height: u32,
    #[arg(long, default_value_t = 30.0)]
    noise_scale: f32,
    /// Noise seed; drawn at random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

impl BattlefieldArgs {
    fn config(&self) -> BattlefieldConfig {
        BattlefieldConfig::new(self.width, self.max_height, self.depth, self.noise_scale)
    }
}

fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().cmd {
        Cmd::Map {
            battlefield,
            terrain,
        } => {
            let world = generate(&battlefield)?;
            let grid = grid(&world)?;
            let layer = if terrain { Layer::Terrain } else { Layer::Height };
            println!("seed {}", grid.seed());
            print!("{}", render::render(grid, layer, &Overlay::default()));
        }
        Cmd::Reach {
            battlefield,
            x,
            z,
            movement,
            jump,
        } => reach(&battlefield, (x, z), movement, jump)?,
        Cmd::Path {
            battlefield,
            from,
            to,
            max_expansions,
        } => path(&battlefield, from, to, max_expansions)?,
        Cmd::Scenario {
            file,
            catalog,
            json,
        } => {
            let catalog = match catalog {
                Some(path) => scenario::load_catalog(&path)?,
                None => Catalog::builtin(),
            };
            let events = Scenario::load(&file)?.run(catalog)?;
            for event in &events {
                if json {
                    println!(
                        "{}",
                        serde_json::to_string(event).context("failed to encode event")?
                    );
                } else {
                    println!("{event:?}");
                }
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_column(value: &str) -> Result<(i32, i32), String> {
    let (x, z) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Z but found `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok((parse(x)?, parse(z)?))
}

fn generate(args: &BattlefieldArgs) -> Result<World> {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::GenerateTerrain {
            config: args.config(),
            seed: args.seed,
        },
        &mut events,
    );
    if let Some(Event::TerrainRejected { reason }) = events.first() {
        bail!("battlefield rejected: {reason}");
    }
    Ok(world)
}

fn grid(world: &World) -> Result<&Grid> {
    query::grid(world).context("world holds no battlefield")
}

fn column_top(grid: &Grid, (x, z): (i32, i32)) -> Result<CellCoord> {
    grid.column_top(x, z)
        .map(|cell| cell.coord())
        .with_context(|| format!("column ({x}, {z}) is outside the battlefield"))
}

fn reach(args: &BattlefieldArgs, column: (i32, i32), movement: u32, jump: u32) -> Result<()> {
    let mut world = generate(args)?;
    let start = column_top(grid(&world)?, column)?;

    let mut stats = UnitKind::Rogue.base_stats();
    stats.movement = movement;
    stats.jump = jump;
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::RegisterPlayer {
            name: "probe".to_owned(),
            faction: Faction::Player,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SpawnUnit {
            player: PlayerId::new(0),
            blueprint: UnitBlueprint::Custom {
                name: "probe".to_owned(),
                kind: UnitKind::Rogue,
                stats,
            },
            position: start.to_world(),
        },
        &mut events,
    );
    let Some(unit) = events.iter().find_map(|event| match event {
        Event::UnitCreated { unit, .. } => Some(*unit),
        _ => None,
    }) else {
        bail!("probe could not be placed on column ({}, {})", column.0, column.1);
    };
    apply(
        &mut world,
        Command::SelectUnit { unit: Some(unit) },
        &mut events,
    );

    let reachable = query::reachable_cells(&world).context("probe has no reachable set")?;
    let mut overlay = Overlay::default();
    for cell in reachable.coords() {
        overlay.mark(cell.x(), cell.z(), '*');
    }
    overlay.mark(start.x(), start.z(), '@');

    let grid = grid(&world)?;
    println!("seed {}", grid.seed());
    print!("{}", render::render(grid, Layer::Height, &overlay));
    println!("{} reachable cells", reachable.len());
    Ok(())
}

fn path(
    args: &BattlefieldArgs,
    from: (i32, i32),
    to: (i32, i32),
    max_expansions: Option<usize>,
) -> Result<()> {
    let world = generate(args)?;
    let grid = grid(&world)?;
    let start = column_top(grid, from)?;
    let goal = column_top(grid, to)?;

    let route = match max_expansions {
        Some(max_expansions) => {
            find_path_bounded(grid, start, goal, PlannerLimits { max_expansions })?
        }
        None => find_path(grid, start, goal),
    };

    let mut overlay = Overlay::default();
    for cell in route.cells() {
        overlay.mark(cell.x(), cell.z(), 'o');
    }
    overlay.mark(start.x(), start.z(), 'S');
    overlay.mark(goal.x(), goal.z(), 'G');

    println!("seed {}", grid.seed());
    print!("{}", render::render(grid, Layer::Height, &overlay));
    if route.is_empty() {
        println!("no route");
        return Ok(());
    }
    for cell in route.cells() {
        println!("({}, {}, {})", cell.x(), cell.y(), cell.z());
    }
    println!("cost {:.1}", route.total_cost());
    Ok(())
}
