//! geocoin binary
//!
//! Plays the geocoin world in a terminal, saving the session to a JSON file.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                              | Default              | Description                       |
//! |----------------------------------|----------------------|-----------------------------------|
//! | `GEOCOIN_SEED`                   | `geocoin`            | World seed                        |
//! | `GEOCOIN_STEP`                   | `0.0001`             | Cell size / step (degrees)        |
//! | `GEOCOIN_NEIGHBORHOOD_RADIUS`    | `8`                  | Chebyshev spawn radius (cells)    |
//! | `GEOCOIN_SPAWN_PROBABILITY`      | `0.1`                | Chance a cell holds a cache       |
//! | `GEOCOIN_MAX_COINS_PER_CACHE`    | `3`                  | Initial mint upper bound          |
//! | `GEOCOIN_VISIBLE_DISTANCE`       | `0.0008`             | Display radius (degrees)          |
//! | `GEOCOIN_ORIGIN__LAT` / `__LNG`  | Oakes College, UCSC  | World origin                      |
//! | `GEOCOIN_SAVE`                   | `geocoin-save.json`  | Save file                         |

use anyhow::{Context, Result};
use clap::Parser;
use geocoin_world::{
    driver::{DriverConfig, SessionDriver},
    FileStore, LatLng, StateStore, WorldConfig,
};
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "geocoin", about = "Geocoin World", version)]
struct Args {
    /// TOML or JSON world configuration file
    #[arg(long, env = "GEOCOIN_CONFIG")]
    config: Option<PathBuf>,

    /// Save file
    #[arg(long, env = "GEOCOIN_SAVE", default_value = "geocoin-save.json")]
    save: PathBuf,

    /// Discard the save file before starting
    #[arg(long)]
    fresh: bool,

    /// World seed (overrides config)
    #[arg(long)]
    seed: Option<String>,

    /// Cell size in degrees (overrides config)
    #[arg(long)]
    step: Option<f64>,

    /// Spawn radius in cells (overrides config)
    #[arg(long)]
    radius: Option<i32>,

    /// JSON array of `{"lat":…,"lng":…}` fixes to replay as geolocation
    #[arg(long)]
    track: Option<PathBuf>,

    /// Milliseconds between replayed fixes
    #[arg(long, default_value_t = 1000)]
    track_interval_ms: u64,

    /// Seconds between background saves
    #[arg(long, default_value_t = 30)]
    autosave_secs: u64,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geocoin_world=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut world = WorldConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(seed) = args.seed {
        world.seed = seed;
    }
    if let Some(step) = args.step {
        world.step = step;
    }
    if let Some(radius) = args.radius {
        world.neighborhood_radius = radius;
    }

    let track = args
        .track
        .as_deref()
        .map(|path| -> Result<Vec<LatLng>> {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read track {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid track file {}", path.display()))
        })
        .transpose()?;

    let mut store = FileStore::new(&args.save);
    if args.fresh {
        store.clear().context("Failed to discard save file")?;
    }

    tracing::info!(
        "Starting geocoin (seed='{}', step={}, radius={}, save={})",
        world.seed,
        world.step,
        world.neighborhood_radius,
        args.save.display(),
    );

    let driver_config = DriverConfig {
        autosave_interval: Duration::from_secs(args.autosave_secs.max(1)),
        track_interval: Duration::from_millis(args.track_interval_ms.max(1)),
    };

    println!("Type 'help' for commands.");
    SessionDriver::start(world, store, driver_config)?
        .run(track)
        .await?;
    Ok(())
}
