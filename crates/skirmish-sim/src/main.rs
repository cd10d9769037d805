//! # Skirmish Sim
//!
//! Headless driver for the skirmish combat core: loads a config, spawns a
//! scripted arena, runs it at a fixed frame rate until the match resolves
//! and prints the final snapshot as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod arena;
mod cli;

use anyhow::{Context, Result};
use skirmish_combat::prelude::*;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fixed frame length in seconds.
const FRAME: f32 = 1.0 / 60.0;

/// Main entry point.
fn main() -> Result<()> {
    let args = cli::parse_args();

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("skirmish=info".parse()?);
    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Skirmish sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = args
        .config
        .as_deref()
        .map(SkirmishConfig::load_from)
        .unwrap_or_default();
    if let Some(class) = &args.class {
        config.player_class = class.parse::<ClassId>()?;
    }
    config.validate();

    let mut arena = arena::Arena::new(config, args.enemies, args.allies)?;
    let outcome = arena.run(args.max_seconds, FRAME);
    info!(
        "Match ended {outcome:?} after {:.1}s",
        arena.skirmish().now_ms() as f64 / 1000.0
    );

    let json = arena.snapshot().to_json()?;
    if let Some(path) = &args.output {
        std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
        info!("Snapshot written to {}", path.display());
    }
    println!("{json}");

    Ok(())
}
