//! Command-line interface for the headless arena.

use clap::Parser;
use std::path::PathBuf;

/// Headless arena skirmish simulator
#[derive(Parser, Debug)]
#[command(name = "skirmish-sim")]
#[command(about = "Runs a scripted arena skirmish and prints the final snapshot")]
#[command(version)]
pub struct Args {
    /// TOML config file (defaults are used when missing)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Player class, overriding the config (Warrior, Mage, Warlock, Paladin)
    #[arg(long)]
    pub class: Option<String>,

    /// Number of enemies to spawn
    #[arg(long, default_value = "3")]
    pub enemies: u32,

    /// Number of allies to spawn
    #[arg(long, default_value = "1")]
    pub allies: u32,

    /// Maximum match duration in seconds
    #[arg(long, default_value = "120")]
    pub max_seconds: f32,

    /// Also write the final snapshot to this path
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
