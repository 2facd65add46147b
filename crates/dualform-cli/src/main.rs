mod commands;
mod script;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use commands::Simulation;
use script::Script;

#[derive(Parser)]
#[command(name = "dualform")]
#[command(about = "Dual category chart form tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the options a category key resolves to
    Resolve {
        /// Subcategory data JSON file
        #[arg(long)]
        table: PathBuf,
        /// Category key, e.g. "age" or "geography"
        key: String,
        /// Geography type for the geography key
        #[arg(long)]
        geography_type: Option<String>,
        /// TOML configuration override
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a subcategory data file
    Check {
        /// Subcategory data JSON file
        #[arg(long)]
        table: PathBuf,
    },
    /// Run a scripted session against an in-memory form
    Simulate {
        /// Subcategory data JSON file
        #[arg(long)]
        table: PathBuf,
        /// Host initial state JSON file
        #[arg(long)]
        state: Option<PathBuf>,
        /// Render at least this many segments
        #[arg(long, default_value = "0")]
        segments: usize,
        /// TOML configuration override
        #[arg(long)]
        config: Option<PathBuf>,
        /// Form prefix of the block instance
        #[arg(long, default_value = "card")]
        prefix: String,
        /// Script of steps (TOML)
        script: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Resolve {
            table,
            key,
            geography_type,
            config,
        } => {
            let config = commands::load_config(config.as_deref())?;
            let table = commands::read_file(&table)?;
            let entries = commands::resolve(&table, &config, &key, geography_type.as_deref())?;
            print_json(&entries)?;
        }

        Commands::Check { table } => {
            let report = commands::check(&commands::read_file(&table)?)?;
            print_json(&report)?;
        }

        Commands::Simulate {
            table,
            state,
            segments,
            config,
            prefix,
            script,
        } => {
            let simulation = Simulation {
                table_text: commands::read_file(&table)?,
                state: commands::load_state(state.as_deref())?,
                segments,
                config: Rc::new(commands::load_config(config.as_deref())?),
                prefix,
            };
            let report = simulation.run(&Script::load(&script)?)?;
            print_json(&report)?;
        }
    }

    Ok(())
}
