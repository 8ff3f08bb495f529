//! strata CLI - pass-script driver for the place-and-legalize engine.
//!
//! `strata run <script>` executes a pass script line by line, `strata exec`
//! runs a single pass, and `strata passes` lists what is available.

#![warn(missing_docs)]

mod config;
mod passes;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;
use strata_common::logging;
use strata_db::Design;

use config::StrataConfig;
use passes::{run_script, PassRegistry};

/// strata - an ASIC place-and-legalize engine.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "strata place-and-legalize engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `strata.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a pass script, stopping at the first failure.
    Run {
        /// Script file: one `passname [args…]` per line.
        script: PathBuf,
    },
    /// Execute a single pass.
    Exec {
        /// Pass name followed by its arguments.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
    /// List the available passes.
    Passes,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

impl From<ColorChoice> for logging::ColorChoice {
    fn from(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => logging::ColorChoice::Auto,
            ColorChoice::Always => logging::ColorChoice::Always,
            ColorChoice::Never => logging::ColorChoice::Never,
        }
    }
}

fn level_from_name(name: &str) -> Option<LevelFilter> {
    match name {
        "verbose" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => StrataConfig::load(path),
        None => StrataConfig::discover(),
    }
    .map_err(|e| e.to_string())?;

    // CLI flags win over the config file
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        match config.log.level.as_deref() {
            Some(name) => {
                level_from_name(name).ok_or_else(|| format!("unknown log level '{name}'"))?
            }
            None => LevelFilter::Info,
        }
    };
    logging::init(level, cli.color.into());

    let registry = PassRegistry::with_default_passes(&config).map_err(|e| e.to_string())?;
    let mut design = Design::new();

    match &cli.command {
        Command::Run { script } => {
            let text = std::fs::read_to_string(script)
                .map_err(|e| format!("cannot open '{}': {e}", script.display()))?;
            run_script(&registry, &mut design, &text).map_err(|e| e.to_string())
        }
        Command::Exec { args } => {
            let (name, rest) = args.split_first().expect("clap requires at least one");
            registry
                .run(&mut design, name, rest)
                .map_err(|e| e.to_string())
        }
        Command::Passes => {
            for (name, help) in registry.list() {
                println!("{name:18} {help}");
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(&cli) {
        log::error!("{message}");
        process::exit(1);
    }
}
