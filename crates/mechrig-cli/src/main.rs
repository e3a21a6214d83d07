//! mechrig - Command-line interface for mechanical rig synthesis
//!
//! This binary validates scene selections, synthesizes skeleton documents,
//! and applies IK control rigs to them.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mechrig_cli::commands;
use mechrig_cli::commands::controls::ControlsArgs;
use mechrig_cli::commands::synthesize::SynthesizeArgs;

/// mechrig - Skeletons and IK control rigs for rigid mechanical models
#[derive(Parser)]
#[command(name = "mechrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a scene selection without synthesizing anything
    Validate {
        /// Path to the scene document (JSON)
        #[arg(short, long)]
        scene: String,

        /// Path to a naming-conventions file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Synthesize a skeleton document from a scene selection
    Synthesize {
        /// Path to the scene document (JSON)
        #[arg(short, long)]
        scene: String,

        /// Skeleton document to update instead of starting fresh
        #[arg(short, long)]
        existing: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Global multiplier for bone lengths
        #[arg(long)]
        scale: Option<f64>,

        /// Name of a newly created skeleton
        #[arg(long)]
        name: Option<String>,

        /// Also plan geometry duplication and binding
        #[arg(long)]
        plan: bool,

        /// Path to a naming-conventions file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Build or update the IK control rig of a skeleton document
    Controls {
        /// Path to the skeleton document (JSON)
        #[arg(short, long)]
        skeleton: String,

        /// Path to the per-bone rig configuration (JSON)
        #[arg(short, long)]
        rig: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Path to a naming-conventions file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the bone forest analyzed from a scene selection
    Inspect {
        /// Path to the scene document (JSON)
        #[arg(short, long)]
        scene: String,

        /// Path to a naming-conventions file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mechrig=debug" } else { "mechrig=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate { scene, config, json } => {
            commands::validate::run(&scene, config.as_deref(), json)
        }
        Commands::Synthesize {
            scene,
            existing,
            output,
            scale,
            name,
            plan,
            config,
            json,
        } => commands::synthesize::run(
            &SynthesizeArgs {
                scene: &scene,
                config: config.as_deref(),
                existing: existing.as_deref(),
                output: output.as_deref(),
                scale,
                name: name.as_deref(),
                plan,
            },
            json,
        ),
        Commands::Controls {
            skeleton,
            rig,
            output,
            config,
            json,
        } => commands::controls::run(
            &ControlsArgs {
                skeleton: &skeleton,
                rig: &rig,
                config: config.as_deref(),
                output: output.as_deref(),
            },
            json,
        ),
        Commands::Inspect { scene, config, json } => {
            commands::inspect::run(&scene, config.as_deref(), json)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
