use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Lunar bytecode runner and introspection tools.
///
/// Executes serialized bytecode chunks and observes them through the VM's
/// debug hook: instruction traces with resolved call targets, opcode and
/// line profiles, and disassembly.
///
/// EXAMPLES:
///     lunar run main.json                Run a chunk, print returned values
///     lunar trace main.json --calls-only Trace call instructions only
///     lunar profile main.json --top 5    Show the five hottest opcodes/lines
///     lunar disasm main.json             Print disassembly
///
/// ENVIRONMENT VARIABLES:
///     LUNAR_MAX_CALL_DEPTH  Override [runtime] max_call_depth
///     LUNAR_HOOK            Override [debug] hook
///     LUNAR_HOOK_COUNT      Override [debug] count
///     RUST_LOG              Log filter (default: warn)
#[derive(Parser)]
#[command(name = "lunar")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Use this config file instead of searching for lunar.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum nested call frames (overrides config and environment)
    #[arg(long, global = true)]
    max_call_depth: Option<usize>,

    /// Log VM activity at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a bytecode chunk
    ///
    /// Loads and validates the chunk, calls it with no arguments and prints
    /// the returned values separated by tabs.
    ///
    /// EXAMPLES:
    ///     lunar run main.json
    #[command(visible_alias = "r")]
    Run {
        /// Path to the chunk JSON file
        file: PathBuf,
    },

    /// Run a chunk and print an instruction trace
    ///
    /// Each record shows the function, source position, pc and disassembled
    /// instruction. Call instructions also show the resolved target and
    /// whether it came through a __call metamethod.
    ///
    /// EXAMPLES:
    ///     lunar trace main.json
    ///     lunar trace main.json --calls-only
    ///     lunar trace main.json --json --limit 100
    #[command(visible_alias = "t")]
    Trace {
        /// Path to the chunk JSON file
        file: PathBuf,
        /// Fire only before CALL and TAILCALL
        #[arg(long)]
        calls_only: bool,
        /// Print one JSON object per record
        #[arg(long)]
        json: bool,
        /// Maximum number of records to keep
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run a chunk with the profiler attached
    ///
    /// EXAMPLES:
    ///     lunar profile main.json
    ///     lunar profile main.json --top 3
    Profile {
        /// Path to the chunk JSON file
        file: PathBuf,
        /// Entries to show per report section
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Print the disassembly of a chunk and its nested functions
    ///
    /// EXAMPLES:
    ///     lunar disasm main.json
    #[command(visible_alias = "d")]
    Disasm {
        /// Path to the chunk JSON file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = commands::RunOptions {
        config: cli.config,
        max_call_depth: cli.max_call_depth,
    };

    match cli.command {
        Commands::Run { file } => commands::run::run(&file, &options)?,
        Commands::Trace {
            file,
            calls_only,
            json,
            limit,
        } => {
            let args = commands::trace::TraceArgs {
                file,
                calls_only,
                json,
                limit,
            };
            commands::trace::run(args, &options)?;
        }
        Commands::Profile { file, top } => {
            let args = commands::profile::ProfileArgs { file, top };
            commands::profile::run(args, &options)?;
        }
        Commands::Disasm { file } => commands::disasm::run(&file)?,
    }

    Ok(())
}
