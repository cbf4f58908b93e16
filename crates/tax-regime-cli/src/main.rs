mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::compare::CompareArgs;
use commands::lookup::{ClassifyArgs, JurisdictionArgs};
use commands::regimes::{ActualArgs, PresumedArgs, SimplifiedArgs, SimulateArgs};
use input::config::DataPaths;

/// Brazilian corporate tax regime comparison
#[derive(Parser)]
#[command(
    name = "txr",
    version,
    about = "Compare Brazilian corporate tax regimes",
    long_about = "Computes the tax liability of a company under Simples Nacional, \
                  Lucro Presumido and Lucro Real with decimal precision, ranks the \
                  regimes and explains the result. Jurisdiction data is normalized \
                  from heterogeneous state records."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Tax tables file (JSON or YAML) replacing the built-in rates
    #[arg(long, global = true)]
    tables: Option<String>,

    /// Jurisdiction source records (JSON or YAML) replacing the bundled set
    #[arg(long, global = true)]
    sources: Option<String>,

    /// Log computation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare all three regimes and recommend the cheapest
    Compare(CompareArgs),
    /// Compute the simplified regime (Simples Nacional)
    Simplified(SimplifiedArgs),
    /// Compute the presumed-profit regime (Lucro Presumido)
    Presumed(PresumedArgs),
    /// Compute the actual-profit regime (Lucro Real)
    Actual(ActualArgs),
    /// Run the actual-profit regime over consecutive periods
    Simulate(SimulateArgs),
    /// Show the normalized profile of a state
    Jurisdiction(JurisdictionArgs),
    /// Classify an activity code
    Classify(ClassifyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tax_regime_core=debug,txr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("txr {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    init_tracing(cli.verbose);

    let paths = DataPaths {
        tables: cli.tables.clone(),
        sources: cli.sources.clone(),
    };
    let result = input::config::load_engine(&paths).and_then(|engine| match cli.command {
        Commands::Compare(args) => commands::compare::run_compare(args, &engine),
        Commands::Simplified(args) => commands::regimes::run_simplified(args, &engine),
        Commands::Presumed(args) => commands::regimes::run_presumed(args, &engine),
        Commands::Actual(args) => commands::regimes::run_actual(args, &engine),
        Commands::Simulate(args) => commands::regimes::run_simulate(args, &engine),
        Commands::Jurisdiction(args) => commands::lookup::run_jurisdiction(args, &engine),
        Commands::Classify(args) => commands::lookup::run_classify(args, &engine),
        Commands::Version => Ok(serde_json::Value::Null),
    });

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
