mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lease::{GoalSeekArgs, NpvArgs};

/// Compare the cost of two residential leases
#[derive(Parser)]
#[command(
    name = "lnpv",
    version,
    about = "Compare the cost of two residential leases",
    long_about = "Turns each lease into 24 months of outflows (rent, broker fee, moving cost), \
                  discounts them at a monthly compounding rate, and solves for the rent that \
                  makes a comparison lease cost the same as a baseline lease."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Net present value of a single lease
    Npv(NpvArgs),
    /// Solve for the comparison rent that matches the baseline lease's cost
    GoalSeek(GoalSeekArgs),
    /// Run the two-apartment example comparison
    Demo,
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

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Npv(args) => commands::lease::run_npv(args),
        Commands::GoalSeek(args) => commands::lease::run_goal_seek(args),
        Commands::Demo => commands::lease::run_demo(),
        Commands::Version => {
            println!("lnpv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

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
