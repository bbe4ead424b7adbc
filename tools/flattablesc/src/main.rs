//! flattablesc - FlatBuffers schema and Rust glue generator
//!
//! Reads a tables file and writes a FlatBuffers schema, Rust conversion code
//! and optionally a GraphQL schema, then compiles the schema with `flatc`.

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::generate::GenerateCommand;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

/// flattablesc - Generate FlatBuffers schemas and Rust glue code from tables
#[derive(Debug, Parser)]
#[command(name = "flattablesc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate schema and glue code from a tables file
    #[command(name = "generate")]
    Generate(GenerateCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Generate(cmd) => cmd.execute().await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("  {} {}", "hint:".yellow(), hint);
        }
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
