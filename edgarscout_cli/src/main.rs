//! CLI binary for EdgarScout: match a prospect catalog against a directory
//! of SEC EDGAR filings and write triaged match CSVs.
//!
//! Exit codes: 0 success, 1 argument error, 2 input I/O error.

mod commands;
mod output;

use clap::{Parser, Subcommand};

/// Top-level CLI structure parsed by clap.
#[derive(Parser)]
#[command(name = "edgarscout")]
#[command(about = "Match fundraising prospects against SEC EDGAR filings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run a matching pass over a filings directory
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("edgarscout=info".parse().expect("valid directive")),
        )
        .with_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap's help/version output is not an error.
            if e.use_stderr() {
                let _ = e.print();
                std::process::exit(1);
            }
            let _ = e.print();
            std::process::exit(0);
        }
    };

    let result = match &cli.command {
        Commands::Run(args) => commands::run::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {}", e.message());
        std::process::exit(e.exit_code());
    }
}
