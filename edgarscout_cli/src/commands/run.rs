//! The `run` subcommand: load prospects, scan a filings directory, write
//! the debug and client CSVs, print the summary table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use edgarscout_lib::{
    load_prospects, run_pipeline, CancelFlag, ColumnMap, MatchEngine, PipelineConfig,
    PipelineError, ProspectRow, DEFAULT_CHECKPOINT_EVERY,
};

use crate::output;

/// Distinguishes input I/O failures (exit 2) from everything else.
#[derive(Debug)]
pub enum RunError {
    /// Unreadable prospect file or filings directory.
    Input(anyhow::Error),
    Other(anyhow::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Input(_) => 2,
            RunError::Other(_) => 1,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RunError::Input(e) | RunError::Other(e) => format!("{:#}", e),
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Prospect CSV (columns: prospect_id, prospect_name, company_name, ...)
    #[arg(long)]
    pub prospects: PathBuf,

    /// Directory of EDGAR filing .txt files
    #[arg(long)]
    pub filings: PathBuf,

    /// Output directory for CSVs and checkpoints
    #[arg(long, default_value = "edgarscout-out")]
    pub out: PathBuf,

    /// Process at most this many filings
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Recurse into subdirectories of the filings directory
    #[arg(long)]
    pub recursive: bool,

    /// Worker count (default: available CPU parallelism)
    #[arg(long, default_value = "0")]
    pub jobs: usize,

    /// Write a checkpoint every N filings (0 disables)
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
    pub checkpoint_every: usize,

    /// Resume from a previous checkpoint in the output directory
    #[arg(long)]
    pub resume: bool,

    /// Advisory per-filing time budget, in seconds
    #[arg(long, default_value = "30")]
    pub soft_budget_secs: u64,
}

pub async fn run(args: &RunArgs) -> Result<(), RunError> {
    let prospects = load_prospect_csv(&args.prospects)?;
    if prospects.is_empty() {
        return Err(RunError::Other(anyhow::anyhow!(
            "no usable prospects in {} (need id and name columns)",
            args.prospects.display()
        )));
    }
    eprintln!("Loaded {} prospects", prospects.len());

    let engine = Arc::new(MatchEngine::new(prospects));
    eprintln!(
        "Built index: {} patterns registered",
        engine.index().patterns().len()
    );

    let mut config = PipelineConfig::new(&args.filings, &args.out);
    config.max_files = args.max_files;
    config.recursive = args.recursive;
    config.jobs = args.jobs;
    config.checkpoint_every = args.checkpoint_every;
    config.resume = args.resume;
    config.soft_budget = Duration::from_secs(args.soft_budget_secs);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling at the next filing boundary...");
                cancel.cancel();
            }
        });
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )
        .expect("progress template"),
    );
    bar.set_message("scanning filings...");
    let bar_handle = bar.clone();
    let progress: edgarscout_lib::ProgressFn = Arc::new(move |done: usize, total: usize| {
        bar_handle.set_length(total as u64);
        bar_handle.set_position(done as u64);
    });

    let report = run_pipeline(engine, config, cancel, Some(progress))
        .await
        .map_err(|e| match e {
            PipelineError::FilingsDir { .. } => RunError::Input(e.into()),
            PipelineError::Checkpoint(_) => RunError::Other(e.into()),
        })?;
    bar.finish_and_clear();

    output::write_outputs(&args.out, &report.records).map_err(RunError::Other)?;

    eprintln!("{}", output::summary_table(&report.stats));
    eprintln!(
        "Wrote {} and {} under {}",
        output::DEBUG_CSV,
        output::CLIENT_CSV,
        args.out.display()
    );
    if report.cancelled {
        eprintln!("Run cancelled; re-run with --resume to continue.");
    }
    Ok(())
}

/// Read the prospect CSV through the column-alias adapter.
fn load_prospect_csv(path: &PathBuf) -> Result<Vec<edgarscout_lib::Prospect>, RunError> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("reading prospect file {}", path.display()))
        .map_err(RunError::Input)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RunError::Input(e.into()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let map = ColumnMap::resolve(&headers).map_err(|e| RunError::Input(e.into()))?;

    let mut rows: Vec<ProspectRow> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| RunError::Input(e.into()))?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        rows.push(map.row(&cells));
    }
    Ok(load_prospects(rows))
}
