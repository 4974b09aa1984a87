//! The scan pipeline: build once, scan in parallel, merge at the end.
//!
//! The prospect index and automaton are built in a single-writer phase and
//! then shared immutably. Filings are embarrassingly parallel: each worker
//! takes one filing end-to-end (read, parse, scan, fuse) on a blocking
//! thread, bounded by a semaphore sized to the hardware. Cancellation is
//! cooperative at filing boundaries; a cancelled run still reports every
//! record already produced.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use edgarscout_filings::parse_filing;

use crate::checkpoint::{self, Checkpoint, CheckpointError};
use crate::matcher::MatchEngine;
use crate::record::MatchRecord;
use crate::stats::RunStats;

/// Advisory per-filing time budget.
pub const DEFAULT_SOFT_BUDGET: Duration = Duration::from_secs(30);

/// Checkpoint cadence, in filings.
pub const DEFAULT_CHECKPOINT_EVERY: usize = 25;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read filings directory {path}: {source}")]
    FilingsDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Scan-phase configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub filings_dir: PathBuf,
    pub out_dir: PathBuf,
    pub max_files: Option<usize>,
    pub recursive: bool,
    /// Worker count; 0 means available hardware parallelism.
    pub jobs: usize,
    pub checkpoint_every: usize,
    pub resume: bool,
    pub soft_budget: Duration,
}

impl PipelineConfig {
    pub fn new(filings_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            filings_dir: filings_dir.into(),
            out_dir: out_dir.into(),
            max_files: None,
            recursive: false,
            jobs: 0,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            resume: false,
            soft_budget: DEFAULT_SOFT_BUDGET,
        }
    }

    fn worker_count(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Cooperative cancellation token, checked at filing boundaries.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callback: (filings done, filings total).
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Everything a finished (or cancelled) run reports.
pub struct PipelineReport {
    pub records: Vec<MatchRecord>,
    pub stats: RunStats,
    pub cancelled: bool,
}

/// Outcome of one worker's filing.
struct FilingOutcome {
    filename: String,
    records: Vec<MatchRecord>,
    stats: RunStats,
    skipped: bool,
}

/// Run the scan phase over a filings directory.
pub async fn run_pipeline(
    engine: Arc<MatchEngine>,
    config: PipelineConfig,
    cancel: CancelFlag,
    progress: Option<ProgressFn>,
) -> Result<PipelineReport, PipelineError> {
    let mut files = list_filings(&config.filings_dir, config.recursive)?;
    if let Some(max) = config.max_files {
        files.truncate(max);
    }

    let mut records: Vec<MatchRecord> = Vec::new();
    let mut record_keys: HashMap<(String, String), usize> = HashMap::new();
    let mut stats = RunStats::default();
    let mut processed: Vec<String> = Vec::new();

    if config.resume {
        if let Some(checkpoint) = checkpoint::load(&config.out_dir)? {
            tracing::info!(
                processed = checkpoint.processed.len(),
                matches = checkpoint.matches.len(),
                "resuming from checkpoint"
            );
            files.retain(|f| !checkpoint.processed.contains(&filename_of(f)));
            stats.files_processed = checkpoint.processed.len();
            processed = checkpoint.processed;
            for record in checkpoint.matches {
                add_record(&mut records, &mut record_keys, record);
            }
        }
    }

    let total = files.len();
    let workers = config.worker_count();
    tracing::info!(filings = total, workers, "scan phase starting");

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut join_set = JoinSet::new();
    let soft_budget = config.soft_budget;

    for path in files {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            if cancel.is_cancelled() {
                return FilingOutcome {
                    filename: filename_of(&path),
                    records: Vec::new(),
                    stats: RunStats::default(),
                    skipped: true,
                };
            }
            tokio::task::spawn_blocking(move || process_filing(&engine, &path, soft_budget))
                .await
                .expect("scan worker panicked")
        });
    }

    let mut done = 0usize;
    let mut since_checkpoint = 0usize;
    let mut cancelled = false;

    while let Some(joined) = join_set.join_next().await {
        let outcome = joined.expect("scan task panicked");
        if outcome.skipped {
            cancelled = true;
            continue;
        }
        done += 1;
        since_checkpoint += 1;
        stats.merge(outcome.stats);
        for record in outcome.records {
            add_record(&mut records, &mut record_keys, record);
        }
        processed.push(outcome.filename);

        if let Some(progress) = &progress {
            progress(done, total);
        }

        if config.checkpoint_every > 0 && since_checkpoint >= config.checkpoint_every {
            since_checkpoint = 0;
            write_checkpoint(&config, &processed, &records)?;
        }
    }

    if cancel.is_cancelled() {
        cancelled = true;
    }

    if cancelled {
        // Keep the checkpoint so the run can resume; record what finished.
        write_checkpoint(&config, &processed, &records)?;
        tracing::warn!(
            done,
            total,
            "run cancelled; checkpoint written for resume"
        );
    } else if config.checkpoint_every > 0 {
        checkpoint::clear(&config.out_dir)?;
    }

    for record in &records {
        stats.note_record(record);
    }

    Ok(PipelineReport {
        records,
        stats,
        cancelled,
    })
}

/// Insert a record, enforcing at-most-one per (prospect, accession). When a
/// duplicate filing copy produces a collision, the stronger record wins:
/// higher confidence, then structured method, then verified company, then
/// name+company evidence.
fn add_record(
    records: &mut Vec<MatchRecord>,
    keys: &mut HashMap<(String, String), usize>,
    record: MatchRecord,
) {
    let key = (
        record.prospect_id.clone(),
        record
            .accession_number
            .clone()
            .unwrap_or_else(|| record.filename.clone()),
    );
    match keys.get(&key) {
        Some(&idx) => {
            if record.beats(&records[idx]) {
                records[idx] = record;
            }
        }
        None => {
            keys.insert(key, records.len());
            records.push(record);
        }
    }
}

fn write_checkpoint(
    config: &PipelineConfig,
    processed: &[String],
    records: &[MatchRecord],
) -> Result<(), PipelineError> {
    // Remaining = everything discovered but not yet processed; recomputed
    // from disk so a resumed run sees late-added files too.
    let remaining: Vec<String> = list_filings(&config.filings_dir, config.recursive)
        .map(|files| {
            files
                .iter()
                .map(|f| filename_of(f))
                .filter(|f| !processed.contains(f))
                .collect()
        })
        .unwrap_or_default();
    checkpoint::save(
        &config.out_dir,
        &Checkpoint {
            processed: processed.to_vec(),
            matches: records.to_vec(),
            remaining,
        },
    )?;
    Ok(())
}

/// One filing end-to-end on a blocking thread.
fn process_filing(engine: &MatchEngine, path: &Path, soft_budget: Duration) -> FilingOutcome {
    let filename = filename_of(path);
    let started = Instant::now();
    let mut stats = RunStats::default();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(file = %filename, "unreadable filing, skipping: {}", e);
            stats.note_filing("UNREADABLE", true);
            return FilingOutcome {
                filename,
                records: Vec::new(),
                stats,
                skipped: false,
            };
        }
    };

    let filing = parse_filing(&raw);
    stats.note_filing(
        &filing.header.form_class.to_string(),
        filing.parse_error.is_some(),
    );
    if let Some(err) = &filing.parse_error {
        tracing::warn!(file = %filename, "parse error (generic fallback used): {}", err);
    }

    let records = engine.match_filing(&filing, &raw, &filename);

    let elapsed = started.elapsed();
    if elapsed > soft_budget {
        stats.soft_budget_breaches += 1;
        tracing::warn!(
            file = %filename,
            elapsed_ms = elapsed.as_millis() as u64,
            "filing exceeded soft time budget"
        );
    }

    FilingOutcome {
        filename,
        records,
        stats,
        skipped: false,
    }
}

/// Discover `.txt` filings under a directory, sorted by name.
fn list_filings(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    collect_filings(dir, recursive, &mut files).map_err(|source| PipelineError::FilingsDir {
        path: dir.to_path_buf(),
        source,
    })?;
    files.sort();
    Ok(files)
}

fn collect_filings(
    dir: &Path,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_filings(&path, recursive, files)?;
            }
        } else if path.extension().map(|e| e == "txt").unwrap_or(false) {
            files.push(path);
        }
    }
    Ok(())
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
