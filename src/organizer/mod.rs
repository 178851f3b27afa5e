pub mod processor;
pub mod scanner;

pub use processor::{FileOutcome, MediaProcessor};
pub use scanner::SourceScanner;

use log::{info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::errors::{ProcessError, RunError};
use crate::media_types::GpsFix;
use crate::track_log::write_track_log;

/// Collected results of processing a batch of files.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub fixes: Vec<GpsFix>,
    pub completed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    /// First fatal error encountered, with the file it happened on.
    pub fatal: Option<(PathBuf, ProcessError)>,
}

impl BatchResult {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Completed(fix) => {
                self.completed += 1;
                self.fixes.extend(fix);
            }
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Cancelled => self.cancelled += 1,
            FileOutcome::Fatal(e) => {
                if self.fatal.is_none() {
                    self.fatal = Some((path, e));
                } else {
                    warn!("Additional fatal error on {}: {}", path.display(), e);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub scanned: usize,
    pub completed: usize,
    pub skipped: usize,
    pub geotagged: usize,
    /// Where the track log was written; `None` in dry-run mode.
    pub track_log: Option<PathBuf>,
}

/// Fans files out to a bounded worker pool and merges the GPS fixes into one track log.
pub struct MediaOrganizer {
    scanner: SourceScanner,
    processor: MediaProcessor,
    workers: usize,
    dry_run: bool,
    track_log_path: PathBuf,
}

impl MediaOrganizer {
    pub fn new(config: &Config) -> Self {
        Self::with_processor(config, MediaProcessor::new(config))
    }

    pub fn with_processor(config: &Config, processor: MediaProcessor) -> Self {
        Self {
            scanner: SourceScanner::new(config.sources.clone()),
            processor,
            workers: config.workers.max(1),
            dry_run: config.dry_run,
            track_log_path: config.track_log_path(),
        }
    }

    pub fn run(&self) -> Result<RunReport, RunError> {
        let files = self.scanner.scan();
        let scanned = files.len();

        let batch = self.process_all(&files)?;
        info!(
            "Processed {} files: {} completed, {} skipped, {} geotagged",
            scanned,
            batch.completed,
            batch.skipped,
            batch.fixes.len()
        );

        if let Some((path, source)) = batch.fatal {
            if batch.cancelled > 0 {
                warn!("{} files were not processed", batch.cancelled);
            }
            return Err(RunError::Fatal { path, source });
        }

        let geotagged = batch.fixes.len();
        let track_log = if self.dry_run {
            info!(
                "[dry-run] Would write GPX trace with {} points to {}",
                geotagged,
                self.track_log_path.display()
            );
            None
        } else {
            write_track_log(batch.fixes, &self.track_log_path)?;
            Some(self.track_log_path.clone())
        };

        Ok(RunReport {
            scanned,
            completed: batch.completed,
            skipped: batch.skipped,
            geotagged,
            track_log,
        })
    }

    /// Process `files` serially or on a pool of `workers` threads.
    ///
    /// Once a fatal outcome is seen no new file is started; files already in flight finish.
    pub fn process_all(&self, files: &[PathBuf]) -> Result<BatchResult, RunError> {
        let mut batch = BatchResult::default();

        if self.workers == 1 {
            for path in files {
                let outcome = if batch.fatal.is_some() {
                    FileOutcome::Cancelled
                } else {
                    self.processor.process_file(path)
                };
                batch.record(path.clone(), outcome);
            }
            return Ok(batch);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let aborting = AtomicBool::new(false);

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    if aborting.load(Ordering::SeqCst) {
                        return FileOutcome::Cancelled;
                    }
                    let outcome = self.processor.process_file(path);
                    if matches!(outcome, FileOutcome::Fatal(_)) {
                        aborting.store(true, Ordering::SeqCst);
                    }
                    outcome
                })
                .collect()
        });

        for (path, outcome) in files.iter().zip(outcomes) {
            batch.record(path.clone(), outcome);
        }

        Ok(batch)
    }
}
