//! Batch processing of uploaded reports.
//!
//! Files are independent, so each one is loaded and parsed on its own rayon task. Results are
//! collected in upload order, which makes the combined dataset identical to a sequential run.
//! A file that cannot be read is reported beside the dataset and does not stop the batch.

use std::path::Path;

use rayon::prelude::*;
use rayon::ThreadPoolBuildError;
use serde::Serialize;
use tracing::warn;

use crate::dataset::Dataset;
use crate::grid::loader::{file_name_of, LoadError};
use crate::parallel::pool::WorkerPool;
use crate::report::{extract_report, extract_report_file, DetectionStrategy, ParsedReport};

/// One uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    pub records: usize,
    pub strategy: DetectionStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub dataset: Dataset,
    pub files: Vec<FileSummary>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn collect(results: Vec<(String, Result<ParsedReport, LoadError>)>) -> Self {
        let mut outcome = Self::default();
        for (file_name, result) in results {
            match result {
                Ok(report) => {
                    outcome.files.push(FileSummary {
                        file_name,
                        records: report.records.len(),
                        strategy: report.layout.strategy,
                    });
                    outcome.dataset.append(report.records);
                }
                Err(err) => {
                    warn!(file = %file_name, error = %err, "report skipped");
                    outcome.failures.push(FileFailure {
                        file_name,
                        message: err.to_string(),
                    });
                }
            }
        }
        outcome
    }
}

pub fn process_uploads(
    uploads: &[Upload],
    pool: &WorkerPool,
) -> Result<BatchOutcome, ThreadPoolBuildError> {
    let results = pool.install(|| {
        uploads
            .par_iter()
            .map(|upload| {
                (
                    upload.file_name.clone(),
                    extract_report(&upload.bytes, &upload.file_name),
                )
            })
            .collect::<Vec<_>>()
    })?;
    Ok(BatchOutcome::collect(results))
}

pub fn process_paths<P>(paths: &[P], pool: &WorkerPool) -> Result<BatchOutcome, ThreadPoolBuildError>
where
    P: AsRef<Path> + Sync,
{
    let results = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                (file_name_of(path), extract_report_file(path))
            })
            .collect::<Vec<_>>()
    })?;
    Ok(BatchOutcome::collect(results))
}
