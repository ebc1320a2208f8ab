// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use probmap_core::error::ProbmapError;
use probmap_core::ut;
use probmap_core::{BatchOptions, BatchReport, ColorizeOptions};

/// Run a batch on a blocking worker, raising the cancel flag on Ctrl-C
///
/// Files already being processed finish writing their images. Files that
/// had not started are reported as skipped.
pub async fn run_all(
    input: PathBuf,
    options: ColorizeOptions,
    batch: BatchOptions,
    n_files: usize,
    verbose: bool,
) -> Result<BatchReport, ProbmapError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_worker = cancel.clone();

    let mut handle = tokio::task::spawn_blocking(move || {
        let pb = ut::track::progress_bar(n_files, "Thresholding", verbose);
        probmap_core::threshold_probabilities_with_cancel(
            &input,
            &options,
            &batch,
            &cancel_worker,
            pb,
        )
    });

    let joined = tokio::select! {
        joined = &mut handle => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            cancel.store(true, Ordering::SeqCst);
            eprintln!(
                "[probmap::colorize] Cancelling. Waiting for images in progress to be saved."
            );
            handle.await
        }
    };

    joined.unwrap_or_else(|err| {
        Err(ProbmapError::OtherError(format!(
            "Failed to threshold probability maps ({})",
            err
        )))
    })
}

#[derive(Debug, Serialize)]
struct FailureRecord {
    source: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    threshold: f64,
    converted: Vec<(String, String)>,
    failed: Vec<FailureRecord>,
    skipped: Vec<FailureRecord>,
}

fn records(entries: &[(PathBuf, ProbmapError)]) -> Vec<FailureRecord> {
    entries
        .iter()
        .map(|(source, err)| FailureRecord {
            source: source.display().to_string(),
            error: err.to_string(),
        })
        .collect()
}

/// Write a JSON summary of converted, failed and skipped probability maps
pub fn write_report(path: &Path, threshold: f64, report: &BatchReport) -> Result<(), ProbmapError> {
    let summary = RunSummary {
        threshold,
        converted: report
            .succeeded
            .iter()
            .map(|(source, output)| (source.display().to_string(), output.display().to_string()))
            .collect(),
        failed: records(&report.failed),
        skipped: records(&report.skipped),
    };

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|err| ProbmapError::OtherError(format!("Failed to serialize report ({})", err)))?;

    std::fs::write(path, json).map_err(|err| {
        ProbmapError::OtherError(format!(
            "Failed to write report to {} ({})",
            path.display(),
            err
        ))
    })
}
