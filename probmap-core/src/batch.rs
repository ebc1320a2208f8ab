// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use kdam::{Bar, TqdmParallelIterator};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::constant;
use crate::cv;
use crate::error::ProbmapError;
use crate::im::{ColorImage, Palette};
use crate::io;
use crate::ut;

/// Settings shared by every probability map of a run
#[derive(Debug, Clone, PartialEq)]
pub struct ColorizeOptions {
    pub threshold: f64,
    pub palette: Palette,
    pub deletion: bool,
    output_format: String,
}

impl ColorizeOptions {
    /// Threshold with a validated palette, writing png and keeping sources
    pub fn new(threshold: f64, palette: Palette) -> ColorizeOptions {
        ColorizeOptions {
            threshold,
            palette,
            deletion: false,
            output_format: constant::DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    /// Remove each probability map once its color image has been written
    pub fn with_deletion(mut self, deletion: bool) -> ColorizeOptions {
        self.deletion = deletion;
        self
    }

    /// Set the output image format (e.g. png, tif)
    pub fn with_output_format(mut self, format: &str) -> Result<ColorizeOptions, ProbmapError> {
        let format = format.trim_start_matches('.').to_lowercase();

        if !constant::SUPPORTED_OUTPUT_FORMATS.contains(&format.as_str()) {
            return Err(ProbmapError::FormatError(format!(
                "'{}'. Must be one of: {:?}",
                format,
                constant::SUPPORTED_OUTPUT_FORMATS
            )));
        }

        self.output_format = format;
        Ok(self)
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }
}

/// What to do with the rest of a directory once a file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop starting new files after the first failure
    FailFast,
    /// Attempt every file and report all failures
    #[default]
    CollectAll,
}

/// Settings for directory processing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOptions {
    pub policy: FailurePolicy,
    /// Only process files whose name contains this substring
    pub substring: Option<String>,
    /// Size of a dedicated worker pool (the global rayon pool if None)
    pub threads: Option<usize>,
}

/// Outcome of every probability map considered by a run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Source and output paths of converted probability maps
    pub succeeded: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, ProbmapError)>,
    /// Files that were never attempted
    pub skipped: Vec<(PathBuf, ProbmapError)>,
}

impl BatchReport {
    fn push(&mut self, source: PathBuf, result: Result<PathBuf, ProbmapError>) {
        match result {
            Ok(output) => self.succeeded.push((source, output)),
            Err(err @ ProbmapError::Cancelled(_)) => self.skipped.push((source, err)),
            Err(err) => self.failed.push((source, err)),
        }
    }

    /// Number of probability maps considered
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every considered file was converted
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Output paths, or the first error if any file was not converted
    pub fn into_result(self) -> Result<Vec<PathBuf>, ProbmapError> {
        if let Some((_, err)) = self.failed.into_iter().next() {
            return Err(err);
        }

        if let Some((_, err)) = self.skipped.into_iter().next() {
            return Err(err);
        }

        Ok(self
            .succeeded
            .into_iter()
            .map(|(_, output)| output)
            .collect())
    }
}

/// Create a color image from a single probability map without saving it
///
/// The returned image is in RGB order. Use `ColorImage::into_order` to
/// hand it to an encoder expecting BGR pixels.
///
/// # Arguments
///
/// * `path` - Path to a .h5 (or .npz) probability map
/// * `threshold` - Strict lower bound on the winning class probability
/// * `palette` - Below-threshold color and one color per channel
///
/// # Examples
///
/// ```no_run
/// use probmap_core::color_threshold_probabilities;
/// use probmap_core::im::Palette;
///
/// let palette = Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0], vec![0, 255, 0]]).unwrap();
/// let image = color_threshold_probabilities("image_Probabilities.h5", 0.5, &palette).unwrap();
/// ```
pub fn color_threshold_probabilities<P: AsRef<Path>>(
    path: P,
    threshold: f64,
    palette: &Palette,
) -> Result<ColorImage, ProbmapError> {
    let volume = io::read_probabilities(path)?;
    cv::colorize(&volume, threshold, palette)
}

/// Create and save a color image from a single probability map
///
/// The image is written next to the source with the output format as its
/// extension. The source is only deleted after the image has been written.
///
/// # Arguments
///
/// * `path` - Path to a .h5 (or .npz) probability map
/// * `options` - Threshold, palette, deletion and output format
///
/// Returns the path of the written image.
pub fn process_single_file<P: AsRef<Path>>(
    path: P,
    options: &ColorizeOptions,
) -> Result<PathBuf, ProbmapError> {
    let path = path.as_ref();

    let image = color_threshold_probabilities(path, options.threshold, &options.palette)?;

    let output = ut::path::output_path(path, &options.output_format);
    image.save(&output)?;

    if options.deletion {
        std::fs::remove_file(path).map_err(|err| {
            ProbmapError::OtherError(format!(
                "Image saved to {} but {} could not be deleted ({})",
                output.display(),
                path.display(),
                err
            ))
        })?;
    }

    Ok(output)
}

/// Create color images for a probability map or a directory of them
///
/// # Arguments
///
/// * `path` - A .h5 or .npz file, or a directory whose immediate probability maps are processed
/// * `options` - Threshold, palette, deletion and output format
/// * `batch` - Failure policy, file filter and worker count
///
/// # Examples
///
/// ```no_run
/// use probmap_core::{BatchOptions, ColorizeOptions, threshold_probabilities};
/// use probmap_core::im::Palette;
///
/// let palette = Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0], vec![0, 255, 0]]).unwrap();
/// let options = ColorizeOptions::new(0.5, palette).with_deletion(true);
///
/// let report = threshold_probabilities("results/", &options, &BatchOptions::default()).unwrap();
/// for (source, err) in report.failed.iter() {
///     eprintln!("{}\t{}", source.display(), err);
/// }
/// ```
pub fn threshold_probabilities<P: AsRef<Path>>(
    path: P,
    options: &ColorizeOptions,
    batch: &BatchOptions,
) -> Result<BatchReport, ProbmapError> {
    let cancel = AtomicBool::new(false);
    let bar = ut::track::progress_bar(0, "", false);

    threshold_probabilities_with_cancel(path, options, batch, &cancel, bar)
}

/// Same as `threshold_probabilities`, with cancellation and progress tracking
///
/// Files not yet started when `cancel` is raised are reported as skipped.
/// Files already being processed finish writing their image.
pub fn threshold_probabilities_with_cancel<P: AsRef<Path>>(
    path: P,
    options: &ColorizeOptions,
    batch: &BatchOptions,
    cancel: &AtomicBool,
    bar: Bar,
) -> Result<BatchReport, ProbmapError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProbmapError::SourceNotFound(path.display().to_string()));
    }

    let mut report = BatchReport::default();

    if !path.is_dir() {
        let result = if cancel.load(Ordering::SeqCst) {
            Err(ProbmapError::Cancelled("The run was cancelled".to_string()))
        } else {
            process_single_file(path, options)
        };

        report.push(path.to_path_buf(), result);
        return Ok(report);
    }

    let files = ut::path::collect_file_paths(
        path,
        constant::SUPPORTED_PROBABILITY_FORMATS.as_slice(),
        batch.substring.as_deref(),
    )?;

    let stop = AtomicBool::new(false);

    let run = || {
        files
            .into_par_iter()
            .tqdm_with_bar(bar)
            .map(|file| {
                if cancel.load(Ordering::SeqCst) {
                    let err = ProbmapError::Cancelled("The run was cancelled".to_string());
                    return (file, Err(err));
                }

                if stop.load(Ordering::SeqCst) {
                    let err = ProbmapError::Cancelled("An earlier file failed".to_string());
                    return (file, Err(err));
                }

                let result = process_single_file(&file, options);

                if result.is_err() && batch.policy == FailurePolicy::FailFast {
                    stop.store(true, Ordering::SeqCst);
                }

                (file, result)
            })
            .collect::<Vec<(PathBuf, Result<PathBuf, ProbmapError>)>>()
    };

    let outcomes = match batch.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| ProbmapError::OtherError(format!("Failed to start workers ({})", err)))?
            .install(run),
        None => run(),
    };

    for (file, result) in outcomes {
        report.push(file, result);
    }

    Ok(report)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::im::{Color, ProbabilityVolume};

    fn options() -> ColorizeOptions {
        let palette =
            Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0], vec![0, 255, 0]]).unwrap();
        ColorizeOptions::new(0.5, palette)
    }

    fn write_volume(path: &Path, channels: usize) {
        let data: Vec<f32> = (0..4 * channels)
            .map(|i| if i % channels == 0 { 0.9 } else { 0.05 })
            .collect();
        let volume = ProbabilityVolume::new_f32(2, 2, channels, data).unwrap();

        match path.extension().and_then(|s| s.to_str()) {
            Some("npz") => io::write_probabilities_npz(path, &volume).unwrap(),
            _ => io::write_probabilities_h5(path, &volume).unwrap(),
        }
    }

    #[test]
    fn test_output_format_validation() {
        assert_eq!(options().output_format(), "png");
        assert_eq!(
            options().with_output_format(".TIF").unwrap().output_format(),
            "tif"
        );
        assert!(matches!(
            options().with_output_format("npz"),
            Err(ProbmapError::FormatError(_))
        ));
    }

    #[test]
    fn test_color_threshold_probabilities() {
        const TEST_NPZ: &str = "TEST_BATCH_COLOR_THRESHOLD.npz";

        let volume =
            ProbabilityVolume::new_f64(2, 2, 2, vec![0.9, 0.1, 0.4, 0.3, 0.2, 0.8, 0.5, 0.5])
                .unwrap();
        io::write_probabilities_npz(TEST_NPZ, &volume).unwrap();

        let image = color_threshold_probabilities(TEST_NPZ, 0.5, &options().palette).unwrap();

        assert_eq!(image.pixel(0, 0), Some(Color([255, 0, 0])));
        assert_eq!(image.pixel(1, 0), Some(Color([0, 0, 0])));
        assert_eq!(image.pixel(0, 1), Some(Color([0, 255, 0])));
        assert_eq!(image.pixel(1, 1), Some(Color([0, 0, 0])));

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_process_single_file_keeps_source() {
        const TEST_NPZ: &str = "TEST_BATCH_SINGLE_KEEP.npz";

        write_volume(Path::new(TEST_NPZ), 2);

        let output = process_single_file(TEST_NPZ, &options()).unwrap();

        assert_eq!(output, PathBuf::from("TEST_BATCH_SINGLE_KEEP.png"));
        assert!(output.exists());
        assert!(Path::new(TEST_NPZ).exists());

        let image = image::open(&output).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);

        std::fs::remove_file(TEST_NPZ).unwrap();
        std::fs::remove_file(output).unwrap();
    }

    #[test]
    fn test_process_single_file_deletes_on_success() {
        const TEST_NPZ: &str = "TEST_BATCH_SINGLE_DELETE.npz";

        write_volume(Path::new(TEST_NPZ), 2);

        let output = process_single_file(TEST_NPZ, &options().with_deletion(true)).unwrap();

        assert!(output.exists());
        assert!(!Path::new(TEST_NPZ).exists());

        std::fs::remove_file(output).unwrap();
    }

    #[test]
    fn test_process_single_file_keeps_source_on_failure() {
        const TEST_NPZ: &str = "TEST_BATCH_SINGLE_FAILURE.npz";

        write_volume(Path::new(TEST_NPZ), 3);

        let err = process_single_file(TEST_NPZ, &options().with_deletion(true)).unwrap_err();

        assert!(err.is_schema_mismatch());
        assert!(err.to_string().contains("Expected 3, got 2"));
        assert!(Path::new(TEST_NPZ).exists());
        assert!(!Path::new("TEST_BATCH_SINGLE_FAILURE.png").exists());

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_missing_source() {
        let err = threshold_probabilities(
            "TEST_BATCH_DOES_NOT_EXIST.npz",
            &options(),
            &BatchOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ProbmapError::SourceNotFound(_)));
    }

    #[test]
    fn test_directory_collect_all() {
        const TEST_DIR: &str = "TEST_BATCH_COLLECT_ALL";

        let base = Path::new(TEST_DIR);
        std::fs::create_dir_all(base.join("nested")).unwrap();

        write_volume(&base.join("a.h5"), 3);
        write_volume(&base.join("b.h5"), 2);
        write_volume(&base.join("c.npz"), 2);
        write_volume(&base.join("nested").join("d.h5"), 2);
        std::fs::write(base.join("notes.txt"), b"").unwrap();

        let report = threshold_probabilities(
            base,
            &options().with_deletion(true),
            &BatchOptions::default(),
        )
        .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, base.join("a.h5"));
        assert!(!report.is_success());

        assert!(base.join("a.h5").exists());
        assert!(!base.join("a.png").exists());
        assert!(!base.join("b.h5").exists());
        assert!(!base.join("c.npz").exists());
        assert!(base.join("b.png").exists());
        assert!(base.join("c.png").exists());
        assert!(base.join("nested").join("d.h5").exists());
        assert!(!base.join("nested").join("d.png").exists());

        assert!(report.into_result().unwrap_err().is_schema_mismatch());

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_directory_fail_fast() {
        const TEST_DIR: &str = "TEST_BATCH_FAIL_FAST";

        let base = Path::new(TEST_DIR);
        std::fs::create_dir_all(base).unwrap();

        write_volume(&base.join("a.h5"), 3);
        write_volume(&base.join("b.h5"), 2);
        write_volume(&base.join("c.h5"), 2);

        let batch = BatchOptions {
            policy: FailurePolicy::FailFast,
            threads: Some(1),
            ..Default::default()
        };

        let report = threshold_probabilities(base, &options(), &batch).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.succeeded.is_empty());
        assert!(!base.join("b.png").exists());

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_directory_cancelled() {
        const TEST_DIR: &str = "TEST_BATCH_CANCELLED";

        let base = Path::new(TEST_DIR);
        std::fs::create_dir_all(base).unwrap();

        write_volume(&base.join("a.h5"), 2);
        write_volume(&base.join("b.h5"), 2);

        let cancel = AtomicBool::new(true);
        let bar = ut::track::progress_bar(2, "", false);

        let report = threshold_probabilities_with_cancel(
            base,
            &options().with_deletion(true),
            &BatchOptions::default(),
            &cancel,
            bar,
        )
        .unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert!(base.join("a.h5").exists());
        assert!(!base.join("a.png").exists());

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_substring_filter() {
        const TEST_DIR: &str = "TEST_BATCH_SUBSTRING";

        let base = Path::new(TEST_DIR);
        std::fs::create_dir_all(base).unwrap();

        write_volume(&base.join("a_Probabilities.h5"), 2);
        write_volume(&base.join("b_Uncertainty.h5"), 2);

        let batch = BatchOptions {
            substring: Some("_Probabilities".to_string()),
            ..Default::default()
        };

        let report = threshold_probabilities(base, &options(), &batch).unwrap();
        let outputs = report.into_result().unwrap();

        assert_eq!(outputs, vec![base.join("a_Probabilities.png")]);

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_process_single_file_h5() {
        const TEST_H5: &str = "TEST_BATCH_SINGLE_H5.h5";

        write_volume(Path::new(TEST_H5), 2);

        let output = process_single_file(TEST_H5, &options()).unwrap();

        assert_eq!(output, PathBuf::from("TEST_BATCH_SINGLE_H5.png"));
        let image = image::open(&output).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0]);

        std::fs::remove_file(TEST_H5).unwrap();
        std::fs::remove_file(output).unwrap();
    }

    #[test]
    fn test_encode_failure_keeps_source() {
        const TEST_DIR: &str = "TEST_BATCH_ENCODE_FAILURE";

        let base = Path::new(TEST_DIR);
        std::fs::create_dir_all(base.join("map.png")).unwrap();

        let source = base.join("map.npz");
        write_volume(&source, 2);

        let err = process_single_file(&source, &options().with_deletion(true)).unwrap_err();

        assert!(matches!(err, ProbmapError::EncodeFailure(_)));
        assert!(source.exists());
        assert!(base.join("map.png").is_dir());
        assert!(!base.join("map.png.partial").exists());

        std::fs::remove_dir_all(base).unwrap();
    }
}
