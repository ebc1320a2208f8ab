// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use crate::error::ProbmapError;

/// Collect file paths from a directory with an optional substring filter
///
/// Only immediate entries are considered. Subdirectories and files whose
/// extension is not one of `valid_ext` are ignored.
///
/// # Arguments
///
/// * `directory` - Path to directory containing files
/// * `valid_ext` - Extensions (without the leading dot) to keep
/// * `substring` - Only include files containing this substring
///
/// # Examples
///
/// ```no_run
/// use probmap_core::ut::path::collect_file_paths;
/// use probmap_core::constant::SUPPORTED_PROBABILITY_FORMATS;
/// let files = collect_file_paths("directory/", SUPPORTED_PROBABILITY_FORMATS.as_slice(), None);
/// ```
pub fn collect_file_paths<P: AsRef<Path>>(
    directory: P,
    valid_ext: &[&str],
    substring: Option<&str>,
) -> Result<Vec<PathBuf>, ProbmapError> {
    let directory = directory.as_ref();

    let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|err| ProbmapError::DirError(format!("{} ({})", directory.display(), err)))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| valid_ext.contains(&ext))
        })
        .collect();

    if let Some(substring) = substring {
        files.retain(|f| {
            f.file_name()
                .map(|name| name.to_string_lossy().contains(substring))
                .unwrap_or(false)
        });
    }

    files.sort_unstable();

    Ok(files)
}

/// Path of the color image written for a probability map
///
/// # Arguments
///
/// * `source` - Path to a probability map
/// * `format` - Output image extension (e.g. png)
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use probmap_core::ut::path::output_path;
///
/// assert_eq!(
///     output_path(Path::new("results/image_Probabilities.npz"), "png"),
///     PathBuf::from("results/image_Probabilities.png")
/// );
/// ```
pub fn output_path(source: &Path, format: &str) -> PathBuf {
    source.with_extension(format)
}
