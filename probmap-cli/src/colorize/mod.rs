// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use clap::Args;

use probmap_core::config::{self, PaletteConfig};
use probmap_core::constant;
use probmap_core::error::ProbmapError;
use probmap_core::im::{Color, Palette};
use probmap_core::ut;
use probmap_core::{BatchOptions, ColorizeOptions, FailurePolicy};

mod run;

use run::{run_all, write_report};

#[derive(Debug, Args)]
#[command(about = "Threshold probability maps into color-coded label images.")]
pub struct ColorizeArgs {
    #[arg(
        short = 'i',
        long,
        help = "Probability map (.h5 or .npz) or directory of probability maps.",
        required = true
    )]
    pub input: Option<String>,

    #[arg(
        short = 't',
        long,
        allow_negative_numbers = true,
        help = "A pixel takes its class color only if the class probability is greater than this value."
    )]
    pub threshold: Option<f64>,

    #[arg(
        short = 'b',
        long,
        help = "Color (r,g,b) of pixels without a class above threshold [default: 0,0,0]."
    )]
    pub below_color: Option<String>,

    #[arg(
        short = 'c',
        long = "color",
        help = "Color (r,g,b) of a class channel. Repeat once per channel, in channel order."
    )]
    pub colors: Vec<String>,

    #[arg(
        short = 'p',
        long,
        help = "JSON palette with threshold, below_threshold_color and channel_colors."
    )]
    pub palette: Option<String>,

    #[arg(
        short = 'f',
        long,
        help = "Format to save color images (e.g. png, tif, bmp).",
        default_value = "png"
    )]
    pub format: Option<String>,

    #[arg(long, help = "Only process files containing this substring (e.g. _Probabilities).")]
    pub substring: Option<String>,

    #[arg(short = 'd', long, help = "Delete each probability map after its image is saved.")]
    pub delete: bool,

    #[arg(long, help = "Stop processing a directory after the first failure.")]
    pub fail_fast: bool,

    #[arg(short = 'r', long, help = "Write a JSON summary of the run to this file.")]
    pub report: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(short = 'n', long, help = "Number of threads.")]
    pub threads: Option<usize>,
}

/// Merge a palette file with colors given on the command line
///
/// Colors given as arguments take precedence over the file.
pub(crate) fn resolve_palette(
    palette: Option<&str>,
    below_color: Option<&str>,
    colors: &[String],
) -> Result<(Option<f64>, Palette), ProbmapError> {
    let config = match palette {
        Some(path) => PaletteConfig::open(path)?,
        None => PaletteConfig::default(),
    };

    let below = match below_color {
        Some(color) => color.parse::<Color>()?,
        None if config.below_threshold_color.is_empty() => Color::default(),
        None => Color::from_components("below_threshold_color", &config.below_threshold_color)?,
    };

    let channels = if colors.is_empty() {
        config
            .channel_colors
            .iter()
            .enumerate()
            .map(|(idx, color)| {
                Color::from_components(&format!("channel_colors[{}]", idx), color)
            })
            .collect::<Result<Vec<Color>, ProbmapError>>()?
    } else {
        colors
            .iter()
            .map(|color| color.parse::<Color>())
            .collect::<Result<Vec<Color>, ProbmapError>>()?
    };

    Ok((config.threshold, Palette::new(below, channels)?))
}

pub fn colorize(args: &ColorizeArgs) {
    let (threshold, palette) = resolve_palette(
        args.palette.as_deref(),
        args.below_color.as_deref(),
        &args.colors,
    )
    .unwrap_or_else(|err| {
        eprintln!("[probmap::colorize] ERROR: {}", err);
        std::process::exit(1);
    });

    let threshold = args.threshold.or(threshold).unwrap_or_else(|| {
        eprintln!(
            "[probmap::colorize] ERROR: A threshold must be provided with --threshold (-t) or in the palette file."
        );
        std::process::exit(1);
    });

    if threshold.is_nan() {
        eprintln!("[probmap::colorize] ERROR: Threshold must be a number.");
        std::process::exit(1);
    }

    let format = args
        .format
        .to_owned()
        .unwrap_or(constant::DEFAULT_OUTPUT_FORMAT.to_string());

    let options = ColorizeOptions::new(threshold, palette)
        .with_deletion(args.delete)
        .with_output_format(&format)
        .unwrap_or_else(|err| {
            eprintln!("[probmap::colorize] ERROR: {}", err);
            std::process::exit(1);
        });

    let threads = config::resolve_threads(args.threads).unwrap_or_else(|err| {
        eprintln!("[probmap::colorize] ERROR: {}", err);
        std::process::exit(1);
    });

    let input = PathBuf::from(args.input.to_owned().unwrap_or_default());

    if !input.exists() {
        eprintln!(
            "[probmap::colorize] ERROR: {}",
            ProbmapError::SourceNotFound(input.display().to_string())
        );
        std::process::exit(1);
    }

    let n_files = count_inputs(&input, args.substring.as_deref());

    if n_files == 0 {
        eprintln!(
            "[probmap::colorize] ERROR: No probability maps were detected. Please check your path and/or substring identifier."
        );
        std::process::exit(1);
    }

    ut::track::progress_log(
        &format!(
            "Detected {} probability maps with {} channels.",
            ut::track::thousands_format(n_files),
            options.palette.len()
        ),
        args.verbose,
    );

    let batch = BatchOptions {
        policy: if args.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::CollectAll
        },
        substring: args.substring.to_owned(),
        threads: Some(threads),
    };

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|err| {
        eprintln!("[probmap::colorize] ERROR: Could not start runtime. {}", err);
        std::process::exit(1);
    });

    let report = rt
        .block_on(run_all(input, options, batch, n_files, args.verbose))
        .unwrap_or_else(|err| {
            eprintln!("[probmap::colorize] ERROR: {}", err);
            std::process::exit(1);
        });

    if args.verbose {
        println!();
    }

    for (source, err) in report.failed.iter() {
        eprintln!(
            "[probmap::colorize] ERROR: {}\t{}",
            source.display(),
            err
        );
    }

    let message = if report.is_success() {
        format!(
            "Complete. {} color images saved.",
            ut::track::thousands_format(report.succeeded.len())
        )
    } else {
        format!(
            "Complete. {} color images saved. {} failed. {} skipped.",
            ut::track::thousands_format(report.succeeded.len()),
            ut::track::thousands_format(report.failed.len()),
            ut::track::thousands_format(report.skipped.len())
        )
    };

    ut::track::progress_log(&message, args.verbose);

    if let Some(path) = args.report.as_deref() {
        write_report(Path::new(path), threshold, &report).unwrap_or_else(|err| {
            eprintln!("[probmap::colorize] ERROR: {}", err);
            std::process::exit(1);
        });
    }

    if !report.is_success() {
        std::process::exit(1);
    }
}

/// Number of probability maps a run will consider
fn count_inputs(input: &Path, substring: Option<&str>) -> usize {
    if !input.is_dir() {
        return 1;
    }

    ut::path::collect_file_paths(
        input,
        constant::SUPPORTED_PROBABILITY_FORMATS.as_slice(),
        substring,
    )
    .map(|files| files.len())
    .unwrap_or_else(|err| {
        eprintln!("[probmap::colorize] ERROR: {}", err);
        std::process::exit(1);
    })
}
