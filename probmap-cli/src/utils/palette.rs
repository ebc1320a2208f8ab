// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use clap::Args;

use probmap_core::config::PaletteConfig;
use probmap_core::im::Palette;
use probmap_core::ut;

use crate::colorize::resolve_palette;

#[derive(Debug, Args)]
#[command(about = "Validate colors and write them to a reusable JSON palette.")]
pub struct PaletteArgs {
    #[arg(short = 'o', long, help = "Output palette file (.json).", required = true)]
    pub output: Option<String>,

    #[arg(
        short = 't',
        long,
        allow_negative_numbers = true,
        help = "Threshold stored alongside the colors."
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

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

/// Convert a validated palette back into its file representation
fn to_config(threshold: Option<f64>, palette: &Palette) -> PaletteConfig {
    let components = |color: [u8; 3]| color.iter().map(|&c| c as i64).collect::<Vec<i64>>();

    PaletteConfig {
        threshold,
        below_threshold_color: components(palette.below_threshold().0),
        channel_colors: palette
            .channels()
            .iter()
            .map(|color| components(color.0))
            .collect(),
    }
}

pub fn utils_palette(args: &PaletteArgs) {
    let output = args.output.to_owned().unwrap_or_default();

    if !output.to_lowercase().ends_with(".json") {
        eprintln!("[probmap::utils::palette] ERROR: Output palette must be a .json file.");
        std::process::exit(1);
    }

    if args.threshold.is_some_and(|t| t.is_nan()) {
        eprintln!("[probmap::utils::palette] ERROR: Threshold must be a number.");
        std::process::exit(1);
    }

    let (_, palette) = resolve_palette(None, args.below_color.as_deref(), &args.colors)
        .unwrap_or_else(|err| {
            eprintln!("[probmap::utils::palette] ERROR: {}", err);
            std::process::exit(1);
        });

    let config = to_config(args.threshold, &palette);

    let json = serde_json::to_string_pretty(&config).unwrap_or_else(|err| {
        eprintln!("[probmap::utils::palette] ERROR: {}", err);
        std::process::exit(1);
    });

    std::fs::write(&output, json).unwrap_or_else(|err| {
        eprintln!(
            "[probmap::utils::palette] ERROR: Failed to write {} ({}).",
            output, err
        );
        std::process::exit(1);
    });

    ut::track::progress_log(
        &format!("Palette with {} channels written to {}.", palette.len(), output),
        args.verbose,
    );
}

#[cfg(test)]
mod test {

    use super::*;
    use probmap_core::im::Color;

    #[test]
    fn test_to_config_round_trips_through_palette() {
        let palette = Palette::new(Color([1, 2, 3]), vec![Color([255, 0, 0])]).unwrap();
        let config = to_config(Some(0.4), &palette);

        assert_eq!(config.below_threshold_color, vec![1, 2, 3]);
        assert_eq!(config.channel_colors, vec![vec![255, 0, 0]]);
        assert_eq!(config.into_palette().unwrap(), palette);
    }
}
