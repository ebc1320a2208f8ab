// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use clap::Args;

use probmap_core::constant;
use probmap_core::ut;

#[derive(Debug, Args)]
#[command(about = "List probability maps that a colorize run would process.")]
pub struct LocateArgs {
    #[arg(short = 'i', long, help = "Directory of probability maps.", required = true)]
    pub input: Option<String>,

    #[arg(long, help = "Only list files containing this substring (e.g. _Probabilities).")]
    pub substring: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn utils_locate(args: &LocateArgs) {
    let input = PathBuf::from(args.input.to_owned().unwrap_or_default());

    if !input.is_dir() {
        eprintln!(
            "[probmap::utils::locate] ERROR: Input {} must be an existing directory.",
            input.display()
        );
        std::process::exit(1);
    }

    let files = ut::path::collect_file_paths(
        &input,
        constant::SUPPORTED_PROBABILITY_FORMATS.as_slice(),
        args.substring.as_deref(),
    )
    .unwrap_or_else(|err| {
        eprintln!("[probmap::utils::locate] ERROR: {}", err);
        std::process::exit(1);
    });

    ut::track::progress_log(
        &format!(
            "Located {} probability maps.",
            ut::track::thousands_format(files.len())
        ),
        args.verbose,
    );

    for file in files.iter() {
        println!("{}", file.display());
    }
}
