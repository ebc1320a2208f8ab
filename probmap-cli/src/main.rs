// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use clap::{Parser, Subcommand};
use probmap_cli::{colorize, utils};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Colorize(colorize::ColorizeArgs),
    Utils(utils::UtilsArgs),
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Colorize(colorize_args)) => colorize::colorize(colorize_args),
        Some(Commands::Utils(utils_args)) => utils::utils(utils_args),
        None => {}
    }
}
