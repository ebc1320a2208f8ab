// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use clap::{Args, Subcommand};

mod locate;
mod palette;

use locate::{LocateArgs, utils_locate};
use palette::{PaletteArgs, utils_palette};

#[derive(Debug, Args)]
#[command(about = "Utilities for locating probability maps and writing palettes.")]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
#[command(flatten_help = true)]
pub struct UtilsArgs {
    #[command(subcommand)]
    command: Option<UtilsCommands>,
}

#[derive(Debug, Subcommand)]
enum UtilsCommands {
    Locate(LocateArgs),
    Palette(PaletteArgs),
}

pub fn utils(args: &UtilsArgs) {
    match args.command.as_ref() {
        Some(UtilsCommands::Locate(locate_args)) => utils_locate(locate_args),
        Some(UtilsCommands::Palette(palette_args)) => utils_palette(palette_args),
        None => {}
    }
}
