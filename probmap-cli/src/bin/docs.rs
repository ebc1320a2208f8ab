#![allow(clippy::all)]
use clap::{Parser, Subcommand};
use clap_markdown;

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
    clap_markdown::print_help_markdown::<Cli>();
}
