//! lechamp binary entry point

use clap::Parser;
use lepasserelle::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
