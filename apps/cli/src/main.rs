//! Appendix CLI: append files, file-lists, file-sets, or inline text to a
//! single destination file, optionally through a filter chain.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
