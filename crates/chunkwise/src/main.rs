//! `chunkwise`: split large files into verified chunks, fetch them back over
//! HTTP and reassemble them.

use anyhow::Result;
use clap::Parser;

mod cli;
mod cmd;
mod config;
mod logging;
mod progress;
mod size;

use cli::{App, Commands};
use config::Config;

fn main() -> Result<()> {
    let app = App::parse();
    logging::init(app.quiet, app.verbose);
    let config = Config::resolve(app.config.as_deref())?;

    match app.cmd {
        Commands::Split(arg) => cmd::split(arg, &config),
        Commands::Fetch(arg) => cmd::fetch(arg, &config, app.quiet),
        Commands::Reassemble(arg) => cmd::reassemble(arg, &config),
        Commands::Verify(arg) => cmd::verify(arg),
        Commands::Digest(arg) => cmd::digest(arg),
    }
}
