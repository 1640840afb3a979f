#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays scripted build orders against an isometric city.

mod config;
mod report;
mod session;
mod templates;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::{
    session::{BuildOrder, Session},
    templates::TemplateDirectory,
};

/// Builds roads and zones on an isometric tile grid from the command line.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// World configuration file; defaults apply when it does not exist.
    #[arg(long, value_name = "PATH", default_value = "isocity.toml")]
    config: PathBuf,

    /// Directory holding one `<key>.toml` template per structure.
    #[arg(long, value_name = "DIR", default_value = "assets/templates")]
    templates: PathBuf,

    /// Override the grid edge length in tiles.
    #[arg(long)]
    grid_size: Option<u32>,

    /// Override the starting balance.
    #[arg(long)]
    funds: Option<i64>,

    /// Build order `KIND@X,Y` or a drag `KIND@X,Y:X,Y`; may be repeated.
    #[arg(long = "build", value_name = "ORDER")]
    orders: Vec<BuildOrder>,

    /// Print an ASCII map of the built area.
    #[arg(long)]
    map: bool,
}

/// Entry point for the Isocity command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = config::load(&cli.config)?;
    if let Some(grid_size) = cli.grid_size {
        anyhow::ensure!(grid_size > 0, "--grid-size must be positive");
        config.grid_size = grid_size;
    }
    if let Some(funds) = cli.funds {
        config.starting_funds = funds;
    }

    let mut session = Session::new(config, TemplateDirectory::new(&cli.templates));
    for order in &cli.orders {
        session.run(order)?;
    }
    info!("replayed {} build orders", cli.orders.len());

    print!("{}", report::summary(session.world(), session.tally()));
    if cli.map {
        match report::map(session.world()) {
            Some(map) => print!("{map}"),
            None => println!("map: nothing built"),
        }
    }
    Ok(())
}
