use structopt::StructOpt;

use schedsim::utils;
use schedsim::utils::logging::prelude::*;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    let cli = cli::Cli::from_args();

    // basic logging first, then reconfigure it from the loaded Configuration
    let mut logging = utils::logging::setup()?;
    utils::app_config::init(cli.config.as_deref())?;
    logging.reconfigure()?;

    trace!("Start cli execution");

    cli.execute()?;
    Ok(())
}
