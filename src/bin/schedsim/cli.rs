use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::commands::{self, Cmd};
use schedsim::utils::Result;

#[derive(StructOpt)]
#[structopt(settings = &[AppSettings::ArgRequiredElseHelp, AppSettings::VersionlessSubcommands])]
pub struct Cli {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE", parse(from_os_str))]
    pub config: Option<PathBuf>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    Run(commands::Run),
    Compare(commands::Compare),
    Generate(commands::Generate),
    Config(commands::Config),
}

impl Cli {
    /// Match commands
    pub fn execute(self) -> Result<()> {
        match self.command {
            Command::Run(cmd) => cmd.run(),
            Command::Compare(cmd) => cmd.run(),
            Command::Generate(cmd) => cmd.run(),
            Command::Config(cmd) => cmd.run(),
        }
    }
}
