use std::io;
use std::path::PathBuf;

use itertools::Itertools;
use structopt::StructOpt;

use schedsim::output::ReportFormat;
use schedsim::utils::prelude::*;
use schedsim::{Algorithm, RunOptions};

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

fn parse_algorithm(s: &str) -> std::result::Result<Algorithm, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown scheduling algorithm '{}', valid options: {}",
            s,
            Algorithm::ALL.iter().join(", ")
        )
    })
}

/// Simulate one scheduling policy over a descriptor file
#[derive(StructOpt)]
pub struct Run {
    /// Binary process descriptor file
    #[structopt(parse(from_os_str))]
    pcb_file: PathBuf,
    /// One of FCFS, SJF, P, RR, SRT
    #[structopt(parse(try_from_str = parse_algorithm))]
    algorithm: Algorithm,
    /// Time quantum, required by RR
    quantum: Option<u64>,
    /// Output format, text, json or yaml
    #[structopt(short, long)]
    format: Option<ReportFormat>,
    /// Write a Chrome trace of the CPU timeline
    #[structopt(long, value_name = "FILE", parse(from_os_str))]
    trace: Option<PathBuf>,
    /// Write per-process outcomes as CSV
    #[structopt(long, value_name = "FILE", parse(from_os_str))]
    csv: Option<PathBuf>,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        let opts = RunOptions {
            input: self.pcb_file,
            algorithm: self.algorithm,
            quantum: self.quantum,
            format: self.format,
            trace: self.trace,
            csv: self.csv,
        };
        let stdout = io::stdout();
        schedsim::run_schedule(&opts, stdout.lock())?;
        Ok(())
    }
}

/// Run every policy over copies of the same descriptors
#[derive(StructOpt)]
pub struct Compare {
    /// Binary process descriptor file
    #[structopt(parse(from_os_str))]
    pcb_file: PathBuf,
    /// Time quantum for RR, RR is skipped without it
    #[structopt(short, long)]
    quantum: Option<u64>,
}

impl Cmd for Compare {
    fn run(self) -> Result<()> {
        let stdout = io::stdout();
        schedsim::run_compare(&self.pcb_file, self.quantum, stdout.lock())
    }
}

/// Write a random descriptor file
#[derive(StructOpt)]
pub struct Generate {
    #[structopt(parse(from_os_str))]
    output: PathBuf,
    /// Number of processes, defaults to `generate.count`
    #[structopt(short = "n", long)]
    count: Option<u32>,
    /// Seed, defaults to `generate.seed`
    #[structopt(short, long)]
    seed: Option<String>,
}

impl Cmd for Generate {
    fn run(self) -> Result<()> {
        let count = schedsim::run_generate(&self.output, self.count, self.seed)?;
        println!("Wrote {} processes to {}", count, self.output.display());
        Ok(())
    }
}

/// Show the configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let config: serde_yaml::Value = config().fetch()?;
        print!("{}", serde_yaml::to_string(&config)?);
        Ok(())
    }
}
