use std::io::Write;
use std::path::{Path, PathBuf};

use crate::output::{ReportConfig, ReportFormat};
use crate::utils::prelude::*;

pub mod generate;
pub mod loader;
pub mod output;
pub mod process;
pub mod scheduling;
pub mod utils;

pub use process::ProcessControlBlock;
pub use scheduling::{Algorithm, Schedule, ScheduleError, ScheduleResult, Scheduler};

/// Everything needed for one end-to-end run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub algorithm: Algorithm,
    pub quantum: Option<u64>,
    /// overrides `report.format`
    pub format: Option<ReportFormat>,
    pub trace: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

fn report_config(format: Option<ReportFormat>) -> Result<ReportConfig> {
    let mut cfg: ReportConfig = config().get("report")?;
    if let Some(format) = format {
        cfg.format = format;
    }
    Ok(cfg)
}

/// Load the descriptors, run the selected policy and report to `out`
pub fn run_schedule(opts: &RunOptions, out: impl Write) -> Result<ScheduleResult> {
    let _g = info_span!("run", algorithm = %opts.algorithm).entered();

    let report = report_config(opts.format)?;
    // reject a bad quantum before touching the input
    let scheduler = opts.algorithm.scheduler(opts.quantum)?;

    let mut queue = loader::load_process_control_blocks(&opts.input)?;
    let schedule = scheduler.simulate(&mut queue)?;
    let result = schedule.summary();
    info!(?result, "simulation done");

    {
        let _g = info_span!("output").entered();
        output::render_summary(out, opts.algorithm, &result, &report)?;
        if let Some(path) = &opts.trace {
            output::render_chrome_trace(path, &schedule)?;
        }
        if let Some(path) = &opts.csv {
            output::render_outcomes_csv(path, &schedule)?;
        }
    }

    Ok(result)
}

/// Run every policy on copies of the same input and print a table
pub fn run_compare(input: &Path, quantum: Option<u64>, out: impl Write) -> Result<()> {
    let _g = info_span!("compare").entered();

    let report = report_config(None)?;
    let queue = loader::load_process_control_blocks(input)?;
    let rows = scheduling::compare(&queue, quantum);
    output::render_comparison(out, &rows, report.precision)
}

/// Write a random descriptor file, `count` and `seed` override the config
pub fn run_generate(path: &Path, count: Option<u32>, seed: Option<String>) -> Result<usize> {
    let _g = info_span!("generate").entered();

    let mut cfg: generate::GenerateConfig = config().get("generate")?;
    if let Some(count) = count {
        cfg.count = count;
    }
    if let Some(seed) = seed {
        cfg.seed = seed;
    }

    let queue = generate::generate(&cfg);
    loader::write_process_control_blocks(path, &queue)?;
    info!(path = %path.display(), count = queue.len(), "generated");
    Ok(queue.len())
}
