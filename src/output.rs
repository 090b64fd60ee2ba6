use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::scheduling::{Algorithm, Schedule, ScheduleError, ScheduleResult};
use crate::utils::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromStr, Serialize, Deserialize)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
    Yaml,
}

/// The `report` config section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// digits after the decimal point in text output
    pub precision: usize,
}

#[derive(Serialize)]
struct Summary<'a> {
    algorithm: String,
    #[serde(flatten)]
    result: &'a ScheduleResult,
}

/// Print the aggregate statistics of one run
pub fn render_summary(
    mut writer: impl Write,
    algorithm: Algorithm,
    result: &ScheduleResult,
    cfg: &ReportConfig,
) -> Result<()> {
    match cfg.format {
        ReportFormat::Text => {
            let p = cfg.precision;
            writeln!(writer, "Algorithm: {}", algorithm)?;
            writeln!(writer, "Average Waiting Time: {:.*}", p, result.average_waiting_time)?;
            writeln!(writer, "Average Turnaround Time: {:.*}", p, result.average_turnaround_time)?;
            writeln!(writer, "Total Clock Time: {}", result.total_run_time)?;
        }
        ReportFormat::Json => {
            let summary = Summary {
                algorithm: algorithm.to_string(),
                result,
            };
            serde_json::to_writer_pretty(&mut writer, &summary)?;
            writeln!(writer)?;
        }
        ReportFormat::Yaml => {
            let summary = Summary {
                algorithm: algorithm.to_string(),
                result,
            };
            serde_yaml::to_writer(&mut writer, &summary)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Print one row per policy, failed runs included
pub fn render_comparison<'a, I>(mut writer: impl Write, rows: I, precision: usize) -> Result<()>
where
    I: IntoIterator<Item = &'a (Algorithm, std::result::Result<Schedule, ScheduleError>)>,
{
    writeln!(
        writer,
        "{:<10}{:>16}{:>16}{:>12}",
        "Algorithm", "Avg Waiting", "Avg Turnaround", "Total Clock"
    )?;
    for (algorithm, res) in rows {
        match res {
            Ok(schedule) => {
                let result = schedule.summary();
                writeln!(
                    writer,
                    "{:<10}{:>16.*}{:>16.*}{:>12}",
                    algorithm.to_string(),
                    precision,
                    result.average_waiting_time,
                    precision,
                    result.average_turnaround_time,
                    result.total_run_time
                )?;
            }
            Err(e) => writeln!(writer, "{:<10}failed: {}", algorithm.to_string(), e)?,
        }
    }
    Ok(())
}

/// One CSV row per process, in completion order
pub fn render_outcomes_csv(path: impl AsRef<Path>, schedule: &Schedule) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for outcome in &schedule.outcomes {
        writer.serialize(outcome)?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), rows = schedule.outcomes.len(), "wrote outcomes");
    Ok(())
}

/// Chrome trace (chrome://tracing, Perfetto) of the CPU timeline.
///
/// Every process gets its own track; one tick is rendered as one microsecond.
pub fn render_chrome_trace(path: impl AsRef<Path>, schedule: &Schedule) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    write_chrome_trace(file, schedule)?;
    info!(path = %path.as_ref().display(), slices = schedule.timeline.len(), "wrote chrome trace");
    Ok(())
}

fn write_chrome_trace(mut writer: impl io::Write, schedule: &Schedule) -> Result<()> {
    let mut events = vec![json!({
        "name": "process_name",
        "ph": "M",
        "pid": 0,
        "args": { "name": format!("CPU ({})", schedule.algorithm) },
    })];

    for outcome in &schedule.outcomes {
        events.push(json!({
            "name": "thread_name",
            "ph": "M",
            "pid": 0,
            "tid": outcome.pid,
            "args": { "name": format!("P{}", outcome.pid) },
        }));
        events.push(json!({
            "name": format!("P{} arrives", outcome.pid),
            "ph": "i",
            "s": "t",
            "cat": "arrival",
            "ts": outcome.arrival,
            "pid": 0,
            "tid": outcome.pid,
        }));
    }

    for slice in &schedule.timeline {
        events.push(json!({
            "name": format!("P{}", slice.pid),
            "ph": "X",
            "cat": "cpu",
            "ts": slice.start,
            "dur": slice.duration(),
            "pid": 0,
            "tid": slice.pid,
        }));
    }

    serde_json::to_writer(&mut writer, &json!({ "traceEvents": events }))?;
    writer.flush()?;
    Ok(())
}
