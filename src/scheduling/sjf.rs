use super::{run_non_preemptive, validate, Algorithm, Schedule, ScheduleError, Scheduler};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Shortest-job-first. Non-preemptive: the chosen job runs to completion.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sjf;

impl Scheduler for Sjf {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ShortestJobFirst
    }

    #[instrument(level = "debug", skip(self, queue), fields(queue.len = queue.len()))]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        validate(queue)?;
        // a job is never partially run here, so remaining burst is its full burst
        Ok(run_non_preemptive(self.algorithm(), queue, |pcb| pcb.remaining_burst_time))
    }
}
