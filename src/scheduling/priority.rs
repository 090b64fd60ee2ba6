use super::{run_non_preemptive, validate, Algorithm, Schedule, ScheduleError, Scheduler};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Static priority, lower value first. Non-preemptive.
#[derive(Debug, Default, Clone, Copy)]
pub struct Priority;

impl Scheduler for Priority {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Priority
    }

    #[instrument(level = "debug", skip(self, queue), fields(queue.len = queue.len()))]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        validate(queue)?;
        Ok(run_non_preemptive(self.algorithm(), queue, |pcb| pcb.priority))
    }
}
