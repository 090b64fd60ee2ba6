use super::clock::VirtualClock;
use super::lifecycle::{Bookkeeper, WaitingTime};
use super::{next_arrival, validate, Algorithm, Schedule, ScheduleError, Scheduler};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Round-robin with a fixed quantum.
///
/// Each sweep visits the queue in collection order and gives every arrived,
/// unfinished process up to `quantum` time units. Waiting time is measured
/// until the first dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    pub quantum: u64,
}

impl RoundRobin {
    pub fn new(quantum: u64) -> Result<Self, ScheduleError> {
        if quantum == 0 {
            return Err(ScheduleError::ZeroQuantum);
        }
        Ok(Self { quantum })
    }
}

impl Scheduler for RoundRobin {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RoundRobin
    }

    #[instrument(level = "debug", skip(self, queue), fields(queue.len = queue.len(), quantum = self.quantum))]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        validate(queue)?;
        if self.quantum == 0 {
            return Err(ScheduleError::ZeroQuantum);
        }

        let mut clock = VirtualClock::new();
        let mut book = Bookkeeper::new(queue, WaitingTime::UntilFirstDispatch);
        while !book.all_finished() {
            let mut dispatched = false;
            for (idx, pcb) in queue.iter_mut().enumerate() {
                if !pcb.is_ready(clock.now()) {
                    continue;
                }
                dispatched = true;

                book.dispatch(idx, pcb, clock.now());
                clock.run_for(pcb, self.quantum);
                if pcb.is_finished() {
                    book.finish(idx, pcb, clock.now());
                } else {
                    book.preempt(idx);
                }
            }

            if !dispatched {
                match next_arrival(queue) {
                    Some(time) => {
                        debug!(from = clock.now(), to = time, "cpu idle");
                        clock.idle_until(time);
                    }
                    None => break,
                }
            }
        }

        Ok(book.into_schedule(self.algorithm(), clock))
    }
}
