//! The scheduling-policy engine.
//!
//! Each policy owns its own simulation loop over a `&mut [ProcessControlBlock]`
//! and drives a [`VirtualClock`]. Policies mutate the descriptors in place
//! (ordering, remaining burst, `started`), so run each one on its own copy
//! when comparing.
use parse_display::{Display, FromStr};
use serde::Serialize;
use thiserror::Error;

use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

mod clock;
mod fcfs;
mod lifecycle;
mod priority;
mod round_robin;
mod sjf;
mod srt;

pub use clock::{Slice, VirtualClock};
pub use fcfs::Fcfs;
pub use lifecycle::ProcessState;
pub use priority::Priority;
pub use round_robin::RoundRobin;
pub use sjf::Sjf;
pub use srt::Srt;

use lifecycle::{Bookkeeper, WaitingTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("no processes to schedule")]
    EmptyQueue,
    #[error("round-robin quantum must be positive")]
    ZeroQuantum,
    #[error("round-robin requires a time quantum")]
    MissingQuantum,
}

/// Available policies, named as on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromStr)]
pub enum Algorithm {
    #[display("FCFS")]
    FirstComeFirstServe,
    #[display("SJF")]
    ShortestJobFirst,
    #[display("P")]
    Priority,
    #[display("RR")]
    RoundRobin,
    #[display("SRT")]
    ShortestRemainingTimeFirst,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::FirstComeFirstServe,
        Algorithm::ShortestJobFirst,
        Algorithm::Priority,
        Algorithm::RoundRobin,
        Algorithm::ShortestRemainingTimeFirst,
    ];

    pub fn is_preemptive(&self) -> bool {
        matches!(self, Algorithm::RoundRobin | Algorithm::ShortestRemainingTimeFirst)
    }

    /// Build the scheduler for this policy. `quantum` is only used by round-robin.
    pub fn scheduler(self, quantum: Option<u64>) -> Result<Box<dyn Scheduler>, ScheduleError> {
        info!(algorithm = %self, ?quantum, "using");
        Ok(match self {
            Algorithm::FirstComeFirstServe => Box::new(Fcfs),
            Algorithm::ShortestJobFirst => Box::new(Sjf),
            Algorithm::Priority => Box::new(Priority),
            Algorithm::RoundRobin => Box::new(RoundRobin::new(quantum.ok_or(ScheduleError::MissingQuantum)?)?),
            Algorithm::ShortestRemainingTimeFirst => Box::new(Srt),
        })
    }
}

/// A scheduling policy
pub trait Scheduler {
    fn algorithm(&self) -> Algorithm;

    /// Run every process in `queue` to completion.
    ///
    /// Arguments are validated before any descriptor is touched.
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError>;
}

impl Scheduler for Box<dyn Scheduler> {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    #[inline]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        (**self).simulate(queue)
    }
}

/// Aggregate statistics of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub average_waiting_time: f64,
    pub average_turnaround_time: f64,
    /// completion instant of the last process
    pub total_run_time: u64,
}

/// What happened to a single process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub pid: u32,
    pub arrival: u32,
    pub burst: u32,
    pub priority: u32,
    pub first_dispatch: Option<u64>,
    pub completion: u64,
    /// first dispatch minus arrival
    pub response: u64,
    /// as defined by the policy
    pub waiting: u64,
    pub turnaround: u64,
}

/// Full record of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub algorithm: Algorithm,
    /// ordered by completion
    pub outcomes: Vec<ProcessOutcome>,
    /// ordered by start
    pub timeline: Vec<Slice>,
    pub total_run_time: u64,
}

impl Schedule {
    pub fn summary(&self) -> ScheduleResult {
        let n = self.outcomes.len() as f64;
        let waiting: u64 = self.outcomes.iter().map(|o| o.waiting).sum();
        let turnaround: u64 = self.outcomes.iter().map(|o| o.turnaround).sum();

        ScheduleResult {
            average_waiting_time: waiting as f64 / n,
            average_turnaround_time: turnaround as f64 / n,
            total_run_time: self.total_run_time,
        }
    }

    pub fn outcome(&self, pid: u32) -> Option<&ProcessOutcome> {
        self.outcomes.iter().find(|o| o.pid == pid)
    }
}

fn validate(queue: &[ProcessControlBlock]) -> Result<(), ScheduleError> {
    if queue.is_empty() {
        return Err(ScheduleError::EmptyQueue);
    }
    Ok(())
}

/// Position of the ready process with the smallest `key`, first found on ties
fn pick_ready<K, F>(queue: &[ProcessControlBlock], now: u64, key: F) -> Option<usize>
where
    K: Ord,
    F: Fn(&ProcessControlBlock) -> K,
{
    queue
        .iter()
        .enumerate()
        .filter(|(_, pcb)| pcb.is_ready(now))
        .min_by_key(|(_, pcb)| key(pcb))
        .map(|(idx, _)| idx)
}

/// Earliest arrival among the unfinished processes
fn next_arrival(queue: &[ProcessControlBlock]) -> Option<u64> {
    queue
        .iter()
        .filter(|pcb| !pcb.is_finished())
        .map(|pcb| u64::from(pcb.arrival))
        .min()
}

/// Shared loop of the non-preemptive key-ordered policies.
///
/// When nothing is ready the clock jumps to the next arrival; the key then
/// decides among everything that arrived at that instant.
fn run_non_preemptive<K, F>(algorithm: Algorithm, queue: &mut [ProcessControlBlock], key: F) -> Schedule
where
    K: Ord,
    F: Fn(&ProcessControlBlock) -> K,
{
    let mut clock = VirtualClock::new();
    let mut book = Bookkeeper::new(queue, WaitingTime::UntilFirstDispatch);
    loop {
        let idx = match pick_ready(queue, clock.now(), &key) {
            Some(idx) => idx,
            None => match next_arrival(queue) {
                Some(time) => {
                    debug!(from = clock.now(), to = time, "cpu idle");
                    clock.idle_until(time);
                    continue;
                }
                None => break,
            },
        };

        let pcb = &mut queue[idx];
        book.dispatch(idx, pcb, clock.now());
        clock.run_to_completion(pcb);
        book.finish(idx, pcb, clock.now());
    }

    book.into_schedule(algorithm, clock)
}

pub fn first_come_first_serve(queue: &mut [ProcessControlBlock]) -> Result<ScheduleResult, ScheduleError> {
    Fcfs.simulate(queue).map(|s| s.summary())
}

pub fn shortest_job_first(queue: &mut [ProcessControlBlock]) -> Result<ScheduleResult, ScheduleError> {
    Sjf.simulate(queue).map(|s| s.summary())
}

pub fn priority(queue: &mut [ProcessControlBlock]) -> Result<ScheduleResult, ScheduleError> {
    Priority.simulate(queue).map(|s| s.summary())
}

pub fn round_robin(queue: &mut [ProcessControlBlock], quantum: u64) -> Result<ScheduleResult, ScheduleError> {
    RoundRobin::new(quantum)?.simulate(queue).map(|s| s.summary())
}

pub fn shortest_remaining_time_first(queue: &mut [ProcessControlBlock]) -> Result<ScheduleResult, ScheduleError> {
    Srt.simulate(queue).map(|s| s.summary())
}

/// Run every policy on its own copy of `queue`. Round-robin is only included
/// when a quantum is given.
pub fn compare(
    queue: &[ProcessControlBlock],
    quantum: Option<u64>,
) -> Vec<(Algorithm, Result<Schedule, ScheduleError>)> {
    Algorithm::ALL
        .iter()
        .copied()
        .filter(|a| *a != Algorithm::RoundRobin || quantum.is_some())
        .map(|a| {
            let mut copy = queue.to_vec();
            let res = a.scheduler(quantum).and_then(|s| s.simulate(&mut copy));
            (a, res)
        })
        .collect()
}
