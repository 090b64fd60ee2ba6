use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheduling-relevant state of one process.
///
/// `remaining_burst_time` and `started` are mutated while a policy simulates;
/// `arrival`, `priority` and `pid` never change after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessControlBlock {
    /// Position of the record in the input, used to label outcomes
    pub pid: u32,
    /// CPU time units still needed
    pub remaining_burst_time: u32,
    /// lower value wins
    pub priority: u32,
    /// simulated instant the process becomes eligible
    pub arrival: u32,
    /// set on first dispatch
    pub started: bool,
}

impl ProcessControlBlock {
    pub fn new(pid: u32, burst: u32, priority: u32, arrival: u32) -> Self {
        Self {
            pid,
            remaining_burst_time: burst,
            priority,
            arrival,
            started: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_burst_time == 0
    }

    /// Eligible to run at `now`
    pub fn is_ready(&self, now: u64) -> bool {
        !self.is_finished() && u64::from(self.arrival) <= now
    }
}

impl fmt::Display for ProcessControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pcb({}, @{}<{}, prio {})",
            self.pid, self.arrival, self.remaining_burst_time, self.priority
        )
    }
}

/// Build a descriptor list from `(burst, priority, arrival)` triples, pids in order.
pub fn from_triples<I>(triples: I) -> Vec<ProcessControlBlock>
where
    I: IntoIterator<Item = (u32, u32, u32)>,
{
    triples
        .into_iter()
        .enumerate()
        .map(|(i, (burst, priority, arrival))| ProcessControlBlock::new(i as u32, burst, priority, arrival))
        .collect()
}
