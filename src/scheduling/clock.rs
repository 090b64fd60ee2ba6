use serde::Serialize;

use crate::process::ProcessControlBlock;

/// A contiguous interval `[start, end)` during which `pid` held the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub pid: u32,
    pub start: u64,
    pub end: u64,
}

impl Slice {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }
}

/// The simulated time of the single virtual CPU.
///
/// Burst is only ever consumed through [`VirtualClock::step`], which advances
/// the clock by the same unit, so the two can never drift apart.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: u64,
    timeline: Vec<Slice>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `pcb` for one time unit.
    pub fn step(&mut self, pcb: &mut ProcessControlBlock) {
        match pcb.remaining_burst_time.checked_sub(1) {
            Some(remaining) => pcb.remaining_burst_time = remaining,
            None => {
                debug_assert!(false, "stepping finished process {}", pcb.pid);
                return;
            }
        }

        match self.timeline.last_mut() {
            Some(slice) if slice.pid == pcb.pid && slice.end == self.now => slice.end += 1,
            _ => self.timeline.push(Slice {
                pid: pcb.pid,
                start: self.now,
                end: self.now + 1,
            }),
        }
        self.now += 1;
    }

    /// Step until the burst is exhausted, returns the number of steps taken
    pub fn run_to_completion(&mut self, pcb: &mut ProcessControlBlock) -> u64 {
        let steps = u64::from(pcb.remaining_burst_time);
        for _ in 0..steps {
            self.step(pcb);
        }
        steps
    }

    /// Step at most `quantum` times, returns the number of steps taken
    pub fn run_for(&mut self, pcb: &mut ProcessControlBlock, quantum: u64) -> u64 {
        let steps = quantum.min(u64::from(pcb.remaining_burst_time));
        for _ in 0..steps {
            self.step(pcb);
        }
        steps
    }

    /// Let the CPU idle until `time`. Never moves the clock backwards.
    pub fn idle_until(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    pub fn timeline(&self) -> &[Slice] {
        &self.timeline
    }

    pub fn into_timeline(self) -> Vec<Slice> {
        self.timeline
    }
}
