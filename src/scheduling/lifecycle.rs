use parse_display::Display;

use super::clock::VirtualClock;
use super::{Algorithm, ProcessOutcome, Schedule};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Where a process is in its life on the virtual CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProcessState {
    /// not arrived yet
    Waiting,
    /// arrived, wants the CPU
    Ready,
    Running,
    Finished,
}

/// How a policy reports a process's waiting time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitingTime {
    /// time between arrival and the first dispatch
    UntilFirstDispatch,
    /// turnaround minus the original burst, covers time spent preempted
    TurnaroundLessBurst,
}

#[derive(Debug)]
struct Lifecycle {
    state: ProcessState,
    burst: u32,
    first_dispatch: Option<u64>,
}

/// Tracks the state machine of every process in a queue, indexed by position.
///
/// Positions must stay stable for the lifetime of the bookkeeper, so any
/// reordering of the queue has to happen before it is created.
#[derive(Debug)]
pub(crate) struct Bookkeeper {
    lifecycles: Vec<Lifecycle>,
    outcomes: Vec<ProcessOutcome>,
    waiting: WaitingTime,
}

impl Bookkeeper {
    pub fn new(queue: &[ProcessControlBlock], waiting: WaitingTime) -> Self {
        let mut outcomes = Vec::with_capacity(queue.len());
        let lifecycles = queue
            .iter()
            .map(|pcb| {
                if pcb.is_finished() {
                    // nothing to run, done the moment it arrives
                    outcomes.push(ProcessOutcome {
                        pid: pcb.pid,
                        arrival: pcb.arrival,
                        burst: 0,
                        priority: pcb.priority,
                        first_dispatch: None,
                        completion: u64::from(pcb.arrival),
                        response: 0,
                        waiting: 0,
                        turnaround: 0,
                    });
                    Lifecycle {
                        state: ProcessState::Finished,
                        burst: 0,
                        first_dispatch: None,
                    }
                } else {
                    Lifecycle {
                        state: ProcessState::Waiting,
                        burst: pcb.remaining_burst_time,
                        first_dispatch: None,
                    }
                }
            })
            .collect();

        Self {
            lifecycles,
            outcomes,
            waiting,
        }
    }

    pub fn state(&self, idx: usize) -> ProcessState {
        self.lifecycles[idx].state
    }

    pub fn all_finished(&self) -> bool {
        self.outcomes.len() == self.lifecycles.len()
    }

    /// Give the CPU to `pcb`. Admission (Waiting -> Ready) happens here
    /// because the policies only consider processes that have arrived.
    pub fn dispatch(&mut self, idx: usize, pcb: &mut ProcessControlBlock, now: u64) {
        let lc = &mut self.lifecycles[idx];
        debug_assert!(u64::from(pcb.arrival) <= now, "{} dispatched before arrival", pcb);

        if lc.state == ProcessState::Waiting {
            lc.state = ProcessState::Ready;
        }
        debug_assert_eq!(lc.state, ProcessState::Ready, "{} dispatched while {}", pcb, lc.state);
        lc.state = ProcessState::Running;

        if !pcb.started {
            pcb.started = true;
            lc.first_dispatch = Some(now);
            trace!(pid = pcb.pid, now, "first dispatch");
        } else {
            trace!(pid = pcb.pid, now, "resume");
        }
    }

    /// Take the CPU away from an unfinished process
    pub fn preempt(&mut self, idx: usize) {
        debug_assert_eq!(self.state(idx), ProcessState::Running);
        self.lifecycles[idx].state = ProcessState::Ready;
    }

    pub fn finish(&mut self, idx: usize, pcb: &ProcessControlBlock, now: u64) {
        let lc = &mut self.lifecycles[idx];
        debug_assert_eq!(lc.state, ProcessState::Running);
        debug_assert!(pcb.is_finished());
        lc.state = ProcessState::Finished;

        let arrival = u64::from(pcb.arrival);
        let burst = u64::from(lc.burst);
        let turnaround = now - arrival;
        let response = lc.first_dispatch.unwrap_or(arrival) - arrival;
        let waiting = match self.waiting {
            WaitingTime::UntilFirstDispatch => response,
            WaitingTime::TurnaroundLessBurst => turnaround - burst,
        };
        trace!(pid = pcb.pid, now, waiting, turnaround, "finished");

        self.outcomes.push(ProcessOutcome {
            pid: pcb.pid,
            arrival: pcb.arrival,
            burst: lc.burst,
            priority: pcb.priority,
            first_dispatch: lc.first_dispatch,
            completion: now,
            response,
            waiting,
            turnaround,
        });
    }

    /// The clock is moved up to the latest completion, which can lie past the
    /// last slice when a zero-burst process arrives after everything else.
    pub fn into_schedule(self, algorithm: Algorithm, mut clock: VirtualClock) -> Schedule {
        debug_assert!(self.all_finished());

        let mut outcomes = self.outcomes;
        outcomes.sort_by_key(|o| (o.completion, o.pid));
        if let Some(last) = outcomes.last() {
            clock.idle_until(last.completion);
        }

        Schedule {
            algorithm,
            total_run_time: clock.now(),
            timeline: clock.into_timeline(),
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        let mut queue = vec![ProcessControlBlock::new(0, 2, 0, 1)];
        let mut book = Bookkeeper::new(&queue, WaitingTime::TurnaroundLessBurst);
        let mut clock = VirtualClock::new();
        assert_eq!(book.state(0), ProcessState::Waiting);

        clock.idle_until(1);
        book.dispatch(0, &mut queue[0], clock.now());
        assert_eq!(book.state(0), ProcessState::Running);
        assert!(queue[0].started);

        clock.step(&mut queue[0]);
        book.preempt(0);
        assert_eq!(book.state(0), ProcessState::Ready);

        book.dispatch(0, &mut queue[0], clock.now());
        clock.step(&mut queue[0]);
        book.finish(0, &queue[0], clock.now());
        assert_eq!(book.state(0), ProcessState::Finished);
        assert!(book.all_finished());

        let schedule = book.into_schedule(Algorithm::ShortestRemainingTimeFirst, clock);
        let outcome = &schedule.outcomes[0];
        assert_eq!(outcome.first_dispatch, Some(1));
        assert_eq!(outcome.turnaround, 2);
        assert_eq!(outcome.waiting, 0);
        assert_eq!(schedule.total_run_time, 3);
    }

    #[test]
    fn zero_burst_is_finished_up_front() {
        let queue = vec![
            ProcessControlBlock::new(0, 0, 0, 4),
            ProcessControlBlock::new(1, 3, 0, 0),
        ];
        let book = Bookkeeper::new(&queue, WaitingTime::UntilFirstDispatch);

        assert_eq!(book.state(0), ProcessState::Finished);
        assert_eq!(book.state(1), ProcessState::Waiting);
        assert!(!book.all_finished());
    }

    #[test]
    fn schedule_ends_at_latest_completion() {
        let mut queue = vec![
            ProcessControlBlock::new(0, 2, 0, 0),
            ProcessControlBlock::new(1, 0, 0, 7),
        ];
        let mut book = Bookkeeper::new(&queue, WaitingTime::UntilFirstDispatch);
        let mut clock = VirtualClock::new();

        book.dispatch(0, &mut queue[0], clock.now());
        clock.run_to_completion(&mut queue[0]);
        book.finish(0, &queue[0], clock.now());

        let schedule = book.into_schedule(Algorithm::ShortestJobFirst, clock);
        assert_eq!(schedule.total_run_time, 7);
        assert_eq!(schedule.outcomes.last().map(|o| o.pid), Some(1));
        assert_eq!(schedule.timeline.len(), 1);
    }
}
