use super::clock::VirtualClock;
use super::lifecycle::{Bookkeeper, WaitingTime};
use super::{next_arrival, pick_ready, validate, Algorithm, Schedule, ScheduleError, Scheduler};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Shortest-remaining-time-first.
///
/// The candidate is re-evaluated after every time unit, so a process is
/// preempted as soon as another arrived one has strictly less work left.
/// Waiting time is turnaround minus the original burst.
#[derive(Debug, Default, Clone, Copy)]
pub struct Srt;

impl Scheduler for Srt {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ShortestRemainingTimeFirst
    }

    #[instrument(level = "debug", skip(self, queue), fields(queue.len = queue.len()))]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        validate(queue)?;

        let mut clock = VirtualClock::new();
        // captures the original bursts before anything runs
        let mut book = Bookkeeper::new(queue, WaitingTime::TurnaroundLessBurst);
        let mut running: Option<usize> = None;
        while !book.all_finished() {
            let idx = match pick_ready(queue, clock.now(), |pcb| pcb.remaining_burst_time) {
                Some(idx) => idx,
                None => match next_arrival(queue) {
                    Some(time) => {
                        // nothing can become shorter while no one is ready
                        debug!(from = clock.now(), to = time, "cpu idle");
                        clock.idle_until(time);
                        continue;
                    }
                    None => break,
                },
            };

            if running != Some(idx) {
                if let Some(prev) = running.take() {
                    debug!(now = clock.now(), prev = queue[prev].pid, next = queue[idx].pid, "preempt");
                    book.preempt(prev);
                }
                book.dispatch(idx, &mut queue[idx], clock.now());
                running = Some(idx);
            }

            let pcb = &mut queue[idx];
            clock.step(pcb);
            if pcb.is_finished() {
                book.finish(idx, pcb, clock.now());
                running = None;
            }
        }

        Ok(book.into_schedule(self.algorithm(), clock))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::process::from_triples;
    use crate::scheduling::{shortest_remaining_time_first, Slice};

    #[test]
    fn shorter_arrivals_preempt() {
        let mut queue = from_triples(vec![(8, 0, 0), (4, 0, 1), (2, 0, 2)]);
        let result = shortest_remaining_time_first(&mut queue).unwrap();

        assert_abs_diff_eq!(result.average_waiting_time, 8.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.average_turnaround_time, 22.0 / 3.0, epsilon = 1e-9);
        assert_eq!(result.total_run_time, 14);
    }

    #[test]
    fn timeline_shows_preemptions() {
        let mut queue = from_triples(vec![(8, 0, 0), (4, 0, 1), (2, 0, 2)]);
        let schedule = Srt.simulate(&mut queue).unwrap();

        assert_eq!(
            schedule.timeline,
            vec![
                Slice { pid: 0, start: 0, end: 1 },
                Slice { pid: 1, start: 1, end: 2 },
                Slice { pid: 2, start: 2, end: 4 },
                Slice { pid: 1, start: 4, end: 7 },
                Slice { pid: 0, start: 7, end: 14 },
            ]
        );
        for outcome in &schedule.outcomes {
            assert_eq!(outcome.turnaround, outcome.waiting + u64::from(outcome.burst));
        }
    }

    #[test]
    fn equal_remaining_does_not_preempt_earlier_in_collection() {
        // at t=1 both have 3 left; P0 comes first in scan order and keeps running
        let mut queue = from_triples(vec![(4, 0, 0), (3, 0, 1)]);
        let schedule = Srt.simulate(&mut queue).unwrap();

        assert_eq!(schedule.timeline.len(), 2);
        assert_eq!(schedule.timeline[0], Slice { pid: 0, start: 0, end: 4 });
    }

    #[test]
    fn idle_gap_then_resume() {
        let mut queue = from_triples(vec![(2, 0, 5), (1, 0, 0)]);
        let schedule = Srt.simulate(&mut queue).unwrap();

        assert_eq!(schedule.total_run_time, 7);
        assert_abs_diff_eq!(schedule.summary().average_waiting_time, 0.0);
    }

    #[test]
    fn empty_queue_fails() {
        assert_eq!(shortest_remaining_time_first(&mut []), Err(ScheduleError::EmptyQueue));
    }
}
