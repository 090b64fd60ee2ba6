use super::clock::VirtualClock;
use super::lifecycle::{Bookkeeper, WaitingTime};
use super::{validate, Algorithm, Schedule, ScheduleError, Scheduler};
use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// First-come-first-served, each process runs to completion in arrival order
#[derive(Debug, Default, Clone, Copy)]
pub struct Fcfs;

impl Scheduler for Fcfs {
    fn algorithm(&self) -> Algorithm {
        Algorithm::FirstComeFirstServe
    }

    #[instrument(level = "debug", skip(self, queue), fields(queue.len = queue.len()))]
    fn simulate(&self, queue: &mut [ProcessControlBlock]) -> Result<Schedule, ScheduleError> {
        validate(queue)?;

        // stable, equal arrivals keep their input order
        queue.sort_by_key(|pcb| pcb.arrival);

        let mut clock = VirtualClock::new();
        let mut book = Bookkeeper::new(queue, WaitingTime::UntilFirstDispatch);
        for (idx, pcb) in queue.iter_mut().enumerate() {
            clock.idle_until(pcb.arrival.into());
            if pcb.is_finished() {
                // selected like any other, but has nothing to run
                pcb.started = true;
                continue;
            }
            book.dispatch(idx, pcb, clock.now());
            clock.run_to_completion(pcb);
            book.finish(idx, pcb, clock.now());
        }

        Ok(book.into_schedule(self.algorithm(), clock))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::process::from_triples;
    use crate::scheduling::first_come_first_serve;

    #[test]
    fn three_staggered_arrivals() {
        let mut queue = from_triples(vec![(5, 0, 0), (3, 0, 1), (8, 0, 2)]);
        let result = first_come_first_serve(&mut queue).unwrap();

        assert_abs_diff_eq!(result.average_waiting_time, 10.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.average_turnaround_time, 26.0 / 3.0, epsilon = 1e-9);
        assert_eq!(result.total_run_time, 16);
        assert!(queue.iter().all(|pcb| pcb.started && pcb.is_finished()));
    }

    #[test]
    fn sorts_by_arrival_keeping_ties_in_order() {
        let mut queue = from_triples(vec![(2, 0, 4), (1, 0, 0), (3, 0, 0)]);
        let schedule = Fcfs.simulate(&mut queue).unwrap();

        let pids: Vec<_> = queue.iter().map(|pcb| pcb.pid).collect();
        assert_eq!(pids, vec![1, 2, 0]);
        let order: Vec<_> = schedule.timeline.iter().map(|s| s.pid).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(schedule.total_run_time, 6);
    }

    #[test]
    fn idles_until_late_arrival() {
        let mut queue = from_triples(vec![(2, 0, 0), (2, 0, 10)]);
        let schedule = Fcfs.simulate(&mut queue).unwrap();

        assert_eq!(schedule.total_run_time, 12);
        assert_abs_diff_eq!(schedule.summary().average_waiting_time, 0.0);
        assert_abs_diff_eq!(schedule.summary().average_turnaround_time, 2.0);
    }

    #[test]
    fn zero_burst_arrival_moves_the_clock() {
        let mut queue = from_triples(vec![(4, 0, 0), (0, 0, 9)]);
        let schedule = Fcfs.simulate(&mut queue).unwrap();

        assert_eq!(schedule.total_run_time, 9);
        assert_eq!(schedule.outcome(1).unwrap().completion, 9);
        assert_eq!(schedule.timeline.len(), 1);
        assert!(queue.iter().all(|pcb| pcb.started));
        assert_abs_diff_eq!(schedule.summary().average_turnaround_time, 2.0);
    }

    #[test]
    fn empty_queue_fails() {
        assert_eq!(first_come_first_serve(&mut []), Err(ScheduleError::EmptyQueue));
    }
}
