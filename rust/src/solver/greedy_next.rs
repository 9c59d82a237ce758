//! Greedy "next available edge" scan cover solver.

use std::time::Instant;

use crate::availability::{filter_serviceable, AvailabilityModel, EdgeRef};
use crate::config::SolverConfig;
use crate::models::Instance;
use crate::orientation::OrientationState;
use crate::scan_cover::ScanCover;
use crate::{log_changes, log_checks, log_debug};

use super::cancel::CancelToken;
use super::{SolveOutcome, Solver};

/// Receives the fraction of serviceable edges committed so far, in (0, 1].
pub type ProgressHandler<'a> = Box<dyn FnMut(f64) + 'a>;

/// Greedy solver: each round commits the remaining edge that can be serviced
/// soonest after the time of the previous event.
///
/// Availability is re-evaluated for every remaining edge every round, so a
/// solve costs O(E²) model queries.
pub struct GreedyNext<'a, M: AvailabilityModel + ?Sized> {
    instance: &'a Instance,
    model: &'a M,
    config: SolverConfig,
    cancel: CancelToken,
    progress: Option<ProgressHandler<'a>>,
    satellite_orientation: OrientationState,
}

impl<'a, M: AvailabilityModel + ?Sized> GreedyNext<'a, M> {
    /// Create a solver with the default configuration and a fresh cancel token.
    pub fn new(instance: &'a Instance, model: &'a M) -> Self {
        Self {
            instance,
            model,
            config: SolverConfig::default(),
            cancel: CancelToken::new(),
            progress: None,
            satellite_orientation: OrientationState::new(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a cancel token with the caller. It is polled once per round.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Install a handler invoked once per committed event.
    pub fn with_progress(mut self, handler: impl FnMut(f64) + 'a) -> Self {
        self.progress = Some(Box::new(handler));
        self
    }

    /// Handle that cancels this solver.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Orientation of each satellite for its most recently scheduled edge.
    pub fn orientations(&self) -> &OrientationState {
        &self.satellite_orientation
    }

    /// Find the remaining edge with the earliest next contact after `curr_time`.
    ///
    /// Returns its position in `remaining` and the contact time. Ties keep the
    /// leftmost edge. If no edge can be serviced any more, the first one is
    /// returned with an infinite time.
    fn select_next(&self, remaining: &[usize], curr_time: f64) -> (usize, f64) {
        let verbosity = self.config.verbosity;
        let mut best_pos = 0;
        let mut t_next = f64::INFINITY;

        for (pos, &index) in remaining.iter().enumerate() {
            let edge = EdgeRef {
                index,
                edge: &self.instance.edges[index],
            };
            let t = self
                .model
                .next_communication(edge, curr_time)
                .unwrap_or(f64::INFINITY);
            log_checks!(verbosity, "  Edge {}: next contact {}", index, t);

            if t < t_next {
                t_next = t;
                best_pos = pos;
            }

            // Nothing can be earlier than the current clock
            if self.config.stop_at_current_time && t_next == curr_time {
                log_checks!(
                    verbosity,
                    "  Edge {} available now, skipping {} edges",
                    remaining[best_pos],
                    remaining.len() - pos - 1
                );
                break;
            }
        }

        (best_pos, t_next)
    }
}

impl<M: AvailabilityModel + ?Sized> Solver for GreedyNext<'_, M> {
    fn name(&self) -> &'static str {
        "greedy_next"
    }

    fn solve(&mut self) -> SolveOutcome {
        let started = Instant::now();
        let verbosity = self.config.verbosity;
        self.satellite_orientation.clear();

        let first_contacts = filter_serviceable(self.model, self.instance, verbosity);
        let mut remaining: Vec<usize> = first_contacts.iter().map(|&(i, _)| i).collect();
        let n_edges = remaining.len();
        let mut solution = ScanCover::with_capacity(n_edges);
        let mut curr_time = 0.0_f64;

        log_changes!(
            verbosity,
            "{}: {} of {} edges serviceable",
            self.name(),
            n_edges,
            self.instance.edges.len()
        );

        while !remaining.is_empty() {
            if self.cancel.is_cancelled() {
                log_debug!(
                    verbosity,
                    "Cancelled at time {} with {} edges remaining",
                    curr_time,
                    remaining.len()
                );
                return SolveOutcome::Cancelled;
            }

            let (best_pos, t_next) = self.select_next(&remaining, curr_time);

            if let Some(progress) = self.progress.as_mut() {
                progress((solution.len() + 1) as f64 / n_edges as f64);
            }

            let edge_index = remaining.remove(best_pos);
            let edge = &self.instance.edges[edge_index];
            let orientation = self.model.orientation(
                EdgeRef {
                    index: edge_index,
                    edge,
                },
                t_next,
            );
            self.satellite_orientation.assign(edge, orientation);
            solution.add_event(edge_index, t_next, orientation);

            log_changes!(
                verbosity,
                "Time {}: edge {} ({} <-> {})",
                t_next,
                edge_index,
                edge.v1,
                edge.v2
            );

            curr_time = t_next;
        }

        solution.finalize(self.model.lower_bound(&first_contacts), started);

        log_changes!(
            verbosity,
            "{}: {} events, makespan {}, lower bound {:?}, {:.6}s",
            self.name(),
            solution.len(),
            solution.makespan(),
            solution.lower_bound,
            solution.computation_time
        );

        SolveOutcome::Completed(solution)
    }
}

/// Run [`GreedyNext`] with the default configuration and no cancellation.
pub fn solve<M: AvailabilityModel + ?Sized>(instance: &Instance, model: &M) -> SolveOutcome {
    GreedyNext::new(instance, model).solve()
}

/// Run [`GreedyNext`] with a progress handler that may fail.
///
/// The first error stops the solve at its next round and is returned, even if
/// that was the last round. `cancel` is only read: the stop goes through a
/// private token linked to it, so the caller can reuse `cancel` afterwards.
pub fn solve_with_fallible_progress<M, E, F>(
    instance: &Instance,
    model: &M,
    config: SolverConfig,
    cancel: &CancelToken,
    mut progress: F,
) -> Result<SolveOutcome, E>
where
    M: AvailabilityModel + ?Sized,
    F: FnMut(f64) -> Result<(), E>,
{
    let stop = cancel.linked();
    let stop_handle = stop.clone();
    let mut error: Option<E> = None;
    let error_slot = &mut error;

    let outcome = GreedyNext::new(instance, model)
        .with_config(config)
        .with_cancel_token(stop)
        .with_progress(move |fraction| {
            if error_slot.is_some() {
                return;
            }
            if let Err(err) = progress(fraction) {
                *error_slot = Some(err);
                stop_handle.cancel();
            }
        })
        .solve();

    match error {
        Some(err) => Err(err),
        None => Ok(outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{FnAvailability, Window, WindowTable};
    use crate::models::{Edge, EdgeOrientation, Orientation, Satellite};
    use std::cell::{Cell, RefCell};
    use std::sync::mpsc;

    const A: u32 = 0;
    const B: u32 = 1;
    const C: u32 = 2;

    fn instance(names: &[&str], edges: &[(u32, u32)]) -> Instance {
        let satellites = names
            .iter()
            .map(|n| Satellite {
                name: n.to_string(),
            })
            .collect();
        let edges = edges.iter().map(|&(a, b)| Edge::new(a, b)).collect();
        Instance::new(satellites, edges).unwrap()
    }

    /// Orientation that encodes which edge and endpoint it was computed for.
    fn tagged(edge: EdgeRef<'_>, time: f64) -> EdgeOrientation {
        EdgeOrientation::new(
            Orientation::new(edge.index as f64, time, 1.0),
            Orientation::new(edge.index as f64, time, 2.0),
        )
    }

    /// A-B at 5, B-C at max(3, t), A-C at 10.
    fn triangle() -> Instance {
        instance(&["A", "B", "C"], &[(A, B), (B, C), (A, C)])
    }

    fn triangle_next(edge: EdgeRef<'_>, t: f64) -> Option<f64> {
        match edge.index {
            0 => Some(5.0),
            1 => Some(t.max(3.0)),
            _ => Some(10.0),
        }
    }

    fn completed(outcome: SolveOutcome) -> ScanCover {
        match outcome {
            SolveOutcome::Completed(cover) => cover,
            SolveOutcome::Cancelled => panic!("solve was cancelled"),
        }
    }

    fn event_pairs(cover: &ScanCover) -> Vec<(usize, f64)> {
        cover.iter().map(|e| (e.edge_index, e.time)).collect()
    }

    #[test]
    fn test_triangle_scenario() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);

        let cover = completed(solve(&inst, &model));

        assert_eq!(event_pairs(&cover), vec![(1, 3.0), (0, 5.0), (2, 10.0)]);
        assert_eq!(cover.lower_bound, Some(10.0));
        assert!(cover.computation_time >= 0.0);
        assert!(cover.solved_at.is_some());
        assert_eq!(cover.validate(&inst), Ok(()));
    }

    #[test]
    fn test_orientation_state_tracks_latest_event() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let mut solver = GreedyNext::new(&inst, &model);

        completed(solver.solve());

        let state = solver.orientations();
        assert_eq!(state.len(), 3);
        // A last served A-C (edge 2) at 10 as first endpoint
        assert_eq!(state.get(A), Some(Orientation::new(2.0, 10.0, 1.0)));
        // B last served A-B (edge 0) at 5 as second endpoint
        assert_eq!(state.get(B), Some(Orientation::new(0.0, 5.0, 2.0)));
        // C last served A-C (edge 2) at 10 as second endpoint
        assert_eq!(state.get(C), Some(Orientation::new(2.0, 10.0, 2.0)));

        let mut by_satellite: Vec<(u32, Orientation)> = state.iter().collect();
        by_satellite.sort_by_key(|&(id, _)| id);
        let ids: Vec<u32> = by_satellite.iter().map(|&(id, _)| id).collect();
        assert_eq!(ids, vec![A, B, C]);
        assert_eq!(by_satellite[1].1, Orientation::new(0.0, 5.0, 2.0));
    }

    #[test]
    fn test_never_serviceable_edge_yields_empty_cover() {
        let inst = instance(&["A", "B"], &[(A, B)]);
        let model = FnAvailability::new(|_: EdgeRef<'_>, _: f64| None, tagged);
        let mut calls = 0;

        let outcome = GreedyNext::new(&inst, &model)
            .with_progress(|_| calls += 1)
            .solve();

        assert!(!outcome.is_cancelled());
        let cover = completed(outcome);
        assert!(cover.is_empty());
        assert_eq!(cover.lower_bound, Some(0.0));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_filtered_edges_never_scheduled() {
        let inst = instance(&["A", "B", "C", "D"], &[(A, B), (B, C), (C, 3), (A, 3)]);
        let model = FnAvailability::new(
            |e: EdgeRef<'_>, t: f64| {
                if e.index % 2 == 1 {
                    None
                } else {
                    Some(t + 1.0)
                }
            },
            tagged,
        );

        let cover = completed(solve(&inst, &model));

        let edges: Vec<usize> = cover.iter().map(|e| e.edge_index).collect();
        assert_eq!(edges, vec![0, 2]);
        assert_eq!(event_pairs(&cover), vec![(0, 1.0), (2, 2.0)]);
    }

    #[test]
    fn test_every_serviceable_edge_scheduled_once() {
        let names: Vec<String> = (0..6).map(|i| format!("sat{}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut pairs = Vec::new();
        for i in 0..6u32 {
            for j in (i + 1)..6 {
                pairs.push((i, j));
            }
        }
        let inst = instance(&name_refs, &pairs);

        // Windows staggered per edge; some overlap so ties and waits both occur
        let mut table = WindowTable::new();
        for index in 0..inst.edges.len() {
            let start = ((index * 7) % 11) as f64;
            table
                .add_window(
                    index,
                    Window {
                        start,
                        end: start + 2.0,
                        orientation: EdgeOrientation::default(),
                    },
                )
                .unwrap();
            table
                .add_window(
                    index,
                    Window {
                        start: 50.0 + index as f64,
                        end: 60.0 + index as f64,
                        orientation: EdgeOrientation::default(),
                    },
                )
                .unwrap();
        }

        let cover = completed(solve(&inst, &table));

        assert_eq!(cover.len(), inst.edges.len());
        assert_eq!(cover.validate(&inst), Ok(()));
        assert!(cover.lower_bound.unwrap() <= cover.makespan());
    }

    #[test]
    fn test_commit_order_matches_sorted_order() {
        let inst = instance(
            &["A", "B", "C", "D"],
            &[(A, B), (B, C), (C, 3), (A, 3), (A, C)],
        );
        let committed = RefCell::new(Vec::new());
        let model = FnAvailability::new(
            |e: EdgeRef<'_>, t: f64| {
                // Periodic contacts strictly after `t`, a different period per edge
                let period = [7.0, 3.0, 5.0, 4.0, 6.0][e.index];
                Some((t / period).floor() * period + period)
            },
            |e: EdgeRef<'_>, t: f64| {
                committed.borrow_mut().push(e.index);
                tagged(e, t)
            },
        );

        let cover = completed(solve(&inst, &model));

        let sorted: Vec<usize> = cover.iter().map(|e| e.edge_index).collect();
        assert_eq!(sorted, vec![1, 3, 2, 4, 0]);
        assert_eq!(*committed.borrow(), sorted);
        assert!(cover.events.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_ties_keep_leftmost_edge() {
        let inst = instance(&["A", "B", "C"], &[(A, B), (B, C), (A, C)]);
        let queries = Cell::new(0);
        let model = FnAvailability::new(
            |_: EdgeRef<'_>, t: f64| {
                queries.set(queries.get() + 1);
                Some(t.max(4.0))
            },
            tagged,
        );

        // 3 filter queries, then rounds at clock 0, 4, 4
        let cases = [(true, 3 + 3 + 1 + 1), (false, 3 + 3 + 2 + 1)];
        for (stop_at_current_time, expected_queries) in cases {
            queries.set(0);
            let config = SolverConfig {
                stop_at_current_time,
                ..SolverConfig::default()
            };
            let cover = completed(GreedyNext::new(&inst, &model).with_config(config).solve());
            assert_eq!(event_pairs(&cover), vec![(0, 4.0), (1, 4.0), (2, 4.0)]);
            assert_eq!(queries.get(), expected_queries);
        }
    }

    #[test]
    fn test_deterministic() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);

        let first = completed(solve(&inst, &model));
        let second = completed(solve(&inst, &model));

        assert_eq!(first.events, second.events);
    }

    #[test]
    fn test_progress_once_per_event() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let mut seen = Vec::new();

        let cover = completed(
            GreedyNext::new(&inst, &model)
                .with_progress(|p| seen.push(p))
                .solve(),
        );

        assert_eq!(seen.len(), cover.len());
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[test]
    fn test_cancel_before_first_round() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut solver = GreedyNext::new(&inst, &model).with_cancel_token(cancel);
        let outcome = solver.solve();

        assert!(outcome.is_cancelled());
        assert!(outcome.scan_cover().is_none());
        assert!(solver.orientations().is_empty());
    }

    #[test]
    fn test_cancel_from_progress_handler() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let cancel = CancelToken::new();
        let handle = cancel.clone();
        let mut calls = 0;

        let outcome = GreedyNext::new(&inst, &model)
            .with_cancel_token(cancel)
            .with_progress(|_| {
                calls += 1;
                handle.cancel();
            })
            .solve();

        assert!(outcome.is_cancelled());
        // The event in flight is committed, the next round sees the flag
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let (progress_tx, progress_rx) = mpsc::channel::<f64>();
        let (ack_tx, ack_rx) = mpsc::channel::<()>();

        let outcome = std::thread::scope(|s| {
            let worker = s.spawn(|| {
                GreedyNext::new(&inst, &model)
                    .with_cancel_token(cancel)
                    .with_progress(move |p| {
                        progress_tx.send(p).unwrap();
                        ack_rx.recv().unwrap();
                    })
                    .solve()
            });

            let first = progress_rx.recv().unwrap();
            assert!(first > 0.0 && first < 1.0);
            remote.cancel();
            ack_tx.send(()).unwrap();

            worker.join().unwrap()
        });

        assert!(outcome.is_cancelled());
        assert!(progress_rx.try_recv().is_err());
    }

    #[test]
    fn test_token_reset_allows_new_solve() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let mut solver = GreedyNext::new(&inst, &model);
        let cancel = solver.cancel_token();

        cancel.cancel();
        assert!(solver.solve().is_cancelled());

        cancel.reset();
        assert_eq!(completed(solver.solve()).len(), 3);
    }

    #[test]
    fn test_edge_lost_after_clock_advance_goes_last() {
        let inst = instance(&["A", "B", "C"], &[(A, B), (B, C)]);
        let model = FnAvailability::new(
            |e: EdgeRef<'_>, t: f64| match e.index {
                0 if t < 1.0 => Some(5.0),
                0 => None,
                _ => Some(t.max(1.0)),
            },
            tagged,
        );

        let cover = completed(solve(&inst, &model));

        assert_eq!(event_pairs(&cover), vec![(1, 1.0), (0, f64::INFINITY)]);
    }

    #[test]
    fn test_failing_progress_leaves_caller_token_untouched() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let cancel = CancelToken::new();
        let mut calls = 0;

        let result = solve_with_fallible_progress(
            &inst,
            &model,
            SolverConfig::default(),
            &cancel,
            |_| {
                calls += 1;
                Err("callback failed")
            },
        );

        assert_eq!(result.unwrap_err(), "callback failed");
        // The solve stopped at the next round
        assert_eq!(calls, 1);
        assert!(!cancel.is_cancelled());

        // The same token still drives a full solve
        let outcome = solve_with_fallible_progress(
            &inst,
            &model,
            SolverConfig::default(),
            &cancel,
            |_| Ok::<(), &str>(()),
        );
        assert_eq!(completed(outcome.unwrap()).len(), 3);
    }

    #[test]
    fn test_fallible_progress_observes_caller_cancel() {
        let inst = triangle();
        let model = FnAvailability::new(triangle_next, tagged);
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = solve_with_fallible_progress(
            &inst,
            &model,
            SolverConfig::default(),
            &cancel,
            |_| Ok::<(), &str>(()),
        )
        .unwrap();

        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_solver_name() {
        let inst = triangle();
        let model = WindowTable::new();
        assert_eq!(GreedyNext::new(&inst, &model).name(), "greedy_next");
    }
}
