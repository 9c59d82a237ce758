//! Schedule result: the scan cover produced by a solver.

use chrono::{DateTime, Utc};
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use std::time::Instant;
use thiserror::Error;

use crate::models::{EdgeOrientation, Instance};

/// Invariant violations reported by [`ScanCover::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanCoverError {
    #[error("Event refers to unknown edge {0}")]
    UnknownEdge(usize),
    #[error("Edge {0} is serviced more than once")]
    DuplicateEdge(usize),
    #[error("Event at position {position} is earlier than its predecessor")]
    OutOfOrder { position: usize },
}

/// One committed service event.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    #[pyo3(get)]
    pub edge_index: usize,
    #[pyo3(get)]
    pub time: f64,
    #[pyo3(get)]
    pub orientation: EdgeOrientation,
}

#[pymethods]
impl ScheduledEvent {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledEvent(edge_index={}, time={})",
            self.edge_index, self.time
        )
    }
}

/// Ordered service events plus solution metadata.
///
/// Grows by one event per committed edge while solving, then gets its
/// metadata and final ordering from [`ScanCover::finalize`].
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct ScanCover {
    #[pyo3(get)]
    pub events: Vec<ScheduledEvent>,
    /// Unset until the solve completes.
    #[pyo3(get)]
    pub lower_bound: Option<f64>,
    /// Duration of the solve in seconds.
    #[pyo3(get)]
    pub computation_time: f64,
    #[pyo3(get)]
    pub solved_at: Option<DateTime<Utc>>,
}

impl ScanCover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn add_event(&mut self, edge_index: usize, time: f64, orientation: EdgeOrientation) {
        self.events.push(ScheduledEvent {
            edge_index,
            time,
            orientation,
        });
    }

    pub fn set_lower_bound(&mut self, lower_bound: f64) {
        self.lower_bound = Some(lower_bound);
    }

    pub fn set_computation_time(&mut self, seconds: f64) {
        self.computation_time = seconds;
    }

    /// Stable sort by ascending time; equal times keep their commit order.
    pub fn sort(&mut self) {
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Stamp metadata and put events into presentation order.
    ///
    /// `started` is a monotonic instant so clock adjustments during the solve
    /// cannot distort the computation time.
    pub fn finalize(&mut self, lower_bound: f64, started: Instant) {
        self.set_lower_bound(lower_bound);
        self.sort();
        self.set_computation_time(started.elapsed().as_secs_f64());
        self.solved_at = Some(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.iter()
    }

    /// Time of the last event, or 0 when nothing was scheduled.
    pub fn makespan(&self) -> f64 {
        self.events.iter().map(|e| e.time).fold(0.0, f64::max)
    }

    /// Check that every event names a distinct edge of `instance` and that
    /// times never decrease.
    pub fn validate(&self, instance: &Instance) -> Result<(), ScanCoverError> {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for (position, event) in self.events.iter().enumerate() {
            if event.edge_index >= instance.edges.len() {
                return Err(ScanCoverError::UnknownEdge(event.edge_index));
            }
            if !seen.insert(event.edge_index) {
                return Err(ScanCoverError::DuplicateEdge(event.edge_index));
            }
            if position > 0 && event.time < self.events[position - 1].time {
                return Err(ScanCoverError::OutOfOrder { position });
            }
        }
        Ok(())
    }
}

#[pymethods]
impl ScanCover {
    #[pyo3(name = "makespan")]
    fn py_makespan(&self) -> f64 {
        self.makespan()
    }

    #[pyo3(name = "validate")]
    fn py_validate(&self, instance: PyRef<'_, Instance>) -> PyResult<()> {
        self.validate(&instance)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __len__(&self) -> usize {
        self.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScanCover(events={}, lower_bound={:?}, computation_time={})",
            self.events.len(),
            self.lower_bound,
            self.computation_time
        )
    }
}
