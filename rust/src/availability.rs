//! Contract with the orbit/edge model, plus the models shipped with the crate.
//!
//! The orbital mechanics that decide when two satellites can see each other
//! are not part of this crate. Solvers only see an [`AvailabilityModel`]:
//! "when can this edge be served next" and "how must both satellites point".

use pyo3::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::models::{Edge, EdgeOrientation, Instance, Orientation};
use crate::solver::lower_bound::max_first_contact;

/// An edge together with its stable index in the instance.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef<'a> {
    pub index: usize,
    pub edge: &'a Edge,
}

/// Time-varying availability of edges.
///
/// Implementations must be pure functions of their arguments for the
/// duration of a solve.
pub trait AvailabilityModel {
    /// Earliest absolute time `>= current_time` at which the edge can be
    /// serviced. `None` (or a non-finite value) means never.
    fn next_communication(&self, edge: EdgeRef<'_>, current_time: f64) -> Option<f64>;

    /// Orientation pair required to service the edge at `time`.
    fn orientation(&self, edge: EdgeRef<'_>, time: f64) -> EdgeOrientation;

    /// Lower bound on the makespan of any scan cover, given the first
    /// contact time of every serviceable edge.
    fn lower_bound(&self, first_contacts: &[(usize, f64)]) -> f64 {
        max_first_contact(first_contacts)
    }
}

impl<M: AvailabilityModel + ?Sized> AvailabilityModel for &M {
    fn next_communication(&self, edge: EdgeRef<'_>, current_time: f64) -> Option<f64> {
        (**self).next_communication(edge, current_time)
    }

    fn orientation(&self, edge: EdgeRef<'_>, time: f64) -> EdgeOrientation {
        (**self).orientation(edge, time)
    }

    fn lower_bound(&self, first_contacts: &[(usize, f64)]) -> f64 {
        (**self).lower_bound(first_contacts)
    }
}

/// Availability model built from two closures.
pub struct FnAvailability<N, O> {
    next: N,
    orient: O,
}

impl<N, O> FnAvailability<N, O>
where
    N: Fn(EdgeRef<'_>, f64) -> Option<f64>,
    O: Fn(EdgeRef<'_>, f64) -> EdgeOrientation,
{
    pub fn new(next: N, orient: O) -> Self {
        Self { next, orient }
    }
}

impl<N, O> AvailabilityModel for FnAvailability<N, O>
where
    N: Fn(EdgeRef<'_>, f64) -> Option<f64>,
    O: Fn(EdgeRef<'_>, f64) -> EdgeOrientation,
{
    fn next_communication(&self, edge: EdgeRef<'_>, current_time: f64) -> Option<f64> {
        (self.next)(edge, current_time)
    }

    fn orientation(&self, edge: EdgeRef<'_>, time: f64) -> EdgeOrientation {
        (self.orient)(edge, time)
    }
}

/// Partition edges at t=0: returns `(edge index, first contact time)` for every
/// edge that can ever be serviced, in instance order.
///
/// Edges left out are permanently infeasible (e.g. their orbits never align).
pub fn filter_serviceable<M: AvailabilityModel + ?Sized>(
    model: &M,
    instance: &Instance,
    verbosity: u8,
) -> Vec<(usize, f64)> {
    let mut serviceable = Vec::with_capacity(instance.edges.len());
    for (index, edge) in instance.edges.iter().enumerate() {
        match model
            .next_communication(EdgeRef { index, edge }, 0.0)
            .filter(|t| t.is_finite())
        {
            Some(t) => {
                crate::log_debug!(verbosity, "  Edge {} first contact at {}", index, t);
                serviceable.push((index, t));
            }
            None => {
                crate::log_debug!(verbosity, "  Edge {} is never serviceable, excluded", index);
            }
        }
    }
    serviceable
}

/// Errors raised while filling a [`WindowTable`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("Window for edge {edge} has a non-finite bound")]
    NonFiniteBound { edge: usize },
    #[error("Window for edge {edge} ends ({end}) before it starts ({start})")]
    InvertedWindow { edge: usize, start: f64, end: f64 },
}

/// A closed interval during which an edge can be serviced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
    pub orientation: EdgeOrientation,
}

/// Availability model backed by precomputed communication windows per edge.
///
/// Edges without windows are never serviceable.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct WindowTable {
    windows: FxHashMap<usize, Vec<Window>>,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window for an edge; windows of one edge are kept sorted by start.
    pub fn add_window(&mut self, edge: usize, window: Window) -> Result<(), WindowError> {
        if !window.start.is_finite() || !window.end.is_finite() {
            return Err(WindowError::NonFiniteBound { edge });
        }
        if window.end < window.start {
            return Err(WindowError::InvertedWindow {
                edge,
                start: window.start,
                end: window.end,
            });
        }

        let list = self.windows.entry(edge).or_default();
        let pos = list.partition_point(|w| w.start <= window.start);
        list.insert(pos, window);
        Ok(())
    }

    pub fn windows(&self, edge: usize) -> &[Window] {
        self.windows.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First window that has not ended by `time`.
    fn window_from(&self, edge: usize, time: f64) -> Option<&Window> {
        self.windows(edge).iter().find(|w| w.end >= time)
    }
}

impl AvailabilityModel for WindowTable {
    fn next_communication(&self, edge: EdgeRef<'_>, current_time: f64) -> Option<f64> {
        self.window_from(edge.index, current_time)
            .map(|w| w.start.max(current_time))
    }

    fn orientation(&self, edge: EdgeRef<'_>, time: f64) -> EdgeOrientation {
        self.window_from(edge.index, time)
            .map(|w| w.orientation)
            .unwrap_or_default()
    }
}

#[pymethods]
impl WindowTable {
    #[new]
    fn py_new() -> Self {
        Self::new()
    }

    #[pyo3(name = "add_window")]
    #[pyo3(signature = (edge, start, end, sat1=(0.0, 0.0, 0.0), sat2=(0.0, 0.0, 0.0)))]
    fn py_add_window(
        &mut self,
        edge: usize,
        start: f64,
        end: f64,
        sat1: (f64, f64, f64),
        sat2: (f64, f64, f64),
    ) -> PyResult<()> {
        let window = Window {
            start,
            end,
            orientation: EdgeOrientation::new(Orientation::from(sat1), Orientation::from(sat2)),
        };
        self.add_window(edge, window)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    /// Windows of an edge as `(start, end)` pairs.
    fn window_bounds(&self, edge: usize) -> Vec<(f64, f64)> {
        self.windows(edge).iter().map(|w| (w.start, w.end)).collect()
    }

    fn __repr__(&self) -> String {
        let total: usize = self.windows.values().map(Vec::len).sum();
        format!("WindowTable(edges={}, windows={})", self.windows.len(), total)
    }
}
