//! Core data types for scan cover instances.

use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Satellite handle: index into `Instance::satellites`.
pub type SatelliteId = u32;

/// Errors raised while building an instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Edge {edge} refers to unknown satellite {satellite}")]
    UnknownSatellite { edge: usize, satellite: SatelliteId },
    #[error("Satellite {0} has an empty name")]
    EmptySatelliteName(usize),
}

/// A satellite on its orbit. The orbital elements live in the availability model.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Satellite {
    #[pyo3(get, set)]
    pub name: String,
}

#[pymethods]
impl Satellite {
    #[new]
    fn new(name: String) -> Self {
        Self { name }
    }

    fn __repr__(&self) -> String {
        format!("Satellite(name={:?})", self.name)
    }
}

/// A potential communication link between two satellites.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    #[pyo3(get)]
    pub v1: SatelliteId,
    #[pyo3(get)]
    pub v2: SatelliteId,
}

impl Edge {
    pub fn new(v1: SatelliteId, v2: SatelliteId) -> Self {
        Self { v1, v2 }
    }

    /// Whether the edge touches the given satellite.
    #[inline]
    pub fn touches(&self, satellite: SatelliteId) -> bool {
        self.v1 == satellite || self.v2 == satellite
    }

    /// Endpoints in ascending order, so (a, b) and (b, a) compare equal.
    #[inline]
    fn unordered(&self) -> (SatelliteId, SatelliteId) {
        (self.v1.min(self.v2), self.v1.max(self.v2))
    }
}

#[pymethods]
impl Edge {
    fn __repr__(&self) -> String {
        format!("Edge(v1={}, v2={})", self.v1, self.v2)
    }
}

/// Read-only problem input: satellites and the edges between them.
///
/// Edges are identified by their position in `edges` for the whole solve.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct Instance {
    #[pyo3(get)]
    pub satellites: Vec<Satellite>,
    #[pyo3(get)]
    pub edges: Vec<Edge>,
}

impl Instance {
    /// Build an instance, checking every edge endpoint against the satellite list.
    pub fn new(satellites: Vec<Satellite>, edges: Vec<Edge>) -> Result<Self, InstanceError> {
        if let Some(index) = satellites.iter().position(|s| s.name.trim().is_empty()) {
            return Err(InstanceError::EmptySatelliteName(index));
        }

        let n_satellites = satellites.len();
        for (index, edge) in edges.iter().enumerate() {
            for satellite in [edge.v1, edge.v2] {
                if satellite as usize >= n_satellites {
                    return Err(InstanceError::UnknownSatellite {
                        edge: index,
                        satellite,
                    });
                }
            }
        }

        Ok(Self { satellites, edges })
    }

    /// Drop self-loops and repeated satellite pairs, keeping the first occurrence.
    ///
    /// Returns the number of removed edges. Edge indices shift after removal,
    /// so call this before solving.
    pub fn remove_invalid_edges(&mut self) -> usize {
        let before = self.edges.len();
        let mut seen: FxHashSet<(SatelliteId, SatelliteId)> = FxHashSet::default();
        self.edges
            .retain(|e| e.v1 != e.v2 && seen.insert(e.unordered()));
        before - self.edges.len()
    }

    /// Indices of all edges incident to a satellite.
    pub fn edges_of(&self, satellite: SatelliteId) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.touches(satellite))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn satellite(&self, id: SatelliteId) -> Option<&Satellite> {
        self.satellites.get(id as usize)
    }
}

#[pymethods]
impl Instance {
    #[new]
    #[pyo3(signature = (satellites, edges))]
    fn py_new(satellites: Vec<String>, edges: Vec<(SatelliteId, SatelliteId)>) -> PyResult<Self> {
        let satellites = satellites.into_iter().map(|name| Satellite { name }).collect();
        let edges = edges.into_iter().map(|(v1, v2)| Edge::new(v1, v2)).collect();
        Instance::new(satellites, edges)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[pyo3(name = "remove_invalid_edges")]
    fn py_remove_invalid_edges(&mut self) -> usize {
        self.remove_invalid_edges()
    }

    #[pyo3(name = "edges_of")]
    fn py_edges_of(&self, satellite: SatelliteId) -> Vec<usize> {
        self.edges_of(satellite)
    }

    fn __repr__(&self) -> String {
        format!(
            "Instance(satellites={}, edges={})",
            self.satellites.len(),
            self.edges.len()
        )
    }
}

/// Attitude a satellite must hold to point its antenna, as a direction vector.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    #[pyo3(get)]
    pub x: f64,
    #[pyo3(get)]
    pub y: f64,
    #[pyo3(get)]
    pub z: f64,
}

impl Orientation {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Orientation {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

#[pymethods]
impl Orientation {
    #[new]
    fn py_new(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z)
    }

    fn __repr__(&self) -> String {
        format!("Orientation({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Orientations both endpoints of an edge must hold while it is serviced.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeOrientation {
    #[pyo3(get)]
    pub sat1: Orientation,
    #[pyo3(get)]
    pub sat2: Orientation,
}

impl EdgeOrientation {
    pub const fn new(sat1: Orientation, sat2: Orientation) -> Self {
        Self { sat1, sat2 }
    }
}

#[pymethods]
impl EdgeOrientation {
    fn __repr__(&self) -> String {
        format!("EdgeOrientation(sat1={:?}, sat2={:?})", self.sat1, self.sat2)
    }
}
