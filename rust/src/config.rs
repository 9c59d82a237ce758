//! Configuration types for the solvers.

use pyo3::prelude::*;

/// Configuration for a scan cover solve.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Stop scanning a round as soon as an edge is available at the current clock.
    ///
    /// No later edge can beat it, so disabling this only costs time.
    #[pyo3(get, set)]
    pub stop_at_current_time: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            verbosity: crate::logging::VERBOSITY_SILENT,
            stop_at_current_time: true,
        }
    }
}

#[pymethods]
impl SolverConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, stop_at_current_time=None))]
    fn new(verbosity: Option<u8>, stop_at_current_time: Option<bool>) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            stop_at_current_time: stop_at_current_time.unwrap_or(defaults.stop_at_current_time),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SolverConfig(verbosity={}, stop_at_current_time={})",
            self.verbosity, self.stop_at_current_time
        )
    }
}
