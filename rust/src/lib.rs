//! Rust implementation of dynamic minimum scan cover scheduling.
//!
//! Plans when each communicable pair of satellites ("edge") is serviced, given
//! an availability model that says when an edge can next be served and how
//! both satellites must be oriented to do so.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod availability;
mod config;
pub mod logging;
mod models;
pub mod orientation;
mod scan_cover;
pub mod solver;

pub use availability::{
    filter_serviceable, AvailabilityModel, EdgeRef, FnAvailability, Window, WindowError,
    WindowTable,
};
pub use config::SolverConfig;
pub use models::{
    Edge, EdgeOrientation, Instance, InstanceError, Orientation, Satellite, SatelliteId,
};
pub use orientation::OrientationState;
pub use scan_cover::{ScanCover, ScanCoverError, ScheduledEvent};
pub use solver::{
    solve, solve_with_fallible_progress, CancelToken, GreedyNext, SolveOutcome, Solver,
};

/// Run the greedy next-available-edge solver on an instance.
///
/// The GIL is released while solving, so another Python thread can call
/// `cancel.cancel()`. `progress` is called with the fraction of committed
/// edges after each round; if it raises, the solve stops and the exception
/// is re-raised. `cancel` itself is never set by this function.
///
/// # Arguments
/// * `instance` - Satellites and edges to schedule
/// * `windows` - Communication windows per edge index
/// * `config` - Solver configuration (defaults if omitted)
/// * `cancel` - Token another thread may use to stop the solve
/// * `progress` - Callable taking a float in (0, 1]
///
/// # Returns
/// * The scan cover, or None if the solve was cancelled
#[pyfunction]
#[pyo3(signature = (instance, windows, config=None, cancel=None, progress=None))]
fn solve_greedy_next(
    py: Python<'_>,
    instance: PyRef<'_, Instance>,
    windows: PyRef<'_, WindowTable>,
    config: Option<SolverConfig>,
    cancel: Option<CancelToken>,
    progress: Option<PyObject>,
) -> PyResult<Option<ScanCover>> {
    let instance: &Instance = &instance;
    let windows: &WindowTable = &windows;
    let config = config.unwrap_or_default();
    let cancel = cancel.unwrap_or_default();

    let outcome = py.allow_threads(|| match progress {
        Some(callback) => {
            solve_with_fallible_progress(instance, windows, config, &cancel, |fraction| {
                Python::with_gil(|py| callback.call1(py, (fraction,)).map(|_| ()))
            })
        }
        None => Ok(GreedyNext::new(instance, windows)
            .with_config(config)
            .with_cancel_token(cancel.clone())
            .solve()),
    })?;

    Ok(outcome.into_scan_cover())
}

/// The dmsc.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Instance types
    m.add_class::<Satellite>()?;
    m.add_class::<Edge>()?;
    m.add_class::<Instance>()?;
    m.add_class::<Orientation>()?;
    m.add_class::<EdgeOrientation>()?;
    m.add_class::<WindowTable>()?;

    // Results
    m.add_class::<ScheduledEvent>()?;
    m.add_class::<ScanCover>()?;

    // Solver controls
    m.add_class::<SolverConfig>()?;
    m.add_class::<CancelToken>()?;

    m.add_function(wrap_pyfunction!(solve_greedy_next, m)?)?;

    Ok(())
}
