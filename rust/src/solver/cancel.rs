//! Cooperative cancellation shared between a solver and its caller.

use pyo3::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag. All clones observe the same signal.
///
/// A token made with [`CancelToken::linked`] also reports its parents'
/// cancellation, but cancelling it never touches them.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parents: Vec<Arc<AtomicBool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the solve stops at its next round.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.parents.iter().any(|p| p.load(Ordering::Acquire))
    }

    /// New token that is cancelled when either it or `self` is cancelled.
    pub fn linked(&self) -> Self {
        let mut parents = self.parents.clone();
        parents.push(Arc::clone(&self.flag));
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parents,
        }
    }

    /// Clear this token's own flag so it can be reused for another solve.
    /// Cancellation inherited from a parent stays visible.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[pymethods]
impl CancelToken {
    #[new]
    fn py_new() -> Self {
        Self::new()
    }

    #[pyo3(name = "cancel")]
    fn py_cancel(&self) {
        self.cancel();
    }

    #[pyo3(name = "is_cancelled")]
    fn py_is_cancelled(&self) -> bool {
        self.is_cancelled()
    }

    #[pyo3(name = "reset")]
    fn py_reset(&self) {
        self.reset();
    }

    fn __repr__(&self) -> String {
        format!("CancelToken(cancelled={})", self.is_cancelled())
    }
}
