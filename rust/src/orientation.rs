//! Per-satellite orientation bookkeeping during a solve.

use rustc_hash::FxHashMap;

use crate::models::{Edge, EdgeOrientation, Orientation, SatelliteId};

/// Last orientation assigned to each satellite.
///
/// Only records the orientation chosen when a satellite last took part in a
/// committed event; it is not required to agree with its other edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrientationState {
    by_satellite: FxHashMap<SatelliteId, Orientation>,
}

impl OrientationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the orientation pair for both endpoints, overwriting older entries.
    pub fn assign(&mut self, edge: &Edge, orientation: EdgeOrientation) {
        self.by_satellite.insert(edge.v1, orientation.sat1);
        self.by_satellite.insert(edge.v2, orientation.sat2);
    }

    #[inline]
    pub fn get(&self, satellite: SatelliteId) -> Option<Orientation> {
        self.by_satellite.get(&satellite).copied()
    }

    pub fn len(&self) -> usize {
        self.by_satellite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_satellite.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_satellite.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (SatelliteId, Orientation)> + '_ {
        self.by_satellite.iter().map(|(k, v)| (*k, *v))
    }
}
