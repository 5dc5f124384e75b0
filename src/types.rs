use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a camera in a fixed rig. Ids are assigned densely from zero
/// when the rig registries (frame cache, calibration) are constructed, and
/// referencing an id outside that range is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub usize);

impl CameraId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a tracked feature, assigned by the tracker.
pub type FeatureId = u64;
