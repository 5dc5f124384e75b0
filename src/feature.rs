use glam::Vec2;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{CameraId, FeatureId};

/// One tracked feature: per camera, chronological parallel sequences of
/// raw pixel observations, normalized observations and timestamps. Raw
/// and timestamp entries are appended together by the tracker; the
/// normalized sequence is filled by the undistortion pipeline and
/// index-corresponds to the raw sequence after any completed run.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,
    pub uvs: HashMap<CameraId, Vec<Vec2>>,
    pub uvs_norm: HashMap<CameraId, Vec<Vec2>>,
    pub times: HashMap<CameraId, Vec<f64>>,
}

impl Feature {
    pub fn new(id: FeatureId) -> Feature {
        Feature {
            id,
            uvs: HashMap::new(),
            uvs_norm: HashMap::new(),
            times: HashMap::new(),
        }
    }

    /// Append one raw observation for `cam` at `timestamp`.
    pub fn push(&mut self, cam: CameraId, timestamp: f64, uv: Vec2) {
        self.uvs.entry(cam).or_default().push(uv);
        self.times.entry(cam).or_default().push(timestamp);
    }

    pub fn raw(&self, cam: CameraId) -> Option<&[Vec2]> {
        self.uvs.get(&cam).map(|v| v.as_slice())
    }

    pub fn normalized(&self, cam: CameraId) -> Option<&[Vec2]> {
        self.uvs_norm.get(&cam).map(|v| v.as_slice())
    }

    pub fn timestamps(&self, cam: CameraId) -> Option<&[f64]> {
        self.times.get(&cam).map(|v| v.as_slice())
    }

    /// Number of raw observations under `cam`.
    pub fn num_observations(&self, cam: CameraId) -> usize {
        self.uvs.get(&cam).map_or(0, |v| v.len())
    }

    /// Raw slice and normalized buffer for the same camera, for
    /// index-addressed writes. `None` when there is nothing to process.
    pub(crate) fn observation_buffers(
        &mut self,
        cam: CameraId,
    ) -> Option<(&[Vec2], &mut Vec<Vec2>)> {
        let raw = self.uvs.get(&cam).filter(|v| !v.is_empty())?;
        let norm = self.uvs_norm.entry(cam).or_default();
        Some((raw.as_slice(), norm))
    }
}

/// Concurrent feature map. Features are handed out as `Arc<Mutex<_>>`
/// clones, so a holder obtained before a removal stays valid while the
/// store itself reports the id as gone.
#[derive(Default)]
pub struct FeatureStore {
    features: RwLock<HashMap<FeatureId, Arc<Mutex<Feature>>>>,
}

impl FeatureStore {
    pub fn new() -> FeatureStore {
        FeatureStore::default()
    }

    /// Append an observation, creating the feature on first sighting.
    pub fn append(&self, id: FeatureId, cam: CameraId, timestamp: f64, uv: Vec2) {
        if let Some(feat) = self.lookup(id) {
            feat.lock().push(cam, timestamp, uv);
            return;
        }
        let feat = self
            .features
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(Feature::new(id))))
            .clone();
        feat.lock().push(cam, timestamp, uv);
    }

    pub fn lookup(&self, id: FeatureId) -> Option<Arc<Mutex<Feature>>> {
        self.features.read().get(&id).cloned()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.read().contains_key(&id)
    }

    /// Drop a lost feature. Returns whether the id was present.
    pub fn remove(&self, id: FeatureId) -> bool {
        self.features.write().remove(&id).is_some()
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.features.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.read().is_empty()
    }
}
