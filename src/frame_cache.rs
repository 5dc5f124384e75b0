use glam::Vec2;
use image::GrayImage;
use parking_lot::Mutex;

use crate::types::{CameraId, FeatureId};

/// Latest tracker output for one camera. The keypoint and id lists
/// index-correspond whenever the cell is observed under its lock.
#[derive(Debug)]
pub struct CameraCell {
    pub image: GrayImage,
    pub keypoints: Vec<Vec2>,
    pub ids: Vec<FeatureId>,
}

impl CameraCell {
    fn empty() -> CameraCell {
        CameraCell {
            image: GrayImage::new(0, 0),
            keypoints: Vec::new(),
            ids: Vec::new(),
        }
    }
}

/// Fixed registry of per-camera cells, one mutex per camera, sized once
/// at construction. Referencing a camera outside the registry is a
/// configuration error and panics.
pub struct FrameCache {
    cells: Vec<Mutex<CameraCell>>,
}

impl FrameCache {
    pub fn new(num_cameras: usize) -> FrameCache {
        FrameCache {
            cells: (0..num_cameras).map(|_| Mutex::new(CameraCell::empty())).collect(),
        }
    }

    pub fn num_cameras(&self) -> usize {
        self.cells.len()
    }

    /// Producer entry point: replace the cell contents for `cam` as a
    /// unit. Keypoints and ids must index-correspond.
    pub fn update(&self, cam: CameraId, image: GrayImage, keypoints: Vec<Vec2>, ids: Vec<FeatureId>) {
        assert_eq!(
            keypoints.len(),
            ids.len(),
            "keypoint and id lists for camera {} must index-correspond",
            cam
        );
        let mut cell = self.cell(cam).lock();
        cell.image = image;
        cell.keypoints = keypoints;
        cell.ids = ids;
    }

    pub(crate) fn cell(&self, cam: CameraId) -> &Mutex<CameraCell> {
        self.cells
            .get(cam.index())
            .unwrap_or_else(|| panic!("camera {} has no registered cache cell", cam))
    }

    /// Clone the cached image under the camera's lock and release it.
    pub fn snapshot_image(&self, cam: CameraId) -> GrayImage {
        self.cell(cam).lock().image.clone()
    }

    /// Clone the current keypoint list under the camera's lock.
    pub fn snapshot_keypoints(&self, cam: CameraId) -> Vec<Vec2> {
        self.cell(cam).lock().keypoints.clone()
    }

    /// Clone the current tracked-id list under the camera's lock.
    pub fn snapshot_ids(&self, cam: CameraId) -> Vec<FeatureId> {
        self.cell(cam).lock().ids.clone()
    }
}
