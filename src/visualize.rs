//! Multi-camera track rendering.
//!
//! Both render modes snapshot shared state one camera lock at a time, so
//! a canvas is internally consistent per camera but never globally
//! synchronized against concurrent tracking.

use glam::Vec2;
use image::{GrayImage, Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::draw::{draw_label, gray_to_rgb};
use crate::feature::FeatureStore;
use crate::frame_cache::FrameCache;
use crate::types::CameraId;

const CAMERA_LABEL_POS: (i32, i32) = (30, 30);

/// Colors and geometry shared by both render modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizStyle {
    /// Filled keypoint marker; "recent" trail endpoint on primary cameras.
    pub marker_color: [u8; 3],
    /// Bounding box outline; "old" trail endpoint on primary cameras.
    pub outline_color: [u8; 3],
    pub label_color: [u8; 3],
    pub marker_radius: i32,
    pub box_half_extent: i32,
    pub label_scale: u32,
    /// Cap on trail length in history mode. `None` walks the full history.
    pub max_trail: Option<usize>,
    /// Draw the feature id at each trail head.
    pub label_features: bool,
}

impl Default for VizStyle {
    fn default() -> VizStyle {
        VizStyle {
            marker_color: [255, 0, 0],
            outline_color: [0, 0, 255],
            label_color: [0, 255, 0],
            marker_radius: 2,
            box_half_extent: 5,
            label_scale: 3,
            max_trail: None,
            label_features: false,
        }
    }
}

/// Renders tiled canvases of current detections or track histories from
/// the frame cache and feature store. Holds no image state of its own;
/// the caller owns the canvas across calls.
pub struct TrackVisualizer {
    style: VizStyle,
    secondary: HashSet<CameraId>,
}

impl TrackVisualizer {
    pub fn new(style: VizStyle) -> TrackVisualizer {
        TrackVisualizer {
            style,
            secondary: HashSet::new(),
        }
    }

    /// Mark the secondary halves of stereo pairs; their trail endpoint
    /// colors are swapped in history mode.
    pub fn set_secondary_cameras(&mut self, cams: &[CameraId]) {
        self.secondary = cams.iter().copied().collect();
    }

    pub fn style(&self) -> &VizStyle {
        &self.style
    }

    /// Draw current detections: a filled marker and a box outline per
    /// keypoint plus a camera label, one slot per camera.
    pub fn render_active(&self, cache: &FrameCache, canvas: &mut RgbImage) {
        let Some(layout) = SlotLayout::snapshot(cache) else {
            return;
        };
        let fresh = layout.reset_canvas_if_stale(canvas);
        for (slot, (cam, snapshot)) in layout.slots.iter().enumerate() {
            let x0 = layout.slot_width * slot as u32;
            let mut tile = layout.tile(canvas, fresh, x0, snapshot);
            // Narrower critical section than the snapshot: only the
            // current keypoint list is read under the lock.
            let keypoints = cache.snapshot_keypoints(*cam);
            for kp in &keypoints {
                self.draw_keypoint(&mut tile, *kp);
            }
            draw_label(
                &mut tile,
                CAMERA_LABEL_POS.0,
                CAMERA_LABEL_POS.1,
                self.style.label_scale,
                Rgb(self.style.label_color),
                &format!("CAM:{cam}"),
            );
            imageops::replace(canvas, &tile, x0 as i64, 0);
        }
        log::trace!(
            "rendered active canvas {}x{} from {} cameras",
            canvas.width(),
            canvas.height(),
            layout.slots.len()
        );
    }

    /// Draw track histories as fading trails. Ids that no longer resolve
    /// through the store, or features without observations under a
    /// camera, are skipped.
    pub fn render_history(&self, cache: &FrameCache, store: &FeatureStore, canvas: &mut RgbImage) {
        let Some(layout) = SlotLayout::snapshot(cache) else {
            return;
        };
        let fresh = layout.reset_canvas_if_stale(canvas);
        for (slot, (cam, snapshot)) in layout.slots.iter().enumerate() {
            let x0 = layout.slot_width * slot as u32;
            let mut tile = layout.tile(canvas, fresh, x0, snapshot);
            let swapped = self.secondary.contains(cam);
            for id in cache.snapshot_ids(*cam) {
                let Some(feat) = store.lookup(id) else {
                    continue;
                };
                let track: Vec<Vec2> = {
                    let feat = feat.lock();
                    match feat.raw(*cam) {
                        Some(obs) if !obs.is_empty() => obs.to_vec(),
                        _ => continue,
                    }
                };
                self.draw_trail(&mut tile, &track, swapped);
                if self.style.label_features {
                    let head = track[track.len() - 1];
                    draw_label(
                        &mut tile,
                        head.x.round() as i32 + 6,
                        head.y.round() as i32 - 6,
                        1,
                        Rgb(self.style.label_color),
                        &id.to_string(),
                    );
                }
            }
            imageops::replace(canvas, &tile, x0 as i64, 0);
        }
        log::trace!(
            "rendered history canvas {}x{} from {} cameras",
            canvas.width(),
            canvas.height(),
            layout.slots.len()
        );
    }

    fn draw_keypoint(&self, tile: &mut RgbImage, kp: Vec2) {
        let (cx, cy) = (kp.x.round() as i32, kp.y.round() as i32);
        draw_filled_circle_mut(
            tile,
            (cx, cy),
            self.style.marker_radius,
            Rgb(self.style.marker_color),
        );
        let half = self.style.box_half_extent;
        let side = (2 * half + 1) as u32;
        draw_hollow_rect_mut(
            tile,
            Rect::at(cx - half, cy - half).of_size(side, side),
            Rgb(self.style.outline_color),
        );
    }

    /// Walk the most-recent window of the track by sample age, oldest
    /// first so every marker repaints the segment end laid down beneath
    /// it, and connect each observation to its chronological successor.
    fn draw_trail(&self, tile: &mut RgbImage, track: &[Vec2], swapped: bool) {
        let len = track.len();
        let drawn = len.min(self.style.max_trail.unwrap_or(len));
        let (recent, old) = if swapped {
            (self.style.outline_color, self.style.marker_color)
        } else {
            (self.style.marker_color, self.style.outline_color)
        };
        for age in (0..drawn).rev() {
            let i = len - 1 - age;
            let color = trail_color(recent, old, age, len);
            if age > 0 {
                let next = track[i + 1];
                draw_line_segment_mut(tile, (track[i].x, track[i].y), (next.x, next.y), color);
            }
            draw_filled_circle_mut(
                tile,
                (track[i].x.round() as i32, track[i].y.round() as i32),
                self.style.marker_radius,
                color,
            );
        }
    }
}

/// Linear fade between the endpoint colors by sample age.
fn trail_color(recent: [u8; 3], old: [u8; 3], age: usize, total: usize) -> Rgb<u8> {
    let t = age as f32 / total as f32;
    Rgb(std::array::from_fn(|c| {
        let r = recent[c] as f32;
        let o = old[c] as f32;
        (r - (r - o) * t).round().clamp(0.0, 255.0) as u8
    }))
}

/// Per-camera image snapshots plus the tiled slot geometry derived from
/// them. Cameras without a cached image occupy no slot.
struct SlotLayout {
    slots: Vec<(CameraId, GrayImage)>,
    slot_width: u32,
    slot_height: u32,
}

impl SlotLayout {
    fn snapshot(cache: &FrameCache) -> Option<SlotLayout> {
        let mut slots = Vec::new();
        let (mut max_w, mut max_h) = (0, 0);
        for idx in 0..cache.num_cameras() {
            let cam = CameraId(idx);
            let image = cache.snapshot_image(cam);
            if image.width() == 0 || image.height() == 0 {
                continue;
            }
            max_w = max_w.max(image.width());
            max_h = max_h.max(image.height());
            slots.push((cam, image));
        }
        if slots.is_empty() {
            None
        } else {
            Some(SlotLayout {
                slots,
                slot_width: max_w,
                slot_height: max_h,
            })
        }
    }

    fn expected_dims(&self) -> (u32, u32) {
        (self.slot_width * self.slots.len() as u32, self.slot_height)
    }

    /// Replace a mismatched canvas with a fresh zeroed buffer. Returns
    /// whether the canvas was replaced; a kept canvas keeps whatever the
    /// caller drew on it previously.
    fn reset_canvas_if_stale(&self, canvas: &mut RgbImage) -> bool {
        let (w, h) = self.expected_dims();
        if canvas.width() != w || canvas.height() != h {
            *canvas = RgbImage::new(w, h);
            true
        } else {
            false
        }
    }

    /// Working tile for one slot: the converted snapshot on a fresh
    /// canvas, the existing slot content otherwise. Drawing into the
    /// tile and blitting it back keeps marks clipped to the slot.
    fn tile(&self, canvas: &RgbImage, fresh: bool, x0: u32, snapshot: &GrayImage) -> RgbImage {
        if fresh {
            gray_to_rgb(snapshot)
        } else {
            imageops::crop_imm(canvas, x0, 0, snapshot.width(), snapshot.height()).to_image()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_color_hits_recent_endpoint_at_age_zero() {
        let recent = [250, 40, 10];
        let old = [10, 160, 250];
        assert_eq!(trail_color(recent, old, 0, 4), Rgb(recent));
    }

    #[test]
    fn test_trail_color_fades_monotonically() {
        let recent = [250, 40, 10];
        let old = [10, 160, 250];
        let dist = |c: Rgb<u8>| {
            c.0.iter()
                .zip(recent.iter())
                .map(|(&a, &b)| (a as f32 - b as f32).powi(2))
                .sum::<f32>()
                .sqrt()
        };
        let mut last = -1.0f32;
        for age in 0..4 {
            let d = dist(trail_color(recent, old, age, 4));
            assert!(d > last, "fade must move away from the recent endpoint");
            last = d;
        }
    }
}
