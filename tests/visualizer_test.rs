use glam::Vec2;
use image::{GrayImage, Luma, Rgb, RgbImage};
use multicam_track::feature::FeatureStore;
use multicam_track::frame_cache::FrameCache;
use multicam_track::types::CameraId;
use multicam_track::visualize::{TrackVisualizer, VizStyle};

const CAM0: CameraId = CameraId(0);

fn trail_style() -> VizStyle {
    VizStyle {
        marker_color: [250, 40, 10],
        outline_color: [10, 160, 250],
        ..VizStyle::default()
    }
}

/// Cache with one zeroed 64x48 camera holding a three-sample track for
/// feature 7 plus a stale id 99 that no longer resolves.
fn history_fixture() -> (FrameCache, FeatureStore) {
    let store = FeatureStore::new();
    for (k, uv) in [
        Vec2::new(8.0, 8.0),
        Vec2::new(16.0, 16.0),
        Vec2::new(24.0, 24.0),
    ]
    .iter()
    .enumerate()
    {
        store.append(7, CAM0, k as f64 * 0.05, *uv);
    }
    let cache = FrameCache::new(1);
    cache.update(
        CAM0,
        GrayImage::new(64, 48),
        vec![Vec2::new(24.0, 24.0), Vec2::new(50.0, 40.0)],
        vec![7, 99],
    );
    (cache, store)
}

fn px(canvas: &RgbImage, x: u32, y: u32) -> [u8; 3] {
    canvas.get_pixel(x, y).0
}

#[test]
fn test_render_on_empty_cache_is_noop() {
    let cache = FrameCache::new(2);
    let store = FeatureStore::new();
    let viz = TrackVisualizer::new(VizStyle::default());
    let mut canvas = RgbImage::from_pixel(5, 5, Rgb([7, 7, 7]));
    let sentinel = canvas.as_raw().clone();

    viz.render_active(&cache, &mut canvas);
    assert_eq!(*canvas.as_raw(), sentinel);
    viz.render_history(&cache, &store, &mut canvas);
    assert_eq!(*canvas.as_raw(), sentinel);
}

#[test]
fn test_active_mode_draws_markers_boxes_and_label() {
    let cache = FrameCache::new(1);
    cache.update(
        CAM0,
        GrayImage::from_pixel(64, 48, Luma([20])),
        vec![Vec2::new(10.0, 10.0), Vec2::new(30.0, 20.0)],
        vec![1, 2],
    );
    let viz = TrackVisualizer::new(VizStyle::default());
    let mut canvas = RgbImage::new(0, 0);
    viz.render_active(&cache, &mut canvas);

    assert_eq!((canvas.width(), canvas.height()), (64, 48));
    // filled markers at both keypoints
    assert_eq!(px(&canvas, 10, 10), [255, 0, 0]);
    assert_eq!(px(&canvas, 30, 20), [255, 0, 0]);
    // box outline corners at center minus the half extent
    assert_eq!(px(&canvas, 5, 5), [0, 0, 255]);
    assert_eq!(px(&canvas, 25, 15), [0, 0, 255]);
    // second column of the C in "CAM:0" at scale 3 from (30, 30)
    assert_eq!(px(&canvas, 33, 30), [0, 255, 0]);
    // untouched background comes from the grayscale snapshot
    assert_eq!(px(&canvas, 63, 47), [20, 20, 20]);
}

#[test]
fn test_active_mode_keeps_matching_canvas_content() {
    let cache = FrameCache::new(1);
    cache.update(
        CAM0,
        GrayImage::from_pixel(64, 48, Luma([20])),
        vec![Vec2::new(40.0, 10.0)],
        vec![5],
    );
    let viz = TrackVisualizer::new(VizStyle::default());
    let mut canvas = RgbImage::from_pixel(64, 48, Rgb([9, 9, 9]));
    viz.render_active(&cache, &mut canvas);

    // matching dimensions reuse the canvas instead of re-blitting the
    // camera image, so prior content survives outside the new marks
    assert_eq!(px(&canvas, 0, 47), [9, 9, 9]);
    assert_eq!(px(&canvas, 63, 47), [9, 9, 9]);
    assert_eq!(px(&canvas, 40, 10), [255, 0, 0]);
    assert_eq!(px(&canvas, 35, 5), [0, 0, 255]);
    assert_eq!(px(&canvas, 33, 30), [0, 255, 0]);
}

#[test]
fn test_canvas_tiles_cameras_by_max_dims() {
    let cache = FrameCache::new(2);
    cache.update(
        CAM0,
        GrayImage::from_pixel(64, 48, Luma([10])),
        Vec::new(),
        Vec::new(),
    );
    cache.update(
        CameraId(1),
        GrayImage::from_pixel(32, 40, Luma([30])),
        Vec::new(),
        Vec::new(),
    );
    let viz = TrackVisualizer::new(VizStyle::default());
    let mut canvas = RgbImage::new(0, 0);
    viz.render_active(&cache, &mut canvas);

    // slots are sized to the largest image; smaller tiles leave zeroed
    // margins inside their slot
    assert_eq!((canvas.width(), canvas.height()), (128, 48));
    assert_eq!(px(&canvas, 0, 0), [10, 10, 10]);
    assert_eq!(px(&canvas, 63, 0), [10, 10, 10]);
    assert_eq!(px(&canvas, 64, 0), [30, 30, 30]);
    assert_eq!(px(&canvas, 104, 0), [0, 0, 0]);
    assert_eq!(px(&canvas, 64, 45), [0, 0, 0]);
    assert_eq!(px(&canvas, 127, 47), [0, 0, 0]);
}

#[test]
fn test_history_mode_fades_trail_and_skips_unresolved_ids() {
    let (cache, store) = history_fixture();
    let viz = TrackVisualizer::new(trail_style());
    let mut canvas = RgbImage::new(0, 0);
    viz.render_history(&cache, &store, &mut canvas);

    assert_eq!((canvas.width(), canvas.height()), (64, 48));
    // newest sample carries the exact marker color, older samples fade
    // toward the outline color by age over the track length
    assert_eq!(px(&canvas, 24, 24), [250, 40, 10]);
    assert_eq!(px(&canvas, 16, 16), [170, 80, 90]);
    assert_eq!(px(&canvas, 8, 8), [90, 120, 170]);
    // id 99 resolves to no feature, so its keypoint stays unmarked
    assert_eq!(px(&canvas, 50, 40), [0, 0, 0]);
    assert_eq!(px(&canvas, 40, 40), [0, 0, 0]);
}

#[test]
fn test_secondary_camera_swaps_trail_endpoints() {
    let (cache, store) = history_fixture();
    let mut viz = TrackVisualizer::new(trail_style());
    viz.set_secondary_cameras(&[CAM0]);
    let mut canvas = RgbImage::new(0, 0);
    viz.render_history(&cache, &store, &mut canvas);

    assert_eq!(px(&canvas, 24, 24), [10, 160, 250]);
    assert_eq!(px(&canvas, 8, 8), [170, 80, 90]);
}

#[test]
fn test_history_trail_cap_limits_window() {
    let (cache, store) = history_fixture();
    let style = VizStyle {
        max_trail: Some(2),
        ..trail_style()
    };
    let viz = TrackVisualizer::new(style);
    let mut canvas = RgbImage::new(0, 0);
    viz.render_history(&cache, &store, &mut canvas);

    // only the two newest samples are drawn; fade still runs over the
    // full track length
    assert_eq!(px(&canvas, 24, 24), [250, 40, 10]);
    assert_eq!(px(&canvas, 16, 16), [170, 80, 90]);
    assert_eq!(px(&canvas, 8, 8), [0, 0, 0]);
}

#[test]
fn test_history_skips_features_without_camera_observations() {
    let store = FeatureStore::new();
    store.append(7, CameraId(1), 0.0, Vec2::new(24.0, 24.0));
    let cache = FrameCache::new(1);
    cache.update(
        CAM0,
        GrayImage::new(64, 48),
        vec![Vec2::new(24.0, 24.0)],
        vec![7],
    );
    let viz = TrackVisualizer::new(trail_style());
    let mut canvas = RgbImage::new(0, 0);
    viz.render_history(&cache, &store, &mut canvas);

    assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0]));
}

#[test]
fn test_history_feature_labels_draw_at_trail_head() {
    let (cache, store) = history_fixture();
    let style = VizStyle {
        label_features: true,
        ..trail_style()
    };
    let viz = TrackVisualizer::new(style);
    let mut canvas = RgbImage::new(0, 0);
    viz.render_history(&cache, &store, &mut canvas);

    // the id glyph sits offset from the head at unit scale; the top-left
    // pixel of the 7 is lit
    assert_eq!(px(&canvas, 30, 18), [0, 255, 0]);
}
