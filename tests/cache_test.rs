use glam::Vec2;
use image::GrayImage;
use multicam_track::frame_cache::FrameCache;
use multicam_track::types::CameraId;

#[test]
fn test_update_replaces_cell_as_a_unit() {
    let cache = FrameCache::new(2);
    assert_eq!(cache.num_cameras(), 2);

    let image = GrayImage::from_pixel(32, 24, image::Luma([90]));
    let kps = vec![Vec2::new(4.0, 5.0), Vec2::new(20.0, 11.0)];
    cache.update(CameraId(1), image, kps.clone(), vec![3, 8]);

    let snap = cache.snapshot_image(CameraId(1));
    assert_eq!((snap.width(), snap.height()), (32, 24));
    assert_eq!(snap.get_pixel(0, 0).0, [90]);
    assert_eq!(cache.snapshot_keypoints(CameraId(1)), kps);
    assert_eq!(cache.snapshot_ids(CameraId(1)), vec![3, 8]);

    // untouched camera keeps its empty cell
    let other = cache.snapshot_image(CameraId(0));
    assert_eq!((other.width(), other.height()), (0, 0));
    assert!(cache.snapshot_ids(CameraId(0)).is_empty());
}

#[test]
fn test_update_overwrites_previous_frame() {
    let cache = FrameCache::new(1);
    cache.update(
        CameraId(0),
        GrayImage::new(16, 16),
        vec![Vec2::new(1.0, 1.0)],
        vec![42],
    );
    cache.update(CameraId(0), GrayImage::new(16, 16), Vec::new(), Vec::new());
    assert!(cache.snapshot_keypoints(CameraId(0)).is_empty());
    assert!(cache.snapshot_ids(CameraId(0)).is_empty());
}

#[test]
#[should_panic(expected = "no registered cache cell")]
fn test_unregistered_camera_is_fatal() {
    let cache = FrameCache::new(2);
    cache.update(CameraId(2), GrayImage::new(8, 8), Vec::new(), Vec::new());
}

#[test]
#[should_panic(expected = "index-correspond")]
fn test_mismatched_keypoint_and_id_lists_are_fatal() {
    let cache = FrameCache::new(1);
    cache.update(
        CameraId(0),
        GrayImage::new(8, 8),
        vec![Vec2::new(1.0, 2.0)],
        vec![7, 9],
    );
}
