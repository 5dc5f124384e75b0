use anyhow::Result;
use clap::Parser;
use glam::Vec2;
use image::{GrayImage, Luma, RgbImage};
use indicatif::ProgressBar;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

use multicam_track::camera::{
    CameraCalibration, CameraIntrinsics, RadTanDistortion, RigCalibration,
};
use multicam_track::feature::FeatureStore;
use multicam_track::frame_cache::FrameCache;
use multicam_track::io::save_rig_calibration;
use multicam_track::offload::{OffloadConfig, OffloadPool};
use multicam_track::types::{CameraId, FeatureId};
use multicam_track::visualize::{TrackVisualizer, VizStyle};

#[derive(Parser)]
#[command(version, about)]
struct TrackDemoCli {
    /// output folder for rendered canvases and the rig file
    #[arg(short, long, default_value = "demo_output")]
    output: String,

    /// number of cameras in the synthetic rig
    #[arg(long, default_value_t = 2)]
    cameras: usize,

    /// number of frames to simulate
    #[arg(long, default_value_t = 90)]
    frames: usize,

    /// number of tracked features
    #[arg(long, default_value_t = 36)]
    features: usize,

    /// image width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// image height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// cap on history trail length
    #[arg(long)]
    max_trail: Option<usize>,

    /// RNG seed for trajectories
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

struct SyntheticTrack {
    id: FeatureId,
    pos: (f64, f64),
    vel: (f64, f64),
}

fn synthetic_tracks(n: usize, seed: u64) -> Vec<SyntheticTrack> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| SyntheticTrack {
            id: i as FeatureId,
            pos: (
                rng.random_range(-0.45..0.45),
                rng.random_range(-0.35..0.35),
            ),
            vel: (
                rng.random_range(-0.004..0.004),
                rng.random_range(-0.004..0.004),
            ),
        })
        .collect()
}

fn advance_tracks(tracks: &mut [SyntheticTrack]) {
    for track in tracks {
        track.pos.0 += track.vel.0;
        track.pos.1 += track.vel.1;
        if track.pos.0.abs() > 0.5 {
            track.vel.0 = -track.vel.0;
        }
        if track.pos.1.abs() > 0.4 {
            track.vel.1 = -track.vel.1;
        }
    }
}

fn synthetic_rig(cameras: usize, width: u32, height: u32) -> RigCalibration {
    let cams = (0..cameras)
        .map(|i| {
            let f = 420.0 + 8.0 * i as f64;
            CameraCalibration::new(
                CameraIntrinsics::new(f, f, width as f64 / 2.0, height as f64 / 2.0),
                RadTanDistortion::new(-0.28, 0.07, 1.9e-4, 1.8e-5),
            )
        })
        .collect();
    RigCalibration::new(cams)
}

fn synthetic_image(width: u32, height: u32, frame: usize, keypoints: &[Vec2]) -> GrayImage {
    let mut img = GrayImage::from_fn(width, height, |x, y| {
        Luma([(((x + y) / 4 + frame as u32 * 2) % 160) as u8 + 40])
    });
    for kp in keypoints {
        let (cx, cy) = (kp.x.round() as i32, kp.y.round() as i32);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (px, py) = (cx + dx, cy + dy);
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    img.put_pixel(px as u32, py as u32, Luma([255]));
                }
            }
        }
    }
    img
}

/// Tracker stand-in for one camera and one frame: project the synthetic
/// tracks, append the visible ones to the store and refresh the cache.
#[allow(clippy::too_many_arguments)]
fn produce_frame(
    store: &FeatureStore,
    cache: &FrameCache,
    rig: &RigCalibration,
    tracks: &[SyntheticTrack],
    cam: CameraId,
    t: f64,
    frame: usize,
    width: u32,
    height: u32,
) {
    let calib = rig.camera(cam);
    let parallax = 0.04 * cam.index() as f64;
    let mut keypoints = Vec::new();
    let mut ids = Vec::new();
    for track in tracks {
        let uv = calib.project_normalized(track.pos.0 - parallax, track.pos.1);
        if uv.x < 0.0 || uv.y < 0.0 || uv.x >= width as f32 || uv.y >= height as f32 {
            continue;
        }
        store.append(track.id, cam, t, uv);
        keypoints.push(uv);
        ids.push(track.id);
    }
    let image = synthetic_image(width, height, frame, &keypoints);
    cache.update(cam, image, keypoints, ids);
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = TrackDemoCli::parse();
    std::fs::create_dir_all(&cli.output)?;

    let rig = synthetic_rig(cli.cameras, cli.width, cli.height);
    save_rig_calibration(Path::new(&cli.output).join("rig.json"), &rig)?;

    let store = FeatureStore::new();
    let cache = FrameCache::new(cli.cameras);
    let pool = OffloadPool::new(OffloadConfig::default())?;
    let style = VizStyle {
        max_trail: cli.max_trail,
        ..VizStyle::default()
    };
    let mut visualizer = TrackVisualizer::new(style);
    // odd cameras act as the secondary half of a stereo pair
    let secondary: Vec<CameraId> = (1..cli.cameras).step_by(2).map(CameraId).collect();
    visualizer.set_secondary_cameras(&secondary);

    let mut tracks = synthetic_tracks(cli.features, cli.seed);
    let mut active_canvas = RgbImage::new(0, 0);
    let mut history_canvas = RgbImage::new(0, 0);

    log::info!(
        "simulating {} frames of {} features over {} cameras",
        cli.frames,
        cli.features,
        cli.cameras
    );
    let pb = ProgressBar::new(cli.frames as u64);
    for frame in 0..cli.frames {
        let t = frame as f64 / 20.0;
        advance_tracks(&mut tracks);

        // one producer per camera, as the tracker threads would run
        std::thread::scope(|s| {
            for cam_idx in 0..cli.cameras {
                let cam = CameraId(cam_idx);
                let (store, cache, rig, tracks) = (&store, &cache, &rig, &tracks);
                let (width, height) = (cli.width, cli.height);
                s.spawn(move || {
                    produce_frame(store, cache, rig, tracks, cam, t, frame, width, height);
                });
            }
        });

        for id in store.ids() {
            if let Some(feat) = store.lookup(id) {
                let mut feat = feat.lock();
                for cam_idx in 0..cli.cameras {
                    let cam = CameraId(cam_idx);
                    let calib = rig.camera(cam);
                    pool.undistort_feature(&mut feat, cam, &calib.intrinsics, &calib.distortion);
                }
            }
        }

        visualizer.render_active(&cache, &mut active_canvas);
        visualizer.render_history(&cache, &store, &mut history_canvas);
        active_canvas.save(Path::new(&cli.output).join(format!("active_{frame:04}.png")))?;
        history_canvas.save(Path::new(&cli.output).join(format!("history_{frame:04}.png")))?;
        pb.inc(1);
    }
    pb.finish();
    log::info!("wrote {} canvases to {}", 2 * cli.frames, cli.output);
    Ok(())
}
