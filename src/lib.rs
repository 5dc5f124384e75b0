//! Concurrent multi-camera feature tracking utilities: a thread-safe
//! observation store, a parallel undistortion offload pipeline with
//! staging accounting, and a tiled active/history track visualizer.

pub mod camera;
pub mod draw;
pub mod feature;
pub mod frame_cache;
pub mod io;
pub mod offload;
pub mod types;
pub mod visualize;

pub use camera::{CameraCalibration, CameraIntrinsics, RadTanDistortion, RigCalibration};
pub use feature::{Feature, FeatureStore};
pub use frame_cache::FrameCache;
pub use offload::{OffloadConfig, OffloadPool};
pub use types::{CameraId, FeatureId};
pub use visualize::{TrackVisualizer, VizStyle};
