use glam::Vec2;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::types::CameraId;

/// Iteration cap for the fixed-point distortion inverse.
pub const UNDISTORT_MAX_ITERATIONS: usize = 20;
/// Convergence threshold on the normalized-plane update between iterates.
pub const UNDISTORT_CONVERGENCE_EPS: f64 = 1e-12;

/// Pinhole intrinsics (focal lengths and principal point, pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> CameraIntrinsics {
        CameraIntrinsics { fx, fy, cx, cy }
    }

    /// Unit focal length, zero principal point. Pixel and normalized
    /// coordinates coincide under this mapping.
    pub fn identity() -> CameraIntrinsics {
        CameraIntrinsics::new(1.0, 1.0, 0.0, 0.0)
    }

    pub fn from_matrix(k: &na::Matrix3<f64>) -> CameraIntrinsics {
        CameraIntrinsics::new(k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)])
    }

    pub fn to_matrix(&self) -> na::Matrix3<f64> {
        let mut k = na::Matrix3::identity();
        k[(0, 0)] = self.fx;
        k[(1, 1)] = self.fy;
        k[(0, 2)] = self.cx;
        k[(1, 2)] = self.cy;
        k
    }

    pub fn pixel_to_normalized(&self, u: f64, v: f64) -> (f64, f64) {
        ((u - self.cx) / self.fx, (v - self.cy) / self.fy)
    }

    pub fn normalized_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (self.fx * x + self.cx, self.fy * y + self.cy)
    }
}

/// Radial-tangential distortion, 4 coefficients (k1, k2, p1, p2).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RadTanDistortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
}

impl RadTanDistortion {
    pub const NUM_COEFFS: usize = 4;

    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64) -> RadTanDistortion {
        RadTanDistortion { k1, k2, p1, p2 }
    }

    pub fn none() -> RadTanDistortion {
        RadTanDistortion::default()
    }

    pub fn from_vector(d: &na::Vector4<f64>) -> RadTanDistortion {
        RadTanDistortion::new(d[0], d[1], d[2], d[3])
    }

    pub fn to_vector(&self) -> na::Vector4<f64> {
        na::Vector4::new(self.k1, self.k2, self.p1, self.p2)
    }

    /// Forward model: ideal normalized point to distorted normalized point.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2;
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + dx, y * radial + dy)
    }

    /// Inverse model by fixed-point iteration, seeded at the distorted
    /// point. Stops on convergence or after [`UNDISTORT_MAX_ITERATIONS`];
    /// a non-convergent input yields the last finite iterate instead of
    /// an error, so degenerate boundary points cannot fail a batch.
    pub fn undistort(&self, xd: f64, yd: f64) -> (f64, f64) {
        let (mut x, mut y) = (xd, yd);
        for _ in 0..UNDISTORT_MAX_ITERATIONS {
            let r2 = x * x + y * y;
            let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2;
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
            let x_next = (xd - dx) / radial;
            let y_next = (yd - dy) / radial;
            if !x_next.is_finite() || !y_next.is_finite() {
                break;
            }
            let step = ((x_next - x).powi(2) + (y_next - y).powi(2)).sqrt();
            x = x_next;
            y = y_next;
            if step < UNDISTORT_CONVERGENCE_EPS {
                break;
            }
        }
        (x, y)
    }
}

/// Intrinsics plus distortion for one camera. Treated as immutable for
/// the duration of any pipeline call that reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    pub intrinsics: CameraIntrinsics,
    pub distortion: RadTanDistortion,
}

impl CameraCalibration {
    pub fn new(intrinsics: CameraIntrinsics, distortion: RadTanDistortion) -> CameraCalibration {
        CameraCalibration {
            intrinsics,
            distortion,
        }
    }

    /// Raw pixel observation to undistorted normalized coordinate.
    pub fn undistort_pixel(&self, uv: Vec2) -> Vec2 {
        let (x, y) = self
            .intrinsics
            .pixel_to_normalized(uv.x as f64, uv.y as f64);
        let (xn, yn) = self.distortion.undistort(x, y);
        Vec2::new(xn as f32, yn as f32)
    }

    /// Ideal normalized coordinate to the distorted pixel it images at.
    pub fn project_normalized(&self, x: f64, y: f64) -> Vec2 {
        let (xd, yd) = self.distortion.distort(x, y);
        let (u, v) = self.intrinsics.normalized_to_pixel(xd, yd);
        Vec2::new(u as f32, v as f32)
    }
}

/// Per-camera calibration for a whole rig, indexed by [`CameraId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigCalibration {
    pub cameras: Vec<CameraCalibration>,
}

impl RigCalibration {
    pub fn new(cameras: Vec<CameraCalibration>) -> RigCalibration {
        RigCalibration { cameras }
    }

    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    pub fn camera(&self, cam: CameraId) -> &CameraCalibration {
        self.cameras
            .get(cam.index())
            .unwrap_or_else(|| panic!("camera {} is not part of the calibrated rig", cam))
    }
}
