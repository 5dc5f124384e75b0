//! Parallel undistortion offload.
//!
//! Batches of per-observation undistortion tasks are dispatched to a
//! dedicated thread pool. Every batch is registered with a staging ledger
//! before dispatch and released only after the synchronous join, mirroring
//! the track / wait / release discipline of offload runtimes: the caller
//! never observes partial results, and release never races the join.

use anyhow::Result;
use glam::Vec2;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::mem;

use crate::camera::{CameraCalibration, CameraIntrinsics, RadTanDistortion};
use crate::feature::Feature;
use crate::types::{CameraId, FeatureId};

#[derive(Debug, Clone)]
pub struct OffloadConfig {
    /// Worker threads in the pool. 0 means one per core.
    pub workers: usize,
    /// Batches that may be staged at once before the target counts as
    /// exhausted.
    pub max_inflight: usize,
}

impl Default for OffloadConfig {
    fn default() -> OffloadConfig {
        OffloadConfig {
            workers: 0,
            max_inflight: 256,
        }
    }
}

#[derive(Default)]
struct StageLedger {
    inflight: HashMap<(FeatureId, CameraId), usize>,
    bytes: usize,
}

/// Registration of one in-flight batch. Dropping the lease releases the
/// ledger entry on every exit path, including an unwinding one.
struct StageLease<'p> {
    pool: &'p OffloadPool,
    key: (FeatureId, CameraId),
}

impl Drop for StageLease<'_> {
    fn drop(&mut self) {
        let mut ledger = self.pool.ledger.lock();
        if let Some(bytes) = ledger.inflight.remove(&self.key) {
            ledger.bytes -= bytes;
        }
        log::trace!(
            "released staging for feature {} camera {}",
            self.key.0,
            self.key.1
        );
    }
}

/// Execution target for undistortion batches.
pub struct OffloadPool {
    pool: rayon::ThreadPool,
    max_inflight: usize,
    ledger: Mutex<StageLedger>,
}

impl OffloadPool {
    pub fn new(config: OffloadConfig) -> Result<OffloadPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("offload-{i}"))
            .build()?;
        Ok(OffloadPool {
            pool,
            max_inflight: config.max_inflight,
            ledger: Mutex::new(StageLedger::default()),
        })
    }

    /// Batches currently staged.
    pub fn staged_batches(&self) -> usize {
        self.ledger.lock().inflight.len()
    }

    /// Bytes of feature and calibration memory currently staged.
    pub fn staged_bytes(&self) -> usize {
        self.ledger.lock().bytes
    }

    fn stage(&self, feature: FeatureId, cam: CameraId, bytes: usize) -> StageLease<'_> {
        let mut ledger = self.ledger.lock();
        assert!(
            ledger.inflight.len() < self.max_inflight,
            "offload staging exhausted: {} batches in flight (limit {})",
            ledger.inflight.len(),
            self.max_inflight
        );
        assert!(
            !ledger.inflight.contains_key(&(feature, cam)),
            "feature {} camera {} already staged; serialize pipeline calls per (feature, camera) pair",
            feature,
            cam
        );
        ledger.inflight.insert((feature, cam), bytes);
        ledger.bytes += bytes;
        log::trace!("staged {} B for feature {} camera {}", bytes, feature, cam);
        StageLease {
            pool: self,
            key: (feature, cam),
        }
    }

    /// Compute normalized coordinates for every raw observation of
    /// `feat` under `cam`, writing them in place at the matching index.
    ///
    /// Blocks until the whole batch has completed; no partial result is
    /// observable before the call returns. With no raw observations the
    /// call is a no-op and stages nothing. Concurrent calls are safe on
    /// disjoint (feature, camera) pairs; the exclusive feature borrow
    /// rules out aliased calls, and a staged duplicate id pair is fatal.
    pub fn undistort_feature(
        &self,
        feat: &mut Feature,
        cam: CameraId,
        intrinsics: &CameraIntrinsics,
        distortion: &RadTanDistortion,
    ) {
        let id = feat.id;
        let Some((raw, norm)) = feat.observation_buffers(cam) else {
            return;
        };
        let staged = mem::size_of_val(raw)
            + mem::size_of::<CameraIntrinsics>()
            + mem::size_of::<RadTanDistortion>();
        let _lease = self.stage(id, cam, staged);

        let calib = CameraCalibration::new(*intrinsics, *distortion);
        norm.clear();
        norm.resize(raw.len(), Vec2::ZERO);
        self.pool.install(|| {
            raw.par_iter()
                .zip(norm.par_iter_mut())
                .for_each(|(uv, out)| {
                    *out = calib.undistort_pixel(*uv);
                });
        });
        log::debug!(
            "undistorted {} observations for feature {} camera {}",
            raw.len(),
            id,
            cam
        );
    }
}
