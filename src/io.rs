use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

use crate::camera::RigCalibration;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: impl AsRef<Path>, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path.as_ref(), j)
        .with_context(|| format!("failed to write {}", output_path.as_ref().display()))?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let contents = std::fs::read_to_string(file_path.as_ref())
        .with_context(|| format!("failed to read {}", file_path.as_ref().display()))?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn save_rig_calibration(output_path: impl AsRef<Path>, rig: &RigCalibration) -> Result<()> {
    object_to_json(output_path, rig)
}

pub fn load_rig_calibration(file_path: impl AsRef<Path>) -> Result<RigCalibration> {
    object_from_json(file_path)
}
