// Disk, pool and parity models

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::numeric::usage_percentages;

/// Magnitudes are in the unit configured for the disk's pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStatus {
    /// Inventory key: last segment of the mount path.
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "mount")]
    pub path: String,
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub used_percent: f64,
    pub free_percent: f64,
    pub temp: u64,
    #[serde(rename = "disk_id")]
    pub id: String,
    pub is_spinning: bool,
}

impl DiskStatus {
    /// Usage of `path` from its total and free space; `used = total - free`.
    pub fn from_usage(path: &str, total: f64, free: f64) -> Self {
        let (used_percent, free_percent) = usage_percentages(free, total);
        Self {
            name: base_name(path),
            path: path.to_string(),
            total,
            used: total - free,
            free,
            used_percent,
            free_percent,
            ..Default::default()
        }
    }

    /// Zeroed status for a mount whose usage could not be read.
    pub fn unavailable(path: &str) -> Self {
        Self {
            name: base_name(path),
            path: path.to_string(),
            ..Default::default()
        }
    }
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParityStatus {
    pub name: String,
    pub temp: u64,
    #[serde(rename = "disk_id")]
    pub id: String,
    pub is_spinning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub name: String,
    pub total: DiskStatus,
    pub disks: Vec<DiskStatus>,
}

/// Output of one disk sampling round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskUsage {
    pub array: PoolStatus,
    pub cache: PoolStatus,
    /// Every configured pool other than array and cache.
    pub pools: Vec<PoolStatus>,
    /// Sorted by name.
    pub parity: Vec<ParityStatus>,
}
