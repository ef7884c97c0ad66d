// Memory usage model

use serde::{Deserialize, Serialize};

/// Magnitudes are in the configured memory unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStatus {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub used_percent: f64,
    pub free_percent: f64,
}
