// CPU load and temperature models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStatus {
    pub load_percent: f64,
    /// Degrees Celsius, 0 when no sensor is available.
    pub temp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreStatus {
    pub name: String,
    pub load_percent: f64,
}
