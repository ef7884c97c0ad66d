// Full report served on each request

use serde::{Deserialize, Serialize};

use super::{
    CoreStatus, CpuStatus, DiskStatus, MemoryStatus, NetworkRate, ParityStatus, PoolStatus,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub array: Vec<DiskStatus>,
    pub cache: Vec<DiskStatus>,
    pub pools: Vec<PoolStatus>,
    pub parity: Vec<ParityStatus>,
    pub network: Vec<NetworkRate>,
    pub array_total: DiskStatus,
    pub cache_total: DiskStatus,
    pub network_total: NetworkRate,
    pub cpu: CpuStatus,
    pub cores: Vec<CoreStatus>,
    pub memory: MemoryStatus,
    pub error: Option<String>,
}

impl Report {
    /// Empty report carrying only an error message.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}
