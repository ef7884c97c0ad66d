// Per-resource monitors: kernel counters in, presentation-ready statuses out

mod cpu;
mod disk;
mod fanout;
mod inventory;
mod memory;
mod network;
mod system;
mod zfs;

pub use cpu::{CpuMonitor, CpuSnapshot, CpuTicks, load_percent, locate_temp_file, parse_proc_stat};
pub use disk::{ARRAY_POOL, CACHE_POOL, DiskMonitor, FsUsage, PARITY_LABEL, Pool, PoolUnits, Statvfs};
pub use inventory::{DISKS_INI, Inventory, InventoryEntry, fetch_inventory, parse_inventory};
pub use memory::{MemoryMonitor, parse_meminfo};
pub use network::{CounterReading, InterfaceSnapshot, NetworkMonitor, network_rate};
pub use system::SystemMonitor;
pub use zfs::{ZfsCli, ZfsDataset, ZfsDatasets, parse_zfs_list};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading one host source. Monitors log these and fall back to zeroed values.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },
    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },
}

/// Root under which host paths are resolved (`HOSTFS_PREFIX` when running in a container).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFs {
    root: Option<PathBuf>,
}

impl HostFs {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// `path` as seen from inside the host root.
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.root {
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
            None => path.to_path_buf(),
        }
    }

    /// Glob `pattern` (an absolute host path pattern) under the host root. The root is
    /// matched literally.
    pub fn glob_pattern(&self, pattern: &str) -> String {
        match self.root() {
            Some(root) => {
                let root = glob::Pattern::escape(&root.to_string_lossy());
                format!(
                    "{}/{}",
                    root.trim_end_matches('/'),
                    pattern.trim_start_matches('/')
                )
            }
            None => pattern.to_string(),
        }
    }
}

pub(crate) async fn read_source(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
}
