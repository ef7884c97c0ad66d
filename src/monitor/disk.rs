// Disk and pool usage: statvfs or ZFS per mount, joined with the disk inventory

use futures_util::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use super::fanout::gather_indexed;
use super::inventory::{DISKS_INI, Inventory, fetch_inventory};
use super::zfs::{ZfsCli, ZfsDatasets};
use super::HostFs;
use crate::aggregate::aggregate_disk_statuses;
use crate::models::{DiskStatus, DiskUsage, ParityStatus, PoolStatus};
use crate::units::{BYTE, SizeConverter, UnitError};

pub const ARRAY_POOL: &str = "array";
pub const CACHE_POOL: &str = "cache";
/// Inventory entries whose name contains this are parity disks.
pub const PARITY_LABEL: &str = "parity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    pub mounts: Vec<String>,
}

/// Bytes-to-display-unit conversion per pool: array and cache have their own, every
/// other pool shares one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolUnits {
    array: SizeConverter,
    cache: SizeConverter,
    other: SizeConverter,
}

impl PoolUnits {
    pub fn new(array: &str, cache: &str, other: &str) -> Result<Self, UnitError> {
        Ok(Self {
            array: SizeConverter::new(BYTE, array)?,
            cache: SizeConverter::new(BYTE, cache)?,
            other: SizeConverter::new(BYTE, other)?,
        })
    }

    pub fn for_pool(&self, name: &str) -> SizeConverter {
        match name {
            ARRAY_POOL => self.array,
            CACHE_POOL => self.cache,
            _ => self.other,
        }
    }
}

/// Space of the filesystem holding a path, as `(total, available)` bytes. Called on the
/// blocking pool.
pub trait FsUsage: Send + Sync {
    fn usage(&self, path: &Path) -> nix::Result<(u64, u64)>;
}

/// `statvfs(3)`: `blocks * frsize` total, `bavail * frsize` available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statvfs;

impl FsUsage for Statvfs {
    fn usage(&self, path: &Path) -> nix::Result<(u64, u64)> {
        let stat = nix::sys::statvfs::statvfs(path)?;
        let fragment = stat.fragment_size() as u64;
        let total = (stat.blocks() as u64).saturating_mul(fragment);
        let available = (stat.blocks_available() as u64).saturating_mul(fragment);
        Ok((total, available))
    }
}

pub struct DiskMonitor {
    host: HostFs,
    pools: Vec<Pool>,
    units: PoolUnits,
    check_zfs: bool,
    read_timeout: Option<Duration>,
    zfs: ZfsCli,
    fs: Arc<dyn FsUsage>,
}

impl DiskMonitor {
    pub fn new(
        host: HostFs,
        pools: Vec<Pool>,
        units: PoolUnits,
        check_zfs: bool,
        read_timeout: Option<Duration>,
    ) -> Self {
        if check_zfs {
            info!("Running in privileged mode, ZFS datasets will be checked");
        } else {
            info!("Not running in privileged mode, ZFS datasets will not be checked");
        }
        Self {
            host,
            pools,
            units,
            check_zfs,
            read_timeout,
            zfs: ZfsCli::default(),
            fs: Arc::new(Statvfs),
        }
    }

    pub fn with_zfs_cli(mut self, zfs: ZfsCli) -> Self {
        self.zfs = zfs;
        self
    }

    pub fn with_fs_usage(mut self, fs: Arc<dyn FsUsage>) -> Self {
        self.fs = fs;
        self
    }

    #[instrument(skip(self), fields(monitor = "disk", operation = "compute_disk_usage"))]
    pub async fn compute_disk_usage(&self) -> DiskUsage {
        let inventory = fetch_inventory(&self.host.path(DISKS_INI)).await;
        let datasets = if self.check_zfs {
            self.zfs.list_datasets().await
        } else {
            debug!("Disk ZFS dataset checking is disabled");
            ZfsDatasets::new()
        };

        let statuses = join_all(
            self.pools
                .iter()
                .map(|pool| self.pool_status(pool, &datasets, &inventory)),
        )
        .await;

        let mut usage = DiskUsage::default();
        for status in statuses {
            match status.name.as_str() {
                ARRAY_POOL => usage.array = status,
                CACHE_POOL => usage.cache = status,
                _ => usage.pools.push(status),
            }
        }
        usage.parity = parity_statuses(&inventory);
        usage
    }

    async fn pool_status(
        &self,
        pool: &Pool,
        datasets: &ZfsDatasets,
        inventory: &Inventory,
    ) -> PoolStatus {
        let bytes_to_unit = self.units.for_pool(&pool.name);
        let mut disks = gather_indexed(
            pool.mounts.clone(),
            self.read_timeout,
            |mount| {
                let dataset = datasets.get(&mount).cloned();
                let host = self.host.clone();
                let fs = Arc::clone(&self.fs);
                async move {
                    match dataset {
                        Some(dataset) => dataset.usage(&bytes_to_unit),
                        None => filesystem_usage(fs, &host, &mount, &bytes_to_unit).await,
                    }
                }
            },
            |i| DiskStatus::unavailable(&pool.mounts[i]),
        )
        .await;

        for disk in &mut disks {
            attach_inventory(disk, inventory);
        }
        PoolStatus {
            name: pool.name.clone(),
            total: aggregate_disk_statuses(&disks),
            disks,
        }
    }
}

/// Copies id, temperature and spin state from the inventory. A disk missing from the
/// inventory has no id, no temperature and is assumed spinning.
fn attach_inventory(disk: &mut DiskStatus, inventory: &Inventory) {
    let entry = inventory.get(&disk.name).cloned().unwrap_or_default();
    disk.is_spinning = entry.is_spinning();
    disk.id = entry.id;
    disk.temp = entry.temp;
}

fn parity_statuses(inventory: &Inventory) -> Vec<ParityStatus> {
    inventory
        .iter()
        .filter(|(name, _)| name.contains(PARITY_LABEL))
        .map(|(name, entry)| ParityStatus {
            name: name.clone(),
            temp: entry.temp,
            id: entry.id.clone(),
            is_spinning: entry.is_spinning(),
        })
        .collect()
}

async fn filesystem_usage(
    fs: Arc<dyn FsUsage>,
    host: &HostFs,
    mount: &str,
    bytes_to_unit: &SizeConverter,
) -> DiskStatus {
    let query = host.path(mount);
    debug!(path = %query.display(), mount, "Disk reading usage");
    let result = tokio::task::spawn_blocking(move || fs.usage(&query)).await;
    match result {
        Ok(Ok((total, free))) => {
            let status = DiskStatus::from_usage(
                mount,
                bytes_to_unit.convert(total as f64),
                bytes_to_unit.convert(free as f64),
            );
            if status.total <= 0.0 {
                debug!(mount, "Disk total size is 0, percentages reported as 0");
            }
            status
        }
        Ok(Err(e)) => {
            error!(mount, error = %e, "Disk cannot read usage");
            DiskStatus::unavailable(mount)
        }
        Err(e) => {
            error!(mount, error = %e, "Disk usage task failed");
            DiskStatus::unavailable(mount)
        }
    }
}
