// All monitors behind one entry point that builds the per-request report

use std::time::Duration;
use tracing::{debug, instrument};

use super::{CpuMonitor, DiskMonitor, HostFs, MemoryMonitor, NetworkMonitor, Pool, PoolUnits};
use crate::aggregate::aggregate_network_rates;
use crate::config::{AppConfig, HostEnv};
use crate::models::Report;

pub struct SystemMonitor {
    cpu: CpuMonitor,
    memory: MemoryMonitor,
    network: NetworkMonitor,
    disk: DiskMonitor,
}

impl SystemMonitor {
    pub fn new(
        cpu: CpuMonitor,
        memory: MemoryMonitor,
        network: NetworkMonitor,
        disk: DiskMonitor,
    ) -> Self {
        Self {
            cpu,
            memory,
            network,
            disk,
        }
    }

    /// Builds every monitor from configuration. Takes the first CPU and network baselines
    /// and, unless a sensor is configured, runs the CPU temperature heuristic.
    pub async fn from_config(config: &AppConfig, env: &HostEnv) -> anyhow::Result<Self> {
        let host = HostFs::new(env.hostfs_prefix.clone());
        let monitoring = &config.monitoring;
        let read_timeout = monitoring.read_timeout_ms.map(Duration::from_millis);

        let units = PoolUnits::new(&config.units.array, &config.units.cache, &config.units.pools)?;
        let pools = config
            .disks
            .iter()
            .map(|(name, mounts)| Pool {
                name: name.clone(),
                mounts: mounts.clone(),
            })
            .collect();
        let memory = MemoryMonitor::new(host.clone(), &config.units.memory)?;
        let disk = DiskMonitor::new(host.clone(), pools, units, env.zfs_ok, read_timeout);
        let network = NetworkMonitor::new(host.clone(), &monitoring.networks, read_timeout).await;
        let cpu = CpuMonitor::new(
            host,
            monitoring.cpu_temp.clone(),
            Duration::from_secs(monitoring.cpu_stress_secs),
        )
        .await;

        Ok(Self::new(cpu, memory, network, disk))
    }

    /// Samples every monitor concurrently. Monitors only serialize with themselves.
    #[instrument(skip(self), fields(operation = "report"))]
    pub async fn report(&self) -> Report {
        let ((cpu, cores), memory, network, disks) = tokio::join!(
            self.cpu.compute_cpu_status(),
            self.memory.compute_memory_usage(),
            self.network.compute_network_rate(),
            self.disk.compute_disk_usage(),
        );
        let network_total = aggregate_network_rates(&network);
        debug!(
            pools = disks.pools.len(),
            interfaces = network.len(),
            cores = cores.len(),
            "Report built"
        );

        Report {
            array: disks.array.disks,
            cache: disks.cache.disks,
            pools: disks.pools,
            parity: disks.parity,
            network,
            array_total: disks.array.total,
            cache_total: disks.cache.total,
            network_total,
            cpu,
            cores,
            memory,
            error: None,
        }
    }
}
