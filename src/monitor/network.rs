// Network throughput from /sys/class/net/<interface>/statistics counters

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::fanout::gather_indexed;
use super::{HostFs, SourceError, read_source};
use crate::models::NetworkRate;
use crate::numeric::round_two_decimals;
use crate::units::RateUnit;

/// One byte counter and the instant it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReading {
    pub bytes: u64,
    pub taken_at: Instant,
}

impl CounterReading {
    /// Bytes per second since `earlier`. 0 unless this reading is strictly later and the
    /// counter did not go backwards.
    pub fn rate_since(&self, earlier: &CounterReading) -> f64 {
        let elapsed = self
            .taken_at
            .saturating_duration_since(earlier.taken_at)
            .as_secs_f64();
        if elapsed <= 0.0 || self.bytes < earlier.bytes {
            return 0.0;
        }
        (self.bytes - earlier.bytes) as f64 / elapsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    pub name: String,
    pub rx: CounterReading,
    pub tx: CounterReading,
}

/// Rate between two snapshots of the same interface. MiB/s and Mbps are derived from the
/// byte rate separately and rounded separately.
pub fn network_rate(previous: &InterfaceSnapshot, current: &InterfaceSnapshot) -> NetworkRate {
    let rx = current.rx.rate_since(&previous.rx);
    let tx = current.tx.rate_since(&previous.tx);
    if rx == 0.0 && tx == 0.0 && current.rx.taken_at <= previous.rx.taken_at {
        warn!(
            interface = %current.name,
            "Network no time elapsed between snapshots, rate reported as 0"
        );
    }
    let present = |unit: RateUnit, rate: f64| round_two_decimals(unit.from_bytes_per_second(rate));
    NetworkRate {
        name: current.name.clone(),
        rx_mibs: present(RateUnit::MebibytesPerSecond, rx),
        tx_mibs: present(RateUnit::MebibytesPerSecond, tx),
        rx_mbps: present(RateUnit::MegabitsPerSecond, rx),
        tx_mbps: present(RateUnit::MegabitsPerSecond, tx),
    }
}

pub struct NetworkMonitor {
    host: HostFs,
    snapshots: Mutex<Vec<InterfaceSnapshot>>,
    read_timeout: Option<Duration>,
}

impl NetworkMonitor {
    /// Takes a baseline snapshot of every interface; the first rate is measured from here.
    pub async fn new(host: HostFs, interfaces: &[String], read_timeout: Option<Duration>) -> Self {
        let snapshots = gather_indexed(
            interfaces.to_vec(),
            read_timeout,
            |name| {
                let host = host.clone();
                async move { read_interface(&host, &name).await }
            },
            |i| unread_snapshot(&interfaces[i]),
        )
        .await;
        Self {
            host,
            snapshots: Mutex::new(snapshots),
            read_timeout,
        }
    }

    pub async fn interfaces(&self) -> Vec<String> {
        self.snapshots
            .lock()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Rates since the previous call, in configured interface order.
    #[instrument(skip(self), fields(monitor = "network", operation = "compute_network_rate"))]
    pub async fn compute_network_rate(&self) -> Vec<NetworkRate> {
        let mut snapshots = self.snapshots.lock().await;
        let previous = snapshots.clone();
        let host = &self.host;

        let samples = gather_indexed(
            previous.clone(),
            self.read_timeout,
            |prev| {
                let host = host.clone();
                async move {
                    let current = read_interface(&host, &prev.name).await;
                    let rate = network_rate(&prev, &current);
                    debug!(interface = %rate.name, rx_mibs = rate.rx_mibs, tx_mibs = rate.tx_mibs, "Network rate computed");
                    (current, rate)
                }
            },
            // A stalled interface keeps its old baseline and reports no traffic.
            |i| (previous[i].clone(), NetworkRate::idle(&previous[i].name)),
        )
        .await;

        let (next, rates): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        *snapshots = next;
        rates
    }
}

fn unread_snapshot(name: &str) -> InterfaceSnapshot {
    let now = Instant::now();
    let zero = CounterReading {
        bytes: 0,
        taken_at: now,
    };
    InterfaceSnapshot {
        name: name.to_string(),
        rx: zero,
        tx: zero,
    }
}

async fn read_interface(host: &HostFs, name: &str) -> InterfaceSnapshot {
    let (rx, tx) = tokio::join!(
        read_counter(host, name, "rx"),
        read_counter(host, name, "tx")
    );
    InterfaceSnapshot {
        name: name.to_string(),
        rx,
        tx,
    }
}

/// Reads one counter; an unreadable or malformed file reads as 0.
async fn read_counter(host: &HostFs, name: &str, direction: &str) -> CounterReading {
    let taken_at = Instant::now();
    let path = host.path(format!("/sys/class/net/{name}/statistics/{direction}_bytes"));
    let parsed = match read_source(&path).await {
        Ok(content) => content
            .trim()
            .parse::<u64>()
            .map_err(|e| SourceError::Parse {
                path: path.clone(),
                detail: format!("{:?}: {e}", content.trim()),
            }),
        Err(e) => Err(e),
    };
    let bytes = parsed.unwrap_or_else(|e| {
        warn!(interface = name, direction, error = %e, "Network cannot read counter");
        0
    });
    CounterReading { bytes, taken_at }
}
