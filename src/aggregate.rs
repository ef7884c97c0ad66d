// Folding per-disk and per-interface statuses into one summary

use tracing::debug;

use crate::models::{DiskStatus, NetworkRate};
use crate::numeric::{average, common_prefix, usage_percentages};

/// Wildcard appended to the shared path of an aggregate ("/mnt/disk*").
pub const PATH_WILDCARD: &str = "*";

pub fn aggregate_disk_statuses(disks: &[DiskStatus]) -> DiskStatus {
    if disks.is_empty() {
        return DiskStatus::default();
    }

    let total = sum_of(disks, |d| d.total);
    let used = sum_of(disks, |d| d.used);
    let free = total - used;
    let (used_percent, free_percent) = usage_percentages(free, total);
    if total <= 0.0 {
        debug!(
            disks = disks.len(),
            "aggregate total is 0, percentages reported as 0"
        );
    }

    let paths: Vec<&str> = disks.iter().map(|d| d.path.as_str()).collect();
    let temps: Vec<f64> = disks
        .iter()
        .filter(|d| d.temp > 0)
        .map(|d| d.temp as f64)
        .collect();
    let ids: Vec<&str> = disks.iter().map(|d| d.id.as_str()).collect();

    DiskStatus {
        name: String::new(),
        path: common_prefix(&paths) + PATH_WILDCARD,
        total,
        used,
        free,
        used_percent,
        free_percent,
        temp: average(&temps) as u64,
        id: ids.join(" "),
        is_spinning: disks.iter().any(|d| d.is_spinning),
    }
}

pub fn aggregate_network_rates(rates: &[NetworkRate]) -> NetworkRate {
    let names: Vec<&str> = rates.iter().map(|r| r.name.as_str()).collect();
    NetworkRate {
        name: names.join(" "),
        rx_mibs: sum_of(rates, |r| r.rx_mibs),
        tx_mibs: sum_of(rates, |r| r.tx_mibs),
        rx_mbps: sum_of(rates, |r| r.rx_mbps),
        tx_mbps: sum_of(rates, |r| r.tx_mbps),
    }
}

// Starts from +0.0 so an empty list does not serialize as -0.0.
fn sum_of<T>(items: &[T], field: impl Fn(&T) -> f64) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + field(item))
}
