// Memory usage from /proc/meminfo

use std::path::Path;
use tracing::{debug, error, instrument};

use super::{HostFs, SourceError, read_source};
use crate::models::MemoryStatus;
use crate::numeric::usage_percentages;
use crate::units::{KIBI, SizeConverter, UnitError};

const MEMINFO: &str = "/proc/meminfo";

/// Returns `(MemTotal, MemAvailable)` in KiB.
pub fn parse_meminfo(path: &Path, content: &str) -> Result<(f64, f64), SourceError> {
    let mut total = None;
    let mut available = None;
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let slot = match fields.next() {
            Some("MemTotal:") => &mut total,
            Some("MemAvailable:") => &mut available,
            _ => continue,
        };
        let raw = fields.next().unwrap_or("");
        let value = raw.parse::<f64>().map_err(|e| SourceError::Parse {
            path: path.to_path_buf(),
            detail: format!("{line:?}: {e}"),
        })?;
        *slot = Some(value);
        if total.is_some() && available.is_some() {
            break;
        }
    }
    match (total, available) {
        (Some(total), Some(available)) => Ok((total, available)),
        _ => Err(SourceError::Parse {
            path: path.to_path_buf(),
            detail: "MemTotal or MemAvailable missing".into(),
        }),
    }
}

/// Stateless: every call is a fresh read.
pub struct MemoryMonitor {
    host: HostFs,
    kibibytes_to_unit: SizeConverter,
}

impl MemoryMonitor {
    pub fn new(host: HostFs, unit: &str) -> Result<Self, UnitError> {
        Ok(Self {
            host,
            kibibytes_to_unit: SizeConverter::new(KIBI, unit)?,
        })
    }

    #[instrument(skip(self), fields(monitor = "memory", operation = "compute_memory_usage"))]
    pub async fn compute_memory_usage(&self) -> MemoryStatus {
        let path = self.host.path(MEMINFO);
        let parsed = match read_source(&path).await {
            Ok(content) => parse_meminfo(&path, &content),
            Err(e) => Err(e),
        };
        let (total_kib, available_kib) = match parsed {
            Ok(values) => values,
            Err(e) => {
                error!(error = %e, "Memory unable to compute usage");
                return MemoryStatus::default();
            }
        };

        let total = self.kibibytes_to_unit.convert(total_kib);
        let free = self.kibibytes_to_unit.convert(available_kib);
        let (used_percent, free_percent) = usage_percentages(free, total);
        let status = MemoryStatus {
            total,
            used: total - free,
            free,
            used_percent,
            free_percent,
        };
        debug!(total, free, "Memory status computed");
        status
    }
}
