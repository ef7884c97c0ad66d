// CPU load from /proc/stat tick deltas, temperature from a located hwmon sensor

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{HostFs, SourceError, read_source};
use crate::models::{CoreStatus, CpuStatus};

const PROC_STAT: &str = "/proc/stat";
const HWMON_TEMP_PATTERN: &str = "/sys/class/hwmon/hwmon*/temp1_input";
/// Position of the idle column after the `cpuN` label.
const IDLE_FIELD: usize = 3;

/// Idle and total jiffies of one stat line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub idle: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub aggregate: CpuTicks,
    /// `(name, ticks)` for each numbered core in file order.
    pub cores: Vec<(String, CpuTicks)>,
}

/// Load between two readings of the same line: `(1 - Δidle/Δtotal) * 100`, 0 when no ticks elapsed.
pub fn load_percent(previous: CpuTicks, current: CpuTicks) -> f64 {
    let delta_total = current.total.saturating_sub(previous.total);
    if delta_total == 0 {
        return 0.0;
    }
    let delta_idle = current.idle.saturating_sub(previous.idle);
    ((1.0 - delta_idle as f64 / delta_total as f64) * 100.0).clamp(0.0, 100.0)
}

/// Parses the `cpu` and `cpuN` lines of /proc/stat. Unparseable columns count as 0.
pub fn parse_proc_stat(content: &str) -> CpuSnapshot {
    let mut snapshot = CpuSnapshot::default();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            continue;
        };
        if !name.starts_with("cpu") {
            continue;
        }
        let ticks = parse_ticks(name, fields);
        if name == "cpu" {
            snapshot.aggregate = ticks;
        } else {
            snapshot.cores.push((name.to_string(), ticks));
        }
    }
    snapshot
}

fn parse_ticks<'a>(name: &str, fields: impl Iterator<Item = &'a str>) -> CpuTicks {
    let mut ticks = CpuTicks::default();
    for (i, field) in fields.enumerate() {
        let value = field.parse::<u64>().unwrap_or_else(|e| {
            warn!(line = name, field, error = %e, "CPU cannot parse stat column");
            0
        });
        ticks.total = ticks.total.saturating_add(value);
        if i == IDLE_FIELD {
            ticks.idle = value;
        }
    }
    ticks
}

pub struct CpuMonitor {
    host: HostFs,
    snapshot: Mutex<CpuSnapshot>,
    temp_path: Option<PathBuf>,
}

impl CpuMonitor {
    /// Takes the baseline snapshot and resolves the temperature sensor. When `cpu_temp` is
    /// `None` this runs the stress heuristic for `stress` on every logical core.
    pub async fn new(host: HostFs, cpu_temp: Option<PathBuf>, stress: Duration) -> Self {
        let snapshot = read_snapshot(&host).await;
        let temp_path = locate_temp_file(&host, cpu_temp, stress).await;
        Self {
            host,
            snapshot: Mutex::new(snapshot),
            temp_path,
        }
    }

    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }

    #[instrument(skip(self), fields(monitor = "cpu", operation = "compute_cpu_status"))]
    pub async fn compute_cpu_status(&self) -> (CpuStatus, Vec<CoreStatus>) {
        let mut previous = self.snapshot.lock().await;
        let current = read_snapshot(&self.host).await;

        if current.aggregate.total == previous.aggregate.total {
            warn!("CPU no ticks elapsed between snapshots, load reported as 0");
        }
        let status = CpuStatus {
            load_percent: load_percent(previous.aggregate, current.aggregate),
            temp: self.temperature().await,
        };
        let cores = current
            .cores
            .iter()
            .enumerate()
            .map(|(i, (name, ticks))| CoreStatus {
                name: name.clone(),
                load_percent: previous
                    .cores
                    .get(i)
                    .filter(|(prev_name, _)| prev_name == name)
                    .map_or(0.0, |(_, prev)| load_percent(*prev, *ticks)),
            })
            .collect();

        *previous = current;
        debug!(load_percent = status.load_percent, temp = status.temp, "CPU status computed");
        (status, cores)
    }

    async fn temperature(&self) -> i64 {
        let Some(path) = &self.temp_path else {
            return 0;
        };
        match read_temp(path).await {
            Ok(temp) => temp,
            Err(e) => {
                warn!(error = %e, "CPU temperature unavailable");
                0
            }
        }
    }
}

async fn read_snapshot(host: &HostFs) -> CpuSnapshot {
    let path = host.path(PROC_STAT);
    match read_source(&path).await {
        Ok(content) => parse_proc_stat(&content),
        Err(e) => {
            warn!(error = %e, "CPU cannot read stat source");
            CpuSnapshot::default()
        }
    }
}

/// Reads a millidegree sensor file as whole degrees Celsius.
async fn read_temp(path: &Path) -> Result<i64, SourceError> {
    let content = read_source(path).await?;
    let line = content.lines().next().unwrap_or("").trim();
    line.parse::<i64>()
        .map(|milli| milli / 1000)
        .map_err(|e| SourceError::Parse {
            path: path.to_path_buf(),
            detail: format!("{line:?}: {e}"),
        })
}

/// Picks the CPU temperature file. A configured path is used as is; otherwise every hwmon
/// `temp1_input` is read before and after a short all-core busy loop and the one that rose
/// the most wins. `None` disables temperature reporting.
pub async fn locate_temp_file(
    host: &HostFs,
    configured: Option<PathBuf>,
    stress: Duration,
) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path);
    }
    info!(
        "CPU temperature file not configured, attempting to locate it (set monitoring.cpu_temp to skip this)"
    );

    let pattern = host.glob_pattern(HWMON_TEMP_PATTERN);
    let candidates: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "CPU invalid sensor pattern");
            Vec::new()
        }
    };

    let mut baseline = Vec::with_capacity(candidates.len());
    for path in candidates {
        match read_temp(&path).await {
            Ok(temp) => baseline.push((path, temp)),
            Err(e) => debug!(error = %e, "CPU skipping sensor candidate"),
        }
    }
    if baseline.is_empty() {
        warn!("CPU no temperature sensor candidates found");
        return None;
    }

    stress_cpu(stress).await;

    let mut best: Option<(PathBuf, i64, i64)> = None;
    for (path, initial) in baseline {
        let final_temp = match read_temp(&path).await {
            Ok(temp) => temp,
            Err(e) => {
                debug!(error = %e, "CPU sensor candidate unreadable after stress");
                continue;
            }
        };
        let delta = final_temp - initial;
        debug!(path = %path.display(), initial, final_temp, delta, "CPU sensor candidate");
        if delta > 0 && best.as_ref().is_none_or(|(_, _, best_delta)| delta > *best_delta) {
            best = Some((path, initial, delta));
        }
    }

    match best {
        Some((path, initial, delta)) => {
            info!(path = %path.display(), initial, delta, "CPU temperature file located");
            Some(path)
        }
        None => {
            warn!("CPU unable to find a temperature file that reacts to load");
            None
        }
    }
}

async fn stress_cpu(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let threads = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    info!(
        duration_ms = duration.as_millis() as u64,
        threads, "CPU running a short stress test to locate the temperature sensor"
    );
    let result = tokio::task::spawn_blocking(move || {
        let end = Instant::now() + duration;
        std::thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    let mut acc: u64 = 0;
                    while Instant::now() < end {
                        for i in 0..100_000u64 {
                            acc = std::hint::black_box(acc.wrapping_add(i.wrapping_mul(i)));
                        }
                    }
                    acc
                });
            }
        });
    })
    .await;
    if let Err(e) = result {
        warn!(error = %e, "CPU stress test task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  100 0 100 800 0 0 0 0 0 0
cpu0 50 0 50 400 0 0 0 0 0 0
cpu1 50 0 50 400 0 0 0 0 0 0
intr 12345 0 0
ctxt 999
";

    #[test]
    fn parses_aggregate_and_cores() {
        let s = parse_proc_stat(STAT);
        assert_eq!(s.aggregate, CpuTicks { idle: 800, total: 1000 });
        assert_eq!(s.cores.len(), 2);
        assert_eq!(s.cores[1].0, "cpu1");
        assert_eq!(s.cores[1].1, CpuTicks { idle: 400, total: 500 });
    }

    #[test]
    fn malformed_column_counts_as_zero() {
        let s = parse_proc_stat("cpu 10 x 10 80\n");
        assert_eq!(s.aggregate, CpuTicks { idle: 80, total: 100 });
    }

    #[test]
    fn load_is_one_minus_idle_share() {
        let prev = CpuTicks { idle: 800, total: 1000 };
        let cur = CpuTicks { idle: 1400, total: 1800 };
        assert_eq!(load_percent(prev, cur), 25.0);
    }

    #[test]
    fn no_elapsed_ticks_is_zero_load() {
        let t = CpuTicks { idle: 5, total: 10 };
        assert_eq!(load_percent(t, t), 0.0);
    }

    #[test]
    fn counter_reset_never_goes_negative() {
        let prev = CpuTicks { idle: 900, total: 1000 };
        let cur = CpuTicks { idle: 100, total: 2000 };
        assert_eq!(load_percent(prev, cur), 100.0);
        let cur = CpuTicks { idle: 2000, total: 1500 };
        assert_eq!(load_percent(prev, cur), 0.0);
    }
}
