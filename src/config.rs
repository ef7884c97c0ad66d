use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::units;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Pool name -> mount paths, in report order. "array" and "cache" are reported apart.
    #[serde(default)]
    pub disks: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub units: UnitsConfig,
    pub cors: Option<CorsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    24940
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Interfaces under /sys/class/net, in report order.
    #[serde(default)]
    pub networks: Vec<String>,
    /// CPU temperature file; located by a short stress test when unset.
    pub cpu_temp: Option<PathBuf>,
    /// Duration of the stress test used to locate the temperature file.
    #[serde(default = "default_cpu_stress_secs")]
    pub cpu_stress_secs: u64,
    /// Deadline for each concurrent disk/interface read. Unset waits forever.
    pub read_timeout_ms: Option<u64>,
    /// Log filter used when RUST_LOG is not set.
    #[serde(default = "default_logging_level")]
    pub logging_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            cpu_temp: None,
            cpu_stress_secs: default_cpu_stress_secs(),
            read_timeout_ms: None,
            logging_level: default_logging_level(),
        }
    }
}

fn default_cpu_stress_secs() -> u64 {
    5
}

fn default_logging_level() -> String {
    "info".into()
}

/// Display unit labels ("Gi", "M", "Ki", ...).
#[derive(Debug, Clone, Deserialize)]
pub struct UnitsConfig {
    #[serde(default = "default_disk_unit")]
    pub array: String,
    #[serde(default = "default_disk_unit")]
    pub cache: String,
    /// Every pool other than array and cache.
    #[serde(default = "default_disk_unit")]
    pub pools: String,
    #[serde(default = "default_memory_unit")]
    pub memory: String,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            array: default_disk_unit(),
            cache: default_disk_unit(),
            pools: default_disk_unit(),
            memory: default_memory_unit(),
        }
    }
}

fn default_disk_unit() -> String {
    "Gi".into()
}

fn default_memory_unit() -> String {
    "Mi".into()
}

/// CORS response headers; `"*"` allows any.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub origin: String,
    #[serde(default = "default_cors_any")]
    pub methods: String,
    #[serde(default = "default_cors_any")]
    pub headers: String,
}

fn default_cors_any() -> String {
    "*".into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path).map_err(|e| {
            let hint = if std::path::Path::new(&path).is_dir() {
                "configuration path is a directory, replace it with a file"
            } else if e.kind() == std::io::ErrorKind::NotFound {
                "configuration file not found, create it or set CONFIG_FILE"
            } else {
                "unable to read configuration file"
            };
            anyhow::anyhow!("{hint}: {path}: {e}")
        })?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        for (field, label) in [
            ("units.array", &self.units.array),
            ("units.cache", &self.units.cache),
            ("units.pools", &self.units.pools),
            ("units.memory", &self.units.memory),
        ] {
            units::prefix(label).map_err(|e| anyhow::anyhow!("{field}: {e}"))?;
        }
        anyhow::ensure!(
            self.monitoring.read_timeout_ms != Some(0),
            "monitoring.read_timeout_ms must be > 0 when set"
        );
        anyhow::ensure!(
            self.monitoring
                .networks
                .iter()
                .all(|n| !n.is_empty() && !n.contains('/')),
            "monitoring.networks entries must be interface names"
        );
        tracing_subscriber::EnvFilter::try_new(&self.monitoring.logging_level).map_err(|e| {
            anyhow::anyhow!(
                "monitoring.logging_level {:?} is invalid: {e}",
                self.monitoring.logging_level
            )
        })?;
        for (pool, mounts) in &self.disks {
            anyhow::ensure!(!pool.is_empty(), "disks: pool names must be non-empty");
            anyhow::ensure!(
                mounts.iter().all(|m| !m.is_empty()),
                "disks.{pool}: mount paths must be non-empty"
            );
        }
        if let Some(cors) = &self.cors {
            anyhow::ensure!(!cors.origin.is_empty(), "cors.origin must be non-empty");
        }
        Ok(())
    }
}

/// Host toggles read from the environment rather than the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
    /// Where the host's root filesystem is mounted (`HOSTFS_PREFIX`).
    pub hostfs_prefix: Option<PathBuf>,
    /// Privileged mode: ZFS datasets may be listed (`ZFS_OK`).
    pub zfs_ok: bool,
}

impl HostEnv {
    pub fn from_env() -> Self {
        let hostfs_prefix = std::env::var_os("HOSTFS_PREFIX").map(PathBuf::from);
        if let Some(prefix) = &hostfs_prefix {
            tracing::debug!(prefix = %prefix.display(), "Host filesystem prefix is set");
        }
        let zfs_ok = match std::env::var("ZFS_OK") {
            Ok(value) => parse_bool(&value).unwrap_or_else(|| {
                tracing::error!(variable = "ZFS_OK", value = %value, "unable to parse env variable as bool");
                false
            }),
            Err(_) => false,
        };
        Self {
            hostfs_prefix,
            zfs_ok,
        }
    }
}

/// Accepts 1/t/T/TRUE/true/True and 0/f/F/FALSE/false/False.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
