// Shared test helpers: a host filesystem rooted in a temp dir

#![allow(dead_code)]

use hostmon::monitor::HostFs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeHost {
    _dir: TempDir,
    root: PathBuf,
}

impl FakeHost {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    /// Host root at `<tempdir>/<name>`, for roots with unusual characters.
    pub fn nested(name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(name);
        std::fs::create_dir_all(&root).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn host_fs(&self) -> HostFs {
        HostFs::new(Some(self.root().to_path_buf()))
    }

    /// Writes `content` at host path `path` (e.g. "/proc/stat"), creating parents.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full, content).unwrap();
        full
    }

    pub fn mkdir(&self, path: &str) -> PathBuf {
        let full = self.resolve(path);
        std::fs::create_dir_all(&full).unwrap();
        full
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root().join(path.trim_start_matches('/'))
    }

    pub fn write_stat(&self, content: &str) {
        self.write("/proc/stat", content);
    }

    pub fn write_meminfo(&self, total_kib: u64, available_kib: u64) {
        self.write(
            "/proc/meminfo",
            &format!(
                "MemTotal:       {total_kib} kB\nMemFree:          1024 kB\nMemAvailable:   {available_kib} kB\n"
            ),
        );
    }

    pub fn write_counters(&self, interface: &str, rx: u64, tx: u64) {
        self.write(
            &format!("/sys/class/net/{interface}/statistics/rx_bytes"),
            &format!("{rx}\n"),
        );
        self.write(
            &format!("/sys/class/net/{interface}/statistics/tx_bytes"),
            &format!("{tx}\n"),
        );
    }

    pub fn write_inventory(&self, content: &str) {
        self.write("/var/local/emhttp/disks.ini", content);
    }
}

/// Stat file with a `cpu` line then one `cpuN` line per core, each given as (busy, idle).
pub fn stat_file(aggregate: (u64, u64), cores: &[(u64, u64)]) -> String {
    let line = |name: &str, (busy, idle): (u64, u64)| format!("{name} {busy} 0 0 {idle} 0 0 0 0 0 0\n");
    let mut out = line("cpu", aggregate);
    for (i, ticks) in cores.iter().enumerate() {
        out.push_str(&line(&format!("cpu{i}"), *ticks));
    }
    out.push_str("intr 12345 0 0\nctxt 999\n");
    out
}
