// ZFS datasets from `zfs list`, only consulted in privileged mode

use std::collections::HashMap;
use std::ffi::OsString;
use tokio::process::Command;
use tracing::{debug, error, warn};

use super::SourceError;
use crate::models::DiskStatus;
use crate::units::{SizeConverter, parse_zfs_size};

const ZFS_COMMAND: &str = "zfs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZfsDataset {
    pub name: String,
    pub used: String,
    pub avail: String,
    pub refer: String,
    pub mountpoint: String,
}

impl ZfsDataset {
    /// Usage from the dataset's used/avail columns, in the unit of `bytes_to_unit`.
    pub fn usage(&self, bytes_to_unit: &SizeConverter) -> DiskStatus {
        let bytes = |size: &str| {
            parse_zfs_size(size).unwrap_or_else(|e| {
                warn!(dataset = %self.name, error = %e, "Disk unable to parse ZFS size");
                0.0
            })
        };
        let used = bytes_to_unit.convert(bytes(&self.used));
        let free = bytes_to_unit.convert(bytes(&self.avail));
        let status = DiskStatus::from_usage(&self.mountpoint, used + free, free);
        debug!(dataset = %self.name, total = status.total, free = status.free, "Disk ZFS dataset status computed");
        status
    }
}

/// Datasets keyed by mountpoint.
pub type ZfsDatasets = HashMap<String, ZfsDataset>;

/// Parses `zfs list` output: a header line, then name/used/avail/refer/mountpoint columns.
pub fn parse_zfs_list(output: &str) -> ZfsDatasets {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [name, used, avail, refer, mountpoint, ..] = fields.as_slice() else {
                if !line.trim().is_empty() {
                    warn!(line, "Disk unexpected zfs list line");
                }
                return None;
            };
            let dataset = ZfsDataset {
                name: name.to_string(),
                used: used.to_string(),
                avail: avail.to_string(),
                refer: refer.to_string(),
                mountpoint: mountpoint.to_string(),
            };
            debug!(dataset = %dataset.name, mountpoint = %dataset.mountpoint, "Disk ZFS dataset found");
            Some((dataset.mountpoint.clone(), dataset))
        })
        .collect()
}

/// How `zfs` is invoked: a program plus leading arguments, then `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZfsCli {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for ZfsCli {
    fn default() -> Self {
        Self::new(ZFS_COMMAND)
    }
}

impl ZfsCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Runs `zfs list` once. Any failure yields no datasets.
    pub async fn list_datasets(&self) -> ZfsDatasets {
        match self.run_list().await {
            Ok(output) => parse_zfs_list(&output),
            Err(e) => {
                error!(error = %e, "Disk unable to list ZFS datasets");
                ZfsDatasets::new()
            }
        }
    }

    async fn run_list(&self) -> Result<String, SourceError> {
        let command = format!("{} list", self.program.to_string_lossy());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("list")
            .output()
            .await
            .map_err(|e| SourceError::Command {
                command: command.clone(),
                detail: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(SourceError::Command {
                command,
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
