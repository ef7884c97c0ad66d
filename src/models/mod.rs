// Report models returned by the monitors

mod cpu;
mod disk;
mod memory;
mod network;
mod report;

pub use cpu::{CoreStatus, CpuStatus};
pub use disk::{DiskStatus, DiskUsage, ParityStatus, PoolStatus};
pub use memory::MemoryStatus;
pub use network::NetworkRate;
pub use report::Report;
