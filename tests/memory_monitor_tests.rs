// Memory monitor tests against a fake /proc/meminfo

mod common;

use common::FakeHost;
use hostmon::monitor::MemoryMonitor;

#[tokio::test]
async fn test_usage_is_reported_in_configured_unit() {
    let host = FakeHost::new();
    host.write_meminfo(2 * 1024 * 1024, 512 * 1024);
    let monitor = MemoryMonitor::new(host.host_fs(), "Mi").unwrap();

    let memory = monitor.compute_memory_usage().await;
    assert_eq!(memory.total, 2048.0);
    assert_eq!(memory.free, 512.0);
    assert_eq!(memory.used, 1536.0);
    assert_eq!(memory.used_percent, 75.0);
    assert_eq!(memory.free_percent, 25.0);
}

#[tokio::test]
async fn test_gibibyte_unit() {
    let host = FakeHost::new();
    host.write_meminfo(8 * 1024 * 1024, 2 * 1024 * 1024);
    let monitor = MemoryMonitor::new(host.host_fs(), "Gi").unwrap();

    let memory = monitor.compute_memory_usage().await;
    assert_eq!(memory.total, 8.0);
    assert_eq!(memory.free, 2.0);
    assert_eq!(memory.used, 6.0);
}

#[tokio::test]
async fn test_each_call_reads_fresh_values() {
    let host = FakeHost::new();
    host.write_meminfo(1024 * 1024, 1024 * 1024);
    let monitor = MemoryMonitor::new(host.host_fs(), "Mi").unwrap();
    assert_eq!(monitor.compute_memory_usage().await.used, 0.0);

    host.write_meminfo(1024 * 1024, 256 * 1024);
    assert_eq!(monitor.compute_memory_usage().await.used, 768.0);
}

#[tokio::test]
async fn test_missing_meminfo_reports_zeros() {
    let host = FakeHost::new();
    let monitor = MemoryMonitor::new(host.host_fs(), "Mi").unwrap();

    let memory = monitor.compute_memory_usage().await;
    assert_eq!(memory.total, 0.0);
    assert_eq!(memory.used, 0.0);
    assert_eq!(memory.used_percent, 0.0);
    assert_eq!(memory.free_percent, 0.0);
}

#[tokio::test]
async fn test_meminfo_without_available_reports_zeros() {
    let host = FakeHost::new();
    host.write("/proc/meminfo", "MemTotal: 1024 kB\nMemFree: 512 kB\n");
    let monitor = MemoryMonitor::new(host.host_fs(), "Mi").unwrap();
    assert_eq!(monitor.compute_memory_usage().await.total, 0.0);
}

#[test]
fn test_unknown_unit_is_rejected() {
    let host = FakeHost::new();
    assert!(MemoryMonitor::new(host.host_fs(), "MB").is_err());
}
