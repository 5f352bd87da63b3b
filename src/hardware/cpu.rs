//! CPU detection
//!
//! Uses sysinfo everywhere, plus cpufreq sysfs on Linux for the boost clock.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sysinfo::System;

#[cfg(target_os = "linux")]
const SCALING_MAX_FREQ: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_max_freq";

/// CPU information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// CPU brand string (e.g., "AMD Ryzen 7 5800X")
    pub name: String,
    pub vendor: String,
    /// Number of physical cores
    pub cores: usize,
    /// Number of logical threads
    pub threads: usize,
    /// Current frequency in MHz (if reported)
    pub frequency_mhz: Option<u64>,
    /// Max boost frequency in MHz (if available)
    pub max_frequency_mhz: Option<u64>,
    pub architecture: String,
}

impl CpuInfo {
    pub fn detect() -> Result<Self> {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        let cpus = sys.cpus();
        let Some(first_cpu) = cpus.first() else {
            anyhow::bail!("No CPU detected");
        };

        let threads = cpus.len();
        let cores = sys.physical_core_count().unwrap_or(threads);
        let frequency_mhz = Some(first_cpu.frequency()).filter(|mhz| *mhz > 0);

        Ok(CpuInfo {
            name: first_cpu.brand().trim().to_string(),
            vendor: first_cpu.vendor_id().to_string(),
            cores,
            threads,
            frequency_mhz,
            max_frequency_mhz: max_frequency_mhz(),
            architecture: std::env::consts::ARCH.to_string(),
        })
    }
}

#[cfg(target_os = "linux")]
fn max_frequency_mhz() -> Option<u64> {
    std::fs::read_to_string(SCALING_MAX_FREQ)
        .ok()
        .and_then(|raw| parse_khz(&raw))
}

#[cfg(not(target_os = "linux"))]
fn max_frequency_mhz() -> Option<u64> {
    None
}

/// Parse a sysfs kHz value into MHz.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_khz(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .map(|khz| khz / 1000)
        .filter(|mhz| *mhz > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sysfs_khz() {
        assert_eq!(parse_khz("4850000\n"), Some(4850));
        assert_eq!(parse_khz("garbage"), None);
        assert_eq!(parse_khz("0"), None);
    }

    #[test]
    fn detect_reports_at_least_one_thread() {
        let info = CpuInfo::detect().unwrap();
        assert!(info.threads >= 1);
        assert!(info.cores >= 1);
        assert!(!info.architecture.is_empty());
    }
}
