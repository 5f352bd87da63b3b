//! System information aggregator

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sysinfo::System;

use super::cpu::CpuInfo;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Hardware context printed next to benchmark scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu: CpuInfo,
    /// Total physical memory in MB
    pub memory_mb: u64,
    /// Memory available to new allocations in MB
    pub available_memory_mb: u64,
    /// Operating system
    pub os: String,
    pub os_version: Option<String>,
}

impl SystemInfo {
    /// Detect all system information
    pub fn detect() -> Result<Self> {
        let cpu = CpuInfo::detect()?;

        let mut sys = System::new();
        sys.refresh_memory();

        Ok(SystemInfo {
            cpu,
            memory_mb: sys.total_memory() / BYTES_PER_MB,
            available_memory_mb: sys.available_memory() / BYTES_PER_MB,
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version(),
        })
    }

    /// Display system info as formatted string
    pub fn display(&self) -> String {
        const WIDTH: usize = 62;
        let mut output = String::new();

        output.push_str(&format!("╔{}╗\n", "═".repeat(WIDTH)));
        output.push_str(&format!("║{:^WIDTH$}║\n", "SYSTEM INFORMATION"));
        output.push_str(&format!("╠{}╣\n", "═".repeat(WIDTH)));

        let format_line = |label: &str, content: &str| -> String {
            let content_width = WIDTH.saturating_sub(1 + label.chars().count());
            let content: String = content.chars().take(content_width).collect();
            format!("║ {label}{content:<content_width$}║\n")
        };

        output.push_str(&format_line("CPU: ", &self.cpu.name));
        output.push_str(&format_line(
            "     ",
            &format!(
                "{} cores / {} threads ({})",
                self.cpu.cores, self.cpu.threads, self.cpu.architecture
            ),
        ));
        if let Some(freq) = self.cpu.frequency_mhz {
            output.push_str(&format_line("     ", &format!("Clock: {} MHz", freq)));
        }
        if let Some(max_freq) = self.cpu.max_frequency_mhz {
            output.push_str(&format_line("     ", &format!("Max Clock: {} MHz", max_freq)));
        }

        output.push_str(&format!("╠{}╣\n", "═".repeat(WIDTH)));

        let ram = format!(
            "{:.1} GB ({:.1} GB available)",
            self.memory_mb as f64 / 1024.0,
            self.available_memory_mb as f64 / 1024.0
        );
        output.push_str(&format_line("RAM: ", &ram));

        let os_str = match &self.os_version {
            Some(ver) => format!("{} {}", self.os, ver),
            None => self.os.clone(),
        };
        output.push_str(&format_line("OS:  ", &os_str));

        output.push_str(&format!("╚{}╝", "═".repeat(WIDTH)));

        output
    }
}
