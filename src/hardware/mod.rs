//! Hardware detection
//!
//! Describes the CPU, memory and OS with sysinfo so scores can be read in context.

pub mod cpu;
mod system;

pub use system::SystemInfo;
