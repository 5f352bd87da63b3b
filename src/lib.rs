//! hwbench - hardware performance benchmark
//!
//! Measures CPU, RAM, disk and GPU throughput, normalizes each measurement to a 0-10 score
//! against fixed reference ranges and combines the four scores into a weighted composite.
//!
//! ```no_run
//! use hwbench::{Capabilities, Config, PerformanceTester};
//!
//! let config = Config::load()?;
//! let caps = Capabilities::probe(&config.backends);
//! let tester = PerformanceTester::new(caps, config.benchmark);
//! if let Some(result) = tester.run_all(false)?.wait() {
//!     println!("final score: {}", result.final_score);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod benchmark;
pub mod capability;
pub mod config;
pub mod error;
pub mod hardware;
pub mod log_sink;
pub mod runner;
pub mod scoring;

pub use benchmark::{BenchmarkKind, BenchmarkResult};
pub use capability::Capabilities;
pub use config::Config;
pub use error::BenchError;
pub use log_sink::{ConsoleSink, LogLevel, LogSink, MemorySink, StdoutSink, TracingSink};
pub use runner::{PerformanceTester, RunOptions, SuiteHandle, SuiteResult, SuiteRun};
