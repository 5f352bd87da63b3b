//! hwbench - hardware performance benchmark
//!
//! Runs the CPU, RAM, disk and GPU benchmarks and reports a 0-10 score for each plus a weighted
//! composite. Logging goes to stderr (`RUST_LOG`), results to stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use hwbench::benchmark::{BenchmarkKind, BenchmarkResult};
use hwbench::config::{Config, OutputFormat};
use hwbench::hardware::SystemInfo;
use hwbench::runner::{PerformanceTester, RunOptions, SuiteResult, SuiteRun};
use hwbench::{Capabilities, ConsoleSink, LogSink, TracingSink};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// hwbench - score your CPU, RAM, disk and GPU
#[derive(Parser)]
#[command(name = "hwbench")]
#[command(version)]
#[command(about = "Measure CPU, RAM, disk and GPU performance on a 0-10 scale")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full benchmark suite (default)
    Run {
        /// Run the suite on a worker thread and poll for completion
        #[arg(long = "async", default_value_t = false)]
        async_run: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run only the CPU benchmark
    Cpu {
        /// Matrix size multiplier (side = 1000 x mult, capped at 3000)
        #[arg(long)]
        iter_mult: Option<u32>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run only the RAM benchmark
    Ram {
        /// Buffer size in MB
        #[arg(long)]
        size_mb: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run only the disk benchmark
    Disk {
        /// Scratch file size in MB
        #[arg(long)]
        size_mb: Option<u64>,

        /// Directory to create the scratch file under
        #[arg(long)]
        dir: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run only the GPU benchmark
    Gpu {
        /// Render duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Detect and display your system hardware
    Detect,

    /// Show configuration file location and effective settings
    Config,
}

#[derive(Args, Clone, Copy)]
struct OutputArgs {
    /// Report format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Hide the progress bar
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

/// JSON shape for a single-stage run
#[derive(Serialize)]
struct StageReport<'a> {
    stage: &'static str,
    #[serde(flatten)]
    result: &'a BenchmarkResult,
    numeric_backend: &'static str,
    graphics_backend: &'static str,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Some(Commands::Run { async_run, output }) => {
            let config = Config::load_from(&config_path)?;
            run_suite(&config, async_run, output)?;
        }
        None => {
            let config = Config::load_from(&config_path)?;
            let output = OutputArgs {
                format: None,
                quiet: false,
            };
            run_suite(&config, false, output)?;
        }
        Some(Commands::Cpu { iter_mult, output }) => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(iter_mult) = iter_mult {
                config.benchmark.cpu_iter_mult = iter_mult;
            }
            run_stage(&config, BenchmarkKind::Cpu, output)?;
        }
        Some(Commands::Ram { size_mb, output }) => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(size_mb) = size_mb {
                config.benchmark.ram_size_mb = size_mb;
            }
            run_stage(&config, BenchmarkKind::Ram, output)?;
        }
        Some(Commands::Disk {
            size_mb,
            dir,
            output,
        }) => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(size_mb) = size_mb {
                config.benchmark.disk_size_mb = size_mb;
            }
            if dir.is_some() {
                config.benchmark.disk_dir = dir;
            }
            run_stage(&config, BenchmarkKind::Disk, output)?;
        }
        Some(Commands::Gpu { duration, output }) => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(duration) = duration {
                config.benchmark.gpu_duration_secs = duration;
            }
            run_stage(&config, BenchmarkKind::Gpu, output)?;
        }
        Some(Commands::Detect) => {
            let system_info = SystemInfo::detect()?;
            println!("{}", system_info.display());
        }
        Some(Commands::Config) => {
            show_config_info(&config_path)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_tester(
    caps: Capabilities,
    config: &Config,
    format: OutputFormat,
    quiet: bool,
) -> PerformanceTester {
    // JSON output owns stdout, so progress goes to the tracing log instead.
    let sink: Arc<dyn LogSink> = match format {
        OutputFormat::Text => Arc::new(ConsoleSink),
        OutputFormat::Json => Arc::new(TracingSink),
    };
    let options = RunOptions {
        quiet: quiet || format == OutputFormat::Json,
        progress: None,
    };

    PerformanceTester::new(caps, config.benchmark.clone())
        .with_sink(sink)
        .with_options(options)
}

fn run_suite(config: &Config, async_run: bool, output: OutputArgs) -> Result<()> {
    let format = output.format.unwrap_or(config.output.format);
    let quiet = output.quiet || config.output.quiet;
    let caps = Capabilities::probe(&config.backends);
    let tester = build_tester(caps, config, format, quiet);

    if format == OutputFormat::Text {
        println!("{}", "Starting hwbench...\n".bright_cyan().bold());
        print_system_info();
    }

    let result = match tester
        .run_all(async_run)
        .context("Failed to start benchmark worker thread")?
    {
        SuiteRun::Completed(result) => result,
        SuiteRun::Running(handle) => {
            while !handle.is_finished() {
                std::thread::sleep(POLL_INTERVAL);
            }
            handle
                .join()
                .context("Benchmark worker thread terminated unexpectedly")?
        }
    };

    print_suite_result(&result, format)
}

fn run_stage(config: &Config, kind: BenchmarkKind, output: OutputArgs) -> Result<()> {
    let format = output.format.unwrap_or(config.output.format);
    let quiet = output.quiet || config.output.quiet;
    let caps = Capabilities::probe(&config.backends);
    let numeric_backend = caps.numeric.name();
    let graphics_backend = caps.graphics.name();

    let tester = build_tester(caps, config, format, quiet);
    let result = tester.run_one(kind);

    match format {
        OutputFormat::Json => {
            let report = StageReport {
                stage: kind.name(),
                result: &result,
                numeric_backend,
                graphics_backend,
            };
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize benchmark result")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!();
            println!(
                "{} {} {}",
                format!("{kind} Score:").bright_white().bold(),
                score_colored(result.score),
                result.detail.bright_black()
            );
        }
    }

    Ok(())
}

fn print_system_info() {
    match SystemInfo::detect() {
        Ok(info) => println!("{}\n", info.display()),
        Err(err) => {
            tracing::warn!("hardware detection failed: {err:#}");
            println!(
                "{} {}\n",
                "Could not detect hardware:".bright_yellow(),
                err.to_string().bright_black()
            );
        }
    }
}

fn print_suite_result(result: &SuiteResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(result)
                .context("Failed to serialize benchmark results")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!();
            println!("{}", result.display());
            println!(
                "\n{} {}",
                "Final Score:".bright_white().bold(),
                score_colored(result.final_score)
            );
        }
    }
    Ok(())
}

fn score_colored(score: f64) -> ColoredString {
    let text = format!("{score:.2}/10");
    if score >= 7.0 {
        text.bright_green().bold()
    } else if score >= 4.0 {
        text.bright_yellow().bold()
    } else {
        text.bright_red().bold()
    }
}

fn show_config_info(config_path: &Path) -> Result<()> {
    println!("{}", "hwbench Configuration\n".bright_cyan().bold());

    println!(
        "{} {}",
        "Config file:".bright_yellow(),
        config_path.display().to_string().bright_white()
    );
    let existed = config_path.exists();

    let cfg = match Config::init_at(config_path) {
        Ok(cfg) => {
            let status = if existed {
                "Exists".bright_green()
            } else {
                "Created with defaults".bright_green()
            };
            println!("  {} {}", "Status:".bright_cyan(), status);
            cfg
        }
        Err(err) => {
            println!(
                "  {} {}",
                "Note:".bright_yellow(),
                format!("Could not create config file yet: {err:#}").bright_black()
            );
            Config::load_from(config_path)?
        }
    };

    let toml = toml::to_string_pretty(&cfg).context("Failed to serialize config to TOML")?;
    println!("\n{}", "Effective settings:".bright_white().bold());
    for line in toml.lines() {
        println!("  {}", line);
    }

    let caps = Capabilities::probe(&cfg.backends);
    println!("\n{}", "Backends:".bright_white().bold());
    println!(
        "  {} {}",
        "Numeric:".bright_cyan(),
        caps.numeric.name().bright_white()
    );
    println!(
        "  {} {}",
        "Graphics:".bright_cyan(),
        caps.graphics.name().bright_white()
    );

    Ok(())
}
