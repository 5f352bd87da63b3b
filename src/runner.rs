//! Benchmark suite runner
//!
//! Runs the CPU, RAM, Disk and GPU stages strictly in that order, reports each stage through the
//! log sink and combines the scores into the weighted composite. The whole sequence can also be
//! moved onto a worker thread so a UI thread stays responsive.

use crate::benchmark::{
    run_cpu_benchmark, run_disk_benchmark, run_gpu_benchmark, run_ram_benchmark, BenchmarkKind,
    BenchmarkResult,
};
use crate::capability::Capabilities;
use crate::config::BenchmarkConfig;
use crate::log_sink::{LogSink, StdoutSink};
use crate::scoring::{composite, SCORE_VERSION};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "hwbench-suite";

/// Results of one full suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Scoring semantics version (see [`SCORE_VERSION`]).
    pub score_version: String,
    #[serde(rename = "CPU")]
    pub cpu: BenchmarkResult,
    #[serde(rename = "RAM")]
    pub ram: BenchmarkResult,
    #[serde(rename = "Disk")]
    pub disk: BenchmarkResult,
    #[serde(rename = "GPU")]
    pub gpu: BenchmarkResult,
    /// Weighted composite of the four stage scores
    #[serde(rename = "final")]
    pub final_score: f64,
    /// Numeric backend used for the CPU and RAM stages
    pub numeric_backend: String,
    /// Graphics backend used for the GPU stage
    pub graphics_backend: String,
    /// Wall-clock duration of the whole suite in seconds
    pub duration_secs: f64,
}

impl SuiteResult {
    /// Assemble a result from the four stage outcomes, computing the composite.
    pub fn from_stages(
        cpu: BenchmarkResult,
        ram: BenchmarkResult,
        disk: BenchmarkResult,
        gpu: BenchmarkResult,
    ) -> Self {
        let final_score = composite(cpu.score, ram.score, disk.score, gpu.score);
        Self {
            score_version: SCORE_VERSION.to_string(),
            cpu,
            ram,
            disk,
            gpu,
            final_score,
            numeric_backend: String::new(),
            graphics_backend: String::new(),
            duration_secs: 0.0,
        }
    }

    pub fn get(&self, kind: BenchmarkKind) -> &BenchmarkResult {
        match kind {
            BenchmarkKind::Cpu => &self.cpu,
            BenchmarkKind::Ram => &self.ram,
            BenchmarkKind::Disk => &self.disk,
            BenchmarkKind::Gpu => &self.gpu,
        }
    }

    /// Stage results in suite order.
    pub fn stages(&self) -> [(BenchmarkKind, &BenchmarkResult); 4] {
        BenchmarkKind::ALL.map(|kind| (kind, self.get(kind)))
    }

    /// Render the results as a boxed text report
    pub fn display(&self) -> String {
        const WIDTH: usize = 62;
        let mut output = String::new();

        output.push_str(&format!("╔{}╗\n", "═".repeat(WIDTH)));
        output.push_str(&format!("║{:^WIDTH$}║\n", "BENCHMARK RESULTS"));
        output.push_str(&format!("╠{}╣\n", "═".repeat(WIDTH)));

        for (kind, result) in self.stages() {
            let line = format!(" {:<5}{:>6.2}/10  {}", kind.name(), result.score, result.detail);
            output.push_str(&format!("║{}║\n", fit(&line, WIDTH)));
        }

        output.push_str(&format!("╠{}╣\n", "═".repeat(WIDTH)));
        let final_line = format!(" Final{:>6.2}/10", self.final_score);
        output.push_str(&format!("║{}║\n", fit(&final_line, WIDTH)));
        let backends = format!(
            " numeric: {}  graphics: {}  ({})",
            self.numeric_backend,
            self.graphics_backend,
            format_elapsed(self.duration_secs)
        );
        output.push_str(&format!("║{}║\n", fit(&backends, WIDTH)));
        output.push_str(&format!("╚{}╝", "═".repeat(WIDTH)));

        output
    }
}

/// Pad or truncate `line` to exactly `width` characters.
fn fit(line: &str, width: usize) -> String {
    let count = line.chars().count();
    if count > width {
        let mut cut: String = line.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{line}{}", " ".repeat(width - count))
    }
}

/// Suite progress, emitted when a stage starts and when it finishes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// Stage that just started or finished
    pub stage: BenchmarkKind,
    pub completed_steps: usize,
    pub total_steps: usize,
    /// Scores of the finished stages, in suite order
    pub scores: Vec<(BenchmarkKind, f64)>,
    pub status: String,
}

#[derive(Clone, Default)]
pub struct RunOptions {
    /// Suppress the stdout progress bar.
    ///
    /// Useful when stdout carries machine-readable output, or when an embedding UI renders
    /// progress itself from the callback below.
    pub quiet: bool,
    /// Optional callback for progress updates.
    ///
    /// This receives progress events even when `quiet` is true.
    pub progress: Option<Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>>,
}

/// A started suite run
pub enum SuiteRun {
    /// Synchronous run, already finished
    Completed(SuiteResult),
    /// Running on a worker thread
    Running(SuiteHandle),
}

impl SuiteRun {
    /// Block until the run has finished. `None` if the worker thread died.
    pub fn wait(self) -> Option<SuiteResult> {
        match self {
            SuiteRun::Completed(result) => Some(result),
            SuiteRun::Running(handle) => handle.join(),
        }
    }
}

/// Handle to a suite running on a worker thread.
///
/// Dropping the handle detaches the worker; progress remains observable through the log sink.
pub struct SuiteHandle {
    handle: JoinHandle<SuiteResult>,
}

impl SuiteHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker. `None` if it panicked.
    pub fn join(self) -> Option<SuiteResult> {
        self.handle.join().ok()
    }
}

/// Runs the benchmark suite against a fixed set of capabilities and settings
#[derive(Clone)]
pub struct PerformanceTester {
    capabilities: Arc<Capabilities>,
    settings: BenchmarkConfig,
    sink: Arc<dyn LogSink>,
    options: RunOptions,
}

impl PerformanceTester {
    /// New tester reporting to plain stdout.
    pub fn new(capabilities: Capabilities, settings: BenchmarkConfig) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
            settings,
            sink: Arc::new(StdoutSink),
            options: RunOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn settings(&self) -> &BenchmarkConfig {
        &self.settings
    }

    /// Run the full suite, on the calling thread or, with `async_run`, on a worker thread.
    pub fn run_all(&self, async_run: bool) -> io::Result<SuiteRun> {
        if async_run {
            Ok(SuiteRun::Running(self.spawn()?))
        } else {
            Ok(SuiteRun::Completed(self.run_blocking()))
        }
    }

    /// Start the suite on a named worker thread and return immediately.
    pub fn spawn(&self) -> io::Result<SuiteHandle> {
        let tester = self.clone();
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || tester.run_blocking())?;

        tracing::debug!("benchmark suite started on worker thread");
        Ok(SuiteHandle { handle })
    }

    /// Run the full suite on the calling thread.
    pub fn run_blocking(&self) -> SuiteResult {
        let start_time = Instant::now();
        let mut finished = Vec::with_capacity(BenchmarkKind::ALL.len());

        self.sink
            .info("▶️ Starting full hardware benchmark suite...");

        let cpu = self.stage(BenchmarkKind::Cpu, &mut finished);
        let ram = self.stage(BenchmarkKind::Ram, &mut finished);
        let disk = self.stage(BenchmarkKind::Disk, &mut finished);
        let gpu = self.stage(BenchmarkKind::Gpu, &mut finished);

        let mut result = SuiteResult::from_stages(cpu, ram, disk, gpu);
        result.numeric_backend = self.capabilities.numeric.name().to_string();
        result.graphics_backend = self.capabilities.graphics.name().to_string();
        result.duration_secs = start_time.elapsed().as_secs_f64();

        self.sink
            .success(&format!("🏆 Final Score: {:.2}/10", result.final_score));
        tracing::info!(
            final_score = result.final_score,
            duration_secs = result.duration_secs,
            "benchmark suite complete"
        );

        result
    }

    /// Run a single stage with the configured settings.
    pub fn run_one(&self, kind: BenchmarkKind) -> BenchmarkResult {
        let sink = self.sink.as_ref();
        let caps = self.capabilities.as_ref();
        match kind {
            BenchmarkKind::Cpu => {
                run_cpu_benchmark(caps.numeric.as_ref(), self.settings.cpu_iter_mult, sink)
            }
            BenchmarkKind::Ram => {
                run_ram_benchmark(caps.numeric.as_ref(), self.settings.ram_size_mb, sink)
            }
            BenchmarkKind::Disk => run_disk_benchmark(
                self.settings.disk_size_mb,
                self.settings.disk_dir.as_deref(),
                sink,
            ),
            BenchmarkKind::Gpu => run_gpu_benchmark(
                caps.graphics.as_ref(),
                self.settings.gpu_duration_secs,
                sink,
            ),
        }
    }

    fn stage(
        &self,
        kind: BenchmarkKind,
        finished: &mut Vec<(BenchmarkKind, f64)>,
    ) -> BenchmarkResult {
        report_progress(
            &self.options,
            kind,
            finished,
            &format!("Starting {kind} benchmark"),
        );

        let result = self.run_one(kind);
        self.report_stage(kind, &result);
        finished.push((kind, result.score));

        let status = if result.score > 0.0 {
            format!("{kind} benchmark complete")
        } else {
            format!("{kind} benchmark degraded")
        };
        report_progress(&self.options, kind, finished, &status);

        result
    }

    fn report_stage(&self, kind: BenchmarkKind, result: &BenchmarkResult) {
        let icon = match kind {
            BenchmarkKind::Cpu => "🖥",
            BenchmarkKind::Ram => "💾",
            BenchmarkKind::Disk => "🗄",
            BenchmarkKind::Gpu => "🎮",
        };
        let message = format!(
            "{icon} {kind} Score: {:.2}/10 - {}",
            result.score, result.detail
        );

        if result.score > 0.0 {
            self.sink.success(&message);
        } else {
            self.sink.warning(&message);
        }
    }
}

fn report_progress(
    options: &RunOptions,
    stage: BenchmarkKind,
    finished: &[(BenchmarkKind, f64)],
    status: &str,
) {
    if let Some(on_progress) = options.progress.as_ref() {
        on_progress(ProgressUpdate {
            stage,
            completed_steps: finished.len(),
            total_steps: BenchmarkKind::ALL.len(),
            scores: finished.to_vec(),
            status: status.to_string(),
        });
    }

    if options.quiet {
        return;
    }

    println!(
        "   [{}] {}",
        scoreboard(finished).bright_cyan(),
        status.bright_white()
    );
}

/// One cell per stage: its score once finished, `--` before that.
fn scoreboard(finished: &[(BenchmarkKind, f64)]) -> String {
    BenchmarkKind::ALL
        .iter()
        .map(|kind| match finished.iter().find(|(done, _)| done == kind) {
            Some((_, score)) => format!("{kind} {score:>5.2}"),
            None => format!("{kind} {:>5}", "--"),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Wall-clock seconds as `42.3s` or `3m 05s`.
pub fn format_elapsed(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0.0s".to_string();
    }
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let whole = secs as u64;
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::cpu::CpuMeasurement;
    use crate::capability::{NumericBackend, UnavailableGraphics};
    use crate::error::BenchError;
    use crate::log_sink::{LogLevel, MemorySink};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Instant backend reporting fixed measurements.
    struct FixedBackend;

    impl NumericBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn cpu_workload(&self, _iter_mult: u32) -> Result<CpuMeasurement, BenchError> {
            Ok(CpuMeasurement::MatrixMultiply {
                n: 1000,
                elapsed: Duration::from_millis(16),
            })
        }

        fn memory_pass(&self, _buffer: &mut [u8]) -> Result<Duration, BenchError> {
            Ok(Duration::from_secs(1))
        }
    }

    fn fast_tester(scratch: &std::path::Path, sink: Arc<dyn LogSink>) -> PerformanceTester {
        let caps = Capabilities {
            numeric: Box::new(FixedBackend),
            graphics: Box::new(UnavailableGraphics::new("graphics support (test)")),
        };
        let settings = BenchmarkConfig {
            cpu_iter_mult: 1,
            ram_size_mb: 1,
            disk_size_mb: 4,
            disk_dir: Some(scratch.to_path_buf()),
            gpu_duration_secs: 0.01,
        };
        PerformanceTester::new(caps, settings)
            .with_sink(sink)
            .with_options(RunOptions {
                quiet: true,
                progress: None,
            })
    }

    fn position(messages: &[String], prefix: &str) -> usize {
        messages
            .iter()
            .position(|m| m.starts_with(prefix))
            .unwrap_or_else(|| panic!("no message starting with {prefix:?} in {messages:?}"))
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let scratch = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let tester = fast_tester(scratch.path(), sink.clone());

        let result = tester.run_blocking();

        let messages = sink.messages();
        let suite = position(&messages, "▶️ Starting full hardware benchmark suite");
        let cpu = position(&messages, "▶️ CPU:");
        let ram = position(&messages, "▶️ RAM:");
        let disk = position(&messages, "▶️ DISK:");
        let gpu = position(&messages, "▶️ GPU:");
        let last = position(&messages, "🏆 Final Score:");
        assert!(suite < cpu && cpu < ram && ram < disk && disk < gpu && gpu < last);
        assert_eq!(last, messages.len() - 1);

        assert_eq!(result.numeric_backend, "fixed");
        assert_eq!(result.graphics_backend, "unavailable");
    }

    #[test]
    fn composite_includes_degraded_stages() {
        let scratch = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let tester = fast_tester(scratch.path(), sink.clone());

        let result = tester.run_blocking();

        assert_eq!(result.cpu.score, 1.15);
        assert_eq!(result.gpu.score, 0.0);
        assert!(result.gpu.detail.starts_with("missing"));
        assert_eq!(
            result.final_score,
            composite(
                result.cpu.score,
                result.ram.score,
                result.disk.score,
                result.gpu.score
            )
        );

        let gpu_line = sink
            .entries()
            .into_iter()
            .find(|(_, msg)| msg.contains("GPU Score:"))
            .expect("gpu score line");
        assert_eq!(gpu_line.0, LogLevel::Warning);
    }

    #[test]
    fn async_run_returns_handle_and_joins() {
        let scratch = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let tester = fast_tester(scratch.path(), sink.clone());

        let run = tester.run_all(true).unwrap();
        let handle = match run {
            SuiteRun::Running(handle) => handle,
            SuiteRun::Completed(_) => panic!("async run must not block"),
        };

        let result = handle.join().expect("worker should not panic");
        assert_eq!(result.cpu.score, 1.15);
        assert!(sink
            .messages()
            .iter()
            .any(|m| m.starts_with("🏆 Final Score:")));
    }

    #[test]
    fn sync_run_completes_immediately() {
        let scratch = tempfile::tempdir().unwrap();
        let tester = fast_tester(scratch.path(), Arc::new(MemorySink::new()));

        match tester.run_all(false).unwrap() {
            SuiteRun::Completed(result) => assert_eq!(result.stages().len(), 4),
            SuiteRun::Running(_) => panic!("sync run must complete before returning"),
        }
    }

    #[test]
    fn progress_callback_emits_events_in_quiet_mode() {
        let events: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let options = RunOptions {
            quiet: true,
            progress: Some(Arc::new(move |update| {
                let mut guard = sink.lock().expect("progress sink lock poisoned");
                guard.push(update);
            })),
        };

        let finished = [(BenchmarkKind::Cpu, 6.5), (BenchmarkKind::Ram, 0.0)];
        report_progress(&options, BenchmarkKind::Disk, &finished, "Disk benchmark");

        let guard = events.lock().expect("progress sink lock poisoned");
        assert_eq!(guard.len(), 1);
        assert_eq!(guard[0].stage, BenchmarkKind::Disk);
        assert_eq!(guard[0].completed_steps, 2);
        assert_eq!(guard[0].total_steps, 4);
        assert_eq!(guard[0].scores, finished.to_vec());
        assert_eq!(guard[0].status, "Disk benchmark");
    }

    #[test]
    fn suite_reports_progress_for_every_stage() {
        let scratch = tempfile::tempdir().unwrap();
        let events: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&events);
        let tester = fast_tester(scratch.path(), Arc::new(MemorySink::new())).with_options(
            RunOptions {
                quiet: true,
                progress: Some(Arc::new(move |update| {
                    recorder.lock().unwrap().push(update);
                })),
            },
        );

        tester.run_blocking();

        let guard = events.lock().unwrap();
        let steps: Vec<usize> = guard.iter().map(|u| u.completed_steps).collect();
        assert_eq!(steps, vec![0, 1, 1, 2, 2, 3, 3, 4]);

        let last = guard.last().unwrap();
        assert_eq!(last.stage, BenchmarkKind::Gpu);
        assert_eq!(last.status, "GPU benchmark degraded");
        let stages: Vec<BenchmarkKind> = last.scores.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(stages, BenchmarkKind::ALL.to_vec());
        assert_eq!(last.scores[0].1, 1.15);
        assert_eq!(last.scores[3].1, 0.0);
    }

    #[test]
    fn weighted_final_score_example() {
        let result = SuiteResult::from_stages(
            BenchmarkResult::new(8.0, "cpu"),
            BenchmarkResult::new(6.0, "ram"),
            BenchmarkResult::new(4.0, "disk"),
            BenchmarkResult::new(9.0, "gpu"),
        );
        assert_eq!(result.final_score, 7.1);
    }

    #[test]
    fn json_uses_stage_names_as_keys() {
        let result = SuiteResult::from_stages(
            BenchmarkResult::new(1.0, "a"),
            BenchmarkResult::new(2.0, "b"),
            BenchmarkResult::new(3.0, "c"),
            BenchmarkResult::new(4.0, "d"),
        );
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["CPU"]["score"], 1.0);
        assert_eq!(value["RAM"]["detail"], "b");
        assert_eq!(value["Disk"]["score"], 3.0);
        assert_eq!(value["GPU"]["score"], 4.0);
        assert_eq!(value["final"], 2.5);
    }

    #[test]
    fn display_lists_every_stage() {
        let result = SuiteResult::from_stages(
            BenchmarkResult::new(1.0, "a"),
            BenchmarkResult::new(2.0, "b"),
            BenchmarkResult::new(3.0, "c"),
            BenchmarkResult::failed("missing graphics adapter"),
        );
        let text = result.display();
        for name in ["CPU", "RAM", "Disk", "GPU", "Final"] {
            assert!(text.contains(name), "{name} missing from report");
        }
        assert!(text.contains("missing graphics adapter"));
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }

    #[test]
    fn scoreboard_fills_in_finished_stages() {
        assert_eq!(
            scoreboard(&[]),
            "CPU    -- | RAM    -- | Disk    -- | GPU    --"
        );
        assert_eq!(
            scoreboard(&[(BenchmarkKind::Cpu, 7.1), (BenchmarkKind::Ram, 10.0)]),
            "CPU  7.10 | RAM 10.00 | Disk    -- | GPU    --"
        );
    }

    #[test]
    fn elapsed_time_formatting() {
        assert_eq!(format_elapsed(42.26), "42.3s");
        assert_eq!(format_elapsed(185.9), "3m 05s");
        assert_eq!(format_elapsed(f64::NAN), "0.0s");
        assert_eq!(format_elapsed(-3.0), "0.0s");
    }
}
