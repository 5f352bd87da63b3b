//! Disk throughput benchmark
//!
//! Writes a scratch file of random 1 MiB blocks (synced before the timer stops), reads it back
//! sequentially, then samples a few large reads at random offsets. The scratch directory is a
//! [`tempfile::TempDir`], so it is removed on every exit path including unwinding.

use super::{guarded, rate_mb_s, BenchmarkKind, BenchmarkResult};
use crate::error::BenchError;
use crate::log_sink::LogSink;
use crate::scoring::reference;
use rand::Rng;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const BLOCK_BYTES: usize = 1024 * 1024;
/// Number of random-offset reads.
pub const RANDOM_READS: u64 = 10;
/// Size of each random-offset read, MB.
pub const RANDOM_READ_MB: u64 = 4;

const WRITE_WEIGHT: f64 = 0.5;
const READ_WEIGHT: f64 = 0.4;
const RANDOM_WEIGHT: f64 = 0.1;

/// Throughput of the three disk phases, MB/s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskMeasurement {
    pub write_mb_s: f64,
    pub read_mb_s: f64,
    pub rand_mb_s: f64,
}

impl DiskMeasurement {
    /// Weighted throughput fed to the normalizer.
    pub fn metric(&self) -> f64 {
        WRITE_WEIGHT * self.write_mb_s + READ_WEIGHT * self.read_mb_s + RANDOM_WEIGHT * self.rand_mb_s
    }

    pub fn score(&self) -> f64 {
        reference::DISK_MB_S.score(self.metric())
    }

    pub fn detail(&self) -> String {
        format!(
            "seq_write={:.2}MB/s seq_read={:.2}MB/s rand_read={:.2}MB/s",
            self.write_mb_s, self.read_mb_s, self.rand_mb_s
        )
    }

    pub fn into_result(self) -> BenchmarkResult {
        BenchmarkResult::new(self.score(), self.detail())
    }
}

/// Run the disk stage with a `size_mb` MiB scratch file under `scratch_parent` (the OS temp dir
/// when `None`). Never fails; degraded runs score 0.
pub fn run_disk_benchmark(
    size_mb: u64,
    scratch_parent: Option<&Path>,
    sink: &dyn LogSink,
) -> BenchmarkResult {
    sink.info(&format!(
        "▶️ DISK: testing {size_mb} MB sequential write/read..."
    ));

    guarded(BenchmarkKind::Disk, sink, || {
        let measurement = measure(size_mb, scratch_parent, sink, sequential_read)?;
        Ok(measurement.into_result())
    })
}

/// Read phase: time a full sequential pass over the `size_mb` MiB file at the given path.
type ReadPhase = fn(&Path, u64) -> Result<Duration, BenchError>;

fn measure(
    size_mb: u64,
    scratch_parent: Option<&Path>,
    sink: &dyn LogSink,
    read_phase: ReadPhase,
) -> Result<DiskMeasurement, BenchError> {
    if size_mb < RANDOM_READ_MB {
        return Err(BenchError::Measurement(format!(
            "file size must be at least {RANDOM_READ_MB} MB"
        )));
    }

    let scratch = scratch_dir(scratch_parent)?;
    let path = scratch
        .path()
        .join(format!("disk-{}.bin", uuid::Uuid::new_v4()));
    tracing::debug!(path = %path.display(), size_mb, "disk scratch file");

    let write_time = sequential_write(&path, size_mb)?;
    let write_mb_s = rate_mb_s(size_mb as f64, write_time.as_secs_f64());
    sink.info(&format!(
        "DISK write: {write_mb_s:.2} MB/s ({:.2}s)",
        write_time.as_secs_f64()
    ));

    let read_time = read_phase(&path, size_mb)?;
    let read_mb_s = rate_mb_s(size_mb as f64, read_time.as_secs_f64());
    sink.info(&format!(
        "DISK read: {read_mb_s:.2} MB/s ({:.2}s)",
        read_time.as_secs_f64()
    ));

    let rand_time = random_reads(&path, size_mb)?;
    let rand_mb_s = rate_mb_s((RANDOM_READS * RANDOM_READ_MB) as f64, rand_time.as_secs_f64());
    sink.info(&format!(
        "DISK random read: {rand_mb_s:.2} MB/s ({:.2}s)",
        rand_time.as_secs_f64()
    ));

    Ok(DiskMeasurement {
        write_mb_s,
        read_mb_s,
        rand_mb_s,
    })
}

fn scratch_dir(parent: Option<&Path>) -> Result<TempDir, BenchError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("hwbench-disk-");
    let dir = match parent {
        Some(parent) => builder.tempdir_in(parent)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

fn sequential_write(path: &Path, size_mb: u64) -> Result<Duration, BenchError> {
    let mut block = vec![0u8; BLOCK_BYTES];
    rand::thread_rng().fill(&mut block[..]);

    let start = Instant::now();
    let mut file = File::create(path)?;
    for _ in 0..size_mb {
        file.write_all(&block)?;
    }
    file.flush()?;
    file.sync_all()?;
    Ok(start.elapsed())
}

fn sequential_read(path: &Path, size_mb: u64) -> Result<Duration, BenchError> {
    let mut buf = vec![0u8; BLOCK_BYTES];
    let expected = size_mb * BLOCK_BYTES as u64;

    let start = Instant::now();
    let mut file = File::open(path)?;
    let mut total: u64 = 0;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        total += n as u64;
    }
    let elapsed = start.elapsed();

    if total != expected {
        return Err(BenchError::Measurement(format!(
            "read back {total} bytes, expected {expected}"
        )));
    }
    Ok(elapsed)
}

fn random_reads(path: &Path, size_mb: u64) -> Result<Duration, BenchError> {
    let mut rng = rand::thread_rng();
    let mut buf = vec![0u8; RANDOM_READ_MB as usize * BLOCK_BYTES];
    let last_start_mb = size_mb - RANDOM_READ_MB;

    let start = Instant::now();
    let mut file = File::open(path)?;
    for _ in 0..RANDOM_READS {
        let offset_mb = rng.gen_range(0..=last_start_mb);
        file.seek(SeekFrom::Start(offset_mb * BLOCK_BYTES as u64))?;
        file.read_exact(&mut buf)?;
    }
    Ok(start.elapsed())
}
