//! Benchmark error taxonomy
//!
//! Errors never escape a benchmark: the `run_*` entry points convert them into a zero score with
//! the error text as the detail string.

use thiserror::Error;

/// Errors raised while measuring a single benchmark stage
#[derive(Error, Debug)]
pub enum BenchError {
    /// A capability the stage needs (numeric kernels, graphics adapter) is not present.
    #[error("missing {0}")]
    ResourceUnavailable(String),

    /// The working buffer could not be allocated.
    #[error("allocation of {requested_mb} MB failed")]
    Allocation { requested_mb: u64 },

    #[error("measurement failed: {0}")]
    Measurement(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Expected conditions are reported as warnings rather than errors.
    pub fn is_expected(&self) -> bool {
        matches!(self, BenchError::ResourceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_never_empty() {
        let errors = [
            BenchError::ResourceUnavailable("graphics adapter".to_string()),
            BenchError::Allocation { requested_mb: 4096 },
            BenchError::Measurement("zero-sized buffer".to_string()),
            BenchError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn only_missing_resources_are_expected() {
        assert!(BenchError::ResourceUnavailable("wgpu".to_string()).is_expected());
        assert!(!BenchError::Allocation { requested_mb: 1 }.is_expected());
        assert!(!BenchError::Measurement("x".to_string()).is_expected());
    }
}
