// src/error.rs
use std::fmt;

/// A funnel whose stage counts grow instead of shrinking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunnelError {
    StageExceedsPrevious {
        stage: &'static str,
        count: u64,
        previous: &'static str,
        previous_count: u64,
    },
}

impl fmt::Display for FunnelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FunnelError::StageExceedsPrevious { stage, count, previous, previous_count } => write!(
                f,
                "funnel stage '{}' ({}) exceeds previous stage '{}' ({})",
                stage, count, previous, previous_count
            ),
        }
    }
}

impl std::error::Error for FunnelError {}

/// Contract violations by the caller of the snapshot assembler.
/// Missing data is never an error here; it falls back to defaults instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    MissingStoreUrl,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SnapshotError::MissingStoreUrl => write!(f, "test result has no store URL"),
        }
    }
}

impl std::error::Error for SnapshotError {}
