//! Type definitions and aliases

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Direction of a single probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Reverse run: the server sends, the local side measures download
    Download,
    /// Forward run: the local side sends, measuring upload
    Upload,
}

impl Direction {
    /// Whether the probe must be started in reverse mode (`-R`)
    pub fn is_reverse(&self) -> bool {
        matches!(self, Direction::Download)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded retry schedule shared by the orchestrator and the transport
///
/// Attempts are counted in total, so `max_attempts = 2` means one try plus one
/// retry. A zero `backoff_base` disables waiting between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Sequential attempts without any wait in between
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base: Duration::ZERO,
        }
    }

    /// Exponential backoff doubling from `base` after every failed attempt
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base: base,
        }
    }

    /// Wait before the attempt following `attempt` (zero-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(1u32 << attempt.min(16))
    }

    /// Whether another attempt may follow `attempt` (zero-based)
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}
