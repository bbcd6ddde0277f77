use brushpath_config::ConfigError;
use thiserror::Error;

use crate::reference::ReferenceError;

/// Errors raised by the toolpath pipeline.
///
/// `InvalidParameter` and `ReferenceUnavailable` abort a run.
/// `DegenerateStroke` is reported per stroke; the pipeline skips the stroke
/// and carries on.
#[derive(Debug, Error)]
pub enum ToolpathError {
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Reference document unavailable: {0}")]
    ReferenceUnavailable(String),
    #[error("Degenerate stroke: {points} point(s), length {length}")]
    DegenerateStroke { points: usize, length: f64 },
    #[error("Configuration error: {0}")]
    Config(ConfigError),
}

pub type Result<T> = std::result::Result<T, ToolpathError>;

impl From<ConfigError> for ToolpathError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidParameter {
                name,
                value,
                reason,
            } => ToolpathError::InvalidParameter {
                name,
                value,
                reason,
            },
            other => ToolpathError::Config(other),
        }
    }
}

impl From<ReferenceError> for ToolpathError {
    fn from(err: ReferenceError) -> Self {
        ToolpathError::ReferenceUnavailable(err.to_string())
    }
}

impl ToolpathError {
    /// Whether the pipeline may skip the offending stroke and continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ToolpathError::DegenerateStroke { .. })
    }
}
