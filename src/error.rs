use thiserror::Error;

/// Errors surfaced by the analysis library.
///
/// Degenerate input (empty or silent signals, bands that cover no FFT bin)
/// is not an error: those cases resolve to the decibel floor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A caller-supplied parameter is outside the supported domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A request was submitted while another analysis was still running.
    #[error("an analysis is already in flight on this worker")]
    Busy,
    /// The analysis thread could not be started.
    #[error("failed to start analysis thread: {0}")]
    Spawn(String),
    /// The worker thread went away before answering.
    #[error("analysis worker disconnected")]
    Disconnected,
}

impl AnalysisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
