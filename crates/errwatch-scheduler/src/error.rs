//! Check routine error types.

use thiserror::Error;

use errwatch_notify::NotifyError;

/// Errors a check invocation can end with.
///
/// Per-host transport failures are not here: they are logged and
/// isolated to the host, the routine keeps going.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The invocation deadline expired; remaining hosts were skipped.
    #[error("check invocation deadline exceeded")]
    DeadlineExceeded,

    /// Shutdown was signalled mid-invocation; remaining hosts were skipped.
    #[error("check invocation cancelled by shutdown")]
    Cancelled,

    /// A failure notification could not be delivered.
    #[error("notification delivery failed: {0}")]
    Notify(#[from] NotifyError),
}
