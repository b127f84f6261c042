use thiserror::Error;

/// Errors raised while running a verdict.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The database rejected the statement or the connection failed.
    /// Carries the driver message; may be transient.
    #[error("execution failed: {message}")]
    Execution { message: String },

    /// The statement exceeded the client-side timeout and was abandoned.
    #[error("execution timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The verdict was validated against a different catalog than the one
    /// the restricted principal was provisioned for.
    #[error("verdict validated against catalog {found}, executor serves {expected}")]
    StaleCatalog { expected: String, found: String },

    /// Caller bug: a rejected verdict was handed to the executor.
    #[error("internal contract violation: refusing to execute a rejected verdict")]
    UnacceptedVerdict,
}

impl ExecutorError {
    /// Whether retrying the same verdict may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Execution { .. } | Self::Timeout { .. })
    }
}

impl From<sqlx::Error> for ExecutorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Execution {
            message: err.to_string(),
        }
    }
}
