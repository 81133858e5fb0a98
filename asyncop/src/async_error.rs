use thiserror::Error;

/// Failure reported by a [`Running`](crate::Running) handle.
///
/// Only produced when the operation was configured with `throw_on_error`,
/// or when the tracking task never got to finish.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum RunError<E> {
    /// The tracked future failed and `throw_on_error` re-raised it.
    #[error("operation rejected: {0}")]
    Rejected(E),

    /// The tracking task was dropped by the runtime before it settled.
    #[error("tracking task was aborted before the operation settled")]
    Aborted,
}

impl<E> RunError<E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RunError::Rejected(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunError::Aborted)
    }

    /// The rejection value, if there is one.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            RunError::Rejected(error) => Some(error),
            RunError::Aborted => None,
        }
    }
}

/// Misuse of a [`Scope`](crate::Scope)'s lifecycle.
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScopeError {
    #[error("scope was already started")]
    AlreadyStarted,

    #[error("scope is not active")]
    NotActive,

    #[error("scope was stopped")]
    Stopped,
}
