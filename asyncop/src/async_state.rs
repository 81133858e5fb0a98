#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a tracked operation. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum AsyncStatus {
    /// Nothing has completed or been forced yet.
    #[default]
    Idle,
    /// A run is outstanding.
    Loading,
    /// The latest run resolved, or data was set directly.
    Success,
    /// The latest run rejected, or an error was set directly.
    Error,
}

impl AsyncStatus {
    /// `Success` and `Error` are terminal.
    pub fn is_complete(&self) -> bool {
        matches!(self, AsyncStatus::Success | AsyncStatus::Error)
    }
}

/// Snapshot of an operation: its status plus the data and error it carries.
///
/// While `Loading`, `data` and `error` still hold the previous terminal
/// values so a view can keep showing them.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AsyncState<T, E> {
    pub status: AsyncStatus,
    pub data: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        AsyncState::idle()
    }
}

impl<T, E> AsyncState<T, E> {
    pub fn idle() -> Self {
        AsyncState {
            status: AsyncStatus::Idle,
            data: None,
            error: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == AsyncStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == AsyncStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == AsyncStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == AsyncStatus::Error
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Idle or failed: a caller may want to (re)start the operation.
    pub fn should_load(&self) -> bool {
        matches!(self.status, AsyncStatus::Idle | AsyncStatus::Error)
    }

    pub fn data_ref(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error_ref(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub(crate) fn begin_loading(&mut self) {
        self.status = AsyncStatus::Loading;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.status = AsyncStatus::Success;
        self.data = Some(data);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: E) {
        self.status = AsyncStatus::Error;
        self.error = Some(error);
        self.data = None;
    }
}

/// Partial snapshot used to seed an operation. Unset fields fall back to
/// `Idle`, no data, no error.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InitialState<T, E> {
    status: Option<AsyncStatus>,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E> Default for InitialState<T, E> {
    fn default() -> Self {
        InitialState {
            status: None,
            data: None,
            error: None,
        }
    }
}

impl<T, E> InitialState<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: AsyncStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn error(mut self, error: E) -> Self {
        self.error = Some(error);
        self
    }

    /// Merge over the defaults. An error is kept only for `Error`, and
    /// `Error` never carries data.
    pub fn into_state(self) -> AsyncState<T, E> {
        let status = self.status.unwrap_or_default();
        let failed = status == AsyncStatus::Error;
        AsyncState {
            status,
            data: if failed { None } else { self.data },
            error: if failed { self.error } else { None },
        }
    }
}

impl<T, E> From<AsyncState<T, E>> for InitialState<T, E> {
    fn from(state: AsyncState<T, E>) -> Self {
        InitialState {
            status: Some(state.status),
            data: state.data,
            error: state.error,
        }
    }
}
