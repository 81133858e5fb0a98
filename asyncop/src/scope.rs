use crate::{AsyncOperation, InitialState, OperationConfig, Payload, ScopeError};
use futures_signals::signal::Mutable;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ScopePhase {
    #[default]
    Created,
    Active,
    Stopped,
}

/// Owner of a group of operations, bounded by `start()` and `stop()`.
///
/// Operations are handed out only while the scope is active, and all of
/// them are retired when it stops.
#[derive(Debug, Clone)]
pub struct Scope {
    phase: Mutable<ScopePhase>,
    token: CancellationToken,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            phase: Mutable::new(ScopePhase::Created),
            token: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> ScopePhase {
        self.phase.get()
    }

    pub fn is_active(&self) -> bool {
        self.phase() == ScopePhase::Active
    }

    pub fn start(&self) -> Result<(), ScopeError> {
        let mut phase = self.phase.lock_mut();
        match *phase {
            ScopePhase::Created => {}
            ScopePhase::Active => return Err(ScopeError::AlreadyStarted),
            ScopePhase::Stopped => return Err(ScopeError::Stopped),
        }
        *phase = ScopePhase::Active;
        debug!("scope started");
        Ok(())
    }

    /// Retire every operation created from this scope. Idempotent.
    pub fn stop(&self) {
        let mut phase = self.phase.lock_mut();
        if *phase != ScopePhase::Stopped {
            *phase = ScopePhase::Stopped;
            debug!("scope stopped");
        }
        self.token.cancel();
    }

    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn operation<T: Payload, E: Payload>(
        &self,
        initial: InitialState<T, E>,
        config: OperationConfig,
    ) -> Result<AsyncOperation<T, E>, ScopeError> {
        let phase = self.phase.lock_ref();
        if *phase != ScopePhase::Active {
            return Err(ScopeError::NotActive);
        }
        Ok(AsyncOperation::with_retirement(
            initial,
            config,
            self.token.child_token(),
        ))
    }
}
