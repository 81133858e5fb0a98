use crate::{
    ApiError, ApiResponse, AsyncOperation, AsyncStatus, InitialState, OperationConfig, Payload,
    Running, Scope, ScopeError,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Backend that knows how to authenticate a user. Transport and token
/// storage live behind this trait.
pub trait AuthProvider: Send + Sync + 'static {
    type User: Payload;
    type Error: Payload;

    /// Restore the signed-in user from stored credentials, if any.
    fn bootstrap(&self) -> impl Future<Output = Result<Option<Self::User>, Self::Error>> + Send;

    fn login(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<Self::User, Self::Error>> + Send;

    fn register(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<Self::User, Self::Error>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// What a consumer should show for the session right now.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SessionView<U, E> {
    /// Bootstrap has not finished yet.
    Loading,
    /// Bootstrap failed.
    Failed(E),
    /// Ready, with the signed-in user if there is one.
    Ready(Option<U>),
}

/// The signed-in user, tracked as an [`AsyncOperation`] owned by a [`Scope`].
pub struct AuthSession<P: AuthProvider> {
    provider: Arc<P>,
    user: AsyncOperation<Option<P::User>, P::Error>,
}

impl<P: AuthProvider> Clone for AuthSession<P> {
    fn clone(&self) -> Self {
        AuthSession {
            provider: self.provider.clone(),
            user: self.user.clone(),
        }
    }
}

impl<P: AuthProvider> AuthSession<P> {
    /// The scope must be active; stopping it retires the session.
    pub fn new(scope: &Scope, provider: P) -> Result<Self, ScopeError> {
        let user = scope.operation(InitialState::new(), OperationConfig::default())?;
        Ok(AuthSession {
            provider: Arc::new(provider),
            user,
        })
    }

    pub fn operation(&self) -> &AsyncOperation<Option<P::User>, P::Error> {
        &self.user
    }

    pub fn user(&self) -> Option<P::User> {
        self.user.state().data.flatten()
    }

    pub fn view(&self) -> SessionView<P::User, P::Error> {
        let state = self.user.state();
        match state.status {
            AsyncStatus::Idle | AsyncStatus::Loading => SessionView::Loading,
            AsyncStatus::Error => state
                .error
                .map(SessionView::Failed)
                .unwrap_or(SessionView::Loading),
            AsyncStatus::Success => SessionView::Ready(state.data.flatten()),
        }
    }

    /// Restore the user from stored credentials.
    pub fn bootstrap(&self) -> Running<Option<P::User>, P::Error> {
        debug!("bootstrapping session");
        let provider = self.provider.clone();
        self.user.run(async move { provider.bootstrap().await })
    }

    /// Provider errors go back to the caller and leave the session as it was.
    pub async fn login(&self, credentials: Credentials) -> Result<P::User, P::Error> {
        let user = self.provider.login(credentials).await?;
        info!("user signed in");
        self.user.set_data(Some(user.clone()));
        Ok(user)
    }

    pub async fn register(&self, credentials: Credentials) -> Result<P::User, P::Error> {
        let user = self.provider.register(credentials).await?;
        info!("user registered");
        self.user.set_data(Some(user.clone()));
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), P::Error> {
        self.provider.logout().await?;
        info!("user signed out");
        self.user.set_data(None);
        Ok(())
    }

    /// Unwrap a classified response, signing out when the server reports
    /// the session as expired.
    pub async fn accept<T, F>(&self, response: ApiResponse<T, F>) -> Result<T, ApiError<F>> {
        if response.is_auth_expired() {
            warn!("session expired");
            if self.logout().await.is_err() {
                warn!("sign-out after expiry failed");
            }
        }
        response.into_result()
    }
}
