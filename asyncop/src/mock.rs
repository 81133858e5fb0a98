//! Test doubles: futures settled by hand and an in-memory auth backend.

use crate::{AuthProvider, Credentials};
use futures_signals::signal::Mutable;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::oneshot;

/// Settles the future returned alongside it by [`deferred`].
#[derive(Debug)]
pub struct Resolver<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Resolver<T, E> {
    /// Returns false if the future was already dropped.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(Ok(value)).is_ok()
    }

    pub fn reject(self, error: E) -> bool {
        self.tx.send(Err(error)).is_ok()
    }
}

/// A future that settles only when its [`Resolver`] says so. If the
/// resolver is dropped unused, the future stays pending forever.
pub fn deferred<T, E>() -> (Resolver<T, E>, impl Future<Output = Result<T, E>> + Send + 'static)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let future = async move {
        match rx.await {
            Ok(result) => result,
            Err(_) => std::future::pending().await,
        }
    };
    (Resolver { tx }, future)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MockUser {
    pub name: String,
    pub token: String,
}

impl MockUser {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        MockUser {
            token: format!("token-{name}"),
            name,
        }
    }
}

/// Calls received by a [`MockAuthProvider`], in order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AuthCall {
    Bootstrap,
    Login(String),
    Register(String),
    Logout,
}

/// In-memory accounts plus a single stored user standing in for token
/// storage. Clones share everything.
#[derive(Debug, Clone)]
pub struct MockAuthProvider {
    accounts: Mutable<HashMap<String, String>>,
    stored: Mutable<Option<MockUser>>,
    bootstrap_error: Mutable<Option<String>>,
    calls: Mutable<Vec<AuthCall>>,
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthProvider {
    pub fn new() -> Self {
        MockAuthProvider {
            accounts: Mutable::new(HashMap::new()),
            stored: Mutable::new(None),
            bootstrap_error: Mutable::new(None),
            calls: Mutable::new(Vec::new()),
        }
    }

    pub fn with_account(self, username: &str, password: &str) -> Self {
        self.accounts
            .lock_mut()
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Pretend a previous session left a token behind.
    pub fn with_stored_user(self, user: MockUser) -> Self {
        self.stored.set(Some(user));
        self
    }

    pub fn with_bootstrap_error(self, message: &str) -> Self {
        self.bootstrap_error.set(Some(message.to_string()));
        self
    }

    pub fn stored_user(&self) -> Option<MockUser> {
        self.stored.get_cloned()
    }

    pub fn calls(&self) -> Vec<AuthCall> {
        self.calls.get_cloned()
    }

    fn record(&self, call: AuthCall) {
        self.calls.lock_mut().push(call);
    }
}

impl AuthProvider for MockAuthProvider {
    type User = MockUser;
    type Error = String;

    fn bootstrap(&self) -> impl Future<Output = Result<Option<MockUser>, String>> + Send {
        let this = self.clone();
        async move {
            this.record(AuthCall::Bootstrap);
            tokio::task::yield_now().await;
            match this.bootstrap_error.get_cloned() {
                Some(message) => Err(message),
                None => Ok(this.stored.get_cloned()),
            }
        }
    }

    fn login(&self, credentials: Credentials) -> impl Future<Output = Result<MockUser, String>> + Send {
        let this = self.clone();
        async move {
            this.record(AuthCall::Login(credentials.username.clone()));
            tokio::task::yield_now().await;
            let known = this.accounts.lock_ref().get(&credentials.username).cloned();
            match known {
                Some(password) if password == credentials.password => {
                    let user = MockUser::new(credentials.username);
                    this.stored.set(Some(user.clone()));
                    Ok(user)
                }
                _ => Err("invalid username or password".to_string()),
            }
        }
    }

    fn register(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<MockUser, String>> + Send {
        let this = self.clone();
        async move {
            this.record(AuthCall::Register(credentials.username.clone()));
            tokio::task::yield_now().await;
            {
                let mut accounts = this.accounts.lock_mut();
                if accounts.contains_key(&credentials.username) {
                    return Err(format!("user {} already exists", credentials.username));
                }
                accounts.insert(credentials.username.clone(), credentials.password);
            }
            let user = MockUser::new(credentials.username);
            this.stored.set(Some(user.clone()));
            Ok(user)
        }
    }

    fn logout(&self) -> impl Future<Output = Result<(), String>> + Send {
        let this = self.clone();
        async move {
            this.record(AuthCall::Logout);
            this.stored.set(None);
            Ok(())
        }
    }
}
