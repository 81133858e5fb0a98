use asyncop::mock::{MockAuthProvider, MockUser};
use asyncop::{AuthSession, Scope};

pub const USERNAME: &str = "jack";
pub const PASSWORD: &str = "secret";

pub fn active_scope() -> Scope {
    let scope = Scope::new();
    scope.start().expect("fresh scope starts");
    scope
}

pub fn provider_with_account() -> MockAuthProvider {
    MockAuthProvider::new().with_account(USERNAME, PASSWORD)
}

pub fn session(scope: &Scope, provider: MockAuthProvider) -> AuthSession<MockAuthProvider> {
    AuthSession::new(scope, provider).expect("scope is active")
}

pub fn jack() -> MockUser {
    MockUser::new(USERNAME)
}
