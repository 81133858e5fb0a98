use crate::tracing_setup::tracing_init;
use asyncop::mock::{MockAuthProvider, MockUser};
use asyncop::{ApiResponse, AuthSession, Credentials, Scope, SessionView};
use tracing::{info, warn};

mod tracing_setup;

#[tokio::main]
async fn main() {
    tracing_init();

    let scope = Scope::new();
    if let Err(error) = scope.start() {
        warn!("  Main | {}", error);
        return;
    }

    let provider = MockAuthProvider::new()
        .with_account("jack", "secret")
        .with_stored_user(MockUser::new("jack"));
    let session = match AuthSession::new(&scope, provider) {
        Ok(session) => session,
        Err(error) => {
            warn!("  Main | {}", error);
            return;
        }
    };

    info!("==========================================");
    warn!("A. Bootstrap from a stored token");

    let running = session.bootstrap();
    render(&session.view());
    let _ = running.await;
    render(&session.view());

    info!("==========================================");
    warn!("B. An expired token signs the user out");

    let response: ApiResponse<Vec<String>, String> = ApiResponse::classify(
        401,
        || vec!["orbit".to_string()],
        || "unauthorized".to_string(),
    );
    match session.accept(response).await {
        Ok(projects) => info!("  Main | projects: {:?}", projects),
        Err(error) => warn!("  Main | {}", error),
    }
    render(&session.view());

    info!("==========================================");
    warn!("C. Sign in again");

    match session.login(Credentials::new("jack", "wrong")).await {
        Ok(user) => info!("  Main | signed in as {}", user.name),
        Err(error) => warn!("  Main | {}", error),
    }
    match session.login(Credentials::new("jack", "secret")).await {
        Ok(user) => info!("  Main | signed in as {}", user.name),
        Err(error) => warn!("  Main | {}", error),
    }
    render(&session.view());

    scope.stop();
    info!("  Main | Finish");
}

fn render(view: &SessionView<MockUser, String>) {
    match view {
        SessionView::Loading => info!("  View | full page loading"),
        SessionView::Failed(error) => info!("  View | full page error: {}", error),
        SessionView::Ready(Some(user)) => info!("  View | authenticated app for {}", user.name),
        SessionView::Ready(None) => info!("  View | login screen"),
    }
}
