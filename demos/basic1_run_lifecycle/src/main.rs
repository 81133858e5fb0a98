use crate::tracing_setup::tracing_init;
use asyncop::{
    AsyncOperation, AsyncStreamExt, InitialState, OperationConfig, RunConfig, Scope,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("A. A run goes idle -> loading -> success");

    let projects: AsyncOperation<Vec<String>, String> = AsyncOperation::default();
    info!("  Main | show state: {:?}", projects.state());
    let running = projects.run(async {
        sleep(Duration::from_millis(100)).await;
        Ok::<_, String>(vec!["orbit".to_string(), "nebula".to_string()])
    });
    projects
        .to_stream()
        .until_settled()
        .for_each(|state| async move {
            info!("  Main | show state: {:?}", state);
        })
        .await;
    info!("  Main | run returned: {:?}", running.await);

    info!("==========================================");
    warn!("B. Only the newest of several overlapping runs lands");

    let search: AsyncOperation<String, String> = AsyncOperation::default();
    let mut runs = Vec::new();
    for (keyword, delay) in [("o", 300u64), ("or", 200), ("orb", 100)] {
        runs.push(search.run(async move {
            sleep(Duration::from_millis(delay)).await;
            info!("Worker | answer for {:?} arrived", keyword);
            Ok::<_, String>(format!("results for {keyword}"))
        }));
    }
    for running in runs {
        let _ = running.await;
    }
    info!("  Main | final state: {:?}", search.state());

    info!("==========================================");
    warn!("C. A failed run is retried");

    let attempts = Arc::new(AtomicU32::new(0));
    let flaky: AsyncOperation<u32, String> = AsyncOperation::default();
    let retry_attempts = attempts.clone();
    let config = RunConfig::new().retry(move || {
        let attempts = retry_attempts.clone();
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 2 {
                Err(format!("attempt {attempt} failed"))
            } else {
                Ok(attempt)
            }
        }
    });
    let first = flaky
        .run_with(async { Err::<u32, String>("first call failed".to_string()) }, config)
        .await;
    info!("  Main | first run: {:?}, state: {:?}", first, flaky.state());
    while flaky.state().is_error() {
        match flaky.retry() {
            Some(running) => {
                let outcome = running.await;
                info!("  Main | retry: {:?}, state: {:?}", outcome, flaky.state());
            }
            None => break,
        }
    }

    info!("==========================================");
    warn!("D. Stopping the owning scope drops late answers");

    let scope = Scope::new();
    if let Err(error) = scope.start() {
        warn!("  Main | {}", error);
        return;
    }
    let detail = match scope.operation::<String, String>(
        InitialState::new().data("cached".to_string()),
        OperationConfig::default().throw_on_error(true),
    ) {
        Ok(operation) => operation,
        Err(error) => {
            warn!("  Main | {}", error);
            return;
        }
    };
    let running = detail.run(async {
        sleep(Duration::from_millis(100)).await;
        Ok::<_, String>("fresh".to_string())
    });
    scope.stop();
    info!("  Main | run returned: {:?}", running.await);
    info!("  Main | state after stop: {:?}", detail.state());

    info!("  Main | Finish");
}
