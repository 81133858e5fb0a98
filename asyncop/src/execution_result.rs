/// Output of a tracked future, viewed as the operation's `Result`.
///
/// A plain value counts as an infallible success, so `run(async { 42 })`
/// works alongside `run(async { Ok::<_, E>(42) })`.
pub trait ExecutionResult<T, E> {
    fn into_result(self) -> Result<T, E>;
}

impl<T, E> ExecutionResult<T, E> for T {
    fn into_result(self) -> Result<T, E> {
        Ok(self)
    }
}

impl<T, E> ExecutionResult<T, E> for Result<T, E> {
    fn into_result(self) -> Result<T, E> {
        self
    }
}
