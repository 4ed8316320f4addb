use backon::{ConstantBuilder, Retryable};
use futures::Future;
use std::time::Duration;

/// Errors that may succeed if the operation is attempted again.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

/// Fixed delay between attempts, at most `max_retries` attempts after the first one.
pub fn constant_backoff(delay: Duration, max_retries: usize) -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(delay)
        .with_max_times(max_retries)
}

pub async fn retry<T, Fut, FutureFn, E>(fut: FutureFn) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    FutureFn: FnMut() -> Fut,
    E: IsTransient,
{
    fut.retry(constant_backoff(Duration::from_millis(10), 2))
        .when(|e| e.is_transient())
        .await
}
