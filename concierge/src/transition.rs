use std::time::Duration;

use futures_util::future::{Either, select};

use crate::host::{LocalFuture, Timer};

/// How a wait for a completion signal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Completed,
    TimedOut,
}

/// Await `signal`, but never longer than `ceiling`.
pub async fn settle_within<T>(timer: &T, signal: LocalFuture<()>, ceiling: Duration) -> Settled
where
    T: Timer + ?Sized,
{
    match select(signal, timer.sleep(ceiling)).await {
        Either::Left(_) => Settled::Completed,
        Either::Right(_) => Settled::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;
    use futures_util::FutureExt;

    #[tokio::test]
    async fn test_completed_signal_wins() {
        let host = TestHost::new();
        let settled = settle_within(&host, async {}.boxed_local(), Duration::from_millis(50)).await;

        assert_eq!(settled, Settled::Completed);
    }

    #[tokio::test]
    async fn test_silent_signal_times_out() {
        let host = TestHost::new();
        let settled = settle_within(
            &host,
            futures_util::future::pending().boxed_local(),
            Duration::from_millis(50),
        )
        .await;

        assert_eq!(settled, Settled::TimedOut);
        assert_eq!(host.sleeps(), vec![Duration::from_millis(50)]);
    }
}
