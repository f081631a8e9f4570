use crate::Error;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline scope for a single API call.
///
/// A `Context` is cheap to clone. Clones share the same cancellation token, so cancelling one
/// cancels all of them.
///
/// ```
/// use amplitude_http::Context;
/// use std::time::Duration;
///
/// let ctx = Context::background().with_timeout(Duration::from_secs(5));
/// let token = ctx.cancellation_token().clone();
/// // Later, from anywhere:
/// token.cancel();
/// assert!(ctx.err().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Use the given token to cancel calls made with this context.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Give up on calls made with this context once `timeout` has elapsed, counted from now.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Give up on calls made with this context at `deadline`.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// The token that cancels this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this context is done, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            Some(Error::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(Error::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub(crate) async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Error::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Error::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        assert!(Context::background().err().is_none());
    }

    #[test]
    fn cancelled_token_reports_cancelled() {
        let ctx = Context::background();
        ctx.cancellation_token().cancel();
        assert!(matches!(ctx.err(), Some(Error::Cancelled)));
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = Context::background();
        let clone = ctx.clone();
        ctx.cancellation_token().cancel();
        assert!(matches!(clone.err(), Some(Error::Cancelled)));
    }

    #[tokio::test]
    async fn expired_deadline_reports_deadline_exceeded() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert!(matches!(ctx.err(), Some(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn cancellation_wins_over_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        ctx.cancellation_token().cancel();
        assert!(matches!(ctx.err(), Some(Error::Cancelled)));
    }

    #[tokio::test]
    async fn earlier_deadline_is_kept() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(Some(now + Duration::from_secs(1)), ctx.deadline());
    }

    #[tokio::test]
    async fn done_resolves_on_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(matches!(ctx.done().await, Error::DeadlineExceeded));
    }
}
