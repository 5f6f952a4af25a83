use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fuze_model::{BudgetEntry, RetryFlag};

use crate::carrier::Carrier;
use crate::codec::BudgetCodec;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::policy;

/// A cancellable unit of work bound to a request budget.
///
/// Two states exist:
/// - **Bound** (positive timeout): the span owns a child cancellation token
///   and a wall-clock deadline; [`Span::release`] is a real cancellation.
/// - **Unbound** (zero timeout): the parent's token is reused unchanged and
///   release is a no-op.
///
/// Handles are `Arc`-shared; clones observe the same cancellation state.
/// Release is idempotent and safe from any thread, and a correct caller
/// releases exactly once per unit of work, typically through
/// [`Span::release_guard`].
#[derive(Clone)]
pub struct Span {
    inner: Arc<Inner>,
}

struct Inner {
    token: CancellationToken,
    bound: bool,
    deadline: Option<SystemTime>,
    // Monotonic twin of `deadline`, for deadline-aware waiting.
    expires_at: Option<Instant>,
    timeout: Duration,
    retry: RetryFlag,
}

impl Span {
    /// Create a span under `parent`.
    ///
    /// A positive `timeout` binds the span: a child token is derived and the
    /// deadline is `now + timeout`. A zero timeout leaves the span unbound.
    pub fn new(parent: &Context, timeout: Duration, retry: RetryFlag) -> Self {
        let inner = if timeout > Duration::ZERO {
            Inner {
                token: parent.cancellation_token().child_token(),
                bound: true,
                deadline: Some(SystemTime::now() + timeout),
                expires_at: Some(Instant::now() + timeout),
                timeout,
                retry,
            }
        } else {
            Inner {
                token: parent.cancellation_token().clone(),
                bound: false,
                deadline: None,
                expires_at: None,
                timeout,
                retry,
            }
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Execution context descending from this span.
    ///
    /// The span links itself into the context, so any nested collaborator
    /// holding only the context can recover it with [`Span::from_context`].
    pub fn context(&self) -> Context {
        Context::with_span(self.inner.token.clone(), self.clone())
    }

    /// Recover the span previously linked into `ctx`.
    pub fn from_context(ctx: &Context) -> CoreResult<Span> {
        ctx.span().cloned().ok_or(CoreError::NoSpanBound)
    }

    /// Whether this span carries a real deadline and cancellation.
    pub fn is_bound(&self) -> bool {
        self.inner.bound
    }

    /// Absolute wall-clock deadline, if bound.
    pub fn deadline(&self) -> Option<SystemTime> {
        self.inner.deadline
    }

    /// Timeout the deadline was derived from at creation.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Propagated retry permission.
    pub fn retry(&self) -> RetryFlag {
        self.inner.retry
    }

    /// Immutable snapshot of this span's budget.
    pub fn entry(&self) -> BudgetEntry {
        BudgetEntry::new(self.inner.timeout, self.inner.deadline, self.inner.retry)
    }

    /// True when the deadline has passed, or when there is no deadline at
    /// all.
    ///
    /// Treating "no budget information" as already expired is deliberate:
    /// a caller that never propagated a budget fails safe instead of being
    /// granted unlimited time. Do not flip this to fail-open.
    pub fn reached_deadline(&self) -> bool {
        match self.inner.deadline {
            None => true,
            Some(deadline) => SystemTime::now() >= deadline,
        }
    }

    /// Negation of [`Span::reached_deadline`].
    pub fn has_time_remaining(&self) -> bool {
        !self.reached_deadline()
    }

    /// True only when at least `minimum` of the budget is left.
    ///
    /// Pre-admits work that needs a guaranteed slice of time rather than
    /// merely "some positive time". Always false for unbound spans.
    pub fn promise_minimum_quota(&self, minimum: Duration) -> bool {
        match self.inner.deadline {
            None => false,
            Some(deadline) => deadline
                .duration_since(SystemTime::now())
                .is_ok_and(|remaining| remaining >= minimum),
        }
    }

    /// Whether a retry loop holding this span may attempt again.
    pub fn should_continue_retrying(&self) -> bool {
        policy::should_continue_retrying(self.inner.retry)
    }

    /// Cancel the unit of work.
    ///
    /// Idempotent and safe to call concurrently; a no-op for unbound spans
    /// (there is nothing of their own to cancel).
    pub fn release(&self) {
        if self.inner.bound {
            self.inner.token.cancel();
        }
    }

    /// RAII guard that releases the span when dropped.
    pub fn release_guard(&self) -> ReleaseGuard {
        ReleaseGuard { span: self.clone() }
    }

    /// Resolves once the span is released or its deadline passes.
    ///
    /// Deadline enforcement is cooperative: nothing is interrupted, the
    /// future merely wakes deadline-aware operations that await it.
    pub async fn cancelled(&self) {
        match self.inner.expires_at {
            Some(at) => tokio::select! {
                _ = self.inner.token.cancelled() => {}
                _ = tokio::time::sleep_until(at) => {}
            },
            None => self.inner.token.cancelled().await,
        }
    }

    /// Encode this span's budget into `carrier` using `codec`.
    pub fn encode_into(&self, codec: &BudgetCodec, carrier: &mut Carrier<'_>) {
        codec.write_span(self, carrier);
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("bound", &self.inner.bound)
            .field("deadline", &self.inner.deadline)
            .field("timeout", &self.inner.timeout)
            .field("retry", &self.inner.retry)
            .finish()
    }
}

/// Releases its span when dropped, covering every exit path of the unit of
/// work that owns it.
pub struct ReleaseGuard {
    span: Span,
}

impl ReleaseGuard {
    /// The guarded span.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.span.release();
    }
}
