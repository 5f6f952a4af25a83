use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Status, service::Interceptor};
use tracing::debug;

use fuze_core::carrier::Carrier;
use fuze_core::codec::BudgetCodec;
use fuze_core::context::Context;
use fuze_core::policy;
use fuze_core::span::ReleaseGuard;

/// Inbound side of budget propagation for tonic services.
///
/// Parses a budget from the request metadata and rejects calls whose budget
/// is already exhausted with `Status::deadline_exceeded`. Admitted calls
/// carry the execution [`Context`] in their extensions.
///
/// Interceptors run before the handler, so the span cannot be scoped around
/// it; instead the release guard travels in the request extensions and
/// fires when the request is dropped.
#[derive(Clone)]
pub struct BudgetInterceptor {
    codec: Arc<BudgetCodec>,
    least_quota: Duration,
}

impl BudgetInterceptor {
    /// Create an interceptor around `codec` with no minimum-quota
    /// requirement.
    pub fn new(codec: BudgetCodec) -> Self {
        Self {
            codec: Arc::new(codec),
            least_quota: Duration::ZERO,
        }
    }

    /// Require at least this much remaining budget before admitting a call.
    pub fn with_least_quota(mut self, quota: Duration) -> Self {
        self.least_quota = quota;
        self
    }
}

impl Interceptor for BudgetInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let span = match self
            .codec
            .parse_span(&Context::root(), &Carrier::Grpc(request.metadata_mut()))
        {
            Ok(span) => span,
            Err(err) => {
                debug!(%err, "call without budget, passing through");
                return Ok(request);
            }
        };

        if !policy::admit(&span, self.least_quota) {
            debug!(
                deadline = ?span.deadline(),
                least_quota = ?self.least_quota,
                "rejecting call, budget exhausted"
            );
            span.release();
            return Err(Status::deadline_exceeded(
                "the timeout-ms value in metadata is 0, not enough time.",
            ));
        }

        let guard: Arc<ReleaseGuard> = Arc::new(span.release_guard());
        request.extensions_mut().insert(span.context());
        request.extensions_mut().insert(guard);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuze_core::span::Span;
    use fuze_model::RetryFlag;

    fn request_with_budget(timeout_ms: &str) -> Request<()> {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert("infector-timeout-ms", timeout_ms.parse().unwrap());
        request
            .metadata_mut()
            .insert("infector-retry-flag", "on".parse().unwrap());
        request
    }

    #[test]
    fn call_without_budget_passes_through() {
        let mut interceptor = BudgetInterceptor::new(BudgetCodec::default());

        let request = interceptor.call(Request::new(())).unwrap();
        assert!(request.extensions().get::<Context>().is_none());
    }

    #[test]
    fn healthy_budget_attaches_context_and_guard() {
        let mut interceptor = BudgetInterceptor::new(BudgetCodec::default());

        let request = interceptor.call(request_with_budget("60000")).unwrap();

        let ctx = request.extensions().get::<Context>().expect("context");
        let span = Span::from_context(ctx).unwrap();
        assert!(span.has_time_remaining());
        assert_eq!(span.retry(), RetryFlag::On);
        assert!(request.extensions().get::<Arc<ReleaseGuard>>().is_some());
    }

    #[test]
    fn exhausted_budget_is_rejected() {
        let mut interceptor = BudgetInterceptor::new(BudgetCodec::default());

        let status = interceptor.call(request_with_budget("0")).unwrap_err();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);
    }

    #[test]
    fn least_quota_rejects_thin_budgets() {
        let mut interceptor = BudgetInterceptor::new(BudgetCodec::default())
            .with_least_quota(Duration::from_secs(10));

        let status = interceptor.call(request_with_budget("500")).unwrap_err();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);
    }

    #[test]
    fn dropping_the_request_releases_the_span() {
        let mut interceptor = BudgetInterceptor::new(BudgetCodec::default());

        let request = interceptor.call(request_with_budget("60000")).unwrap();
        let ctx = request.extensions().get::<Context>().unwrap().clone();

        drop(request);
        assert!(ctx.is_cancelled());
    }
}
