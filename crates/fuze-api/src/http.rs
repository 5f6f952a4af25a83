use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use fuze_core::carrier::Carrier;
use fuze_core::codec::BudgetCodec;
use fuze_core::context::Context;
use fuze_core::policy;

/// Configuration for the inbound budget middleware.
///
/// Wire it with `axum::middleware::from_fn_with_state(layer,
/// budget_middleware)`.
#[derive(Clone)]
pub struct BudgetLayer {
    codec: Arc<BudgetCodec>,
    least_quota: Duration,
}

impl BudgetLayer {
    /// Create a layer around `codec` with no minimum-quota requirement.
    pub fn new(codec: BudgetCodec) -> Self {
        Self {
            codec: Arc::new(codec),
            least_quota: Duration::ZERO,
        }
    }

    /// Require at least this much remaining budget before admitting a
    /// request.
    pub fn with_least_quota(mut self, quota: Duration) -> Self {
        self.least_quota = quota;
        self
    }
}

/// Inbound side of budget propagation for axum services.
///
/// Parses a budget from the request headers, admits or rejects the request,
/// attaches the execution [`Context`] to the request extensions and releases
/// the span when the response is ready. Requests without budget fields pass
/// through untouched: an upstream that never joined the protocol is not an
/// error.
pub async fn budget_middleware(
    State(layer): State<BudgetLayer>,
    mut req: Request,
    next: Next,
) -> Response {
    let span = match layer
        .codec
        .parse_span(&Context::root(), &Carrier::Http(req.headers_mut()))
    {
        Ok(span) => span,
        Err(err) => {
            debug!(%err, "request without budget, passing through");
            return next.run(req).await;
        }
    };

    let _guard = span.release_guard();

    if !policy::admit(&span, layer.least_quota) {
        debug!(
            deadline = ?span.deadline(),
            least_quota = ?layer.least_quota,
            "rejecting request, budget exhausted"
        );
        return reject();
    }

    req.extensions_mut().insert(span.context());
    next.run(req).await
}

fn reject() -> Response {
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(serde_json::json!({
            "error": "the timeout-ms value in header is 0, not enough time."
        })),
    )
        .into_response()
}
