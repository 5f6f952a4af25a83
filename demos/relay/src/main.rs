use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::Extension, extract::State, middleware, routing::get};
use serde_json::{Value, json};
use tracing::info;

use fuze_api::{BudgetLayer, budget_middleware};
use fuze_core::prelude::*;
use fuze_model::{FieldNames, unix_ms};

/// Relay endpoint: report the inbound budget and show what a downstream
/// call would carry.
async fn relay(
    State(codec): State<Arc<BudgetCodec>>,
    ctx: Option<Extension<Context>>,
) -> Json<Value> {
    let Some(Extension(ctx)) = ctx else {
        return Json(json!({ "budget": "none" }));
    };

    let span = match Span::from_context(&ctx) {
        Ok(span) => span,
        Err(_) => return Json(json!({ "budget": "none" })),
    };

    // What the next hop would receive.
    let outbound = codec.http_headers(&span, None);
    info!(?outbound, "outbound headers for the downstream call");

    Json(json!({
        "retry": span.retry().as_token(),
        "deadline_ms": span.deadline().map(unix_ms),
        "may_retry": span.should_continue_retrying(),
        "admits_50ms_more": span.promise_minimum_quota(Duration::from_millis(50)),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    info!("logger initialized");

    // 2) codec shared by the middleware and the handler
    let codec = BudgetCodec::new(FieldNames::default()).with_sink(tracing_sink());
    let layer = BudgetLayer::new(codec.clone()).with_least_quota(Duration::from_millis(20));

    // 3) router with the budget middleware in front
    let app = Router::new()
        .route("/relay", get(relay))
        .layer(middleware::from_fn_with_state(layer, budget_middleware))
        .with_state(Arc::new(codec));

    // 4) serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    info!("relay listening on {}", listener.local_addr()?);
    info!("try: curl -H 'infector-timeout-ms: 2000' -H 'infector-retry-flag: on' localhost:8080/relay");
    axum::serve(listener, app).await?;

    Ok(())
}
