use tokio_util::sync::CancellationToken;

use crate::span::Span;

/// Execution context handed from a unit of work to its descendants.
///
/// Cheap to clone. Carries the cancellation channel and, once a budget was
/// bound, a private link back to the owning [`Span`]. The link is recovered
/// with [`Span::from_context`]; unrelated code cannot reach or replace it.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    span: Option<Span>,
}

impl Context {
    /// Detached root context with no budget attached.
    pub fn root() -> Self {
        Self::default()
    }

    pub(crate) fn with_span(token: CancellationToken, span: Span) -> Self {
        Self {
            token,
            span: Some(span),
        }
    }

    /// Cancellation channel shared with every descendant of this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Point-in-time check: released, or past the bound deadline.
    pub fn is_cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        self.span
            .as_ref()
            .and_then(Span::deadline)
            .is_some_and(|deadline| std::time::SystemTime::now() >= deadline)
    }

    /// Wait until the unit of work is released or its deadline passes.
    ///
    /// Contexts without a linked span only resolve on explicit
    /// cancellation of their token.
    pub async fn cancelled(&self) {
        match &self.span {
            Some(span) => span.cancelled().await,
            None => self.token.cancelled().await,
        }
    }
}
