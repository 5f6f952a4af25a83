//! Pure admission and retry decisions over a span's state.
use std::time::Duration;

use fuze_model::RetryFlag;

use crate::span::Span;

/// Whether a retry loop may keep going given the propagated flag.
///
/// The flag is an opt-out signal: only an explicit upstream `Off`
/// suppresses retries. Legacy callers that never set the flag propagate
/// `Unknown` and must not be silently prevented from retrying.
pub fn should_continue_retrying(flag: RetryFlag) -> bool {
    match flag {
        RetryFlag::On | RetryFlag::Unknown => true,
        RetryFlag::Off => false,
    }
}

/// Shared admission rule used by the inbound adapters.
///
/// With a positive `least_quota` the span must promise at least that much
/// remaining budget; otherwise any positive remaining time admits the work.
pub fn admit(span: &Span, least_quota: Duration) -> bool {
    if least_quota > Duration::ZERO {
        span.promise_minimum_quota(least_quota)
    } else {
        span.has_time_remaining()
    }
}
