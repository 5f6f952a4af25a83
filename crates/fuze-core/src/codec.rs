//! Conversion between in-memory budgets and the three wire string fields.
//!
//! Field names are fixed at construction via [`FieldNames`]; there is no
//! process-global prefix state. Decoding is lenient: malformed fields are
//! reported to the anomaly sink and degrade to defaults, and only a carrier
//! with none of the fields at all yields [`CoreError::NoBudgetPresent`].
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use http::HeaderMap;
use serde_json::{Map, Value};
use tonic::metadata::MetadataMap;

use fuze_model::{
    BudgetEntry, FieldNames, RetryFlag, duration_from_ms, duration_to_ms, system_time_from_unix_ms,
    unix_ms,
};

use crate::carrier::Carrier;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::sink::{SinkHandle, noop_sink};
use crate::span::Span;

/// Budget read from a carrier, before a local deadline is re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedBudget {
    /// Remaining timeout the upstream granted; zero when absent or
    /// malformed.
    pub timeout: Duration,
    /// Propagated retry permission; `Unknown` when absent or malformed.
    pub retry: RetryFlag,
}

/// Parse the timeout field: non-negative base-10 milliseconds.
pub fn parse_timeout_ms(raw: &str) -> CoreResult<Duration> {
    raw.parse::<u64>()
        .map(duration_from_ms)
        .map_err(|_| CoreError::InvalidTimeout(raw.to_string()))
}

/// Parse the deadline field: base-10 milliseconds since the Unix epoch.
///
/// The codec itself only checks the deadline field for presence; this is
/// for collaborators that want the upstream's raw wall-clock value.
pub fn parse_deadline_ms(raw: &str) -> CoreResult<SystemTime> {
    raw.parse::<u64>()
        .map(system_time_from_unix_ms)
        .map_err(|_| CoreError::InvalidDeadline(raw.to_string()))
}

/// Codec over one fixed set of field names.
#[derive(Clone)]
pub struct BudgetCodec {
    keys: FieldNames,
    sink: SinkHandle,
}

impl Default for BudgetCodec {
    fn default() -> Self {
        Self::new(FieldNames::default())
    }
}

impl BudgetCodec {
    /// Create a codec with the given field names and a no-op anomaly sink.
    pub fn new(keys: FieldNames) -> Self {
        Self {
            keys,
            sink: noop_sink(),
        }
    }

    /// Replace the anomaly sink.
    pub fn with_sink(mut self, sink: SinkHandle) -> Self {
        self.sink = sink;
        self
    }

    /// Field names this codec reads and writes.
    pub fn keys(&self) -> &FieldNames {
        &self.keys
    }

    /// Read the budget fields out of `carrier`.
    ///
    /// `Err(NoBudgetPresent)` only when none of the three fields exist —
    /// the upstream never joined the protocol, which callers treat
    /// differently from "joined but sent a malformed value". Malformed
    /// fields are sink-reported and degrade: retry to `Unknown`, timeout
    /// to zero.
    pub fn read(&self, carrier: &Carrier<'_>) -> CoreResult<DecodedBudget> {
        let retry_raw = carrier.get(self.keys.retry());
        let timeout_raw = carrier.get(self.keys.timeout());
        let deadline_raw = carrier.get(self.keys.deadline());

        if retry_raw.is_none() && timeout_raw.is_none() && deadline_raw.is_none() {
            return Err(CoreError::NoBudgetPresent);
        }

        let retry = match retry_raw {
            None => RetryFlag::Unknown,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                self.report(&CoreError::InvalidRetryFlag(raw.to_string()));
                RetryFlag::Unknown
            }),
        };

        let timeout = match timeout_raw {
            None => {
                self.report(&CoreError::InvalidTimeout(String::new()));
                Duration::ZERO
            }
            Some(raw) => parse_timeout_ms(raw).unwrap_or_else(|err| {
                self.report(&err);
                Duration::ZERO
            }),
        };

        Ok(DecodedBudget { timeout, retry })
    }

    /// [`BudgetCodec::read`] plus local deadline derivation.
    ///
    /// The receiver re-derives `deadline = now + timeout` instead of
    /// trusting the upstream's wall clock, absorbing skew between hops.
    /// A zero timeout yields an entry with no deadline.
    pub fn read_entry(&self, carrier: &Carrier<'_>) -> CoreResult<BudgetEntry> {
        let decoded = self.read(carrier)?;
        Ok(BudgetEntry::from_timeout(decoded.timeout, decoded.retry))
    }

    /// Decode `carrier` and bind the result to a new span under `parent`.
    ///
    /// `NoBudgetPresent` passes through so the caller can choose to proceed
    /// without a budget.
    pub fn parse_span(&self, parent: &Context, carrier: &Carrier<'_>) -> CoreResult<Span> {
        let decoded = self.read(carrier)?;
        Ok(Span::new(parent, decoded.timeout, decoded.retry))
    }

    /// Project `entry` onto the three wire fields.
    ///
    /// Never fails. All three fields are written even without a deadline —
    /// the presence of the fields, not their non-zero-ness, signals that
    /// budget propagation is in effect for this call chain. An expired
    /// budget encodes a timeout of exactly `"0"`, never a negative value.
    pub fn write_entry(&self, entry: &BudgetEntry, carrier: &mut Carrier<'_>) {
        carrier.set(self.keys.retry(), entry.retry().as_token());

        let deadline_ms = entry.deadline().map(unix_ms).unwrap_or(0);
        carrier.set(self.keys.deadline(), &deadline_ms.to_string());
        carrier.set(self.keys.timeout(), "0");

        if let Some(remaining) = entry.remaining_at(SystemTime::now()) {
            if !remaining.is_zero() {
                carrier.set(self.keys.timeout(), &duration_to_ms(remaining).to_string());
            }
        }
    }

    /// Project `span`'s current budget onto the three wire fields.
    pub fn write_span(&self, span: &Span, carrier: &mut Carrier<'_>) {
        self.write_entry(&span.entry(), carrier);
    }

    /// Outbound HTTP headers carrying `span`'s budget.
    ///
    /// Every existing value in `base` is preserved; the budget fields are
    /// set afterwards, so they win over caller-supplied duplicates.
    pub fn http_headers(&self, span: &Span, base: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = base.cloned().unwrap_or_default();
        self.write_span(span, &mut Carrier::Http(&mut headers));
        headers
    }

    /// Outbound gRPC metadata carrying `span`'s budget.
    pub fn grpc_metadata(&self, span: &Span, base: Option<&MetadataMap>) -> MetadataMap {
        let mut metadata = base.cloned().unwrap_or_default();
        self.write_span(span, &mut Carrier::Grpc(&mut metadata));
        metadata
    }

    /// Outbound string map carrying `span`'s budget.
    pub fn text_map(&self, span: &Span, base: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut map = base.cloned().unwrap_or_default();
        self.write_span(span, &mut Carrier::Text(&mut map));
        map
    }

    /// Outbound JSON map carrying `span`'s budget.
    pub fn json_map(&self, span: &Span, base: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut map = base.cloned().unwrap_or_default();
        self.write_span(span, &mut Carrier::Json(&mut map));
        map
    }

    fn report(&self, err: &CoreError) {
        self.sink.error(&err.to_string());
    }
}
