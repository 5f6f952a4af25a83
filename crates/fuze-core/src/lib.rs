pub mod carrier;
pub mod codec;
pub mod context;
pub mod error;
pub mod policy;
pub mod sink;
pub mod span;

pub mod prelude {
    pub use crate::carrier::Carrier;
    pub use crate::codec::{BudgetCodec, DecodedBudget};
    pub use crate::context::Context;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::policy::{admit, should_continue_retrying};
    pub use crate::sink::{AnomalySink, SinkHandle, noop_sink, tracing_sink};
    pub use crate::span::{ReleaseGuard, Span};
}
