#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{BudgetLayer, budget_middleware};

#[cfg(feature = "grpc")]
mod grpc;
#[cfg(feature = "grpc")]
pub use grpc::BudgetInterceptor;
