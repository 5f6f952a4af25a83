mod entry;
pub use entry::BudgetEntry;

mod error;
pub use error::{ModelError, ModelResult};

mod keys;
pub use keys::{DEFAULT_PREFIX, FieldNames};

mod millis;
pub use millis::{duration_from_ms, duration_to_ms, system_time_from_unix_ms, unix_ms};

mod retry;
pub use retry::RetryFlag;
