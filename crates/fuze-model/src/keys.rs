/// Default field-name prefix.
///
/// Part of the wire contract: peers that never customize the prefix
/// interoperate on `infector-deadline-ms`, `infector-timeout-ms` and
/// `infector-retry-flag`.
pub const DEFAULT_PREFIX: &str = "infector";

const SUFFIX_DEADLINE: &str = "deadline-ms";
const SUFFIX_TIMEOUT: &str = "timeout-ms";
const SUFFIX_RETRY: &str = "retry-flag";

/// The three derived wire field names for one prefix.
///
/// Built once at startup and handed to the codec; there is no process-global
/// prefix state, so encode/decode calls can never observe a prefix change
/// mid-flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    deadline: String,
    timeout: String,
    retry: String,
}

impl FieldNames {
    /// Derive the three field names from `prefix`.
    ///
    /// A trailing `-` on the prefix is tolerated and folded away, so
    /// `"infector"` and `"infector-"` produce the same names.
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('-');
        Self {
            deadline: format!("{prefix}-{SUFFIX_DEADLINE}"),
            timeout: format!("{prefix}-{SUFFIX_TIMEOUT}"),
            retry: format!("{prefix}-{SUFFIX_RETRY}"),
        }
    }

    /// Name of the deadline field (milliseconds since the Unix epoch).
    pub fn deadline(&self) -> &str {
        &self.deadline
    }

    /// Name of the timeout-remaining field (milliseconds, floored at zero).
    pub fn timeout(&self) -> &str {
        &self.timeout
    }

    /// Name of the retry-flag field.
    pub fn retry(&self) -> &str {
        &self.retry
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}
