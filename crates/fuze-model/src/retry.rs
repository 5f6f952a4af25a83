use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Tri-state retry permission propagated alongside the time budget.
///
/// The flag is an opt-out signal, not an opt-in one: only an explicit
/// upstream `Off` suppresses retries downstream. `Unknown` stands for
/// "the upstream never made a decision" and is never an error in itself;
/// a carrier that omits the field or holds an unrecognized token decodes
/// to `Unknown`.
///
/// Wire tokens are the literal strings `"on"`, `"off"` and `"unknown"`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryFlag {
    /// Upstream explicitly allows further retries.
    On,
    /// Upstream explicitly forbids further retries.
    Off,
    /// No explicit decision was propagated.
    #[default]
    Unknown,
}

impl RetryFlag {
    /// Wire token for this flag.
    pub const fn as_token(&self) -> &'static str {
        match self {
            RetryFlag::On => "on",
            RetryFlag::Off => "off",
            RetryFlag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RetryFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for RetryFlag {
    type Err = ModelError;

    /// Tokens are matched exactly; the wire contract is case-sensitive.
    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "on" => Ok(RetryFlag::On),
            "off" => Ok(RetryFlag::Off),
            "unknown" => Ok(RetryFlag::Unknown),
            other => Err(ModelError::UnknownRetryFlag(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RetryFlag;

    #[test]
    fn default_is_unknown() {
        assert_eq!(RetryFlag::default(), RetryFlag::Unknown);
    }

    #[test]
    fn tokens_roundtrip() {
        for flag in [RetryFlag::On, RetryFlag::Off, RetryFlag::Unknown] {
            let parsed: RetryFlag = flag.as_token().parse().unwrap();
            assert_eq!(parsed, flag);
        }
    }

    #[test]
    fn unrecognized_token_is_an_error() {
        assert!("maybe".parse::<RetryFlag>().is_err());
        assert!("".parse::<RetryFlag>().is_err());
        // the contract is case-sensitive
        assert!("ON".parse::<RetryFlag>().is_err());
    }

    #[test]
    fn display_matches_token() {
        assert_eq!(RetryFlag::Off.to_string(), "off");
    }

    #[test]
    fn serde_uses_wire_tokens() {
        let json = serde_json::to_string(&RetryFlag::On).unwrap();
        assert_eq!(json, "\"on\"");

        let back: RetryFlag = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(back, RetryFlag::Unknown);
    }
}
