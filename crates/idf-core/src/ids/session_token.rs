use std::fmt::{Debug, Formatter};

use subtle::ConstantTimeEq;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("session token must not be empty")]
    Empty,
}

/// One-time credential issued by the backend for a single attempt.
///
/// The absence of a token is modelled with `Option<SessionToken>`; a value of
/// this type is never empty. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if raw.is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares a token reported by the capture engine against this one.
    pub fn matches(&self, reported: &str) -> bool {
        self.0.as_bytes().ct_eq(reported.as_bytes()).into()
    }

    /// Short prefix for log correlation.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken({})", self.fingerprint())
    }
}
