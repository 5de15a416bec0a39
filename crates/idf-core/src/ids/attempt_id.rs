use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies one verification attempt.
///
/// Every internal event carries the attempt it belongs to, so results that
/// arrive after the attempt was reset can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(String);

impl AttemptId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AttemptId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttemptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
