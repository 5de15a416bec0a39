use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubjectIdError {
    #[error("subject identifier must not be empty")]
    Empty,
}

/// Identity string of the person under verification (NRIC/FIN style).
///
/// Always non-empty: surrounding whitespace is trimmed and a blank value is
/// rejected at construction, so nothing downstream can send an empty id to
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn parse(raw: &str) -> Result<Self, SubjectIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubjectIdError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering that keeps only the last four characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let visible = chars.len().min(4);
        let hidden = chars.len() - visible;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = SubjectIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}
