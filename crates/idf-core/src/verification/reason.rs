use serde::{Deserialize, Serialize};

pub const DENY_REASON_SUBJECT_NOT_RECOGNIZED: &str = "subject not recognized";
pub const DENY_REASON_VALIDATION_NOT_PASSED: &str = "validation_not_passed";

/// Why a verification attempt ended with a legitimate negative outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Backend refused to issue a token for the subject.
    SubjectNotRecognized,
    /// Capture engine reported a negative match; the code is passed through untouched.
    Capture { reason_code: String },
    /// Backend validation answered `is_passed = false`.
    ValidationNotPassed,
}

impl DenyReason {
    /// Reason code handed to the caller for message selection.
    pub fn code(&self) -> &str {
        match self {
            Self::SubjectNotRecognized => DENY_REASON_SUBJECT_NOT_RECOGNIZED,
            Self::Capture { reason_code } => reason_code,
            Self::ValidationNotPassed => DENY_REASON_VALIDATION_NOT_PASSED,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reason_code_is_passed_through() {
        let reason = DenyReason::Capture {
            reason_code: "ambiguous_outcome".to_string(),
        };
        assert_eq!(reason.code(), "ambiguous_outcome");
        assert_eq!(reason.to_string(), "ambiguous_outcome");
    }

    #[test]
    fn fixed_reasons_have_stable_codes() {
        assert_eq!(
            DenyReason::SubjectNotRecognized.code(),
            "subject not recognized"
        );
        assert_eq!(
            DenyReason::ValidationNotPassed.code(),
            "validation_not_passed"
        );
    }
}
