//! User-facing feedback for denied attempts.
//!
//! Reason codes are looked up in a fixed catalogue; unknown codes fall back
//! to the default entry, so a lookup always produces a message.

use serde::Serialize;

use super::reason::{DENY_REASON_SUBJECT_NOT_RECOGNIZED, DENY_REASON_VALIDATION_NOT_PASSED};

pub const ACTION_SCAN_AGAIN: &str = "Scan again";
pub const ACTION_CANCEL: &str = "Cancel";

const TITLE_UNSUCCESSFUL: &str = "Unsuccessful Verification";
const MESSAGE_SCAN_AGAIN: &str = "Try scanning again, or use another method to verify yourself.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedbackMessage {
    pub title: &'static str,
    pub message: &'static str,
    pub actions: &'static [&'static str],
}

const DEFAULT_FEEDBACK: FeedbackMessage = FeedbackMessage {
    title: TITLE_UNSUCCESSFUL,
    message: MESSAGE_SCAN_AGAIN,
    actions: &[ACTION_SCAN_AGAIN, ACTION_CANCEL],
};

pub fn feedback_for(reason_code: &str) -> FeedbackMessage {
    match reason_code {
        "ambiguous_outcome" | "client_browser" => DEFAULT_FEEDBACK,
        DENY_REASON_SUBJECT_NOT_RECOGNIZED => FeedbackMessage {
            title: TITLE_UNSUCCESSFUL,
            message: "We could not find a record for this NRIC/FIN. Check the number and try again.",
            actions: &[ACTION_CANCEL],
        },
        DENY_REASON_VALIDATION_NOT_PASSED => FeedbackMessage {
            title: TITLE_UNSUCCESSFUL,
            message: "Your face could not be matched to this NRIC/FIN. Try scanning again, or use another method to verify yourself.",
            actions: &[ACTION_SCAN_AGAIN, ACTION_CANCEL],
        },
        _ => DEFAULT_FEEDBACK,
    }
}

pub fn welcome_message(subject: &str) -> String {
    format!("Welcome, {subject}!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_capture_codes_offer_rescan() {
        for code in ["ambiguous_outcome", "client_browser"] {
            let feedback = feedback_for(code);
            assert_eq!(feedback.title, "Unsuccessful Verification");
            assert_eq!(feedback.actions, &["Scan again", "Cancel"]);
        }
    }

    #[test]
    fn unknown_code_falls_back_to_default() {
        assert_eq!(feedback_for("never_seen_before"), DEFAULT_FEEDBACK);
        assert_eq!(feedback_for(""), DEFAULT_FEEDBACK);
    }

    #[test]
    fn subject_not_recognized_does_not_offer_rescan() {
        let feedback = feedback_for("subject not recognized");
        assert_eq!(feedback.actions, &["Cancel"]);
        assert!(!feedback.message.is_empty());
    }

    #[test]
    fn welcome_message_names_subject() {
        assert_eq!(welcome_message("G2957839M"), "Welcome, G2957839M!");
    }
}
