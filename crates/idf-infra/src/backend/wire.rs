//! JSON bodies exchanged with the identity backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use idf_core::ports::{NetworkError, TokenResponse, ValidationResponse};
use idf_core::SessionToken;

const STATUS_SUCCESS: &str = "success";
const MAX_BODY_IN_ERROR: usize = 256;

#[derive(Debug, Serialize)]
pub(super) struct TokenRequestBody<'a> {
    pub service_id: &'a str,
    pub user_id: &'a str,
    pub pw: &'a str,
    pub transaction_type: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ValidateRequestBody<'a> {
    pub service_id: &'a str,
    pub user_id: &'a str,
    pub pw: &'a str,
    pub token: &'a str,
    pub transaction_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponseBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ValidateResponseBody {
    #[serde(default)]
    is_passed: Option<FlexibleBool>,
    #[serde(default)]
    score: Option<FlexibleNumber>,
    #[serde(default)]
    reason: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// The backend sends `is_passed` both as a JSON bool and as `"true"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlexibleBool {
    Bool(bool),
    Text(String),
}

impl FlexibleBool {
    fn value(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlexibleNumber {
    Number(f64),
    Text(String),
}

impl FlexibleNumber {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Decodes the token endpoint answer.
///
/// Any well-formed body with a `type` is a status value: `success` issues the
/// token, anything else is a rejection. The HTTP status only matters when the
/// body cannot be read.
pub(super) fn decode_token_response(status: u16, body: &str) -> Result<TokenResponse, NetworkError> {
    let parsed: TokenResponseBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) if is_success(status) => {
            return Err(NetworkError::MalformedResponse(format!(
                "token response is not valid JSON: {err}"
            )))
        }
        Err(_) => return Err(status_error(status, body)),
    };

    let Some(kind) = parsed.kind else {
        return Err(NetworkError::MalformedResponse(
            "token response has no type".to_string(),
        ));
    };

    if kind != STATUS_SUCCESS {
        return Ok(TokenResponse::Rejected {
            message: parsed.message.and_then(message_text),
        });
    }

    let raw = parsed.token.unwrap_or_default();
    SessionToken::parse(&raw)
        .map(|token| TokenResponse::Issued { token })
        .map_err(|_| {
            NetworkError::MalformedResponse("success response carries no token".to_string())
        })
}

/// Decodes the validation endpoint answer.
///
/// A readable `is_passed` is authoritative whatever the HTTP status.
pub(super) fn decode_validation_response(
    status: u16,
    body: &str,
) -> Result<ValidationResponse, NetworkError> {
    let parsed: ValidateResponseBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) if is_success(status) => {
            return Err(NetworkError::MalformedResponse(format!(
                "validation response is not valid JSON: {err}"
            )))
        }
        Err(_) => return Err(status_error(status, body)),
    };

    match parsed.is_passed.as_ref().map(FlexibleBool::value) {
        Some(Some(passed)) => Ok(ValidationResponse {
            passed,
            score: parsed.score.as_ref().and_then(FlexibleNumber::value),
            reason: parsed.reason.and_then(message_text),
        }),
        Some(None) => Err(NetworkError::MalformedResponse(
            "is_passed is neither true nor false".to_string(),
        )),
        None if is_success(status) => Err(NetworkError::MalformedResponse(
            "validation response has no is_passed".to_string(),
        )),
        None => Err(NetworkError::Status {
            status,
            body: parsed
                .message
                .and_then(message_text)
                .unwrap_or_else(|| truncate(body)),
        }),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn status_error(status: u16, body: &str) -> NetworkError {
    NetworkError::Status {
        status,
        body: truncate(body),
    }
}

fn message_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_BODY_IN_ERROR).collect()
}
