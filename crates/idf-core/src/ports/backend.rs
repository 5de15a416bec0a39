use async_trait::async_trait;

use crate::ids::{SessionToken, SubjectId};

use super::errors::NetworkError;

/// Backend answer to a token request.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenResponse {
    Issued { token: SessionToken },
    /// The backend does not recognise the subject. `message` is diagnostic only.
    Rejected { message: Option<String> },
}

/// Backend answer to a validation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResponse {
    pub passed: bool,
    pub score: Option<f64>,
    pub reason: Option<String>,
}

impl ValidationResponse {
    pub fn passed() -> Self {
        Self {
            passed: true,
            score: None,
            reason: None,
        }
    }

    pub fn not_passed() -> Self {
        Self {
            passed: false,
            score: None,
            reason: None,
        }
    }
}

/// Identity backend used to obtain one-time tokens and confirm capture results.
#[async_trait]
pub trait IdentityBackendPort: Send + Sync {
    async fn request_token(&self, subject: &SubjectId) -> Result<TokenResponse, NetworkError>;

    async fn validate(
        &self,
        subject: &SubjectId,
        token: &SessionToken,
    ) -> Result<ValidationResponse, NetworkError>;
}
