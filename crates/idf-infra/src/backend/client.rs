use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use idf_core::ports::{IdentityBackendPort, NetworkError, TokenResponse, ValidationResponse};
use idf_core::{SessionToken, SubjectId};

use super::settings::HttpBackendSettings;
use super::wire::{
    decode_token_response, decode_validation_response, TokenRequestBody, ValidateRequestBody,
};

/// Default connection timeout, capped by the per-request timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity backend reached over HTTP+JSON.
///
/// No retries; each call is bounded by the configured timeout.
pub struct HttpIdentityBackend {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    settings: HttpBackendSettings,
}

impl HttpIdentityBackend {
    pub fn new(settings: HttpBackendSettings) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(settings.timeout))
            .build()
            .context("failed to build identity backend HTTP client")?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(u16, String), NetworkError> {
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!(url, status, "identity backend answered");
        Ok((status, text))
    }

    fn map_transport_error(&self, error: reqwest::Error) -> NetworkError {
        if error.is_timeout() {
            NetworkError::Timeout(self.settings.timeout)
        } else if error.is_connect() {
            NetworkError::Transport(format!("connection failed: {error}"))
        } else {
            NetworkError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl IdentityBackendPort for HttpIdentityBackend {
    async fn request_token(&self, subject: &SubjectId) -> Result<TokenResponse, NetworkError> {
        let body = TokenRequestBody {
            service_id: &self.settings.service_id,
            user_id: subject.as_str(),
            pw: &self.settings.password,
            transaction_type: &self.settings.transaction_type,
        };
        debug!(subject = %subject.masked(), "requesting session token");

        let (status, text) = self.post_json(&self.settings.token_url(), &body).await?;
        let response = decode_token_response(status, &text)?;
        if let TokenResponse::Rejected { message } = &response {
            if status == 401 || status == 403 {
                warn!(
                    status,
                    message = message.as_deref().unwrap_or(""),
                    "token request refused, check backend credentials"
                );
            }
        }
        Ok(response)
    }

    async fn validate(
        &self,
        subject: &SubjectId,
        token: &SessionToken,
    ) -> Result<ValidationResponse, NetworkError> {
        let body = ValidateRequestBody {
            service_id: &self.settings.service_id,
            user_id: subject.as_str(),
            pw: &self.settings.password,
            token: token.as_str(),
            transaction_type: &self.settings.transaction_type,
        };
        debug!(
            subject = %subject.masked(),
            token = %token.fingerprint(),
            "validating capture result"
        );

        let (status, text) = self.post_json(&self.settings.validate_url(), &body).await?;
        decode_validation_response(status, &text)
    }
}
