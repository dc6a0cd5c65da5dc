//! Gateway token endpoints over HTTP.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use quizkit_core::error::AuthError;
use quizkit_core::model::{Credentials, UserInfo};
use quizkit_core::traits::AuthBackend;

const LOGIN_PATH: &str = "/frontend_api/get_token";
const REFRESH_PATH: &str = "/frontend_api/refresh_token";

/// [`AuthBackend`] talking to the gateway's `frontend_api`.
pub struct HttpAuthBackend {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpAuthBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_error(&self, e: reqwest::Error) -> AuthError {
        if e.is_timeout() {
            AuthError::timeout(self.timeout)
        } else {
            AuthError::Network(e.to_string())
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, AuthError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;
        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }
}

/// The gateway reports errors as raw text, a JSON `[title, detail]` pair, or
/// an object carrying `msg`.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(": "),
        Ok(serde_json::Value::Object(fields)) => fields
            .get("msg")
            .or_else(|| fields.get("detail"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        _ => body.trim().to_string(),
    }
}

/// A refreshed token arrives either JSON-encoded or as raw text.
fn parse_token(body: &str) -> Result<String, AuthError> {
    let body = body.trim();
    let token = if body.starts_with('"') {
        serde_json::from_str::<String>(body)
            .map_err(|e| AuthError::InvalidResponse(format!("malformed token string: {e}")))?
    } else {
        body.to_string()
    };

    if token.trim().is_empty() {
        return Err(AuthError::InvalidResponse("empty token".into()));
    }
    Ok(token)
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<UserInfo, AuthError> {
        let response = self
            .client
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let body = self.read_body(response).await?;
        serde_json::from_str::<UserInfo>(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("failed to parse user info: {e}")))
    }

    #[instrument(skip(self, token))]
    async fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .get(format!("{}{REFRESH_PATH}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let body = self.read_body(response).await?;
        parse_token(&body)
    }
}
