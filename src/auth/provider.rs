//! External auth provider client (GoTrue REST API).
//!
//! A client is built per request through [`ProviderFactory::client`] and never
//! stored in shared state, so a user's access token can not leak into a
//! concurrently handled request for another user.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use super::types::{ProviderSession, ProviderUser};
use crate::authstack::APP_USER_AGENT;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
    #[error("provider returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Operations the application needs from the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create a confirmed email/password account.
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderUser, ProviderError>;

    /// Exchange email/password for a session.
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError>;

    async fn delete_account(&self, id: &str) -> Result<(), ProviderError>;

    /// Revoke the refresh tokens bound to an access token.
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), ProviderError>;
}

/// Builds a fresh provider client for each request.
pub trait ProviderFactory: Send + Sync {
    /// # Errors
    /// Returns an error if the underlying HTTP client can not be built.
    fn client(&self) -> Result<Box<dyn AuthProvider>, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GoTrueConfig {
    url: Url,
    anon_key: SecretString,
    service_role_key: SecretString,
}

impl GoTrueConfig {
    /// # Errors
    /// Returns an error if `url` is not an absolute URL.
    pub fn new(
        url: &str,
        anon_key: SecretString,
        service_role_key: SecretString,
    ) -> Result<Self, ProviderError> {
        let url = Url::parse(url.trim_end_matches('/'))?;
        Ok(Self {
            url,
            anon_key,
            service_role_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        let base = self.url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }
}

#[derive(Debug, Clone)]
pub struct GoTrueFactory {
    config: GoTrueConfig,
}

impl GoTrueFactory {
    #[must_use]
    pub fn new(config: GoTrueConfig) -> Self {
        Self { config }
    }
}

impl ProviderFactory for GoTrueFactory {
    fn client(&self) -> Result<Box<dyn AuthProvider>, ProviderError> {
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Box::new(GoTrueClient {
            http,
            config: self.config.clone(),
        }))
    }
}

pub struct GoTrueClient {
    http: Client,
    config: GoTrueConfig,
}

impl GoTrueClient {
    fn admin(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.service_role_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    fn public(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("apikey", self.config.anon_key.expose_secret())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    Err(ProviderError::Status {
        status,
        message: error_message(&body),
    })
}

/// GoTrue error bodies use `msg`, `error_description` or `message`.
fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body[key].as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderUser, ProviderError> {
        let url = self.config.endpoint("/auth/v1/admin/users")?;
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "email_confirm": true,
        });

        let response = self
            .admin(self.http.post(url))
            .json(&payload)
            .send()
            .await?;
        let user: ProviderUser = check(response).await?.json().await?;

        debug!("provider account created: {}", user.id);

        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        let url = self.config.endpoint("/auth/v1/token?grant_type=password")?;
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let response = self
            .public(self.http.post(url))
            .json(&payload)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, id: &str) -> Result<(), ProviderError> {
        let url = self.config.endpoint(&format!("/auth/v1/admin/users/{id}"))?;

        let response = self.admin(self.http.delete(url)).send().await?;
        check(response).await?;

        debug!("provider account deleted: {}", id);

        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), ProviderError> {
        let url = self.config.endpoint("/auth/v1/logout")?;

        let response = self
            .public(self.http.post(url))
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;
        check(response).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> anyhow::Result<GoTrueConfig> {
        Ok(GoTrueConfig::new(
            "https://project.supabase.co/",
            SecretString::from("anon"),
            SecretString::from("service"),
        )?)
    }

    #[test]
    fn endpoint_joins_without_double_slash() -> anyhow::Result<()> {
        let config = config()?;
        let url = config.endpoint("/auth/v1/token?grant_type=password")?;
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/auth/v1/token?grant_type=password"
        );
        Ok(())
    }

    #[test]
    fn config_rejects_relative_url() {
        let result = GoTrueConfig::new(
            "not a url",
            SecretString::from("anon"),
            SecretString::from("service"),
        );
        assert!(matches!(result, Err(ProviderError::Url(_))));
    }

    #[test]
    fn error_message_prefers_msg() {
        let body = json!({"msg": "User already registered", "message": "other"});
        assert_eq!(error_message(&body), "User already registered");

        let body = json!({"error": "invalid_grant", "error_description": "Invalid login credentials"});
        assert_eq!(error_message(&body), "Invalid login credentials");

        assert_eq!(error_message(&Value::Null), "");
    }

    #[test]
    fn factory_builds_independent_clients() -> anyhow::Result<()> {
        let factory = GoTrueFactory::new(config()?);
        let first = factory.client();
        let second = factory.client();
        assert!(first.is_ok());
        assert!(second.is_ok());
        Ok(())
    }
}
