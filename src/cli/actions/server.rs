use crate::{
    auth::{AuthConfig, GoTrueConfig},
    authstack,
    logger::{Environment, Logger},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub provider_url: String,
    pub provider_anon_key: SecretString,
    pub provider_service_role_key: SecretString,
    pub environment: Environment,
    pub session_ttl_seconds: i64,
}

impl Args {
    /// Session settings derived from the environment.
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new()
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_session_cookie_secure(!self.environment.is_development())
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the provider URL is invalid, the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        port = args.port,
        provider_url = %args.provider_url,
        environment = %args.environment,
        session_ttl_seconds = args.session_ttl_seconds,
        "starting server"
    );

    let auth_config = args.auth_config();

    let provider_config = GoTrueConfig::new(
        &args.provider_url,
        args.provider_anon_key,
        args.provider_service_role_key,
    )
    .context("invalid --provider-url")?;

    authstack::new(
        args.port,
        &args.dsn,
        auth_config,
        provider_config,
        Logger::new(args.environment),
    )
    .await
}
