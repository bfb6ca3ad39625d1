//! Auth state and configuration shared by the route handlers.

use std::sync::Arc;

use super::{
    provider::{AuthProvider, ProviderFactory},
    storage::SessionStore,
};
use crate::{
    error::{ErrorKind, StackError},
    logger::Logger,
    user::storage::UserStore,
};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: i64,
    session_cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: true,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

/// Immutable per-process state. The provider is only held as a factory; each
/// request builds its own client.
pub struct AuthState {
    config: AuthConfig,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    provider: Arc<dyn ProviderFactory>,
    logger: Logger,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn ProviderFactory>,
        logger: Logger,
    ) -> Self {
        Self {
            config,
            users,
            sessions,
            provider,
            logger,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Build a fresh provider client for the current request.
    ///
    /// # Errors
    /// Returns a `Provider` error if the client can not be built.
    pub fn provider_client(&self) -> Result<Box<dyn AuthProvider>, StackError> {
        self.provider.client().map_err(|cause| {
            StackError::new(ErrorKind::Provider, "Unable to build auth provider client")
                .with_cause(cause)
                .with_tag("Auth state")
        })
    }
}
