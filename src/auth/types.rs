//! Session shapes: the raw provider payload and the internal `AuthSession`.

use secrecy::SecretString;
use serde::Deserialize;

/// User object as returned by the provider.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session payload as returned by the provider's password grant.
///
/// Tokens stay plain strings only until the mapper wraps them.
#[derive(Deserialize, Clone)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<ProviderUser>,
}

/// Normalized session used everywhere inside the application.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub user_id: String,
    pub email: String,
    pub expires_in: i64,
    pub expires_at: i64,
}
