use secrecy::SecretString;
use serde_json::Value;

use super::types::{AuthSession, ProviderSession};
use crate::error::{ErrorKind, StackError};

const TAG: &str = "Auth mappers";

/// Translate a provider session into an [`AuthSession`].
///
/// # Errors
/// Returns a `MissingEmail` error when the session has no user or the user has
/// no email. Email auth is the only flow, so this should not happen.
pub fn map_auth_session(session: ProviderSession) -> Result<AuthSession, StackError> {
    let Some(user) = session.user else {
        return Err(missing_email(Value::Null));
    };

    let Some(email) = user.email.filter(|email| !email.is_empty()) else {
        return Err(missing_email(Value::String(user.id)));
    };

    Ok(AuthSession {
        access_token: SecretString::from(session.access_token),
        refresh_token: SecretString::from(session.refresh_token),
        user_id: user.id,
        email,
        expires_in: session.expires_in.unwrap_or(-1),
        expires_at: session.expires_at.unwrap_or(-1),
    })
}

fn missing_email(user_id: Value) -> StackError {
    StackError::new(ErrorKind::MissingEmail, "User should have an email.")
        .with_metadata("userId", user_id)
        .with_tag(TAG)
}
