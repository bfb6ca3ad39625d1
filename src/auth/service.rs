//! Provider-facing auth operations, rewrapped into `StackError`.

use axum::http::StatusCode;
use secrecy::SecretString;
use tracing::instrument;

use super::{
    mappers::map_auth_session,
    provider::{AuthProvider, ProviderError},
    types::{AuthSession, ProviderUser},
};
use crate::error::{ErrorKind, StackError};

const TAG: &str = "Auth service";

fn provider_error(cause: ProviderError, message: &str) -> StackError {
    StackError::new(ErrorKind::Provider, message)
        .with_cause(cause)
        .with_tag(TAG)
}

/// Create a confirmed email/password account at the provider.
///
/// # Errors
/// Returns a `Provider` error if the provider rejects the account.
#[instrument(skip(provider, password))]
pub async fn create_email_auth_account(
    provider: &dyn AuthProvider,
    email: &str,
    password: &SecretString,
) -> Result<ProviderUser, StackError> {
    provider
        .create_account(email, password)
        .await
        .map_err(|cause| {
            provider_error(cause, "Unable to create email auth account")
                .with_metadata("email", email)
        })
}

/// Exchange credentials for an [`AuthSession`].
///
/// # Errors
/// Returns a `Provider` error (status 401) on rejected credentials, or the
/// mapper's `MissingEmail` error.
#[instrument(skip(provider, password))]
pub async fn sign_in_with_email(
    provider: &dyn AuthProvider,
    email: &str,
    password: &SecretString,
) -> Result<AuthSession, StackError> {
    let session = provider.sign_in(email, password).await.map_err(|cause| {
        provider_error(cause, "Unable to sign in with email")
            .with_status(StatusCode::UNAUTHORIZED)
            .with_metadata("email", email)
    })?;

    map_auth_session(session)
}

/// # Errors
/// Returns a `Provider` error if the provider could not delete the account.
#[instrument(skip(provider))]
pub async fn delete_auth_account(provider: &dyn AuthProvider, id: &str) -> Result<(), StackError> {
    provider.delete_account(id).await.map_err(|cause| {
        provider_error(cause, "Unable to delete auth account").with_metadata("id", id)
    })
}

/// # Errors
/// Returns a `Provider` error if the provider could not revoke the session.
#[instrument(skip(provider, auth_session), fields(user_id = %auth_session.user_id))]
pub async fn sign_out(
    provider: &dyn AuthProvider,
    auth_session: &AuthSession,
) -> Result<(), StackError> {
    provider
        .sign_out(&auth_session.access_token)
        .await
        .map_err(|cause| {
            provider_error(cause, "Unable to sign out")
                .with_metadata("userId", auth_session.user_id.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeProvider, PROVIDER_USER_ID};
    use secrecy::ExposeSecret;

    fn password() -> SecretString {
        SecretString::from("longenough")
    }

    #[tokio::test]
    async fn sign_in_maps_provider_session() -> anyhow::Result<()> {
        let provider = FakeProvider::default();
        let user = create_email_auth_account(&provider, "alice@example.com", &password()).await?;
        assert_eq!(user.id, PROVIDER_USER_ID);

        let session = sign_in_with_email(&provider, "alice@example.com", &password()).await?;
        assert_eq!(session.user_id, PROVIDER_USER_ID);
        assert_eq!(session.email, "alice@example.com");
        assert_eq!(
            session.access_token.expose_secret(),
            format!("access-{PROVIDER_USER_ID}")
        );
        Ok(())
    }

    #[tokio::test]
    async fn rejected_sign_in_is_unauthorized() {
        let provider = FakeProvider::default();

        let Err(err) = sign_in_with_email(&provider, "nobody@example.com", &password()).await
        else {
            panic!("expected provider error");
        };
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.tag(), Some(TAG));
        assert!(err.cause().is_some());
    }

    #[tokio::test]
    async fn duplicate_account_is_wrapped() -> anyhow::Result<()> {
        let provider = FakeProvider::default();
        create_email_auth_account(&provider, "alice@example.com", &password()).await?;

        let Err(err) = create_email_auth_account(&provider, "alice@example.com", &password()).await
        else {
            panic!("expected provider error");
        };
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(
            err.metadata().get("email").and_then(|v| v.as_str()),
            Some("alice@example.com")
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_unknown_account_fails() {
        let provider = FakeProvider::default();
        let result = delete_auth_account(&provider, "missing").await;
        assert!(matches!(result, Err(ref err) if err.kind() == ErrorKind::Provider));
        assert_eq!(provider.delete_calls(), 1);
    }
}
