//! User lookups and the account lifecycle spanning provider and database.
//!
//! The provider account and the `users` row are two stores without a shared
//! transaction. Account creation compensates a failed later step by deleting
//! the provider account; a failed compensation leaves an orphaned provider
//! account that is logged for manual cleanup.

use axum::http::StatusCode;
use tracing::{error, instrument};
use uuid::Uuid;

use super::{
    storage::UserStore,
    types::{NewAccount, User},
};
use crate::{
    auth::{
        provider::AuthProvider,
        service::{create_email_auth_account, delete_auth_account, sign_in_with_email},
        types::AuthSession,
        utils::normalize_email,
    },
    error::{ErrorKind, StackError},
};

const TAG: &str = "User service";

struct UserCreatePayload<'a> {
    user_id: &'a str,
    email: &'a str,
    name: &'a str,
}

/// Look up a user by email, case-insensitively.
///
/// # Errors
/// Returns a `Lookup` error (status 404) if the store fails.
#[instrument(skip(users))]
pub async fn get_user_by_email(
    users: &dyn UserStore,
    email: &str,
) -> Result<Option<User>, StackError> {
    users
        .find_by_email(&normalize_email(email))
        .await
        .map_err(|cause| {
            StackError::new(ErrorKind::Lookup, "Unable to get user by email")
                .with_cause(cause)
                .with_status(StatusCode::NOT_FOUND)
                .with_metadata("email", email)
                .with_tag(TAG)
        })
}

async fn create_user(
    users: &dyn UserStore,
    payload: UserCreatePayload<'_>,
) -> Result<User, StackError> {
    let create_error = |message: &str| {
        StackError::new(ErrorKind::Create, message)
            .with_metadata("email", payload.email)
            .with_metadata("userId", payload.user_id)
            .with_metadata("name", payload.name)
            .with_tag(TAG)
    };

    let id = Uuid::parse_str(payload.user_id)
        .map_err(|cause| create_error("Provider issued an invalid user id").with_cause(cause))?;

    let user = User {
        id,
        email: payload.email.to_string(),
        name: payload.name.to_string(),
    };

    users
        .insert_user(&user)
        .await
        .map_err(|cause| create_error("Unable to create user in database").with_cause(cause))
}

/// Create the provider account, sign in, then create the local user row.
///
/// # Errors
/// Returns an `AccountCreation` error wrapping the failing step. When a step
/// after the provider signup fails, the provider account is deleted first.
#[instrument(skip(provider, users, account), fields(email = %account.email))]
pub async fn create_user_account(
    provider: &dyn AuthProvider,
    users: &dyn UserStore,
    account: NewAccount,
) -> Result<AuthSession, StackError> {
    let email = normalize_email(&account.email);
    let name = account.name.trim();

    let account_error = |cause: StackError| {
        StackError::new(ErrorKind::AccountCreation, "Unable to create user account")
            .with_cause(cause)
            .with_metadata("email", email.as_str())
            .with_metadata("name", name)
            .with_tag(TAG)
    };

    let provider_user = create_email_auth_account(provider, &email, &account.password)
        .await
        .map_err(account_error)?;

    let result = async {
        let auth_session = sign_in_with_email(provider, &email, &account.password).await?;

        create_user(
            users,
            UserCreatePayload {
                user_id: &provider_user.id,
                email: &email,
                name,
            },
        )
        .await?;

        Ok::<_, StackError>(auth_session)
    }
    .await;

    match result {
        Ok(auth_session) => Ok(auth_session),
        Err(cause) => {
            let mut err = account_error(cause);

            // Not retried: a leftover provider account needs manual cleanup.
            if let Err(compensation) = delete_auth_account(provider, &provider_user.id).await {
                error!(
                    orphaned_provider_account = %provider_user.id,
                    email = %email,
                    error = %compensation.to_log_value(),
                    "compensating delete failed"
                );
                err = err
                    .with_metadata("compensation", "failed")
                    .with_metadata("orphanedProviderAccount", provider_user.id.as_str());
            }

            Err(err)
        }
    }
}

/// Delete the provider account, then the local row.
///
/// # Errors
/// Returns a `Delete` error if either step fails. Nothing is compensated.
#[instrument(skip(provider, users))]
pub async fn delete_user(
    provider: &dyn AuthProvider,
    users: &dyn UserStore,
    id: Uuid,
) -> Result<(), StackError> {
    let delete_error = || {
        StackError::new(ErrorKind::Delete, "Unable to delete user account")
            .with_metadata("id", id.to_string())
            .with_tag(TAG)
    };

    delete_auth_account(provider, &id.to_string())
        .await
        .map_err(|cause| delete_error().with_cause(cause))?;

    users
        .delete_user(id)
        .await
        .map_err(|cause| delete_error().with_cause(cause))
}
