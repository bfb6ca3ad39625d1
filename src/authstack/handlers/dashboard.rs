use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{login::COMPANY_LOGIN_PATH, pages};
use crate::{
    auth::{
        session::{end_user_sessions, get_auth_session, redirect_with, require_auth_session},
        AuthSession, AuthState,
    },
    error::{ErrorKind, StackError},
    user::delete_user,
};

pub(crate) const DASHBOARD_PATH: &str = "/app";

/// Login URL that sends the user back to the dashboard.
fn login_redirect() -> String {
    let redirect_to: String =
        url::form_urlencoded::byte_serialize(DASHBOARD_PATH.as_bytes()).collect();
    format!("{COMPANY_LOGIN_PATH}?redirectTo={redirect_to}")
}

/// Resolve the session or answer with a redirect to the login form.
async fn authenticated(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<AuthSession, Response> {
    match get_auth_session(headers, auth_state.sessions()).await {
        Ok(Some(auth_session)) => Ok(auth_session),
        Ok(None) => Err(redirect_with(&login_redirect(), HeaderMap::new())),
        Err(err) => {
            auth_state.logger().error(&err);
            Err(err.into_response())
        }
    }
}

#[utoipa::path(
    get,
    path = "/app",
    responses(
        (status = 200, description = "Dashboard", content_type = "text/html"),
        (status = 303, description = "Anonymous, redirect to the login form")
    ),
    tag = "pages"
)]
pub async fn dashboard(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    match authenticated(&headers, &auth_state).await {
        Ok(auth_session) => pages::dashboard(&auth_session.email).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/app/account/delete",
    responses(
        (status = 303, description = "Account deleted, sessions destroyed"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Unable to delete the account")
    ),
    tag = "pages"
)]
#[instrument(skip_all)]
pub async fn delete_account(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    let auth_session = match require_auth_session(&headers, auth_state.sessions()).await {
        Ok(auth_session) => auth_session,
        Err(err) => {
            if err.status() == Some(StatusCode::UNAUTHORIZED) {
                auth_state.logger().dev_error(&err);
            } else {
                auth_state.logger().error(&err);
            }
            return err.into_response();
        }
    };

    if let Err(err) = delete_current_user(&auth_state, &auth_session).await {
        auth_state.logger().error(&err);
        return err.into_response();
    }

    // The provider account is gone, so its tokens need no revocation.
    let cleared = end_user_sessions(&auth_state, &auth_session.user_id).await;
    redirect_with("/", cleared)
}

async fn delete_current_user(
    auth_state: &AuthState,
    auth_session: &AuthSession,
) -> Result<(), StackError> {
    let id = Uuid::parse_str(&auth_session.user_id).map_err(|cause| {
        StackError::new(ErrorKind::Delete, "Invalid user id in session")
            .with_cause(cause)
            .with_metadata("id", auth_session.user_id.as_str())
            .with_tag("Dashboard")
    })?;

    let provider = auth_state.provider_client()?;
    delete_user(provider.as_ref(), auth_state.users(), id).await?;

    auth_state
        .logger()
        .info(&format!("deleted account {}", auth_session.email));

    Ok(())
}
