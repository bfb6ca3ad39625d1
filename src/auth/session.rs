//! Cookie session lifecycle: Anonymous ⇄ Authenticated.
//!
//! A successful sign-in stores the [`AuthSession`] under the hash of a random
//! token and hands the raw token to the browser as an `HttpOnly` cookie.

use axum::{
    http::{
        header::{InvalidHeaderValue, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::{
    service::sign_out,
    state::{AuthConfig, AuthState},
    storage::SessionStore,
    types::AuthSession,
    utils::{generate_session_token, hash_session_token},
};
use crate::error::{ErrorKind, StackError};

pub const SESSION_COOKIE_NAME: &str = "authstack_session";

const TAG: &str = "Auth session";

fn session_error(message: &str) -> StackError {
    StackError::new(ErrorKind::Session, message).with_tag(TAG)
}

/// Resolve the session cookie of a request, if any.
///
/// # Errors
/// Returns a `Session` error if the session store fails.
pub async fn get_auth_session(
    headers: &HeaderMap,
    sessions: &dyn SessionStore,
) -> Result<Option<AuthSession>, StackError> {
    // Missing cookies are treated as "no session".
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };

    sessions
        .lookup_session(&hash_session_token(&token))
        .await
        .map_err(|cause| session_error("Unable to lookup session").with_cause(cause))
}

/// # Errors
/// Returns a `Session` error if the session store fails.
pub async fn is_anonymous_session(
    headers: &HeaderMap,
    sessions: &dyn SessionStore,
) -> Result<bool, StackError> {
    Ok(get_auth_session(headers, sessions).await?.is_none())
}

/// # Errors
/// Returns a `Session` error with status 401 for anonymous requests.
pub async fn require_auth_session(
    headers: &HeaderMap,
    sessions: &dyn SessionStore,
) -> Result<AuthSession, StackError> {
    get_auth_session(headers, sessions)
        .await?
        .ok_or_else(|| session_error("No active session").with_status(StatusCode::UNAUTHORIZED))
}

/// Persist the session, set the cookie and redirect.
///
/// # Errors
/// Returns a `Session` error if the token can not be generated or stored.
#[instrument(skip(state, auth_session), fields(user_id = %auth_session.user_id))]
pub async fn create_auth_session(
    state: &AuthState,
    auth_session: &AuthSession,
    redirect_to: &str,
) -> Result<Response, StackError> {
    let token = generate_session_token()
        .map_err(|cause| session_error("Unable to generate session token").with_cause(cause))?;

    state
        .sessions()
        .insert_session(
            &hash_session_token(&token),
            auth_session,
            state.config().session_ttl_seconds(),
        )
        .await
        .map_err(|cause| {
            session_error("Unable to store session")
                .with_cause(cause)
                .with_metadata("userId", auth_session.user_id.as_str())
        })?;

    let cookie = session_cookie(state.config(), &token)
        .map_err(|cause| session_error("Unable to build session cookie").with_cause(cause))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok(redirect_with(redirect_to, headers))
}

/// Drop the server-side session, revoke the provider tokens and clear the
/// cookie. Failures are logged; the cookie is always cleared.
#[instrument(skip_all)]
pub async fn destroy_auth_session(state: &AuthState, headers: &HeaderMap) -> HeaderMap {
    if let Some(token) = extract_session_token(headers) {
        let token_hash = hash_session_token(&token);

        match state.sessions().lookup_session(&token_hash).await {
            Ok(Some(auth_session)) => {
                let revoked = match state.provider_client() {
                    Ok(provider) => sign_out(provider.as_ref(), &auth_session).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = revoked {
                    state.logger().error(&err);
                }
            }
            Ok(None) => {}
            Err(cause) => {
                state
                    .logger()
                    .error(&session_error("Unable to lookup session").with_cause(cause));
            }
        }

        if let Err(cause) = state.sessions().delete_session(&token_hash).await {
            state
                .logger()
                .error(&session_error("Unable to delete session").with_cause(cause));
        }
    }

    cleared_cookie_headers(state.config())
}

/// Drop every server-side session of a user and clear the cookie, without
/// contacting the provider. Used once the provider account is already gone.
#[instrument(skip(state))]
pub async fn end_user_sessions(state: &AuthState, user_id: &str) -> HeaderMap {
    if let Err(cause) = state.sessions().delete_user_sessions(user_id).await {
        state.logger().error(
            &session_error("Unable to delete user sessions")
                .with_cause(cause)
                .with_metadata("userId", user_id),
        );
    }

    cleared_cookie_headers(state.config())
}

fn cleared_cookie_headers(config: &AuthConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(config) {
        headers.insert(SET_COOKIE, cookie);
    }
    headers
}

/// 303 redirect carrying extra headers.
pub(crate) fn redirect_with(location: &str, mut headers: HeaderMap) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(_) => {
            headers.insert(LOCATION, HeaderValue::from_static("/"));
        }
    }
    (StatusCode::SEE_OTHER, headers).into_response()
}

/// Build a secure `HttpOnly` cookie for the session token.
fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
        })
        .find(|token| !token.is_empty())
}
