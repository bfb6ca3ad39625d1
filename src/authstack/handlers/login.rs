use axum::{
    extract::{Extension, Form, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    forms::{LoginForm, RedirectQuery},
    pages,
};
use crate::{
    auth::{
        service::sign_in_with_email,
        session::{create_auth_session, is_anonymous_session, redirect_with},
        utils::safe_redirect,
        AuthState,
    },
    error::{ErrorKind, StackError, GENERIC_CREDENTIALS_MESSAGE},
};

pub(crate) const COMPANY_LOGIN_PATH: &str = "/auth/company/login";
pub(crate) const USER_LOGIN_PATH: &str = "/auth/user/login";
const DEFAULT_REDIRECT: &str = "/app";

#[utoipa::path(
    get,
    path = "/auth/company/login",
    params(RedirectQuery),
    responses(
        (status = 200, description = "Login form", content_type = "text/html"),
        (status = 303, description = "Already signed in, redirect to /app")
    ),
    tag = "auth"
)]
pub async fn company_form(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    login_form(COMPANY_LOGIN_PATH, &headers, &auth_state, query).await
}

#[utoipa::path(
    get,
    path = "/auth/user/login",
    params(RedirectQuery),
    responses(
        (status = 200, description = "Login form", content_type = "text/html"),
        (status = 303, description = "Already signed in, redirect to /app")
    ),
    tag = "auth"
)]
pub async fn user_form(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    login_form(USER_LOGIN_PATH, &headers, &auth_state, query).await
}

async fn login_form(
    action: &str,
    headers: &HeaderMap,
    auth_state: &AuthState,
    query: RedirectQuery,
) -> Response {
    match is_anonymous_session(headers, auth_state.sessions()).await {
        Ok(true) => pages::login(action, query.redirect_to.as_deref(), None).into_response(),
        Ok(false) => redirect_with(DEFAULT_REDIRECT, HeaderMap::new()),
        Err(err) => {
            auth_state.logger().error(&err);
            err.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/company/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set"),
        (status = 400, description = "Something is wrong with credentials", content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn company_login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Form<LoginForm>>,
) -> Response {
    login(COMPANY_LOGIN_PATH, &auth_state, payload).await
}

#[utoipa::path(
    post,
    path = "/auth/user/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set"),
        (status = 400, description = "Something is wrong with credentials", content_type = "text/html")
    ),
    tag = "auth"
)]
pub async fn user_login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Form<LoginForm>>,
) -> Response {
    login(USER_LOGIN_PATH, &auth_state, payload).await
}

#[instrument(skip(auth_state, payload))]
async fn login(
    action: &str,
    auth_state: &AuthState,
    payload: Option<Form<LoginForm>>,
) -> Response {
    let form = payload.map(|Form(form)| form).unwrap_or_default();
    let redirect_to = form.redirect_to().map(ToString::to_string);

    match sign_in(auth_state, form).await {
        Ok(response) => response,
        Err(err) => {
            // The cause is logged but never returned to the client.
            if err.kind() == ErrorKind::Validation {
                auth_state.logger().dev_error(&err);
            } else {
                auth_state.logger().error(&err);
            }
            (
                StatusCode::BAD_REQUEST,
                pages::login(
                    action,
                    redirect_to.as_deref(),
                    Some(GENERIC_CREDENTIALS_MESSAGE),
                ),
            )
                .into_response()
        }
    }
}

async fn sign_in(auth_state: &AuthState, form: LoginForm) -> Result<Response, StackError> {
    let input = form.validate()?;

    let provider = auth_state.provider_client()?;
    let auth_session =
        sign_in_with_email(provider.as_ref(), &input.email, &input.password).await?;

    auth_state
        .logger()
        .dev(&format!("signed in {}", auth_session.email));

    create_auth_session(
        auth_state,
        &auth_session,
        safe_redirect(input.redirect_to.as_deref(), DEFAULT_REDIRECT),
    )
    .await
}
