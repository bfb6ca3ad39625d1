use axum::{
    extract::{Extension, Form, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    forms::{RedirectQuery, RegisterForm},
    pages,
};
use crate::{
    auth::{
        session::{create_auth_session, is_anonymous_session, redirect_with},
        utils::safe_redirect,
        AuthState,
    },
    error::{ErrorKind, StackError, GENERIC_CREDENTIALS_MESSAGE},
    user::{create_user_account, get_user_by_email, NewAccount},
};

const DEFAULT_REDIRECT: &str = "/";
const TAG: &str = "User register";

#[utoipa::path(
    get,
    path = "/auth/user/register",
    params(RedirectQuery),
    responses(
        (status = 200, description = "Registration form", content_type = "text/html"),
        (status = 303, description = "Already signed in, redirect to /app")
    ),
    tag = "register"
)]
pub async fn register_form(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    match is_anonymous_session(&headers, auth_state.sessions()).await {
        Ok(true) => pages::register(query.redirect_to.as_deref(), None).into_response(),
        Ok(false) => redirect_with("/app", HeaderMap::new()),
        Err(err) => {
            auth_state.logger().error(&err);
            err.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/user/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, session cookie set"),
        (status = 400, description = "Something is wrong with credentials", content_type = "text/html")
    ),
    tag = "register"
)]
#[instrument(skip(auth_state, payload))]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Form<RegisterForm>>,
) -> Response {
    let form = payload.map(|Form(form)| form).unwrap_or_default();
    let redirect_to = form.redirect_to().map(ToString::to_string);

    match register_account(&auth_state, form).await {
        Ok(response) => response,
        Err(err) => {
            // Existing emails, invalid input and provider failures all look the same.
            if err.kind() == ErrorKind::Validation {
                auth_state.logger().dev_error(&err);
            } else {
                auth_state.logger().error(&err);
            }
            (
                StatusCode::BAD_REQUEST,
                pages::register(redirect_to.as_deref(), Some(GENERIC_CREDENTIALS_MESSAGE)),
            )
                .into_response()
        }
    }
}

async fn register_account(
    auth_state: &AuthState,
    form: RegisterForm,
) -> Result<Response, StackError> {
    let input = form.validate()?;

    if get_user_by_email(auth_state.users(), &input.email)
        .await?
        .is_some()
    {
        return Err(
            StackError::new(ErrorKind::Credentials, "Email already registered.")
                .with_status(StatusCode::FORBIDDEN)
                .with_metadata("email", input.email.as_str())
                .with_tag(TAG),
        );
    }

    let provider = auth_state.provider_client()?;
    let auth_session = create_user_account(
        provider.as_ref(),
        auth_state.users(),
        NewAccount {
            email: input.email,
            password: input.password,
            name: input.name,
        },
    )
    .await?;

    auth_state
        .logger()
        .dev(&format!("registered {}", auth_session.email));

    create_auth_session(
        auth_state,
        &auth_session,
        safe_redirect(input.redirect_to.as_deref(), DEFAULT_REDIRECT),
    )
    .await
}
