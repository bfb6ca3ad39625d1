use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{
    session::{destroy_auth_session, redirect_with},
    AuthState,
};

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 303, description = "Session destroyed, cookie cleared")),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    let cleared = destroy_auth_session(&auth_state, &headers).await;
    redirect_with("/", cleared)
}
