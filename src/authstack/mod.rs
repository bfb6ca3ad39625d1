use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthConfig, AuthState, GoTrueConfig, GoTrueFactory},
    logger::Logger,
    store::PgStore,
};

pub mod handlers;
pub mod openapi;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_ID: &str = "x-request-id";

/// Every route behind the request-id and trace layers.
///
/// `/health` expects an `Extension<PgPool>` layered on the returned router.
pub fn router(auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health).options(handlers::health))
        .route(
            handlers::login::COMPANY_LOGIN_PATH,
            get(handlers::company_form).post(handlers::company_login),
        )
        .route(
            handlers::login::USER_LOGIN_PATH,
            get(handlers::user_form).post(handlers::user_login),
        )
        .route(
            "/auth/user/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/auth/logout", post(handlers::logout))
        .route(handlers::dashboard::DASHBOARD_PATH, get(handlers::dashboard))
        .route("/app/account/delete", post(handlers::delete_account))
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state)),
        )
}

/// Connect the database, wire the provider and serve until ctrl-c.
///
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start
pub async fn new(
    port: u16,
    dsn: &str,
    auth_config: AuthConfig,
    provider_config: GoTrueConfig,
    logger: Logger,
) -> Result<()> {
    let store = Arc::new(PgStore::connect(dsn).await?);
    let pool = store.pool().clone();

    if !auth_config.session_cookie_secure() {
        logger.warn("session cookie is sent without the Secure attribute");
    }

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        store.clone(),
        store,
        Arc::new(GoTrueFactory::new(provider_config)),
        logger,
    ));

    let app = router(auth_state).layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    logger.info(&format!(
        "Listening on [::]:{port} ({})",
        logger.environment()
    ));

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                logger.info("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http.request",
        method = %request.method(),
        path = request.uri().path(),
        request_id
    )
}
