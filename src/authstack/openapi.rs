use utoipa::OpenApi;

use super::handlers::{dashboard, forms, health, index, login, logout, register};

#[derive(OpenApi)]
#[openapi(
    paths(
        index::index,
        login::company_form,
        login::company_login,
        login::user_form,
        login::user_login,
        register::register_form,
        register::register,
        logout::logout,
        dashboard::dashboard,
        dashboard::delete_account,
        health::health,
    ),
    components(schemas(forms::LoginForm, forms::RegisterForm, health::Health)),
    tags(
        (name = "auth", description = "Sign in and sign out"),
        (name = "register", description = "Account registration"),
        (name = "pages", description = "Server-rendered pages"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for path in [
            "/",
            "/auth/company/login",
            "/auth/user/login",
            "/auth/user/register",
            "/auth/logout",
            "/app",
            "/app/account/delete",
            "/health",
        ] {
            assert!(paths.contains(&path), "missing {path}");
        }
    }
}
