//! Minimal server-rendered markup.

use axum::response::Html;

/// Escape text for HTML element and attribute contexts.
pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
    ))
}

fn hidden_redirect(redirect_to: Option<&str>) -> String {
    redirect_to.map_or_else(String::new, |redirect_to| {
        format!(
            r#"<input type="hidden" name="redirectTo" value="{}">"#,
            escape(redirect_to)
        )
    })
}

fn error_block(error: Option<&str>) -> String {
    error.map_or_else(String::new, |error| {
        format!(r#"<div id="form-error" role="alert">{}</div>"#, escape(error))
    })
}

pub(crate) fn index() -> Html<String> {
    layout(
        "Welcome",
        r#"<h1>Welcome</h1>
<h2>Sitemap</h2>
<ul>
<li><a href="/auth/user/register">User Register Page</a></li>
<li><a href="/auth/user/login">User Login Page</a></li>
<li><a href="/auth/company/login">Company Login Page</a></li>
<li><a href="/app">Dashboard</a></li>
</ul>
<form action="/auth/logout" method="post">
<button data-test-id="logout" type="submit">Log out</button>
</form>"#,
    )
}

pub(crate) fn login(action: &str, redirect_to: Option<&str>, error: Option<&str>) -> Html<String> {
    layout(
        "Log in",
        &format!(
            r#"<h1>Log in</h1>
<form method="post" action="{action}">
<label for="email">Email</label>
<input data-test-id="email" id="email" required autofocus name="email" type="email" autocomplete="email">
<label for="password">Password</label>
<input data-test-id="password" id="password" name="password" type="password" autocomplete="current-password">
{hidden}
<button type="submit">Log in</button>
{error}
</form>
<p>Don't have an account? <a href="/auth/user/register">Sign up</a></p>"#,
            action = escape(action),
            hidden = hidden_redirect(redirect_to),
            error = error_block(error),
        ),
    )
}

pub(crate) fn register(redirect_to: Option<&str>, error: Option<&str>) -> Html<String> {
    layout(
        "Create an account",
        &format!(
            r#"<h1>Create an account</h1>
<form method="post" action="/auth/user/register">
<label for="name">Name</label>
<input data-test-id="name" id="name" required autofocus name="name" type="text">
<label for="email">Email</label>
<input data-test-id="email" id="email" required name="email" type="email" autocomplete="email">
<label for="password">Password</label>
<input data-test-id="password" id="password" name="password" type="password" autocomplete="new-password">
{error}
{hidden}
<button type="submit">Create Account</button>
</form>
<p>Already have an account? <a href="/auth/user/login">Log In</a></p>"#,
            hidden = hidden_redirect(redirect_to),
            error = error_block(error),
        ),
    )
}

pub(crate) fn dashboard(email: &str) -> Html<String> {
    layout(
        "Dashboard",
        &format!(
            r#"<h1>Dashboard</h1>
<p>Signed in as <strong>{email}</strong></p>
<form action="/auth/logout" method="post">
<button data-test-id="logout" type="submit">Log out</button>
</form>
<form action="/app/account/delete" method="post">
<button data-test-id="delete-account" type="submit">Delete test account</button>
</form>"#,
            email = escape(email),
        ),
    )
}
