//! Form payloads and their validation.
//!
//! Validation runs before any provider or database call. Missing fields
//! deserialize to empty strings so that they fail here instead of in the
//! extractor.

use axum::http::StatusCode;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::utils::{normalize_email, valid_email},
    error::{ErrorKind, StackError},
};

const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_NAME_LENGTH: usize = 4;
const TAG: &str = "Form validation";

#[derive(ToSchema, Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "redirectTo")]
    redirect_to: Option<String>,
}

#[derive(ToSchema, Deserialize, Default)]
pub struct RegisterForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "redirectTo")]
    redirect_to: Option<String>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct RedirectQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Validated login input; the email is normalized.
pub(crate) struct LoginInput {
    pub(crate) email: String,
    pub(crate) password: SecretString,
    pub(crate) redirect_to: Option<String>,
}

pub(crate) struct RegisterInput {
    pub(crate) email: String,
    pub(crate) password: SecretString,
    pub(crate) name: String,
    pub(crate) redirect_to: Option<String>,
}

impl LoginForm {
    pub(crate) fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    /// # Errors
    /// Returns a `Validation` error listing the failed rules.
    pub(crate) fn validate(self) -> Result<LoginInput, StackError> {
        let email = normalize_email(&self.email);
        let mut issues = Vec::new();
        check_email(&email, &mut issues);
        check_password(&self.password, &mut issues);
        finish(issues, &email)?;

        Ok(LoginInput {
            email,
            password: SecretString::from(self.password),
            redirect_to: self.redirect_to,
        })
    }
}

impl RegisterForm {
    pub(crate) fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    /// # Errors
    /// Returns a `Validation` error listing the failed rules.
    pub(crate) fn validate(self) -> Result<RegisterInput, StackError> {
        let email = normalize_email(&self.email);
        let name = self.name.trim().to_string();
        let mut issues = Vec::new();
        check_email(&email, &mut issues);
        check_password(&self.password, &mut issues);
        if name.chars().count() < MIN_NAME_LENGTH {
            issues.push("name-too-short");
        }
        finish(issues, &email)?;

        Ok(RegisterInput {
            email,
            password: SecretString::from(self.password),
            name,
            redirect_to: self.redirect_to,
        })
    }
}

fn check_email(email: &str, issues: &mut Vec<&'static str>) {
    if !valid_email(email) {
        issues.push("invalid-email");
    }
}

fn check_password(password: &str, issues: &mut Vec<&'static str>) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        issues.push("password-too-short");
    }
}

fn finish(issues: Vec<&'static str>, email: &str) -> Result<(), StackError> {
    if issues.is_empty() {
        return Ok(());
    }

    Err(StackError::new(ErrorKind::Validation, "Invalid form data")
        .with_status(StatusCode::BAD_REQUEST)
        .with_metadata("email", email)
        .with_metadata(
            "issues",
            Value::from(issues.into_iter().map(Value::from).collect::<Vec<_>>()),
        )
        .with_tag(TAG))
}
