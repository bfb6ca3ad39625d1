//! Uniform application error envelope.
//!
//! Every failure that crosses a service boundary is rewrapped into a
//! [`StackError`] carrying the email/id involved as metadata and the subsystem
//! tag. The original error stays attached as `cause` for logging; it is never
//! rendered to the end user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Map, Value};
use std::{error::Error as StdError, fmt};
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Generic message returned to clients on any auth failure.
pub const GENERIC_CREDENTIALS_MESSAGE: &str = "Something is wrong with credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Form input rejected before any side effect.
    Validation,
    Lookup,
    Create,
    Delete,
    /// Composite failure of provider signup, sign-in and user creation.
    AccountCreation,
    /// Provider session without a user email.
    MissingEmail,
    Credentials,
    Provider,
    Session,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Lookup => "lookup",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::AccountCreation => "account_creation",
            Self::MissingEmail => "missing_email",
            Self::Credentials => "credentials",
            Self::Provider => "provider",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct StackError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<BoxError>,
    status: Option<StatusCode>,
    metadata: Map<String, Value>,
    tag: Option<&'static str>,
}

impl StackError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            status: None,
            metadata: Map::new(),
            tag: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    #[must_use]
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Nested `StackError` cause, if the chain continues with one.
    #[must_use]
    pub fn stack_cause(&self) -> Option<&StackError> {
        self.cause()
            .and_then(|cause| cause.downcast_ref::<StackError>())
    }

    /// Serialize the whole cause chain for structured logs.
    #[must_use]
    pub fn to_log_value(&self) -> Value {
        let mut value = json!({
            "kind": self.kind.as_str(),
            "message": self.message,
            "metadata": Value::Object(self.metadata.clone()),
        });

        if let Some(status) = self.status {
            value["status"] = json!(status.as_u16());
        }

        if let Some(tag) = self.tag {
            value["tag"] = json!(tag);
        }

        if let Some(cause) = self.cause() {
            value["cause"] = match cause.downcast_ref::<StackError>() {
                Some(stack) => stack.to_log_value(),
                None => foreign_log_value(cause),
            };
        }

        value
    }
}

fn foreign_log_value(error: &(dyn StdError + 'static)) -> Value {
    let mut sources = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        sources.push(Value::String(source.to_string()));
        current = source.source();
    }

    if sources.is_empty() {
        json!({ "message": error.to_string() })
    } else {
        json!({ "message": error.to_string(), "sources": sources })
    }
}

impl IntoResponse for StackError {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = if status.is_server_error() {
            "Something went wrong."
        } else {
            GENERIC_CREDENTIALS_MESSAGE
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn builder_sets_fields() {
        let err = StackError::new(ErrorKind::Lookup, "Unable to get user by email")
            .with_status(StatusCode::NOT_FOUND)
            .with_metadata("email", "a@b.com")
            .with_tag("User service");

        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "Unable to get user by email");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.metadata().get("email"), Some(&json!("a@b.com")));
        assert_eq!(err.tag(), Some("User service"));
        assert!(err.cause().is_none());
    }

    #[test]
    fn nested_stack_error_is_reachable() {
        let inner = StackError::new(ErrorKind::Create, "Unable to create user");
        let outer =
            StackError::new(ErrorKind::AccountCreation, "Unable to create user account")
                .with_cause(inner);

        let nested = outer.stack_cause().map(StackError::kind);
        assert_eq!(nested, Some(ErrorKind::Create));
        assert!(outer.source().is_some());
    }

    #[test]
    fn log_value_serializes_chain() {
        let root = anyhow!("connection refused").context("failed to insert user");
        let inner = StackError::new(ErrorKind::Create, "Unable to create user")
            .with_cause(root)
            .with_metadata("userId", "42");
        let outer = StackError::new(ErrorKind::AccountCreation, "Unable to create user account")
            .with_cause(inner)
            .with_tag("User service");

        let value = outer.to_log_value();
        assert_eq!(value["kind"], "account_creation");
        assert_eq!(value["tag"], "User service");
        assert_eq!(value["cause"]["kind"], "create");
        assert_eq!(value["cause"]["metadata"]["userId"], "42");
        assert_eq!(
            value["cause"]["cause"]["message"],
            "failed to insert user"
        );
        assert_eq!(
            value["cause"]["cause"]["sources"][0],
            "connection refused"
        );
    }

    #[test]
    fn response_hides_details() {
        let err = StackError::new(ErrorKind::Credentials, "Email already registered.")
            .with_status(StatusCode::FORBIDDEN);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let err = StackError::new(ErrorKind::Session, "boom");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
