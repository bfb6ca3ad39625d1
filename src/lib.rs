//! # Authstack
//!
//! Server-rendered registration and login backed by an external auth provider
//! (GoTrue REST API) and a PostgreSQL `users` table.
//!
//! ## Account lifecycle
//!
//! The provider account and the local user row live in two stores without a
//! shared transaction. Registration creates the provider account, signs in and
//! inserts the row; when a later step fails the provider account is deleted.
//!
//! ## Sessions
//!
//! A successful sign-in stores the provider session server side under the
//! SHA-256 hash of a random token. The raw token travels in the
//! `authstack_session` cookie. Routes are guarded by session state: forms
//! redirect authenticated users to `/app`, `/app` redirects anonymous users to
//! the login form.
//!
//! ## Errors
//!
//! Failures are wrapped into [`error::StackError`] with a kind, metadata and a
//! subsystem tag. Users only ever see a generic message.

pub mod auth;
pub mod authstack;
pub mod cli;
pub mod error;
pub mod logger;
pub mod store;
pub mod user;

#[cfg(test)]
mod test_support;
