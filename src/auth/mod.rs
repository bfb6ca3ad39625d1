//! Authentication against the external provider and cookie sessions.
//!
//! The provider owns credentials and issues sessions; this module maps its
//! payloads into [`types::AuthSession`], keeps a server-side record per
//! browser session and guards routes by session state.

pub mod mappers;
pub mod provider;
pub mod service;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;
pub mod utils;

pub use provider::{AuthProvider, GoTrueConfig, GoTrueFactory, ProviderError, ProviderFactory};
pub use state::{AuthConfig, AuthState};
pub use types::AuthSession;
