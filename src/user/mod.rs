//! Local user records and the account lifecycle.

pub mod service;
pub mod storage;
pub mod types;

pub use service::{create_user_account, delete_user, get_user_by_email};
pub use types::{NewAccount, User};
